use sea_orm_migration::prelude::*;

use crate::m20250101_000002_create_guests_and_bookings::{Bookings, Guests};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CheckIns::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CheckIns::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(CheckIns::BookingId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CheckIns::GuestId).uuid().not_null())
                    .col(ColumnDef::new(CheckIns::CheckedInBy).string_len(64).not_null())
                    .col(ColumnDef::new(CheckIns::DeviceInfo).text())
                    .col(ColumnDef::new(CheckIns::IpAddress).string_len(64))
                    .col(ColumnDef::new(CheckIns::PassportImageUrl).text())
                    .col(ColumnDef::new(CheckIns::SignatureUrl).text())
                    .col(ColumnDef::new(CheckIns::RulesAccepted).boolean().not_null())
                    .col(ColumnDef::new(CheckIns::RulesAcceptedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CheckIns::GdprConsent).boolean().not_null())
                    .col(ColumnDef::new(CheckIns::GdprConsentAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(CheckIns::ArrivalNotes).text())
                    .col(
                        ColumnDef::new(CheckIns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_booking")
                            .from(CheckIns::Table, CheckIns::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_check_ins_guest")
                            .from(CheckIns::Table, CheckIns::GuestId)
                            .to(Guests::Table, Guests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConsentLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsentLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConsentLogs::BookingId).uuid().not_null())
                    .col(ColumnDef::new(ConsentLogs::GuestId).uuid().not_null())
                    .col(
                        ColumnDef::new(ConsentLogs::ConsentType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ConsentLogs::ConsentText).text().not_null())
                    .col(ColumnDef::new(ConsentLogs::Accepted).boolean().not_null())
                    .col(ColumnDef::new(ConsentLogs::IpAddress).string_len(64))
                    .col(ColumnDef::new(ConsentLogs::UserAgent).text())
                    .col(
                        ColumnDef::new(ConsentLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consent_logs_booking")
                            .from(ConsentLogs::Table, ConsentLogs::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consent_logs_guest")
                            .from(ConsentLogs::Table, ConsentLogs::GuestId)
                            .to(Guests::Table, Guests::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_consent_logs_booking_id")
                    .table(ConsentLogs::Table)
                    .col(ConsentLogs::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ConsentLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CheckIns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CheckIns {
    Table,
    Id,
    BookingId,
    GuestId,
    CheckedInBy,
    DeviceInfo,
    IpAddress,
    PassportImageUrl,
    SignatureUrl,
    RulesAccepted,
    RulesAcceptedAt,
    GdprConsent,
    GdprConsentAt,
    ArrivalNotes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ConsentLogs {
    Table,
    Id,
    BookingId,
    GuestId,
    ConsentType,
    ConsentText,
    Accepted,
    IpAddress,
    UserAgent,
    CreatedAt,
}
