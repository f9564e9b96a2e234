use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_hostels_and_rooms::{Hostels, Rooms};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guests::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Guests::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Guests::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Guests::FullName).string_len(255).not_null())
                    .col(ColumnDef::new(Guests::Phone).string_len(64))
                    .col(ColumnDef::new(Guests::Nationality).string_len(128))
                    .col(ColumnDef::new(Guests::DateOfBirth).date())
                    .col(ColumnDef::new(Guests::PassportNumber).string_len(64))
                    .col(ColumnDef::new(Guests::PassportExpiry).date())
                    .col(ColumnDef::new(Guests::EmergencyContactName).string_len(255))
                    .col(ColumnDef::new(Guests::EmergencyContactPhone).string_len(64))
                    .col(ColumnDef::new(Guests::EmergencyContactRelation).string_len(128))
                    .col(ColumnDef::new(Guests::DietaryRestrictions).text())
                    .col(
                        ColumnDef::new(Guests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Guests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::HostelId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::RoomId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::GuestId).uuid())
                    .col(ColumnDef::new(Bookings::GuestName).string_len(255).not_null())
                    .col(ColumnDef::new(Bookings::GuestEmail).string_len(255).not_null())
                    .col(ColumnDef::new(Bookings::GuestPhone).string_len(64))
                    .col(ColumnDef::new(Bookings::CheckIn).date().not_null())
                    .col(ColumnDef::new(Bookings::CheckOut).date().not_null())
                    .col(ColumnDef::new(Bookings::GuestCount).integer().not_null())
                    .col(ColumnDef::new(Bookings::Nights).integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::TotalPriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Bookings::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Bookings::PaymentStatus)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::PaymentMethod)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::StripeSessionId)
                            .string_len(255)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Bookings::StripePaymentIntentId).string_len(255))
                    .col(ColumnDef::new(Bookings::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bookings::CheckinToken)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Bookings::CheckinCompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bookings::ArrivalTime).string_len(32))
                    .col(
                        ColumnDef::new(Bookings::RulesAccepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::RulesAcceptedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bookings::GdprConsent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::GdprConsentAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Bookings::SpecialRequests).text())
                    .col(ColumnDef::new(Bookings::Notes).text())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_hostel")
                            .from(Bookings::Table, Bookings::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_room")
                            .from(Bookings::Table, Bookings::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_guest")
                            .from(Bookings::Table, Bookings::GuestId)
                            .to(Guests::Table, Guests::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_check_in")
                    .table(Bookings::Table)
                    .col(Bookings::CheckIn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_check_out")
                    .table(Bookings::Table)
                    .col(Bookings::CheckOut)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Guests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Guests {
    Table,
    Id,
    Email,
    FullName,
    Phone,
    Nationality,
    DateOfBirth,
    PassportNumber,
    PassportExpiry,
    EmergencyContactName,
    EmergencyContactPhone,
    EmergencyContactRelation,
    DietaryRestrictions,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    HostelId,
    RoomId,
    GuestId,
    GuestName,
    GuestEmail,
    GuestPhone,
    CheckIn,
    CheckOut,
    GuestCount,
    Nights,
    TotalPriceCents,
    Currency,
    Status,
    PaymentStatus,
    PaymentMethod,
    StripeSessionId,
    StripePaymentIntentId,
    PaidAt,
    CheckinToken,
    CheckinCompletedAt,
    ArrivalTime,
    RulesAccepted,
    RulesAcceptedAt,
    GdprConsent,
    GdprConsentAt,
    SpecialRequests,
    Notes,
    CreatedAt,
    UpdatedAt,
}
