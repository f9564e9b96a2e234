use sea_orm_migration::prelude::*;

use crate::m20250101_000002_create_guests_and_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailReminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailReminders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailReminders::BookingId).uuid().not_null())
                    .col(
                        ColumnDef::new(EmailReminders::ReminderType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmailReminders::Status)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmailReminders::Error).text())
                    .col(
                        ColumnDef::new(EmailReminders::SentAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_reminders_booking")
                            .from(EmailReminders::Table, EmailReminders::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_email_reminders_booking_type")
                    .table(EmailReminders::Table)
                    .col(EmailReminders::BookingId)
                    .col(EmailReminders::ReminderType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailReminders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EmailReminders {
    Table,
    Id,
    BookingId,
    ReminderType,
    Status,
    Error,
    SentAt,
}
