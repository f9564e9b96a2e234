use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_hostels_and_rooms::Hostels;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invitations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invitations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invitations::HostelId).uuid().not_null())
                    .col(ColumnDef::new(Invitations::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Invitations::Role).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Invitations::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invitations::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Invitations::Message).text())
                    .col(ColumnDef::new(Invitations::InvitedBy).string_len(255))
                    .col(
                        ColumnDef::new(Invitations::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Invitations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitations_hostel")
                            .from(Invitations::Table, Invitations::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invitations_email")
                    .table(Invitations::Table)
                    .col(Invitations::Email)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invitations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Invitations {
    Table,
    Id,
    HostelId,
    Email,
    Role,
    Token,
    Status,
    Message,
    InvitedBy,
    ExpiresAt,
    CreatedAt,
}
