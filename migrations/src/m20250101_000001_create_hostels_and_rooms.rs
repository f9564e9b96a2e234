use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hostels::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Hostels::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Hostels::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Hostels::Slug)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Hostels::City).string_len(255).not_null())
                    .col(ColumnDef::new(Hostels::Country).string_len(255).not_null())
                    .col(ColumnDef::new(Hostels::Address).string_len(512))
                    .col(ColumnDef::new(Hostels::Description).text())
                    .col(ColumnDef::new(Hostels::Email).string_len(255))
                    .col(ColumnDef::new(Hostels::Phone).string_len(64))
                    .col(
                        ColumnDef::new(Hostels::TimezoneOffsetMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Hostels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Hostels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Rooms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Rooms::HostelId).uuid().not_null())
                    .col(ColumnDef::new(Rooms::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Rooms::Description).text())
                    .col(ColumnDef::new(Rooms::RoomType).string_len(20).not_null())
                    .col(ColumnDef::new(Rooms::BedCount).integer().not_null())
                    .col(ColumnDef::new(Rooms::MaxGuests).integer().not_null())
                    .col(
                        ColumnDef::new(Rooms::PricePerNightCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Rooms::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Rooms::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Rooms::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rooms_hostel")
                            .from(Rooms::Table, Rooms::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rooms_hostel_id")
                    .table(Rooms::Table)
                    .col(Rooms::HostelId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Hostels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Hostels {
    Table,
    Id,
    Name,
    Slug,
    City,
    Country,
    Address,
    Description,
    Email,
    Phone,
    TimezoneOffsetMinutes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Rooms {
    Table,
    Id,
    HostelId,
    Name,
    Description,
    RoomType,
    BedCount,
    MaxGuests,
    PricePerNightCents,
    Currency,
    IsActive,
    DisplayOrder,
    CreatedAt,
    UpdatedAt,
}
