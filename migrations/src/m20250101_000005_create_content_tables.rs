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
                    .table(HostelRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HostelRules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HostelRules::HostelId).uuid().not_null())
                    .col(ColumnDef::new(HostelRules::Title).string_len(255).not_null())
                    .col(ColumnDef::new(HostelRules::TitleEs).string_len(255))
                    .col(ColumnDef::new(HostelRules::Description).text().not_null())
                    .col(ColumnDef::new(HostelRules::DescriptionEs).text())
                    .col(
                        ColumnDef::new(HostelRules::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HostelRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hostel_rules_hostel")
                            .from(HostelRules::Table, HostelRules::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Content::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Content::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Content::HostelId).uuid().not_null())
                    .col(ColumnDef::new(Content::Section).string_len(128).not_null())
                    .col(ColumnDef::new(Content::Key).string_len(128).not_null())
                    .col(ColumnDef::new(Content::ValueEn).text())
                    .col(ColumnDef::new(Content::ValueEs).text())
                    .col(
                        ColumnDef::new(Content::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_hostel")
                            .from(Content::Table, Content::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_content_hostel_section_key")
                    .table(Content::Table)
                    .col(Content::HostelId)
                    .col(Content::Section)
                    .col(Content::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Faq::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Faq::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Faq::HostelId).uuid().not_null())
                    .col(ColumnDef::new(Faq::Question).text().not_null())
                    .col(ColumnDef::new(Faq::QuestionEs).text())
                    .col(ColumnDef::new(Faq::Answer).text().not_null())
                    .col(ColumnDef::new(Faq::AnswerEs).text())
                    .col(
                        ColumnDef::new(Faq::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Faq::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Faq::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Faq::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_faq_hostel")
                            .from(Faq::Table, Faq::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HostelImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HostelImages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HostelImages::HostelId).uuid().not_null())
                    .col(ColumnDef::new(HostelImages::ImageUrl).text().not_null())
                    .col(ColumnDef::new(HostelImages::AltText).string_len(255))
                    .col(ColumnDef::new(HostelImages::AltTextEs).string_len(255))
                    .col(
                        ColumnDef::new(HostelImages::Category)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HostelImages::DisplayOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(HostelImages::PositionX).integer())
                    .col(ColumnDef::new(HostelImages::PositionY).integer())
                    .col(ColumnDef::new(HostelImages::Size).string_len(8))
                    .col(ColumnDef::new(HostelImages::Rotation).integer())
                    .col(
                        ColumnDef::new(HostelImages::ShowOnMobile)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(HostelImages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_hostel_images_hostel")
                            .from(HostelImages::Table, HostelImages::HostelId)
                            .to(Hostels::Table, Hostels::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HostelImages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Faq::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Content::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(HostelRules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum HostelRules {
    Table,
    Id,
    HostelId,
    Title,
    TitleEs,
    Description,
    DescriptionEs,
    DisplayOrder,
    IsActive,
}

#[derive(DeriveIden)]
enum Content {
    Table,
    Id,
    HostelId,
    Section,
    Key,
    ValueEn,
    ValueEs,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Faq {
    Table,
    Id,
    HostelId,
    Question,
    QuestionEs,
    Answer,
    AnswerEs,
    DisplayOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum HostelImages {
    Table,
    Id,
    HostelId,
    ImageUrl,
    AltText,
    AltTextEs,
    Category,
    DisplayOrder,
    PositionX,
    PositionY,
    Size,
    Rotation,
    ShowOnMobile,
    CreatedAt,
}
