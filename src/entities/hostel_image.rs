use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Gallery, room, activity or hero image. Hero images carry floating layout hints.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = HostelImage)]
#[sea_orm(table_name = "hostel_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub hostel_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub image_url: String,
    #[sea_orm(nullable)]
    pub alt_text: Option<String>,
    #[sea_orm(nullable)]
    pub alt_text_es: Option<String>,
    pub category: String,
    pub display_order: i32,
    #[sea_orm(nullable)]
    pub position_x: Option<i32>,
    #[sea_orm(nullable)]
    pub position_y: Option<i32>,
    #[sea_orm(nullable)]
    pub size: Option<String>,
    #[sea_orm(nullable)]
    pub rotation: Option<i32>,
    pub show_on_mobile: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
