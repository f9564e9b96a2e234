use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = CheckIn)]
#[sea_orm(table_name = "check_ins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_id: Uuid,
    pub guest_id: Uuid,
    pub checked_in_by: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub device_info: Option<String>,
    #[sea_orm(nullable)]
    pub ip_address: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub passport_image_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub signature_url: Option<String>,
    pub rules_accepted: bool,
    #[sea_orm(nullable)]
    pub rules_accepted_at: Option<DateTime<Utc>>,
    pub gdpr_consent: bool,
    #[sea_orm(nullable)]
    pub gdpr_consent_at: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub arrival_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
    #[sea_orm(
        belongs_to = "super::guest::Entity",
        from = "Column::GuestId",
        to = "super::guest::Column::Id"
    )]
    Guest,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl Related<super::guest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Guest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
