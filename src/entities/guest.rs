use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity and document details captured during self check-in.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Guest)]
#[sea_orm(table_name = "guests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    #[sea_orm(nullable)]
    pub nationality: Option<String>,
    #[sea_orm(nullable)]
    pub date_of_birth: Option<NaiveDate>,
    #[sea_orm(nullable)]
    pub passport_number: Option<String>,
    #[sea_orm(nullable)]
    pub passport_expiry: Option<NaiveDate>,
    #[sea_orm(nullable)]
    pub emergency_contact_name: Option<String>,
    #[sea_orm(nullable)]
    pub emergency_contact_phone: Option<String>,
    #[sea_orm(nullable)]
    pub emergency_contact_relation: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub dietary_restrictions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::check_in::Entity")]
    CheckIns,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::check_in::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckIns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
