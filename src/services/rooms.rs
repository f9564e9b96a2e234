use crate::{
    config::AppConfig,
    entities::{
        booking,
        room::{self, RoomType},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Room with its nightly price in currency units.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: room::Model,
    #[schema(value_type = String, example = "15.00")]
    pub price_per_night: Decimal,
}

impl From<room::Model> for RoomView {
    fn from(room: room::Model) -> Self {
        Self {
            price_per_night: room.price_per_night(),
            room,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    pub name: String,
    pub description: Option<String>,
    pub room_type: RoomType,
    pub bed_count: i32,
    pub max_guests: i32,
    #[schema(value_type = String, example = "15.00")]
    pub price_per_night: Decimal,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub room_type: Option<RoomType>,
    pub bed_count: Option<i32>,
    pub max_guests: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price_per_night: Option<Decimal>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

/// Highest nightly price accepted from the admin console (100,000.00).
pub const MAX_PRICE_CENTS: i64 = 10_000_000;

/// Converts a decimal price to cents, rejecting negatives, sub-cent precision
/// and anything above [`MAX_PRICE_CENTS`].
pub fn to_cents(price: Decimal) -> Result<i64, ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    let cents = price * Decimal::ONE_HUNDRED;
    if cents.fract() != Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Price cannot have more than two decimal places".to_string(),
        ));
    }
    cents
        .to_i64()
        .filter(|cents| *cents <= MAX_PRICE_CENTS)
        .ok_or_else(|| ServiceError::ValidationError("Price is too large".to_string()))
}

fn check_capacity(bed_count: i32, max_guests: i32) -> Result<(), ServiceError> {
    if bed_count < 1 {
        return Err(ServiceError::ValidationError(
            "bed_count must be at least 1".to_string(),
        ));
    }
    if max_guests < 1 {
        return Err(ServiceError::ValidationError(
            "max_guests must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct RoomService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl RoomService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    async fn find(&self, id: Uuid) -> Result<room::Model, ServiceError> {
        room::Entity::find_by_id(id)
            .filter(room::Column::HostelId.eq(self.config.hostel_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Room not found".to_string()))
    }

    /// Active rooms for the public site.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<RoomView>, ServiceError> {
        let rooms = room::Entity::find()
            .filter(room::Column::HostelId.eq(self.config.hostel_id))
            .filter(room::Column::IsActive.eq(true))
            .order_by_asc(room::Column::DisplayOrder)
            .order_by_asc(room::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rooms.into_iter().map(RoomView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RoomView>, ServiceError> {
        let rooms = room::Entity::find()
            .filter(room::Column::HostelId.eq(self.config.hostel_id))
            .order_by_asc(room::Column::DisplayOrder)
            .order_by_asc(room::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(rooms.into_iter().map(RoomView::from).collect())
    }

    #[instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create(
        &self,
        req: CreateRoomRequest,
        now: DateTime<Utc>,
    ) -> Result<RoomView, ServiceError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("Room name is required".to_string()));
        }
        check_capacity(req.bed_count, req.max_guests)?;
        let price_cents = to_cents(req.price_per_night)?;

        let room = room::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.config.hostel_id),
            name: Set(name.to_string()),
            description: Set(req.description),
            room_type: Set(req.room_type),
            bed_count: Set(req.bed_count),
            max_guests: Set(req.max_guests),
            price_per_night_cents: Set(price_cents),
            currency: Set(req
                .currency
                .unwrap_or_else(|| self.config.currency.clone())
                .to_uppercase()),
            is_active: Set(req.is_active.unwrap_or(true)),
            display_order: Set(req.display_order.unwrap_or(0)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(room_id = %room.id, "Room created");
        Ok(room.into())
    }

    #[instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateRoomRequest,
        now: DateTime<Utc>,
    ) -> Result<RoomView, ServiceError> {
        let existing = self.find(id).await?;
        check_capacity(
            req.bed_count.unwrap_or(existing.bed_count),
            req.max_guests.unwrap_or(existing.max_guests),
        )?;

        let mut room: room::ActiveModel = existing.into();
        if let Some(name) = req.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ServiceError::ValidationError("Room name is required".to_string()));
            }
            room.name = Set(name);
        }
        if let Some(description) = req.description {
            room.description = Set(Some(description));
        }
        if let Some(room_type) = req.room_type {
            room.room_type = Set(room_type);
        }
        if let Some(bed_count) = req.bed_count {
            room.bed_count = Set(bed_count);
        }
        if let Some(max_guests) = req.max_guests {
            room.max_guests = Set(max_guests);
        }
        if let Some(price) = req.price_per_night {
            room.price_per_night_cents = Set(to_cents(price)?);
        }
        if let Some(currency) = req.currency {
            room.currency = Set(currency.to_uppercase());
        }
        if let Some(is_active) = req.is_active {
            room.is_active = Set(is_active);
        }
        if let Some(display_order) = req.display_order {
            room.display_order = Set(display_order);
        }
        room.updated_at = Set(now);

        Ok(room.update(&*self.db).await?.into())
    }

    /// Rooms that have bookings can only be deactivated.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let room = self.find(id).await?;
        let bookings = booking::Entity::find()
            .filter(booking::Column::RoomId.eq(room.id))
            .count(&*self.db)
            .await?;
        if bookings > 0 {
            return Err(ServiceError::Conflict(
                "Room has bookings and cannot be deleted; deactivate it instead".to_string(),
            ));
        }

        room::Entity::delete_by_id(room.id).exec(&*self.db).await?;
        info!(room_id = %id, "Room deleted");
        Ok(())
    }
}
