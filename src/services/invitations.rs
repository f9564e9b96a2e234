use crate::{
    config::AppConfig,
    entities::invitation::{self, InvitationRole, InvitationStatus},
    errors::ServiceError,
    services::{notifications::Notifier, pricing},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::{str::FromStr, sync::Arc};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const INVITATION_TOKEN_LEN: usize = 48;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInvitationRequest {
    pub email: Option<String>,
    pub role: Option<String>,
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct InvitationService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
}

impl InvitationService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            config,
            notifier,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<invitation::Model>, ServiceError> {
        Ok(invitation::Entity::find()
            .filter(invitation::Column::HostelId.eq(self.config.hostel_id))
            .order_by_desc(invitation::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Records the invitation and emails the accept link. The row is removed
    /// again if the email cannot be delivered.
    #[instrument(skip(self, req))]
    pub async fn create(
        &self,
        req: CreateInvitationRequest,
        invited_by: &str,
        now: DateTime<Utc>,
    ) -> Result<invitation::Model, ServiceError> {
        let email = req
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase);
        let role = req.role.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let (Some(email), Some(role)) = (email, role) else {
            return Err(ServiceError::BadRequest(
                "Email and role are required".to_string(),
            ));
        };
        if !validator::validate_email(email.as_str()) {
            return Err(ServiceError::BadRequest("Invalid email format".to_string()));
        }
        let role = InvitationRole::from_str(role)
            .map_err(|_| ServiceError::BadRequest("Invalid role".to_string()))?;

        let pending = invitation::Entity::find()
            .filter(invitation::Column::HostelId.eq(self.config.hostel_id))
            .filter(invitation::Column::Email.eq(email.as_str()))
            .filter(invitation::Column::Status.eq(InvitationStatus::Pending))
            .filter(invitation::Column::ExpiresAt.gt(now))
            .count(&*self.db)
            .await?;
        if pending > 0 {
            return Err(ServiceError::Conflict(
                "A pending invitation already exists for this email".to_string(),
            ));
        }

        let message = req.message.filter(|m| !m.trim().is_empty());
        let token = pricing::generate_token(INVITATION_TOKEN_LEN);
        let expires_at = now + Duration::days(self.config.invitation_ttl_days);

        let created = invitation::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.config.hostel_id),
            email: Set(email.clone()),
            role: Set(role),
            token: Set(token.clone()),
            status: Set(InvitationStatus::Pending),
            message: Set(message.clone()),
            invited_by: Set(Some(invited_by.to_string())),
            expires_at: Set(expires_at),
            created_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        let link = self.config.invitation_link(&token);
        let delivered = self
            .notifier
            .staff_invitation(&email, &role.to_string(), &link, message.as_deref(), expires_at)
            .await;

        if !matches!(delivered, Ok(true)) {
            match delivered {
                Err(e) => error!(invitation_id = %created.id, "Invitation email failed: {}", e),
                _ => error!(invitation_id = %created.id, "Invitation email skipped, no provider configured"),
            }
            invitation::Entity::delete_by_id(created.id)
                .exec(&*self.db)
                .await?;
            return Err(ServiceError::ExternalServiceError(
                "Failed to send invitation email".to_string(),
            ));
        }

        info!(invitation_id = %created.id, %role, "Invitation sent");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, id: Uuid) -> Result<invitation::Model, ServiceError> {
        let existing = invitation::Entity::find_by_id(id)
            .filter(invitation::Column::HostelId.eq(self.config.hostel_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Invitation not found".to_string()))?;

        let mut model: invitation::ActiveModel = existing.into();
        model.status = Set(InvitationStatus::Revoked);
        Ok(model.update(&*self.db).await?)
    }
}
