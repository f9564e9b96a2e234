/*!
 * # Health Check Module
 *
 * Probes for the load balancer and the container runtime:
 *
 * - `/health` - cached overall status
 * - `/health/ready` - pings the database before answering
 * - `/health/live` - process is up
 * - `/health/details` - per-component status, including which integrations are configured
 */

use crate::config::AppConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

impl HealthStatus {
    fn status_code(self) -> StatusCode {
        match self {
            HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthDetail>,
}

/// Integrations that degrade the service when missing, with whether each is configured.
fn integrations(config: &AppConfig) -> [(&'static str, bool); 3] {
    [
        ("payments", config.stripe_secret_key.is_some()),
        ("email", config.resend_api_key.is_some()),
        (
            "storage",
            config.storage_url.is_some() && config.storage_service_key.is_some(),
        ),
    ]
}

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub health_cache: Arc<RwLock<HealthInfo>>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self {
            db_pool,
            config,
            health_cache: Arc::new(RwLock::new(HealthInfo {
                status: HealthStatus::Up,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                uptime_seconds: 0,
                details: BTreeMap::new(),
            })),
            start_time: SystemTime::now(),
        }
    }

    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }

    /// Re-runs every check and refreshes the cached status.
    pub async fn update_health(&self) {
        let now = Utc::now();
        let mut details = BTreeMap::new();

        let database = match crate::db::check_connection(&self.db_pool).await {
            Ok(()) => HealthDetail {
                status: HealthStatus::Up,
                message: None,
                timestamp: now,
            },
            Err(_) => HealthDetail {
                status: HealthStatus::Down,
                message: Some("database unreachable".to_string()),
                timestamp: now,
            },
        };
        details.insert("database".to_string(), database);

        for (name, configured) in integrations(&self.config) {
            details.insert(
                name.to_string(),
                HealthDetail {
                    status: if configured {
                        HealthStatus::Up
                    } else {
                        HealthStatus::Degraded
                    },
                    message: (!configured).then(|| "not configured".to_string()),
                    timestamp: now,
                },
            );
        }

        let status = if details.values().any(|d| d.status == HealthStatus::Down) {
            HealthStatus::Down
        } else if details.values().any(|d| d.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };

        let mut health = self.health_cache.write().await;
        health.timestamp = now;
        health.uptime_seconds = self.uptime();
        health.details = details;
        health.status = status;
    }
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");
    let health = state.health_cache.read().await;

    (
        health.status.status_code(),
        Json(json!({
            "status": health.status,
            "version": health.version,
            "timestamp": health.timestamp,
        })),
    )
}

/// Ready once the database answers
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    state.update_health().await;
    let health = state.health_cache.read().await;
    let database_up = health
        .details
        .get("database")
        .map(|d| d.status == HealthStatus::Up)
        .unwrap_or(false);

    let status_code = if database_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "ready": database_up,
            "timestamp": health.timestamp,
        })),
    )
}

pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now(),
        })),
    )
}

pub async fn detailed_health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    state.update_health().await;
    let health = state.health_cache.read().await;
    (health.status.status_code(), Json(health.clone()))
}

/// Refreshes the cached status every 30 seconds.
pub async fn run_health_checker(state: Arc<HealthState>) {
    info!("Starting periodic health checker");
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;
        state.update_health().await;

        let health = state.health_cache.read().await;
        if health.status == HealthStatus::Down {
            for (name, detail) in &health.details {
                if detail.status == HealthStatus::Down {
                    warn!("Component {name} is down: {:?}", detail.message);
                }
            }
        }
    }
}

pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/details", get(detailed_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, test_config};

    #[tokio::test]
    async fn unconfigured_integrations_degrade_but_do_not_fail() {
        let config = Arc::new(test_config());
        let db = seeded_db(&config).await;
        let state = HealthState::new(db, config);

        state.update_health().await;
        let health = state.health_cache.read().await;
        assert_eq!(health.details["database"].status, HealthStatus::Up);
        assert_eq!(health.details["email"].status, HealthStatus::Degraded);
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.status.status_code(), StatusCode::OK);
    }
}
