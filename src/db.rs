use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge};
use migrations::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub type DbPool = DatabaseConnection;

/// Pool tuning, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

impl DbConfig {
    fn is_sqlite_memory(&self) -> bool {
        self.url.starts_with("sqlite:") && self.url.contains(":memory:")
    }

    /// `(max, min)` connections. Every connection to an in-memory SQLite
    /// URL opens a separate database, so those pools hold exactly one.
    pub fn pool_bounds(&self) -> (u32, u32) {
        if self.is_sqlite_memory() {
            (1, 1)
        } else {
            let max = self.max_connections.max(1);
            (max, self.min_connections.min(max))
        }
    }

    /// Connection URL with `mode=rwc` added to SQLite file URLs, so a local
    /// `hostel.db` is created on first run instead of failing to open.
    pub fn connect_url(&self) -> String {
        let is_sqlite_file = self.url.starts_with("sqlite:") && !self.is_sqlite_memory();
        if !is_sqlite_file || self.url.contains("mode=") {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}mode=rwc", self.url, separator)
    }
}

/// Connects with default tuning; used by the seeder and tests.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    })
    .await
}

pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    establish_connection_with_config(&cfg.into()).await
}

pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    let (max_connections, min_connections) = config.pool_bounds();
    debug!(max_connections, min_connections, "Configuring database pool");

    let mut opt = ConnectOptions::new(config.connect_url());
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("hostel_db.max_connections", max_connections as f64);

    let pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Database pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let pending = Migrator::get_pending_migrations(pool).await?.len();
    if pending == 0 {
        debug!("Schema is up to date");
        return Ok(());
    }

    info!(pending, "Applying database migrations");
    let start = Instant::now();
    match Migrator::up(pool, None).await {
        Ok(()) => {
            info!("Database migrations completed in {:?}", start.elapsed());
            Ok(())
        }
        Err(e) => {
            error!("Database migrations failed after {:?}: {}", start.elapsed(), e);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Pings the pool, recording latency or a failure counter.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();
    match pool.ping().await {
        Ok(()) => {
            gauge!("hostel_db.ping_ms", start.elapsed().as_millis() as f64);
            Ok(())
        }
        Err(e) => {
            error!("Database ping failed after {:?}: {}", start.elapsed(), e);
            counter!("hostel_db.ping_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}
