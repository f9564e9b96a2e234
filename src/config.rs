use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_HOSTEL_ID: &str = "6f1c2c3e-5d4b-4b8e-9a6e-2f1d8c7b9a10";
const DEV_DEFAULT_JWT_SECRET: &str =
    "mandioca_development_session_secret_not_for_production_use_7f3a9c2e4b81d6";

/// Settings for the API server, seeder and background jobs.
///
/// Loaded by [`load_config`]; every field can be set as `APP__<FIELD>`.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    // ========== Server ==========
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `development`, `test`, `staging` or `production`
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body, which bounds passport uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Comma-separated origins of the hostel website and admin console
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Needed when the admin console sends its session cookie cross-origin
    #[serde(default)]
    pub cors_allow_credentials: bool,

    // ========== Storage backends ==========
    pub database_url: String,

    #[serde(default)]
    pub auto_migrate: bool,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Only read when `login_throttle_backend = "redis"`
    pub redis_url: String,

    // ========== Hostel ==========
    /// The hostel every public and admin query is scoped to
    pub hostel_id: Uuid,

    #[serde(default = "default_hostel_name")]
    pub hostel_name: String,

    /// Inbox that receives booking notifications
    #[serde(default = "default_hostel_email")]
    pub hostel_email: String,

    /// Offset of the hostel's local time from UTC (Asunción is UTC-3)
    #[serde(default = "default_hostel_timezone_offset_minutes")]
    pub hostel_timezone_offset_minutes: i32,

    /// Public site URL used in checkout redirects and check-in links
    #[serde(default = "default_public_base_url")]
    #[validate(custom = "validate_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_max_stay_nights")]
    #[validate(range(min = 1, max = 365))]
    pub max_stay_nights: i64,

    // ========== Payments ==========
    #[serde(default)]
    pub stripe_secret_key: Option<String>,

    #[serde(default = "default_stripe_api_base")]
    pub stripe_api_base: String,

    /// Signing secret for inbound payment webhooks
    #[serde(default)]
    pub stripe_webhook_secret: Option<String>,

    /// Webhook timestamp tolerance (seconds)
    #[serde(default = "default_webhook_tolerance_secs")]
    #[validate(range(min = 1))]
    pub stripe_webhook_tolerance_secs: u64,

    // ========== Email ==========
    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_resend_api_base")]
    pub resend_api_base: String,

    #[serde(default = "default_email_from")]
    pub email_from: String,

    // ========== Storage ==========
    #[serde(default)]
    pub storage_url: Option<String>,

    #[serde(default)]
    pub storage_service_key: Option<String>,

    #[serde(default = "default_documents_bucket")]
    pub storage_documents_bucket: String,

    // ========== Analytics ==========
    #[serde(default)]
    pub posthog_api_key: Option<String>,

    #[serde(default = "default_posthog_host")]
    pub posthog_host: String,

    #[serde(default = "default_event_channel_capacity")]
    #[validate(range(min = 1))]
    pub event_channel_capacity: usize,

    // ========== Admin ==========
    /// Signs admin session tokens
    #[validate(custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_admin_session_secs")]
    #[validate(range(min = 300, max = 2592000))]
    pub admin_session_secs: i64,

    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    /// Argon2 PHC string for the admin password
    #[serde(default)]
    pub admin_password_hash: Option<String>,

    #[serde(default = "default_login_max_attempts")]
    #[validate(range(min = 1))]
    pub login_max_attempts: u32,

    #[serde(default = "default_login_lockout_secs")]
    pub login_lockout_secs: u64,

    /// Login throttle backend: "in-memory" or "redis"
    #[serde(default = "default_login_throttle_backend")]
    #[validate(custom = "validate_login_throttle_backend")]
    pub login_throttle_backend: String,

    #[serde(default = "default_invitation_ttl_days")]
    #[validate(range(min = 1, max = 90))]
    pub invitation_ttl_days: i64,

    // ========== Reminders ==========
    /// Bearer secret protecting the reminder trigger endpoint
    #[serde(default)]
    pub cron_secret: Option<String>,

    /// In-process reminder interval in seconds, 0 disables the scheduler
    #[serde(default)]
    pub reminder_interval_secs: u64,

    /// Applies to Stripe, Resend, storage and PostHog calls
    #[serde(default = "default_http_client_timeout_secs")]
    pub http_client_timeout_secs: u64,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(database_url: String, jwt_secret: String, environment: String) -> Self {
        Self {
            database_url,
            redis_url: "redis://localhost:6379".to_string(),
            jwt_secret,
            admin_session_secs: default_admin_session_secs(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
            hostel_id: default_hostel_id(),
            hostel_name: default_hostel_name(),
            hostel_email: default_hostel_email(),
            hostel_timezone_offset_minutes: default_hostel_timezone_offset_minutes(),
            public_base_url: default_public_base_url(),
            currency: default_currency(),
            max_stay_nights: default_max_stay_nights(),
            stripe_secret_key: None,
            stripe_api_base: default_stripe_api_base(),
            stripe_webhook_secret: None,
            stripe_webhook_tolerance_secs: default_webhook_tolerance_secs(),
            resend_api_key: None,
            resend_api_base: default_resend_api_base(),
            email_from: default_email_from(),
            storage_url: None,
            storage_service_key: None,
            storage_documents_bucket: default_documents_bucket(),
            posthog_api_key: None,
            posthog_host: default_posthog_host(),
            event_channel_capacity: default_event_channel_capacity(),
            admin_username: default_admin_username(),
            admin_password_hash: None,
            login_max_attempts: default_login_max_attempts(),
            login_lockout_secs: default_login_lockout_secs(),
            login_throttle_backend: default_login_throttle_backend(),
            invitation_ttl_days: default_invitation_ttl_days(),
            cron_secret: None,
            reminder_interval_secs: 0,
            http_client_timeout_secs: default_http_client_timeout_secs(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .is_some_and(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
    }

    /// Public base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }

    /// Link a guest follows to complete self check-in
    pub fn checkin_link(&self, token: &str) -> String {
        format!("{}/checkin/{}", self.base_url(), token)
    }

    pub fn invitation_link(&self, token: &str) -> String {
        format!("{}/auth/accept-invite?token={}", self.base_url(), token)
    }

    /// Cross-field and per-environment rules the derive cannot express.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut fail = |field: &'static str, code: &'static str, message: &str| {
            let mut err = ValidationError::new(code);
            err.message = Some(message.to_string().into());
            errors.add(field, err);
        };

        if !self.is_development() && !self.cors_allow_any_origin && !self.has_cors_allowed_origins()
        {
            fail(
                "cors_allowed_origins",
                "cors_allowed_origins_required",
                "Set APP__CORS_ALLOWED_ORIGINS to the hostel website origin, or opt in with APP__CORS_ALLOW_ANY_ORIGIN=true",
            );
        }
        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            fail(
                "jwt_secret",
                "jwt_secret_default_dev",
                "The development session secret cannot be used outside development; set APP__JWT_SECRET",
            );
        }
        if !(-720..=840).contains(&self.hostel_timezone_offset_minutes) {
            fail(
                "hostel_timezone_offset_minutes",
                "hostel_timezone_offset_minutes",
                "Offset must be between -720 and 840 minutes",
            );
        }
        if let Some(reason) = self.cron_secret.as_deref().and_then(|s| weak_secret_reason(s, 16)) {
            fail("cron_secret", "cron_secret", reason);
        }

        if self.is_production() {
            if self.admin_password_hash.is_none() {
                fail(
                    "admin_password_hash",
                    "admin_password_hash_required",
                    "Set APP__ADMIN_PASSWORD_HASH to an argon2 hash in production",
                );
            }
            if self.stripe_secret_key.is_some() && self.stripe_webhook_secret.is_none() {
                fail(
                    "stripe_webhook_secret",
                    "stripe_webhook_secret_required",
                    "Payments are never confirmed without APP__STRIPE_WEBHOOK_SECRET",
                );
            }
            if !self.public_base_url.starts_with("https://") {
                fail(
                    "public_base_url",
                    "public_base_url_https",
                    "Check-in links must use https in production",
                );
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_admin_session_secs() -> i64 {
    86_400
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_hostel_id() -> Uuid {
    Uuid::parse_str(DEFAULT_HOSTEL_ID).unwrap_or_default()
}

fn default_hostel_name() -> String {
    "Mandioca Hostel".to_string()
}

fn default_hostel_email() -> String {
    "info@mandiocahostel.com".to_string()
}

fn default_hostel_timezone_offset_minutes() -> i32 {
    -180
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_max_stay_nights() -> i64 {
    30
}

fn default_stripe_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_webhook_tolerance_secs() -> u64 {
    300
}

fn default_resend_api_base() -> String {
    "https://api.resend.com".to_string()
}

fn default_email_from() -> String {
    "Mandioca Hostel <bookings@mandiocahostel.com>".to_string()
}

fn default_documents_bucket() -> String {
    "guest-documents".to_string()
}

fn default_posthog_host() -> String {
    "https://us.i.posthog.com".to_string()
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_login_max_attempts() -> u32 {
    5
}

fn default_login_lockout_secs() -> u64 {
    900
}

fn default_login_throttle_backend() -> String {
    "in-memory".to_string()
}

fn default_invitation_ttl_days() -> i64 {
    7
}

fn default_http_client_timeout_secs() -> u64 {
    15
}

fn validate_login_throttle_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "in-memory" | "redis" => Ok(()),
        _ => {
            let mut err = ValidationError::new("login_throttle_backend");
            err.message = Some("Must be one of: in-memory, redis".into());
            Err(err)
        }
    }
}

fn validate_base_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        _ => {
            let mut err = ValidationError::new("public_base_url");
            err.message = Some("Must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("log_level");
            err.message = Some("Must be one of: trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

/// Why a shared secret is too guessable, if it is.
fn weak_secret_reason(secret: &str, min_len: usize) -> Option<&'static str> {
    let trimmed = secret.trim();
    if trimmed.len() < min_len {
        return Some("Secret is too short");
    }
    let lower = trimmed.to_ascii_lowercase();
    if ["changeme", "password", "12345678", "secret123"]
        .iter()
        .any(|fragment| lower.contains(fragment))
    {
        return Some("Secret contains a guessable word");
    }
    let distinct: std::collections::HashSet<char> = trimmed.chars().collect();
    if distinct.len() < 10 {
        return Some("Secret needs at least 10 distinct characters");
    }
    None
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    match weak_secret_reason(secret, 64) {
        None => Ok(()),
        Some(reason) => {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some(format!("{} (session secrets need 64+ characters)", reason).into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("hostel_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Loads configuration from an explicit directory and profile name
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    let config = Config::builder()
        .set_default("database_url", "sqlite://hostel.db")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("hostel_id", DEFAULT_HOSTEL_ID)?
        .add_source(
            File::with_name(&config_dir.join("default").to_string_lossy()).required(false),
        )
        .add_source(File::with_name(&config_dir.join(run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // The development secret is only offered when running the development profile
    let config = if config.get_string("jwt_secret").is_err() {
        if run_env != DEFAULT_ENV {
            error!("Session secret is not configured. Set APP__JWT_SECRET (minimum 64 characters).");
            return Err(AppConfigError::Load(ConfigError::NotFound(
                "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                    .into(),
            )));
        }
        Config::builder()
            .add_source(config)
            .set_override("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
            .build()?
    } else {
        config
    };

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod cors_validation_tests {
    use super::*;

    fn base_config() -> AppConfig {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".into(),
            "a9f3k2m8q1w7e4r6t0y5u3i8o2p9l4k7j1h6g3f8d5s2a0z9x4c7v1b6n3m8q2w5".into(),
            "production".into(),
        );
        cfg.admin_password_hash = Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into());
        cfg.public_base_url = "https://mandiocahostel.com".into();
        cfg
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_allows_override_flag() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn non_dev_with_origins_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://mandiocahostel.com".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn production_requires_admin_password_hash() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.admin_password_hash = None;
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("admin_password_hash"));
    }

    #[test]
    fn production_needs_webhook_secret_alongside_stripe_key() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.stripe_secret_key = Some("sk_live_x".into());
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("stripe_webhook_secret"));

        cfg.stripe_webhook_secret = Some("whsec_live".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn production_links_must_be_https() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.public_base_url = "http://mandiocahostel.com".into();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("public_base_url"));
    }

    #[test]
    fn guessable_cron_secret_is_rejected() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.cron_secret = Some("password-for-cron".into());
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("cron_secret"));

        cfg.cron_secret = Some("k3v9Qm2xT7pL4wZ8".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn development_secret_passes_strength_rules() {
        assert!(validate_jwt_secret(DEV_DEFAULT_JWT_SECRET).is_ok());
        assert!(validate_jwt_secret(&"ab".repeat(40)).is_err());
    }

    #[test]
    fn checkin_link_trims_trailing_slash() {
        let mut cfg = base_config();
        cfg.public_base_url = "https://mandiocahostel.com/".into();
        assert_eq!(
            cfg.checkin_link("abc123def456"),
            "https://mandiocahostel.com/checkin/abc123def456"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File as FsFile;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, filename: &str, content: &str) {
        let mut file = FsFile::create(dir.path().join(filename)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn loads_defaults_and_profile_overrides() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                database_url = "postgres://localhost/hostel"
                jwt_secret = "Zq8vN3xK7pL2mR9tW4yB6cF1hJ5gD0sA8eU3iO7kQ2nV6zX9wT4rY1pM5bH8jG3f"
                public_base_url = "https://mandiocahostel.com"
            "#,
        );
        write_config(
            &dir,
            "staging.toml",
            r#"
                port = 9090
                cors_allowed_origins = "https://staging.mandiocahostel.com"
            "#,
        );

        let config = load_config_from(dir.path(), "staging").unwrap();

        assert_eq!(config.database_url, "postgres://localhost/hostel");
        assert_eq!(config.port, 9090);
        assert_eq!(config.environment, "staging");
        assert_eq!(config.stripe_webhook_tolerance_secs, 300);
        assert_eq!(config.login_max_attempts, 5);
        assert_eq!(config.hostel_timezone_offset_minutes, -180);
    }

    #[test]
    fn development_profile_falls_back_to_dev_secret() {
        let dir = TempDir::new().unwrap();
        let config = load_config_from(dir.path(), "development").unwrap();
        assert_eq!(config.jwt_secret, DEV_DEFAULT_JWT_SECRET);
        assert!(config.is_development());
    }

    #[test]
    fn non_development_profile_requires_secret() {
        let dir = TempDir::new().unwrap();
        let result = load_config_from(dir.path(), "staging");
        assert!(matches!(result, Err(AppConfigError::Load(_))));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                jwt_secret = "short"
                log_level = "loud"
                login_throttle_backend = "memcached"
                public_base_url = "not a url"
            "#,
        );

        let result = load_config_from(dir.path(), "development");
        match result {
            Err(AppConfigError::Validation(errors)) => {
                let fields = errors.field_errors();
                assert!(fields.contains_key("jwt_secret"));
                assert!(fields.contains_key("log_level"));
                assert!(fields.contains_key("login_throttle_backend"));
                assert!(fields.contains_key("public_base_url"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
