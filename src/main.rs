use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::{signal, sync::mpsc};
use tracing::{error, info, warn};

use hostel_api as api;

const THROTTLE_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);
    let cfg = Arc::new(cfg);

    // Init DB
    let db_pool = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db_arc = Arc::new(db_pool);

    // Outbound integrations
    let providers = api::handlers::Providers::from_config(&cfg);

    // Init events
    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    let event_sender = Arc::new(api::events::EventSender::new(event_tx));
    tokio::spawn(api::events::process_events(
        event_rx,
        providers.analytics.clone(),
    ));

    // Admin login throttle
    let login_throttle = api::rate_limiter::LoginThrottle::from_app_config(&cfg)
        .context("invalid login throttle configuration")?;
    tokio::spawn(api::rate_limiter::start_cleanup_task(
        login_throttle.clone(),
        THROTTLE_CLEANUP_INTERVAL,
    ));

    // Compose shared app state
    let app_state = api::AppState::new(
        db_arc.clone(),
        cfg.clone(),
        event_sender,
        &providers,
        login_throttle,
    );

    if cfg.reminder_interval_secs > 0 {
        tokio::spawn(api::services::reminders::run_reminder_scheduler(
            (*app_state.services.reminders).clone(),
            Duration::from_secs(cfg.reminder_interval_secs),
        ));
    } else {
        info!("In-process reminder scheduler disabled; use GET /api/v1/cron/reminders");
    }

    let health_state = Arc::new(api::health::HealthState::new(db_arc.clone(), cfg.clone()));
    health_state.update_health().await;
    tokio::spawn(api::health::run_health_checker(health_state.clone()));

    if cfg.stripe_secret_key.is_some() && cfg.stripe_webhook_secret.is_none() {
        warn!("Stripe is configured without APP__STRIPE_WEBHOOK_SECRET; payments will never be confirmed");
    }

    let app = api::app_router(app_state, health_state)
        .layer(api::middleware_helpers::cors_layer(&cfg));

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;
    info!("hostel-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("hostel-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
