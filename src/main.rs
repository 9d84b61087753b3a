use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use fyl_core::{ContactService, CoreConfig, RateLimiter, SystemClock};
use fyl_email::{Mailer, ResendMailer, UnconfiguredMailer};

/// Main entry point for the practice website backend
///
/// Resolves configuration once, starts the rate limiter's expiry sweep and serves the REST API
/// until Ctrl-C is received. The sweep is stopped before the process exits.
///
/// # Environment Variables
/// - `FYL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FYL_ENV`: `development` or `production` (default: "development")
/// - `BASE_URL`: canonical site URL used for origin checks and links
/// - `CONTACT_EMAIL`: practice inbox for appointment requests (required)
/// - `RESEND_API_KEY`: outbound email API key (optional; sends fail without it)
///
/// # Returns
/// * `Ok(())` - If the server starts, runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration is invalid or the listener cannot be bound
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fyl=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env()?);
    let rest_addr = std::env::var("FYL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!(
        "++ Starting practice site API on {} ({} mode)",
        rest_addr,
        cfg.mode()
    );

    let mailer: Arc<dyn Mailer> = match std::env::var("RESEND_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let api_url = std::env::var("RESEND_API_URL").ok();
            Arc::new(ResendMailer::new(key.trim(), api_url)?)
        }
        _ => {
            tracing::warn!("RESEND_API_KEY not set; appointment emails will fail to send");
            Arc::new(UnconfiguredMailer)
        }
    };

    let limiter = RateLimiter::new(cfg.rate_limit().clone(), Arc::new(SystemClock));
    limiter.start();

    let service = ContactService::new(
        cfg.clone(),
        Arc::new(limiter.clone()),
        mailer,
        Arc::new(SystemClock),
    );
    let app = api_rest::router(AppState::new(cfg, service));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    limiter.stop();
    tracing::info!("-- Practice site API stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        // Keep serving; the process can still be stopped externally.
        std::future::pending::<()>().await;
    }
}
