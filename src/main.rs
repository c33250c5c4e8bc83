use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use rxfw_core::{CoreConfig, PrescriptionFirewall};

/// Main entry point for the prescription firewall service
///
/// Loads reference data once, then serves the REST API (with Swagger UI) until Ctrl-C.
///
/// # Environment Variables
/// - `RXFW_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `RXFW_PRESCRIBERS_FILE`: prescriber reference file (default: "data/prescribers.yaml")
/// - `RXFW_PATIENTS_FILE`: patient reference file (default: "data/patients.yaml")
/// - `API_KEY`: key required by `POST /admin/reload`; reload is refused when unset
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configured reference file path is empty,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rxfw=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("RXFW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let cfg = Arc::new(CoreConfig::from_env_values(
        std::env::var("RXFW_PRESCRIBERS_FILE").ok(),
        std::env::var("RXFW_PATIENTS_FILE").ok(),
    )?);
    let api_key = std::env::var("API_KEY").ok();
    if api_key.as_deref().is_none_or(str::is_empty) {
        tracing::warn!("API_KEY is not set; POST /admin/reload will be refused");
    }

    let firewall = Arc::new(PrescriptionFirewall::new(cfg));
    let stats = firewall.statistics();
    tracing::info!(
        "++ Reference data: {} prescribers, {} patients",
        stats.total_prescribers,
        stats.total_patients
    );

    let app = router(AppState::new(firewall, api_key));

    tracing::info!("++ Starting prescription firewall REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Prescription firewall stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
