use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::config::{ASSIGN_IDS_ENV, REST_ADDR_ENV};
use api_rest::{AppState, ServiceConfig};

/// Main entry point for the HMS FHIR service
///
/// Starts the REST facade over the Condition mapper on the configured address.
///
/// # Environment Variables
/// - `HMS_FHIR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `HMS_FHIR_ASSIGN_IDS`: assign UUIDs to created Conditions (default: true)
///
/// A `.env` file in the working directory is loaded first when present.
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hms_fhir_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_env_values(
        std::env::var(REST_ADDR_ENV).ok(),
        std::env::var(ASSIGN_IDS_ENV).ok(),
    )?;
    let addr = cfg.rest_addr();

    tracing::info!("++ Starting HMS FHIR REST on {}", addr);
    if !cfg.assign_resource_ids() {
        tracing::info!("Resource id assignment disabled");
    }

    let app = api_rest::router(AppState::new(cfg));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
