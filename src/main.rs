use atlas_proxy::{
    analysis_service::AtlasAnalyzer,
    api::{self, AppState},
    config::AppConfig,
    fred::FredClient,
    recommendations::RecommendationTable,
    utils,
};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() {
    if let Err(e) = utils::init_logger() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let app_config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Set a global span with node_name for all subsequent logs
    let _span = tracing::info_span!("node", name = %app_config.node_name).entered();

    tracing::info!("Starting atlas-proxy");
    tracing::info!(environment = %app_config.environment, port = app_config.port, "Loaded configuration");

    if let Err(e) = serve(app_config).await {
        tracing::error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn serve(app_config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let fred_client = FredClient::new(
        app_config.fred_api_key.clone(),
        app_config.fred_base_url.clone(),
        app_config.request_timeout,
    )?;
    tracing::info!(base_url = fred_client.base_url(), timeout = ?app_config.request_timeout, "FRED client initialized");

    let recommendations = Arc::new(RecommendationTable::new());
    let analyzer = AtlasAnalyzer::new(Arc::new(fred_client), recommendations)
        .with_series_overrides(app_config.series.clone());
    let app_state = AppState::new(Arc::new(analyzer));

    let app = api::with_rate_limit(api::build_router(app_state), &app_config.rate_limit)
        .ok_or("rate limit replenish_secs and burst must be non-zero")?
        .layer(api::cors_layer(&app_config.cors_allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    tracing::info!(%addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
