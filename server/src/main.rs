use std::sync::Arc;

use anyhow::Context;
use characters_core::UpstreamClient;
use characters_server::{
    config::AppConfig, firestore::FirestoreStore, logging, transport::ReqwestTransport, AppState,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("loading configuration")?;
    logging::init_logging(config.log_format);
    tracing::info!(
        project_id = %config.firebase.project_id,
        api_url = %config.api_url,
        "configuration loaded"
    );

    let http = reqwest::Client::new();
    let store = FirestoreStore::new(http.clone(), &config.firebase)
        .context("initialising firestore store")?;
    let state = AppState::new(
        UpstreamClient::new(&config.api_url),
        Arc::new(ReqwestTransport::new(http)),
        Arc::new(store),
    );

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "server listening");

    characters_server::run(listener, state, &config.cors_origins).await?;
    Ok(())
}
