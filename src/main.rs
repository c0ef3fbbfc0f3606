use anyhow::Context;
use chat2upstream::config::Config;
use chat2upstream::server::build_router;
use chat2upstream::util::{init_tracing, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        upstream = %config.upstream_base_url,
        models = ?config.models,
        auth = config.upstream_api_key.is_some(),
        "Configuration loaded"
    );

    let addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));
    let router = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("chat2upstream listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
