use std::{net::SocketAddr, sync::Arc};

use ai_integration::OpenAiClient;
use server_api::ApiContext;
use storage::PoemStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::build_router;
use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let api_key = settings.require_api_key().map_err(|error| {
        error!(%error, "refusing to start without provider credentials");
        error
    })?;

    let openai = Arc::new(OpenAiClient::new(
        api_key,
        settings.openai_base_url.clone(),
        settings.completion_model.clone(),
    ));
    let api = ApiContext {
        store: PoemStore::new(),
        completion: openai.clone(),
        images: openai,
        generation: settings.generation(),
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, model = %settings.completion_model, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
