pub mod server;
pub mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::trace::TraceLayer;

use formgate_endpoint::Forwarder;
pub use server::{build_router, AppState};
use store::{FormStore, ResultStore};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub forms_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl ServerConfig {
    pub fn default_data_dir() -> PathBuf {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        cwd.join(".formgate")
    }

    pub fn default_forms_dir() -> PathBuf {
        Self::default_data_dir().join("forms")
    }
}

pub async fn run(config: ServerConfig) -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let forms = FormStore::new(config.forms_dir.clone())
        .await
        .context("failed to init form store")?;
    let results = ResultStore::new(config.data_dir.clone())
        .await
        .context("failed to init result store")?;

    let state = AppState {
        forms: Arc::new(forms),
        results: Arc::new(results),
        forwarder: Arc::new(Forwarder::new()),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!("formgate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind port")?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
