//! stemdeck-web: browser surface for the stemdeck pipeline

pub mod jobs;
pub mod routes;
pub mod session;
pub mod views;

use crate::jobs::JobRunner;
use crate::routes::AppState;
use crate::session::Session;
use std::sync::Arc;
use stemdeck_core::catalog::Catalog;
use stemdeck_core::Config;
use tokio::sync::RwLock;
use tracing::info;

/// Run the web UI until the process is stopped.
pub async fn serve(config: Config, bind: &str, port: u16) -> anyhow::Result<()> {
    let catalog = Catalog::new(config.separated_root());
    tokio::fs::create_dir_all(config.staging_dir()).await?;
    tokio::fs::create_dir_all(catalog.root()).await?;

    let session = Arc::new(RwLock::new(Session::new()));
    let jobs = Arc::new(JobRunner::new(config, Arc::clone(&session)));
    let app = routes::router(AppState {
        catalog,
        session,
        jobs,
    });

    let addr = format!("{bind}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("stemdeck listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
