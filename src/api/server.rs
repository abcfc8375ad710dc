use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::error::Result;

/// Serve the API until `shutdown` flips to true
pub async fn start_api_server(
    state: AppState,
    host: String,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(state);

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    info!("API server stopped");
    Ok(())
}
