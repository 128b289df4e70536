//! Server lifecycle management
//!
//! Binds the routes, runs the server on a tokio task and stops it gracefully.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::http::{create_routes, ServiceContext};
use super::staging::StagingArea;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {cause}")]
    Bind { addr: SocketAddr, cause: String },
}

/// Handle to a running server, used to stop it
pub struct ServerHandle {
    /// Channel to signal server shutdown
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    /// The address the server is listening on
    pub addr: SocketAddr,
}

impl ServerHandle {
    /// Stop the server gracefully
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            log::info!("[Server] Shutdown signal sent for {}", self.addr);
        }
    }

    /// Wait for the server task to finish (after [`stop`](Self::stop))
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("[Server] Server task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start serving on `addr`. Port 0 picks a free port; the bound address is
/// on the returned handle.
pub fn start<T: ServiceContext + 'static>(
    addr: SocketAddr,
    ctx: Arc<T>,
    staging: Arc<StagingArea>,
) -> Result<ServerHandle, ServerError> {
    let routes = create_routes(ctx, staging);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            shutdown_rx.await.ok();
            log::info!("[Server] Received shutdown signal");
        })
        .map_err(|e| ServerError::Bind {
            addr,
            cause: e.to_string(),
        })?;

    let task = tokio::spawn(async move {
        server.await;
        log::info!("[Server] Server task completed");
    });

    log::info!("[Server] Server STARTED on http://{}", bound);

    Ok(ServerHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
        addr: bound,
    })
}
