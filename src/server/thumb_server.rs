//! Listener lifecycle for the thumbnail proxy.
//!
//! A [`ThumbServer`] owns a fully built router and binds it on demand.
//! `start` and `stop` are both idempotent: starting a running server returns
//! the address it is already bound to, stopping a stopped server does nothing.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use super::pipeline::PipelineConfig;
use super::routes::{create_router_with_tasks, RouterConfig};
use crate::error::StartupError;
use crate::fetch::ImageFetcher;
use crate::thumbnail::{ImageTransformer, ThumbnailService};

struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// HTTP server wrapping the thumbnail pipeline.
pub struct ThumbServer {
    config: PipelineConfig,
    router: Router,
    persist_tasks: TaskTracker,
    running: Mutex<Option<RunningServer>>,
}

impl ThumbServer {
    pub fn new<F, T>(
        service: ThumbnailService<F, T>,
        config: PipelineConfig,
        router_config: RouterConfig,
    ) -> Self
    where
        F: ImageFetcher + 'static,
        T: ImageTransformer,
    {
        let persist_tasks = TaskTracker::new();
        let router =
            create_router_with_tasks(service, &config, &router_config, persist_tasks.clone());
        Self {
            config,
            router,
            persist_tasks,
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The router this server serves, for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and start accepting connections.
    ///
    /// Returns the bound address. Calling this while already running
    /// returns the existing address without binding again.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Bind`] if the address cannot be bound.
    pub async fn start(&self) -> Result<SocketAddr, StartupError> {
        let mut running = self.running.lock().await;
        if let Some(server) = running.as_ref() {
            if !server.task.is_finished() {
                return Ok(server.local_addr);
            }
        }

        let addr = self.config.bind_address();
        let bind_error = |source| StartupError::Bind {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let router = self.router.clone();
        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;
            if let Err(err) = result {
                error!(error = %err, "Server error");
            }
        });

        info!(address = %local_addr, "Thumbnail server listening");
        *running = Some(RunningServer {
            local_addr,
            shutdown,
            task,
        });

        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    ///
    /// Cache writes spawned by those requests are awaited too, so every
    /// thumbnail served before `stop` returns is on disk. Does nothing if the
    /// server is not running.
    pub async fn stop(&self) {
        let Some(server) = self.running.lock().await.take() else {
            return;
        };

        let _ = server.shutdown.send(());
        if let Err(err) = server.task.await {
            warn!(error = %err, "Server task ended abnormally");
        }

        self.persist_tasks.close();
        self.persist_tasks.wait().await;
        self.persist_tasks.reopen();

        info!(address = %server.local_addr, "Thumbnail server stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|server| !server.task.is_finished())
    }

    /// Address the server is bound to, if running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running.lock().await.as_ref().map(|server| server.local_addr)
    }
}
