use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::domain::ingestion::codec::DEFAULT_MAX_FRAME_LENGTH;
use crate::domain::ingestion::port::bind_available_port;
use crate::domain::ingestion::session::ResultSession;
use crate::domain::results::iteration_result_set::IterationResultSet;
use crate::domain::utils::log_throttle::LogThrottle;
use crate::error::{Error, Result};

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);
const ACCEPT_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Listener settings for the [`ResultIngestionServer`].
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub bind_host: String,
    /// Preferred port; the next free one is used when it is taken.
    pub port: u16,
    /// Thread budget; at most `2 * threads` frames are applied concurrently. Open connections
    /// are not capped.
    pub threads: usize,
    pub max_frame_length: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { bind_host: "0.0.0.0".to_string(), port: 0, threads: 8, max_frame_length: DEFAULT_MAX_FRAME_LENGTH }
    }
}

/// TCP endpoint receiving worker results into the shared [`IterationResultSet`].
pub struct ResultIngestionServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    accept_task: Option<JoinHandle<()>>,
}

impl ResultIngestionServer {
    /// Binds and starts accepting on the current tokio runtime.
    pub async fn start(options: &ServerOptions, results: IterationResultSet) -> Result<Self> {
        if options.threads == 0 {
            return Err(Error::Config("ingestion server needs at least one thread".to_string()));
        }

        let listener = bind_available_port(&options.bind_host, options.port).await?;
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let permits = Arc::new(Semaphore::new(options.threads * 2));

        let accept_task = tokio::spawn(Self::accept_loop(listener, results, permits, options.max_frame_length, shutdown.clone()));

        log::info!("Result ingestion server listening on {}.", local_addr);
        Ok(Self { local_addr, shutdown, accept_task: Some(accept_task) })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub fn is_running(&self) -> bool {
        self.accept_task.is_some()
    }

    /// Stops accepting, closes every open connection and waits until all of them are gone.
    /// Stopping a stopped server does nothing.
    pub async fn stop(&mut self) {
        let Some(accept_task) = self.accept_task.take() else {
            return;
        };

        self.shutdown.cancel();
        if let Err(e) = accept_task.await {
            log::error!("Result ingestion server accept task ended abnormally: {}", e);
        }
        log::info!("Result ingestion server on {} stopped.", self.local_addr);
    }

    async fn accept_loop(listener: TcpListener, results: IterationResultSet, permits: Arc<Semaphore>, max_frame_length: usize, shutdown: CancellationToken) {
        let mut connections = JoinSet::new();
        let accept_errors = LogThrottle::new(ACCEPT_ERROR_LOG_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("Accepted worker connection from {}.", peer);
                        let session = ResultSession::new(results.clone(), permits.clone(), Some(peer));
                        connections.spawn(session.run(stream, max_frame_length, shutdown.clone()));
                    }
                    Err(e) => {
                        // Usually EMFILE; back off before the next accept.
                        if accept_errors.ready() {
                            log::error!("Failed to accept worker connection: {}", e);
                        }
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = sleep(ACCEPT_RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }

        drop(listener);
        while connections.join_next().await.is_some() {}
    }
}

impl Drop for ResultIngestionServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
