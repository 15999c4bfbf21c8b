use std::net::SocketAddr;
use std::sync::Arc;

use crate::domain::barrier::barrier_coordinator::{BarrierCoordinator, BarrierOutcome};
use crate::domain::coordination::coordination_store::{CoordinationStore, CreateMode};
use crate::domain::coordination::znode_paths::{GUAGUA_INIT_STEP, app_node, master_base_node, master_node};
use crate::domain::ingestion::result_server::ResultIngestionServer;
use crate::domain::master::fail_over::last_persisted_iteration;
use crate::domain::master::master_config::MasterConfig;
use crate::domain::master::master_context::MasterContext;
use crate::domain::master::master_result_store::MasterResultStore;
use crate::domain::results::iteration_result_set::IterationResultSet;
use crate::domain::results::result_serializer::ResultSerializer;
use crate::domain::utils::id::ApplicationId;
use crate::domain::utils::log_throttle::LogThrottle;
use crate::error::{Error, Result, StoreError};

/// Master side of a BSP job.
///
/// Workers push their per-iteration results to the ingestion server; the coordinator waits at
/// the barrier until enough of them arrived, hands them to the compute step and persists the
/// master result into the coordination store so that a restarted master can resume. The host
/// loop drives it as
/// `pre_application -> (pre_iteration -> compute -> post_iteration)* -> post_application`.
pub struct MasterCoordinator<M, W> {
    config: MasterConfig,
    store: Arc<dyn CoordinationStore>,
    master_results: MasterResultStore,
    results: IterationResultSet,
    server: Option<ResultIngestionServer>,
    barrier: BarrierCoordinator,
    master_serializer: Arc<dyn ResultSerializer<M>>,
    worker_serializer: Arc<dyn ResultSerializer<W>>,
    current_iteration: u32,
}

impl<M, W> MasterCoordinator<M, W> {
    pub fn new(
        config: MasterConfig,
        store: Arc<dyn CoordinationStore>,
        master_serializer: Arc<dyn ResultSerializer<M>>,
        worker_serializer: Arc<dyn ResultSerializer<W>>,
    ) -> Self {
        let master_results = MasterResultStore::new(store.clone(), config.split_threshold, LogThrottle::new(config.progress_log_interval));
        let barrier = BarrierCoordinator::new(config.retry, config.progress_log_interval);

        MasterCoordinator {
            config,
            store,
            master_results,
            results: IterationResultSet::new(),
            server: None,
            barrier,
            master_serializer,
            worker_serializer,
            current_iteration: GUAGUA_INIT_STEP,
        }
    }

    /// Results received so far for the iteration in flight.
    pub fn results(&self) -> &IterationResultSet {
        &self.results
    }

    pub fn server_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|server| server.local_addr())
    }

    pub fn current_iteration(&self) -> u32 {
        self.current_iteration
    }

    /// Fail-over check, server start and publication of the master address.
    pub async fn pre_application(&mut self, context: &mut MasterContext<M, W>) -> Result<()> {
        let last = last_persisted_iteration(self.store.as_ref(), &context.app_id).await?;
        context.resume_at(last);

        let port = match &self.server {
            Some(server) => server.port(),
            None => {
                let server = ResultIngestionServer::start(&self.config.server, self.results.clone()).await?;
                let port = server.port();
                self.server = Some(server);
                port
            }
        };

        self.init_master_znode(&context.app_id, port).await?;

        self.current_iteration = context.current_iteration;

        if !context.is_init_iteration() {
            // Resumed master: results of the interrupted iteration may already be arriving.
            return Ok(());
        }

        self.results.clear();
        log::info!("Master of application {} initialized for {} workers.", context.app_id, context.workers);
        Ok(())
    }

    /// Creates `/A`, `/A/master` and `/A/master/0` holding `host:port` of the ingestion server.
    async fn init_master_znode(&self, app_id: &ApplicationId, port: u16) -> Result<()> {
        let address = format!("{}:{}", self.config.advertised_host, port);

        self.store.create_node(&app_node(app_id), None, CreateMode::Persistent, false).await?;
        self.store.create_node(&master_base_node(app_id), None, CreateMode::Persistent, false).await?;

        let init_node = master_node(app_id, GUAGUA_INIT_STEP);
        match self.store.create_node(&init_node, Some(address.as_bytes()), CreateMode::Persistent, true).await {
            Ok(()) => log::info!("Published master address {} at {}.", address, init_node),
            Err(StoreError::NodeExists(_)) => log::warn!("Node exists: {}", init_node),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Waits until the quorum of workers reported, then exposes their results on the context.
    pub async fn pre_iteration(&mut self, context: &mut MasterContext<M, W>) -> Result<BarrierOutcome> {
        self.current_iteration = context.current_iteration;

        let results = self.results.clone();
        let step = format!("iteration {}", context.current_iteration);
        let outcome = self.barrier.wait_for(&step, &context.quorum(), || results.size()).await;

        context.worker_results = Some(self.results.to_sequence(self.worker_serializer.clone(), context.worker_result_type_name.clone()));

        log::info!(
            "Application {} iteration {} waiting ends with {}ms execution time, {} of {} workers reported.",
            context.app_id,
            context.current_iteration,
            outcome.elapsed.as_millis(),
            outcome.done_workers,
            context.workers
        );
        Ok(outcome)
    }

    /// Persists the master result, retires stale znodes and resets the result set.
    pub async fn post_iteration(&mut self, context: &mut MasterContext<M, W>) -> Result<()> {
        let iteration = context.current_iteration;
        let master_result = context.master_result.as_ref().ok_or(Error::MissingMasterResult(iteration))?;
        let bytes = self.master_serializer.object_to_bytes(master_result)?;

        match self.master_results.publish(&context.app_id, iteration, &bytes).await {
            Ok(split) => log::info!("Master result of iteration {} written ({} bytes, split: {}).", iteration, bytes.len(), split),
            Err(StoreError::NodeExists(node)) => log::warn!("Has such node: {}", node),
            Err(e) => return Err(e.into()),
        }

        if let Some(retired) = self.master_results.retire_stale(&context.app_id, iteration).await? {
            log::debug!("Retired master znodes of iteration {}.", retired);
        }

        self.results.clear();
        Ok(())
    }

    /// Drains worker unregistrations and cleans the application znodes when enabled, then
    /// releases the server, the store session and the result set.
    ///
    /// Every release is attempted even if an earlier step failed; the first failure is returned.
    pub async fn post_application(&mut self, context: &mut MasterContext<M, W>) -> Result<()> {
        self.current_iteration = context.current_iteration;

        let cleanup = if self.config.cleanup_enabled { self.unregister_and_clean(context).await } else { Ok(()) };

        if let Some(mut server) = self.server.take() {
            server.stop().await;
        }

        let closed = self.store.close().await.map_err(Error::from);
        if let Err(e) = &closed {
            log::error!("Failed to close coordination store: {}", e);
        }

        self.results.clear();

        cleanup.and(closed)
    }

    async fn unregister_and_clean(&self, context: &MasterContext<M, W>) -> Result<()> {
        let results = self.results.clone();
        let outcome = self.barrier.wait_for("unregister step", &context.quorum(), || results.size()).await;
        log::info!("{} of {} workers unregistered.", outcome.done_workers, context.workers);

        let app = app_node(&context.app_id);
        match self.store.delete_node(&app, true).await {
            Ok(()) => log::info!("Deleted application znode {}.", app),
            Err(StoreError::NoNode(_)) => log::warn!("No such node: {}", app),
            Err(e) => {
                log::error!("Failed to delete application znode {}: {}", app, e);
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Decodes the persisted master result of `iteration`, e.g. to restore master state after
    /// fail-over.
    pub async fn read_master_result(&self, app_id: &ApplicationId, iteration: u32) -> Result<Option<M>> {
        match self.master_results.fetch(app_id, iteration).await? {
            Some(bytes) => Ok(Some(self.master_serializer.bytes_to_object(&bytes, "")?)),
            None => Ok(None),
        }
    }
}
