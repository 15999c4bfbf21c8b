use std::net::SocketAddr;
use std::sync::Arc;

use bsp_master_coordinator::domain::coordination::memory_store::InMemoryCoordinationStore;
use bsp_master_coordinator::domain::ingestion::codec::ResultCodec;
use bsp_master_coordinator::domain::ingestion::protocol::Envelope;
use bsp_master_coordinator::domain::master::master_context::MasterContext;
use bsp_master_coordinator::domain::master::master_coordinator::MasterCoordinator;
use bsp_master_coordinator::domain::results::iteration_result_set::WorkerResultRecord;
use bsp_master_coordinator::domain::results::result_serializer::{BincodeSerializer, ResultSerializer};
use bsp_master_coordinator::domain::utils::id::{ApplicationId, WorkerId};
use bsp_master_coordinator::error::{Error, Result};
use bsp_master_coordinator::{load_master_config, logger};
use clap::Parser;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;

/// Runs a BSP master against simulated workers that report over TCP.
#[derive(Parser, Debug)]
#[command(name = "bsp-master", version, about)]
struct Args {
    /// JSON master configuration. Built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,

    /// Application id; a random one is generated when omitted.
    #[arg(long)]
    app_id: Option<String>,

    #[arg(long, default_value_t = 3)]
    workers: usize,

    #[arg(long, default_value_t = 5)]
    iterations: u32,

    /// Overrides the configured server port (0 picks any free port).
    #[arg(long)]
    port: Option<u16>,
}

/// Worker results are partial sums, the master result is their total.
type PartialSum = u64;
type Total = u64;

#[tokio::main]
async fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let mut config = load_master_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let app_id = ApplicationId::new(args.app_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
    let store = Arc::new(InMemoryCoordinationStore::new());
    let master_serializer: Arc<dyn ResultSerializer<Total>> = Arc::new(BincodeSerializer::<Total>::new());
    let worker_serializer: Arc<dyn ResultSerializer<PartialSum>> = Arc::new(BincodeSerializer::<PartialSum>::new());

    let mut context: MasterContext<Total, PartialSum> = MasterContext::new(app_id.clone(), args.workers, args.iterations, &config, "u64");
    let mut master = MasterCoordinator::new(config, store, master_serializer, worker_serializer.clone());

    master.pre_application(&mut context).await?;
    let port = master.server_addr().map(|addr| addr.port()).ok_or_else(|| Error::Protocol("result server did not start".to_string()))?;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Application {} started with {} workers for {} iterations.", app_id, args.workers, args.iterations);

    while !context.is_finished() {
        let iteration = context.advance();
        submit_partial_sums(addr, args.workers, iteration, worker_serializer.as_ref()).await?;

        master.pre_iteration(&mut context).await?;

        let mut total: Total = 0;
        if let Some(results) = context.worker_results.as_mut() {
            for partial in results.by_ref() {
                total += partial?;
            }
        }
        log::info!("Iteration {}: total {}.", iteration, total);
        context.master_result = Some(total);

        master.post_iteration(&mut context).await?;
    }

    submit_stop_messages(addr, args.workers, context.current_iteration).await?;
    master.post_application(&mut context).await?;

    log::info!("Application {} finished after {} iterations.", app_id, context.current_iteration);
    Ok(())
}

async fn send(addr: SocketAddr, record: WorkerResultRecord) -> Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let mut sink = FramedWrite::new(stream, ResultCodec::new());
    sink.send(Envelope::worker_result(record)).await?;
    sink.close().await?;
    Ok(())
}

async fn submit_partial_sums(addr: SocketAddr, workers: usize, iteration: u32, serializer: &dyn ResultSerializer<PartialSum>) -> Result<()> {
    for worker in 0..workers {
        let partial = (worker as u64 + 1) * iteration as u64;
        let record = WorkerResultRecord::new(WorkerId::new(format!("worker-{}", worker)), iteration, serializer.object_to_bytes(&partial)?);
        send(addr, record).await?;
    }
    Ok(())
}

async fn submit_stop_messages(addr: SocketAddr, workers: usize, iteration: u32) -> Result<()> {
    for worker in 0..workers {
        send(addr, WorkerResultRecord::stop(WorkerId::new(format!("worker-{}", worker)), iteration)).await?;
    }
    Ok(())
}
