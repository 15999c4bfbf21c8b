#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bsp_master_coordinator::domain::barrier::retry_policy::RetryPolicy;
use bsp_master_coordinator::domain::ingestion::codec::ResultCodec;
use bsp_master_coordinator::domain::ingestion::protocol::Envelope;
use bsp_master_coordinator::domain::master::master_config::MasterConfig;
use bsp_master_coordinator::domain::results::iteration_result_set::WorkerResultRecord;
use bsp_master_coordinator::domain::results::result_serializer::{BincodeSerializer, ResultSerializer};
use bsp_master_coordinator::domain::utils::id::WorkerId;
use futures::SinkExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;

/// Master settings suited for tests: loopback, any free port, fast polling.
pub fn test_config() -> MasterConfig {
    let mut config = MasterConfig::default();
    config.server.bind_host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.threads = 2;
    config.advertised_host = "127.0.0.1".to_string();
    config.retry = RetryPolicy::FixedDelay(Duration::from_millis(10));
    config.min_workers_timeout = Duration::from_millis(500);
    config
}

pub fn serializer<T: Serialize + DeserializeOwned + 'static>() -> Arc<dyn ResultSerializer<T>> {
    Arc::new(BincodeSerializer::<T>::new())
}

pub fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Opens a framed connection to the ingestion server, the way a worker does.
pub async fn connect(port: u16) -> FramedWrite<TcpStream, ResultCodec> {
    let stream = TcpStream::connect(loopback(port)).await.expect("connect to result server");
    FramedWrite::new(stream, ResultCodec::new())
}

/// Sends one envelope over a fresh connection and closes it.
pub async fn send_envelope(port: u16, envelope: Envelope) {
    let mut sink = connect(port).await;
    sink.send(envelope).await.expect("send envelope");
    sink.close().await.expect("close connection");
}

pub async fn submit<T: Serialize>(port: u16, worker: &str, iteration: u32, value: &T) {
    let record = WorkerResultRecord::new(WorkerId::new(worker), iteration, bincode::serialize(value).expect("encode payload"));
    send_envelope(port, Envelope::worker_result(record)).await;
}

pub async fn submit_stop(port: u16, worker: &str, iteration: u32) {
    send_envelope(port, Envelope::worker_result(WorkerResultRecord::stop(WorkerId::new(worker), iteration))).await;
}

/// Polls `condition` every few milliseconds; returns whether it held before `timeout`.
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
