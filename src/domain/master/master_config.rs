use std::time::Duration;

use crate::api::master_config_dto::MasterConfigDto;
use crate::domain::barrier::retry_policy::RetryPolicy;
use crate::domain::ingestion::codec::DEFAULT_MAX_FRAME_LENGTH;
use crate::domain::ingestion::result_server::ServerOptions;
use crate::error::{Error, Result};
use crate::loader::parser::parse_json_file;

pub const DEFAULT_SERVER_PORT: u16 = 44323;
pub const DEFAULT_SERVER_THREADS: usize = 8;
pub const DEFAULT_SLEEP_TIME_MS: u64 = 1000;
pub const DEFAULT_MAX_SLEEP_TIME_MS: u64 = 30_000;
pub const DEFAULT_MIN_WORKERS_RATIO: f64 = 1.0;
pub const DEFAULT_MIN_WORKERS_TIMEOUT_MS: u64 = 10_000;
/// ZooKeeper rejects znodes above roughly 1 MiB.
pub const DEFAULT_SPLIT_THRESHOLD_BYTES: usize = 1024 * 1024;
pub const DEFAULT_PROGRESS_LOG_INTERVAL_MS: u64 = 5000;

/// Validated master settings.
#[derive(Debug, Clone)]
pub struct MasterConfig {
    pub server: ServerOptions,
    /// Host name published next to the server port in the init znode.
    pub advertised_host: String,
    pub retry: RetryPolicy,
    pub min_workers_ratio: f64,
    pub min_workers_timeout: Duration,
    /// Wait for all workers to unregister and delete the application znodes at the end.
    pub cleanup_enabled: bool,
    /// Master results larger than this are spread over chunk nodes.
    pub split_threshold: usize,
    pub progress_log_interval: Duration,
}

impl MasterConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(file_path: &str) -> Result<Self> {
        let dto: MasterConfigDto = parse_json_file(file_path)?;
        MasterConfig::try_from(dto)
    }

    fn default_host() -> String {
        std::env::var("HOSTNAME").ok().filter(|h| !h.trim().is_empty()).unwrap_or_else(|| "127.0.0.1".to_string())
    }
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            server: ServerOptions {
                bind_host: "0.0.0.0".to_string(),
                port: DEFAULT_SERVER_PORT,
                threads: DEFAULT_SERVER_THREADS,
                max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            },
            advertised_host: Self::default_host(),
            retry: RetryPolicy::FixedDelay(Duration::from_millis(DEFAULT_SLEEP_TIME_MS)),
            min_workers_ratio: DEFAULT_MIN_WORKERS_RATIO,
            min_workers_timeout: Duration::from_millis(DEFAULT_MIN_WORKERS_TIMEOUT_MS),
            cleanup_enabled: true,
            split_threshold: DEFAULT_SPLIT_THRESHOLD_BYTES,
            progress_log_interval: Duration::from_millis(DEFAULT_PROGRESS_LOG_INTERVAL_MS),
        }
    }
}

impl TryFrom<MasterConfigDto> for MasterConfig {
    type Error = Error;

    fn try_from(dto: MasterConfigDto) -> Result<Self> {
        let defaults = MasterConfig::default();

        let min_workers_ratio = dto.min_workers_ratio.unwrap_or(DEFAULT_MIN_WORKERS_RATIO);
        if !(0.0..=1.0).contains(&min_workers_ratio) {
            return Err(Error::Config(format!("minWorkersRatio must be within [0, 1], got {}", min_workers_ratio)));
        }

        let threads = dto.server_threads.unwrap_or(DEFAULT_SERVER_THREADS);
        if threads == 0 {
            return Err(Error::Config("serverThreads must be greater than 0".to_string()));
        }

        let split_threshold = dto.split_threshold_bytes.unwrap_or(DEFAULT_SPLIT_THRESHOLD_BYTES);
        if split_threshold == 0 {
            return Err(Error::Config("splitThresholdBytes must be greater than 0".to_string()));
        }

        let sleep_time_ms = dto.sleep_time_ms.unwrap_or(DEFAULT_SLEEP_TIME_MS);
        if sleep_time_ms == 0 {
            return Err(Error::Config("sleepTimeMs must be greater than 0".to_string()));
        }
        let max_sleep_time_ms = dto.max_sleep_time_ms.unwrap_or(DEFAULT_MAX_SLEEP_TIME_MS);

        Ok(MasterConfig {
            server: ServerOptions {
                bind_host: defaults.server.bind_host,
                port: dto.server_port.unwrap_or(DEFAULT_SERVER_PORT),
                threads,
                max_frame_length: dto.max_frame_length.unwrap_or(DEFAULT_MAX_FRAME_LENGTH),
            },
            advertised_host: dto.advertised_host.unwrap_or(defaults.advertised_host),
            retry: RetryPolicy::from_settings(
                dto.fixed_sleep.unwrap_or(true),
                Duration::from_millis(sleep_time_ms),
                Duration::from_millis(max_sleep_time_ms),
            ),
            min_workers_ratio,
            min_workers_timeout: Duration::from_millis(dto.min_workers_timeout_ms.unwrap_or(DEFAULT_MIN_WORKERS_TIMEOUT_MS)),
            cleanup_enabled: dto.cleanup_enabled.unwrap_or(true),
            split_threshold,
            progress_log_interval: Duration::from_millis(dto.progress_log_interval_ms.unwrap_or(DEFAULT_PROGRESS_LOG_INTERVAL_MS)),
        })
    }
}
