use serde::{Deserialize, Serialize};

/// On-disk shape of the master configuration. Every field is optional; missing ones take the
/// defaults listed on [`crate::domain::master::master_config::MasterConfig`].
#[derive(Debug, Default, Deserialize, Clone, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MasterConfigDto {
    pub server_port: Option<u16>,
    pub server_threads: Option<usize>,
    pub advertised_host: Option<String>,
    pub max_frame_length: Option<usize>,
    pub fixed_sleep: Option<bool>,
    pub sleep_time_ms: Option<u64>,
    pub max_sleep_time_ms: Option<u64>,
    pub min_workers_ratio: Option<f64>,
    pub min_workers_timeout_ms: Option<u64>,
    pub cleanup_enabled: Option<bool>,
    pub split_threshold_bytes: Option<usize>,
    pub progress_log_interval_ms: Option<u64>,
}
