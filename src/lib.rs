use crate::domain::master::master_config::MasterConfig;
use crate::error::Result;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;

/// Loads the master configuration from `file_path`, or the built-in defaults when no file is
/// given.
pub fn load_master_config(file_path: Option<&str>) -> Result<MasterConfig> {
    match file_path {
        Some(path) => {
            let config = MasterConfig::load(path)?;
            log::info!("Master configuration loaded from '{}'.", path);
            Ok(config)
        }
        None => {
            log::info!("No configuration file given, using defaults.");
            Ok(MasterConfig::default())
        }
    }
}
