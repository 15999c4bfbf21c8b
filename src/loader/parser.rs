use serde::de::DeserializeOwned;
use std::fs;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// This function reads a file from `file_path`, attempts to parse it
/// as JSON, and returns an instance of `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path).map_err(Error::IoError)?;

    let parsed_data: T = serde_json::from_str(&data).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::master_config_dto::MasterConfigDto;

    #[test]
    fn missing_file_is_io_error() {
        let result = parse_json_file::<MasterConfigDto>("/nonexistent/master.json");
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn malformed_json_is_deserialization_error() {
        let path = std::env::temp_dir().join(format!("bsp-master-malformed-{}.json", std::process::id()));
        fs::write(&path, "{ \"serverPort\": ").unwrap();

        let result = parse_json_file::<MasterConfigDto>(path.to_str().unwrap());
        assert!(matches!(result, Err(Error::DeserializationError(_))));

        fs::remove_file(&path).unwrap();
    }
}
