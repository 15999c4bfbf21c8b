use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

use crate::error::{Error, Result};

/// Converts master and worker results to and from the opaque bytes that travel over the wire
/// and into the coordination store.
pub trait ResultSerializer<T>: Send + Sync {
    fn object_to_bytes(&self, result: &T) -> Result<Vec<u8>>;

    /// Decodes `bytes` into the result type registered under `type_name`.
    fn bytes_to_object(&self, bytes: &[u8], type_name: &str) -> Result<T>;
}

/// Bincode based [`ResultSerializer`] for any serde type.
///
/// `type_name` must be empty, the full Rust type path of `T`, or a `::`-separated suffix of it
/// (`"SumResult"` matches `my_job::SumResult`).
#[derive(Debug)]
pub struct BincodeSerializer<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeSerializer<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }

    fn accepts(type_name: &str) -> bool {
        let full_name = std::any::type_name::<T>();
        type_name.is_empty() || full_name == type_name || full_name.ends_with(&format!("::{}", type_name))
    }
}

impl<T> Default for BincodeSerializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultSerializer<T> for BincodeSerializer<T>
where
    T: Serialize + DeserializeOwned,
{
    fn object_to_bytes(&self, result: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(result)?)
    }

    fn bytes_to_object(&self, bytes: &[u8], type_name: &str) -> Result<T> {
        if !Self::accepts(type_name) {
            return Err(Error::TypeMismatch { requested: type_name.to_string(), decoder: std::any::type_name::<T>().to_string() });
        }
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct GradientResult {
        error: f64,
        weights: Vec<f64>,
    }

    #[test]
    fn decodes_registered_type() {
        let serializer = BincodeSerializer::<GradientResult>::new();
        let result = GradientResult { error: 0.25, weights: vec![1.0, -2.0] };

        let bytes = serializer.object_to_bytes(&result).unwrap();
        assert_eq!(serializer.bytes_to_object(&bytes, "GradientResult").unwrap(), result);
        assert_eq!(serializer.bytes_to_object(&bytes, "").unwrap(), result);
    }

    #[test]
    fn rejects_foreign_type_name() {
        let serializer = BincodeSerializer::<GradientResult>::new();
        let bytes = serializer.object_to_bytes(&GradientResult { error: 0.0, weights: vec![] }).unwrap();

        let err = serializer.bytes_to_object(&bytes, "Result").unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn truncated_payload_is_codec_error() {
        let serializer = BincodeSerializer::<GradientResult>::new();
        let err = serializer.bytes_to_object(&[1, 2, 3], "GradientResult").unwrap_err();
        assert!(matches!(err, Error::CodecError(_)));
    }
}
