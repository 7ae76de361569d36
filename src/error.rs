//! Error types for ONNX Bench

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

/// Main error type for ONNX Bench
#[derive(Error, Debug)]
pub enum BenchError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// ONNX Runtime error
    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// NVML error
    #[cfg(all(target_os = "linux", feature = "nvidia"))]
    #[error("NVML error: {0}")]
    Nvml(#[from] nvml_wrapper::error::NvmlError),

    /// Model file does not exist
    #[error("Model not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    /// Model loaded but cannot be benchmarked (no inputs, non-tensor input, ...)
    #[error("Model error: {0}")]
    Model(String),

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid input read from the interactive prompt
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// GPU-specific error
    #[error("GPU error: {0}")]
    GpuError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Whether this error is the "model file absent" condition, which the CLI
    /// reports without failing the process.
    pub fn is_model_not_found(&self) -> bool {
        matches!(self, BenchError::ModelNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_model_not_found() {
        let err = BenchError::ModelNotFound(PathBuf::from("./model.onnx"));
        assert_eq!(err.to_string(), "Model not found: ./model.onnx");
        assert!(err.is_model_not_found());
    }

    #[test]
    fn test_display_device_not_found() {
        let err = BenchError::DeviceNotFound("adapter 3".to_string());
        assert_eq!(err.to_string(), "Device not found: adapter 3");
        assert!(!err.is_model_not_found());
    }

    #[test]
    fn test_display_invalid_argument() {
        let err = BenchError::InvalidArgument("width 0".to_string());
        assert_eq!(err.to_string(), "Invalid argument: width 0");
    }

    #[test]
    fn test_from_io() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed");
        let err: BenchError = io_err.into();
        assert!(err.to_string().contains("stdin closed"));
    }

    #[test]
    fn test_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: BenchError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
