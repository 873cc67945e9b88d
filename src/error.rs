//! Error types for speaker-sink.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`SinkError`]): Prevent a sink or backend from being built
//! - **Submission errors** ([`DeviceError`]): A single block was not accepted by
//!   the playback device. These never reach the producer; the sink retries or
//!   drops the block and reports it via [`EventCallback`](crate::EventCallback).

use std::path::PathBuf;
use std::time::Duration;

/// Fatal errors that prevent a sink or device backend from being created.
///
/// These are returned once, from [`MonoSinkBuilder::build()`] or a backend
/// constructor. Nothing on the per-sample path returns this type.
///
/// [`MonoSinkBuilder::build()`]: crate::MonoSinkBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The bound playback device reported itself unusable.
    #[error("playback device unavailable: {name}")]
    DeviceUnavailable {
        /// Name of the device.
        name: String,
    },

    /// A configuration value is out of range.
    #[error("invalid sink configuration: {reason}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
    },

    /// A queued backend was created outside of a tokio runtime.
    #[error("no tokio runtime available to run the device worker")]
    NoRuntime,

    /// No default output device is configured on this system.
    #[error("no default output device configured")]
    NoDefaultDevice,

    /// An error from the underlying audio library (CPAL).
    #[error("audio backend error: {0}")]
    BackendError(String),
}

impl SinkError {
    /// Creates an invalid configuration error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

/// Errors a [`PlaybackDevice`](crate::PlaybackDevice) can return for one block.
///
/// Only [`DeviceError::Busy`] is considered retryable by the sink; everything
/// else drops the block immediately.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The device cannot take another block right now.
    #[error("device busy")]
    Busy,

    /// The device has gone away and will not accept further blocks.
    #[error("device disconnected")]
    Disconnected,

    /// The device did not accept the block in time.
    #[error("device did not accept block within {after:?}")]
    Timeout {
        /// How long the submission was allowed to take.
        after: Duration,
    },

    /// The block's sample rate is not what the device is running at.
    #[error("sample rate {requested}Hz not supported (device runs at {supported}Hz)")]
    UnsupportedRate {
        /// Sample rate carried by the block.
        requested: u32,
        /// Sample rate the device accepts.
        supported: u32,
    },

    /// File I/O error from a file-backed device.
    #[error("file error: {path}: {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Custom error for user-implemented devices.
    #[error("{0}")]
    Custom(String),
}

impl DeviceError {
    /// Creates a custom device error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a file error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if submitting the same block again may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::DeviceUnavailable {
            name: "speaker".to_string(),
        };
        assert_eq!(err.to_string(), "playback device unavailable: speaker");
    }

    #[test]
    fn test_invalid_config_helper() {
        let err = SinkError::invalid_config("buffer capacity must be non-zero");
        assert_eq!(
            err.to_string(),
            "invalid sink configuration: buffer capacity must be non-zero"
        );
    }

    #[test]
    fn test_device_error_custom() {
        let err = DeviceError::custom("i2s fifo overrun");
        assert_eq!(err.to_string(), "i2s fifo overrun");
    }

    #[test]
    fn test_device_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = DeviceError::io("/tmp/capture.wav", io_err);
        assert!(err.to_string().contains("/tmp/capture.wav"));
    }

    #[test]
    fn test_only_busy_is_retryable() {
        assert!(DeviceError::Busy.is_retryable());
        assert!(!DeviceError::Disconnected.is_retryable());
        assert!(!DeviceError::Timeout {
            after: Duration::from_millis(10)
        }
        .is_retryable());
        assert!(!DeviceError::custom("x").is_retryable());
    }

    #[test]
    fn test_unsupported_rate_display() {
        let err = DeviceError::UnsupportedRate {
            requested: 22050,
            supported: 44100,
        };
        assert_eq!(
            err.to_string(),
            "sample rate 22050Hz not supported (device runs at 44100Hz)"
        );
    }
}
