//! Error types for camera operations.
//!
//! This module defines the failures a camera device can report, covering
//! permission refusal, missing or busy hardware, mid-stream disconnection,
//! and malformed frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type alias for camera operations.
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Errors that can occur during camera device operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The user or the platform refused access to the camera.
    #[error("Camera permission denied: {device}")]
    PermissionDenied { device: String },

    /// No camera matching the requested constraints exists.
    #[error("Camera not found: {device}")]
    NotFound { device: String },

    /// The camera is held by another consumer.
    #[error("Camera busy: {device}")]
    HardwareBusy { device: String },

    /// The camera went away while a stream was open.
    #[error("Camera disconnected: {device}")]
    Disconnected { device: String },

    /// Frame buffer does not match its declared geometry.
    #[error("Invalid frame: {message}")]
    InvalidFrame { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl DeviceError {
    /// Create a new permission denied error.
    pub fn permission_denied(device: impl Into<String>) -> Self {
        Self::PermissionDenied {
            device: device.into(),
        }
    }

    /// Create a new not found error.
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::NotFound {
            device: device.into(),
        }
    }

    /// Create a new hardware busy error.
    pub fn hardware_busy(device: impl Into<String>) -> Self {
        Self::HardwareBusy {
            device: device.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Classify this error for reporting.
    pub fn kind(&self) -> DeviceErrorKind {
        match self {
            Self::PermissionDenied { .. } => DeviceErrorKind::PermissionDenied,
            Self::NotFound { .. } => DeviceErrorKind::NotFound,
            Self::HardwareBusy { .. } => DeviceErrorKind::HardwareBusy,
            Self::Disconnected { .. } => DeviceErrorKind::Disconnected,
            Self::InvalidFrame { .. } | Self::Io(_) | Self::Other(_) => DeviceErrorKind::Other,
        }
    }
}

/// Cloneable classification of a [`DeviceError`].
///
/// Sessions keep this instead of the error itself so that snapshots of the
/// session stay `Clone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceErrorKind {
    PermissionDenied,
    NotFound,
    HardwareBusy,
    Disconnected,
    Other,
}

impl DeviceErrorKind {
    /// Build the matching [`DeviceError`] for `device`.
    pub fn into_error(self, device: impl Into<String>) -> DeviceError {
        let device = device.into();
        match self {
            Self::PermissionDenied => DeviceError::permission_denied(device),
            Self::NotFound => DeviceError::not_found(device),
            Self::HardwareBusy => DeviceError::hardware_busy(device),
            Self::Disconnected => DeviceError::disconnected(device),
            Self::Other => DeviceError::other(format!("{device}: device failure")),
        }
    }
}

impl fmt::Display for DeviceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission denied",
            Self::NotFound => "not found",
            Self::HardwareBusy => "hardware busy",
            Self::Disconnected => "disconnected",
            Self::Other => "device failure",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_error() {
        let error = DeviceError::permission_denied("Rear Camera");
        assert!(matches!(error, DeviceError::PermissionDenied { .. }));
        assert_eq!(error.to_string(), "Camera permission denied: Rear Camera");
    }

    #[test]
    fn test_hardware_busy_error() {
        let error = DeviceError::hardware_busy("/dev/video0");
        assert_eq!(error.kind(), DeviceErrorKind::HardwareBusy);
        assert_eq!(error.to_string(), "Camera busy: /dev/video0");
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            DeviceErrorKind::PermissionDenied,
            DeviceErrorKind::NotFound,
            DeviceErrorKind::HardwareBusy,
            DeviceErrorKind::Disconnected,
        ] {
            assert_eq!(kind.into_error("cam").kind(), kind);
        }
    }

    #[test]
    fn test_io_error_is_other_kind() {
        let error: DeviceError = std::io::Error::other("boom").into();
        assert_eq!(error.kind(), DeviceErrorKind::Other);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DeviceErrorKind::PermissionDenied.to_string(), "permission denied");
        assert_eq!(DeviceErrorKind::NotFound.to_string(), "not found");
    }
}
