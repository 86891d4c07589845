//! Observable state of a scan session.

use std::fmt;

use shelfscan_camera::{DeviceError, DeviceErrorKind};
use shelfscan_core::{Generation, Item, ItemCode};
use shelfscan_lookup::LookupError;
use uuid::Uuid;

use crate::ScanState;

/// Why a session ended up in `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFailure {
    /// Acquisition or the stream failed.
    Device {
        kind: DeviceErrorKind,
        message: String,
    },

    /// The lookup produced no answer.
    Lookup(LookupError),
}

impl ScanFailure {
    /// User-facing message, in the wording the scanning page shows.
    pub fn user_message(&self) -> String {
        match self {
            Self::Device {
                kind: DeviceErrorKind::PermissionDenied,
                ..
            } => "Camera access denied. Please allow camera access and try again.".to_string(),
            Self::Device {
                kind: DeviceErrorKind::NotFound,
                ..
            } => "No camera found on this device.".to_string(),
            Self::Device {
                kind: DeviceErrorKind::HardwareBusy,
                ..
            } => "The camera is in use by another application.".to_string(),
            Self::Device { message, .. } => format!("Camera error: {message}"),
            Self::Lookup(error) => format!("Failed to fetch item: {error}"),
        }
    }

    pub fn device_kind(&self) -> Option<DeviceErrorKind> {
        match self {
            Self::Device { kind, .. } => Some(*kind),
            Self::Lookup(_) => None,
        }
    }
}

impl From<&DeviceError> for ScanFailure {
    fn from(error: &DeviceError) -> Self {
        Self::Device {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { message, .. } => write!(f, "{message}"),
            Self::Lookup(error) => write!(f, "{error}"),
        }
    }
}

/// Snapshot of one scan session.
///
/// The controller owns the live session and publishes a copy after every
/// change; see [`ScanController::subscribe`](crate::ScanController::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSession {
    /// Correlation id, renewed on every `start`.
    pub id: Uuid,

    pub state: ScanState,

    /// Bumped on cancel and on entry into `Idle` or `Error`. Results issued
    /// under an older generation are discarded.
    pub generation: Generation,

    pub last_error: Option<ScanFailure>,

    /// Set on detection, kept through lookup and `Done`, cleared whenever
    /// the session goes back to sampling or stops.
    pub decoded_payload: Option<String>,

    /// Frames pulled from the camera while scanning.
    pub frames_sampled: u64,

    /// Last code the inventory did not know.
    pub last_unmatched: Option<ItemCode>,

    /// Item the session resolved to.
    pub resolved: Option<Item>,

    /// Consecutive retries that have not yet got past the failed step.
    pub retries: u32,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ScanState::Idle,
            generation: Generation::INITIAL,
            last_error: None,
            decoded_payload: None,
            frames_sampled: 0,
            last_unmatched: None,
            resolved: None,
            retries: 0,
        }
    }

    /// Clear everything tied to a previous attempt. Identity and generation
    /// are kept.
    pub(crate) fn clear_attempt(&mut self) {
        self.last_error = None;
        self.decoded_payload = None;
        self.frames_sampled = 0;
        self.last_unmatched = None;
        self.resolved = None;
        self.retries = 0;
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}
