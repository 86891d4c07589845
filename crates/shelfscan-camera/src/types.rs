//! Common types shared across camera device implementations.
//!
//! This module defines the acquisition constraints handed to a device and
//! the metadata a device reports about itself.

use serde::{Deserialize, Serialize};
use shelfscan_core::constants::{DEFAULT_IDEAL_HEIGHT, DEFAULT_IDEAL_WIDTH};
use std::fmt;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Rear camera, pointing away from the user. Preferred for labels.
    #[default]
    Environment,

    /// Front camera, pointing at the user.
    User,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(DEFAULT_IDEAL_WIDTH, DEFAULT_IDEAL_HEIGHT)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Constraints passed to a camera when requesting a stream.
///
/// The resolution is a preference; devices deliver the closest mode they
/// support.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::types::{CaptureConstraints, Facing, Resolution};
///
/// let constraints = CaptureConstraints::default();
/// assert_eq!(constraints.facing, Facing::Environment);
/// assert_eq!(constraints.ideal_resolution, Resolution::new(1280, 720));
///
/// let selfie = CaptureConstraints::default().with_facing(Facing::User);
/// assert_eq!(selfie.facing, Facing::User);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    pub facing: Facing,
    pub ideal_resolution: Resolution,
}

impl CaptureConstraints {
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_ideal_resolution(mut self, width: u32, height: u32) -> Self {
        self.ideal_resolution = Resolution::new(width, height);
        self
    }
}

/// Device information metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,

    /// Backend or driver model.
    pub model: String,

    /// Facing of the physical sensor, when known.
    pub facing: Option<Facing>,
}

impl DeviceInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            facing: None,
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = Some(facing);
        self
    }
}
