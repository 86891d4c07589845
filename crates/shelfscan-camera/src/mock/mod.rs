//! Mock camera for testing and development.
//!
//! The mock is driven through a handle: tests script acquisition failures,
//! feed frames, pull the plug, and read back how often the device was
//! acquired and released.

pub mod camera;

pub use camera::{MockCamera, MockCameraHandle, MockStream};
