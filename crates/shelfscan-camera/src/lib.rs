//! Camera abstraction for the shelf scanner.
//!
//! This crate defines how the scanner obtains images: a [`CameraDevice`] is
//! asked for an exclusive [`VideoStream`], and the resulting stream is owned
//! by a [`FrameSource`] that guarantees the device is released exactly once.
//!
//! # Backends
//!
//! - [`mock::MockCamera`]: scripted device for tests, with a handle that
//!   injects failures, feeds frames and counts acquisitions and releases.
//! - [`replay::ReplayCamera`] (feature `replay`, on by default): still images
//!   from disk, one frame per file.
//!
//! Both are wrapped by [`devices::AnyCamera`] for runtime selection.
//!
//! # Example
//!
//! ```
//! use shelfscan_camera::{CaptureConstraints, FrameSource};
//! use shelfscan_camera::mock::MockCamera;
//!
//! #[tokio::main]
//! async fn main() -> shelfscan_camera::Result<()> {
//!     let (camera, handle) = MockCamera::new();
//!
//!     let mut source = FrameSource::acquire(&camera, &CaptureConstraints::default()).await?;
//!     let frame = source.next_frame()?;
//!     assert!(!frame.is_ready());
//!
//!     drop(source);
//!     assert_eq!(handle.release_count(), 1);
//!     Ok(())
//! }
//! ```

pub mod devices;
pub mod error;
pub mod frame;
pub mod mock;
#[cfg(feature = "replay")]
pub mod replay;
pub mod source;
pub mod traits;
pub mod types;

pub use devices::{AnyCamera, AnyVideoStream};
pub use error::{DeviceError, DeviceErrorKind, Result};
pub use frame::{Frame, PixelFormat};
pub use source::{FrameSource, HandleId};
pub use traits::{CameraDevice, VideoStream};
pub use types::{CaptureConstraints, DeviceInfo, Facing, Resolution};
