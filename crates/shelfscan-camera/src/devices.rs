//! Enum wrappers for camera dispatch.
//!
//! [`CameraDevice::open`] returns `impl Future`, so the trait cannot be used
//! as `dyn CameraDevice`. Callers that choose between backends at runtime
//! hold an [`AnyCamera`] instead. Callers that only ever use one backend
//! (the `shelfscan` binary always replays stills) name it directly.
//!
//! # Examples
//!
//! ```
//! use shelfscan_camera::devices::AnyCamera;
//! use shelfscan_camera::mock::MockCamera;
//! use shelfscan_camera::traits::CameraDevice;
//!
//! let (camera, _handle) = MockCamera::new();
//! let camera = AnyCamera::Mock(camera);
//! assert_eq!(camera.info().name, "Mock Camera");
//! ```

use crate::error::Result;
use crate::frame::Frame;
use crate::mock::{MockCamera, MockStream};
#[cfg(feature = "replay")]
use crate::replay::{ReplayCamera, ReplayStream};
use crate::traits::{CameraDevice, VideoStream};
use crate::types::{CaptureConstraints, DeviceInfo};

/// Enum wrapper for camera dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyCamera {
    /// Scripted camera for development and testing.
    Mock(MockCamera),

    /// Still images replayed from disk.
    #[cfg(feature = "replay")]
    Replay(ReplayCamera),
}

impl CameraDevice for AnyCamera {
    type Stream = AnyVideoStream;

    async fn open(&self, constraints: &CaptureConstraints) -> Result<AnyVideoStream> {
        match self {
            Self::Mock(camera) => camera.open(constraints).await.map(AnyVideoStream::Mock),
            #[cfg(feature = "replay")]
            Self::Replay(camera) => camera.open(constraints).await.map(AnyVideoStream::Replay),
        }
    }

    fn info(&self) -> DeviceInfo {
        match self {
            Self::Mock(camera) => camera.info(),
            #[cfg(feature = "replay")]
            Self::Replay(camera) => camera.info(),
        }
    }
}

impl From<MockCamera> for AnyCamera {
    fn from(camera: MockCamera) -> Self {
        Self::Mock(camera)
    }
}

#[cfg(feature = "replay")]
impl From<ReplayCamera> for AnyCamera {
    fn from(camera: ReplayCamera) -> Self {
        Self::Replay(camera)
    }
}

/// Stream produced by [`AnyCamera`].
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyVideoStream {
    Mock(MockStream),

    #[cfg(feature = "replay")]
    Replay(ReplayStream),
}

impl VideoStream for AnyVideoStream {
    fn next_frame(&mut self) -> Result<Frame> {
        match self {
            Self::Mock(stream) => stream.next_frame(),
            #[cfg(feature = "replay")]
            Self::Replay(stream) => stream.next_frame(),
        }
    }

    fn stop(&mut self) {
        match self {
            Self::Mock(stream) => stream.stop(),
            #[cfg(feature = "replay")]
            Self::Replay(stream) => stream.stop(),
        }
    }
}
