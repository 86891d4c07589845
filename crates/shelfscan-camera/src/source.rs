//! Scoped ownership of an acquired camera stream.
//!
//! A [`FrameSource`] is the only owner of a device stream. Releasing it is
//! idempotent, and dropping it releases the device, so every exit path
//! (success, failure, cancellation, teardown) hands the camera back exactly
//! once.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace};

use crate::error::{DeviceError, Result};
use crate::frame::Frame;
use crate::traits::{CameraDevice, VideoStream};
use crate::types::CaptureConstraints;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one acquisition, for logs and handle-identity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// An acquired camera.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::mock::MockCamera;
/// use shelfscan_camera::source::FrameSource;
/// use shelfscan_camera::types::CaptureConstraints;
///
/// #[tokio::main]
/// async fn main() -> shelfscan_camera::Result<()> {
///     let (camera, handle) = MockCamera::new();
///
///     let mut source = FrameSource::acquire(&camera, &CaptureConstraints::default()).await?;
///     assert!(source.is_active());
///
///     source.release();
///     source.release(); // idempotent
///     assert_eq!(handle.release_count(), 1);
///     Ok(())
/// }
/// ```
pub struct FrameSource<S: VideoStream> {
    /// The device handle; `None` once released.
    stream: Option<S>,

    id: HandleId,

    device: String,

    acquired_at: DateTime<Utc>,
}

impl<S: VideoStream> FrameSource<S> {
    /// Acquire exclusive access to `camera`.
    ///
    /// # Errors
    ///
    /// Propagates the device's acquisition failure; no source is
    /// constructed in that case.
    pub async fn acquire<C>(camera: &C, constraints: &CaptureConstraints) -> Result<Self>
    where
        C: CameraDevice<Stream = S>,
    {
        let device = camera.info().name;
        debug!(
            device = %device,
            facing = %constraints.facing,
            resolution = %constraints.ideal_resolution,
            "Requesting camera"
        );

        let stream = camera.open(constraints).await?;
        let source = Self::from_stream(stream, device);

        info!(device = %source.device, handle = %source.id, "Camera acquired");
        Ok(source)
    }

    /// Wrap an already opened stream.
    pub fn from_stream(stream: S, device: impl Into<String>) -> Self {
        Self {
            stream: Some(stream),
            id: HandleId::next(),
            device: device.into(),
            acquired_at: Utc::now(),
        }
    }

    /// Pull the next frame from the device.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Disconnected`] after release, or whatever the
    /// device reports.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| DeviceError::disconnected(format!("{} (released)", self.device)))?;

        let frame = stream.next_frame()?;
        trace!(
            handle = %self.id,
            width = frame.width,
            height = frame.height,
            "Frame pulled"
        );
        Ok(frame)
    }

    /// Hand the device back.
    ///
    /// Returns `true` if this call released the device, `false` if it was
    /// already released.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                info!(device = %self.device, handle = %self.id, "Camera released");
                true
            }
            None => false,
        }
    }

    /// Whether the source still holds the device.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

impl<S: VideoStream> Drop for FrameSource<S> {
    fn drop(&mut self) {
        if self.is_active() {
            debug!(handle = %self.id, "FrameSource dropped while active - releasing camera");
            self.release();
        }
    }
}

impl<S: VideoStream> fmt::Debug for FrameSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSource")
            .field("id", &self.id)
            .field("device", &self.device)
            .field("active", &self.is_active())
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}
