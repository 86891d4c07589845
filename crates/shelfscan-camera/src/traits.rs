//! Camera device trait definitions.
//!
//! These traits establish the contract between the scan controller and the
//! camera backends, enabling substitution between mock, replay and real
//! hardware implementations.
//!
//! Acquisition returns `impl Future + Send` so that a pending acquisition can
//! be held by the controller while it keeps serving commands.

use std::future::Future;

use crate::error::Result;
use crate::frame::Frame;
use crate::types::{CaptureConstraints, DeviceInfo};

/// A camera that can be asked for an exclusive video stream.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `open` returns
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyCamera`](crate::devices::AnyCamera) for runtime selection.
///
/// # Examples
///
/// ```no_run
/// use shelfscan_camera::traits::{CameraDevice, VideoStream};
/// use shelfscan_camera::types::CaptureConstraints;
/// use shelfscan_camera::error::Result;
///
/// async fn first_frame_size<C: CameraDevice>(camera: &C) -> Result<(u32, u32)> {
///     let mut stream = camera.open(&CaptureConstraints::default()).await?;
///     let frame = stream.next_frame()?;
///     stream.stop();
///     Ok((frame.width, frame.height))
/// }
/// ```
pub trait CameraDevice: Send + Sync {
    /// Stream handle produced by a successful [`open`](Self::open).
    type Stream: VideoStream;

    /// Request exclusive access to the camera.
    ///
    /// The returned stream holds the device until [`VideoStream::stop`] is
    /// called. Callers must stop any previous stream before opening again.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Access is refused (`PermissionDenied`)
    /// - No matching device exists (`NotFound`)
    /// - The device is held elsewhere (`HardwareBusy`)
    fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Get device information.
    fn info(&self) -> DeviceInfo;
}

/// An open, exclusively owned video stream.
pub trait VideoStream: Send {
    /// Take the most recent frame.
    ///
    /// Returns [`Frame::not_ready`] when the device has not produced an
    /// image yet; this is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the device disappeared (`Disconnected`) or
    /// delivered a malformed buffer.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Stop the stream and hand the device back.
    ///
    /// Implementations must tolerate repeated calls.
    fn stop(&mut self);
}
