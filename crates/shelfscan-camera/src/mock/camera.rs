//! Mock camera implementation for testing and development.
//!
//! The camera and its handle share one state block. The camera side behaves
//! like a single physical device: only one stream can be open at a time, and
//! a second request while streaming fails with `HardwareBusy`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{DeviceError, DeviceErrorKind, Result};
use crate::frame::Frame;
use crate::traits::{CameraDevice, VideoStream};
use crate::types::{CaptureConstraints, DeviceInfo, Facing};

#[derive(Debug, Default)]
struct MockState {
    /// Failures returned by upcoming `open` calls, oldest first.
    open_failures: VecDeque<DeviceErrorKind>,

    /// One-shot frames, served before the scene.
    frames: VecDeque<Frame>,

    /// Frame returned whenever the queue is empty ("what the lens sees").
    scene: Option<Frame>,

    open_delay: Option<Duration>,

    streaming: bool,

    disconnected: bool,

    open_attempts: u64,

    acquire_count: u64,

    release_count: u64,

    frames_served: u64,

    last_constraints: Option<CaptureConstraints>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock camera for testing and development.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::mock::MockCamera;
/// use shelfscan_camera::traits::{CameraDevice, VideoStream};
/// use shelfscan_camera::types::CaptureConstraints;
///
/// #[tokio::main]
/// async fn main() -> shelfscan_camera::Result<()> {
///     let (camera, handle) = MockCamera::new();
///
///     let mut stream = camera.open(&CaptureConstraints::default()).await?;
///
///     // Nothing queued yet: the device has no image
///     assert!(!stream.next_frame()?.is_ready());
///
///     stream.stop();
///     assert_eq!(handle.release_count(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockCamera {
    state: Arc<Mutex<MockState>>,

    name: String,
}

impl MockCamera {
    /// Create a new mock camera with the default name.
    ///
    /// Returns a tuple of (MockCamera, MockCameraHandle) where the handle
    /// scripts the device and reads back its counters.
    pub fn new() -> (Self, MockCameraHandle) {
        Self::with_name("Mock Camera")
    }

    /// Create a new mock camera with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockCameraHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));

        let camera = Self {
            state: Arc::clone(&state),
            name: name.into(),
        };
        let handle = MockCameraHandle { state };

        (camera, handle)
    }
}

impl CameraDevice for MockCamera {
    type Stream = MockStream;

    async fn open(&self, constraints: &CaptureConstraints) -> Result<MockStream> {
        let delay = {
            let mut state = lock(&self.state);
            state.open_attempts += 1;
            state.last_constraints = Some(*constraints);
            state.open_delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);

        if let Some(kind) = state.open_failures.pop_front() {
            debug!(device = %self.name, %kind, "Mock camera refusing open (scripted)");
            return Err(kind.into_error(self.name.as_str()));
        }

        if state.disconnected {
            return Err(DeviceError::not_found(self.name.as_str()));
        }

        if state.streaming {
            debug!(device = %self.name, "Mock camera already streaming");
            return Err(DeviceError::hardware_busy(self.name.as_str()));
        }

        state.streaming = true;
        state.acquire_count += 1;

        Ok(MockStream {
            state: Arc::clone(&self.state),
            name: self.name.clone(),
            stopped: false,
        })
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock Camera v1.0").with_facing(Facing::Environment)
    }
}

/// Stream handed out by [`MockCamera::open`].
#[derive(Debug)]
pub struct MockStream {
    state: Arc<Mutex<MockState>>,

    name: String,

    stopped: bool,
}

impl VideoStream for MockStream {
    fn next_frame(&mut self) -> Result<Frame> {
        if self.stopped {
            return Err(DeviceError::disconnected(self.name.as_str()));
        }

        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(DeviceError::disconnected(self.name.as_str()));
        }

        let frame = match state.frames.pop_front() {
            Some(frame) => frame,
            None => match &state.scene {
                Some(scene) => scene.clone(),
                None => return Ok(Frame::not_ready()),
            },
        };

        state.frames_served += 1;
        trace!(device = %self.name, served = state.frames_served, "Mock frame served");
        Ok(frame)
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let mut state = lock(&self.state);
        state.streaming = false;
        state.release_count += 1;
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle for controlling a mock camera.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::error::DeviceErrorKind;
/// use shelfscan_camera::mock::MockCamera;
/// use shelfscan_camera::traits::CameraDevice;
/// use shelfscan_camera::types::CaptureConstraints;
///
/// #[tokio::main]
/// async fn main() {
///     let (camera, handle) = MockCamera::new();
///     handle.fail_next_open(DeviceErrorKind::PermissionDenied);
///
///     let result = camera.open(&CaptureConstraints::default()).await;
///     assert!(result.is_err());
///     assert_eq!(handle.open_attempts(), 1);
///     assert_eq!(handle.acquire_count(), 0);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockCameraHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockCameraHandle {
    /// Make the next `open` fail with `kind`. Calls queue up.
    pub fn fail_next_open(&self, kind: DeviceErrorKind) {
        lock(&self.state).open_failures.push_back(kind);
    }

    /// Delay every subsequent `open` by `delay`.
    pub fn set_open_delay(&self, delay: Duration) {
        lock(&self.state).open_delay = Some(delay);
    }

    /// Queue a frame to be served once.
    pub fn push_frame(&self, frame: Frame) {
        lock(&self.state).frames.push_back(frame);
    }

    /// Queue several one-shot frames.
    pub fn push_frames(&self, frames: impl IntoIterator<Item = Frame>) {
        lock(&self.state).frames.extend(frames);
    }

    /// Set the frame served whenever the queue is empty.
    pub fn set_scene(&self, frame: Frame) {
        lock(&self.state).scene = Some(frame);
    }

    /// Remove the scene; an empty queue then yields not-ready frames.
    pub fn clear_scene(&self) {
        lock(&self.state).scene = None;
    }

    /// Simulate the device being unplugged.
    ///
    /// Open streams start failing with `Disconnected`; new opens fail with
    /// `NotFound` until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }

    pub fn reconnect(&self) {
        lock(&self.state).disconnected = false;
    }

    /// Whether a stream is currently open.
    pub fn is_streaming(&self) -> bool {
        lock(&self.state).streaming
    }

    /// Number of `open` calls, successful or not.
    pub fn open_attempts(&self) -> u64 {
        lock(&self.state).open_attempts
    }

    /// Number of successful acquisitions.
    pub fn acquire_count(&self) -> u64 {
        lock(&self.state).acquire_count
    }

    /// Number of releases.
    pub fn release_count(&self) -> u64 {
        lock(&self.state).release_count
    }

    /// Number of ready frames handed out.
    pub fn frames_served(&self) -> u64 {
        lock(&self.state).frames_served
    }

    /// Constraints passed to the most recent `open`.
    pub fn last_constraints(&self) -> Option<CaptureConstraints> {
        lock(&self.state).last_constraints
    }
}
