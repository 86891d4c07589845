//! Camera that replays still images from disk.
//!
//! Each image becomes one frame, served in file-name order. Without looping
//! the stream reports `Disconnected` once the recording runs out, the same
//! way a camera that went away would.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::{DeviceError, Result};
use crate::frame::Frame;
use crate::traits::{CameraDevice, VideoStream};
use crate::types::{CaptureConstraints, DeviceInfo};

/// Replay device backed by image files.
///
/// # Examples
///
/// ```no_run
/// use shelfscan_camera::replay::ReplayCamera;
///
/// let camera = ReplayCamera::from_dir("./captures")?.with_looping(true);
/// assert!(!camera.paths().is_empty());
/// # Ok::<(), shelfscan_camera::DeviceError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    paths: Vec<PathBuf>,

    name: String,

    looping: bool,

    busy: Arc<AtomicBool>,
}

impl ReplayCamera {
    /// Replay every image file in `dir`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the directory does not exist or holds no
    /// recognised image files.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries =
            std::fs::read_dir(dir).map_err(|_| DeviceError::not_found(dir.display().to_string()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();

        debug!(dir = %dir.display(), frames = paths.len(), "Replay directory scanned");
        Self::build(paths, dir.display().to_string())
    }

    /// Replay the given files in order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the list is empty or a file is missing.
    pub fn from_files(paths: impl IntoIterator<Item = PathBuf>) -> Result<Self> {
        let paths: Vec<PathBuf> = paths.into_iter().collect();

        if let Some(missing) = paths.iter().find(|p| !p.is_file()) {
            return Err(DeviceError::not_found(missing.display().to_string()));
        }

        Self::build(paths, "Replay Camera".to_string())
    }

    fn build(paths: Vec<PathBuf>, name: String) -> Result<Self> {
        if paths.is_empty() {
            return Err(DeviceError::not_found(format!("{name} (no frames)")));
        }

        Ok(Self {
            paths,
            name,
            looping: false,
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start over from the first frame instead of disconnecting at the end.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl CameraDevice for ReplayCamera {
    type Stream = ReplayStream;

    async fn open(&self, _constraints: &CaptureConstraints) -> Result<ReplayStream> {
        let claim = DeviceClaim::acquire(&self.busy)
            .ok_or_else(|| DeviceError::hardware_busy(self.name.as_str()))?;

        let mut frames = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            frames.push(load_frame(path).await?);
        }

        info!(device = %self.name, frames = frames.len(), looping = self.looping, "Replay opened");

        Ok(ReplayStream {
            frames,
            cursor: 0,
            looping: self.looping,
            name: self.name.clone(),
            busy: Some(claim.into_lock()),
        })
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Still Image Replay")
    }
}

/// Holds the device lock while an open is in progress.
///
/// Dropping the claim (a failed load, or the open future itself being
/// dropped) frees the device again.
struct DeviceClaim {
    busy: Arc<AtomicBool>,
    armed: bool,
}

impl DeviceClaim {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            busy: Arc::clone(busy),
            armed: true,
        })
    }

    /// Hand the lock over to a stream.
    fn into_lock(mut self) -> Arc<AtomicBool> {
        self.armed = false;
        Arc::clone(&self.busy)
    }
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        if self.armed {
            self.busy.store(false, Ordering::Release);
        }
    }
}

async fn load_frame(path: &Path) -> Result<Frame> {
    let bytes = tokio::fs::read(path).await?;
    let image = image::load_from_memory(&bytes).map_err(|e| {
        DeviceError::invalid_frame(format!("{}: {e}", path.display()))
    })?;
    Ok(Frame::from_image(&image))
}

/// Stream handed out by [`ReplayCamera::open`].
#[derive(Debug)]
pub struct ReplayStream {
    frames: Vec<Frame>,

    cursor: usize,

    looping: bool,

    name: String,

    /// Device lock; `None` once stopped.
    busy: Option<Arc<AtomicBool>>,
}

impl VideoStream for ReplayStream {
    fn next_frame(&mut self) -> Result<Frame> {
        if self.busy.is_none() {
            return Err(DeviceError::disconnected(self.name.as_str()));
        }

        if self.cursor >= self.frames.len() {
            if !self.looping {
                return Err(DeviceError::disconnected(format!(
                    "{} (end of recording)",
                    self.name
                )));
            }
            self.cursor = 0;
        }

        let mut frame = self.frames[self.cursor].clone();
        frame.captured_at = chrono::Utc::now();
        self.cursor += 1;
        Ok(frame)
    }

    fn stop(&mut self) {
        if let Some(busy) = self.busy.take() {
            busy.store(false, Ordering::Release);
        }
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.stop();
    }
}
