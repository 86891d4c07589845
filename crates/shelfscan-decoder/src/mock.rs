//! Scripted decoder for testing the scan loop without real symbols.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shelfscan_camera::Frame;

use crate::{DecodeOptions, Decoder};

#[derive(Debug, Default)]
struct Script {
    results: VecDeque<Option<String>>,
    calls: usize,
    last_options: Option<DecodeOptions>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decoder that returns queued results in order, then `None`.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::{Frame, PixelFormat};
/// use shelfscan_decoder::mock::ScriptedDecoder;
/// use shelfscan_decoder::{DecodeOptions, Decoder};
///
/// let (decoder, handle) = ScriptedDecoder::new();
/// handle.push_nones(2);
/// handle.push(Some("ITM-42"));
///
/// let frame = Frame::new(vec![0u8; 1], 1, 1, PixelFormat::Luma8).unwrap();
/// let options = DecodeOptions::default();
/// assert_eq!(decoder.decode(&frame, &options), None);
/// assert_eq!(decoder.decode(&frame, &options), None);
/// assert_eq!(decoder.decode(&frame, &options).as_deref(), Some("ITM-42"));
/// assert_eq!(handle.calls(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedDecoder {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDecoder {
    pub fn new() -> (Self, ScriptedDecoderHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            ScriptedDecoderHandle { script },
        )
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, _frame: &Frame, options: &DecodeOptions) -> Option<String> {
        let mut script = lock(&self.script);
        script.calls += 1;
        script.last_options = Some(*options);
        script.results.pop_front().flatten()
    }
}

/// Handle for scripting a [`ScriptedDecoder`].
#[derive(Debug, Clone)]
pub struct ScriptedDecoderHandle {
    script: Arc<Mutex<Script>>,
}

impl ScriptedDecoderHandle {
    /// Queue the result of one decode call.
    pub fn push(&self, result: Option<&str>) {
        lock(&self.script).results.push_back(result.map(str::to_string));
    }

    /// Queue `count` calls that find nothing.
    pub fn push_nones(&self, count: usize) {
        let mut script = lock(&self.script);
        script.results.extend(std::iter::repeat_n(None, count));
    }

    /// Number of times the decoder ran.
    pub fn calls(&self) -> usize {
        lock(&self.script).calls
    }

    /// Options passed to the latest call.
    pub fn last_options(&self) -> Option<DecodeOptions> {
        lock(&self.script).last_options
    }
}
