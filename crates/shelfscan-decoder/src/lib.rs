//! QR decoding for the shelf scanner.
//!
//! The optical work is done by [`rqrr`]; this crate puts it behind the
//! [`Decoder`] trait and adds the input checks the scan loop relies on
//! ([`decode_frame`]).
//!
//! Decoding is pure: the same frame and options always produce the same
//! result, and the frame is never modified.

pub mod mock;
pub mod options;
pub mod outcome;
pub mod qr;

pub use options::DecodeOptions;
pub use outcome::{FrameOutcome, decode_frame};
pub use qr::QrDecoder;

use shelfscan_camera::Frame;

/// Something that can find a symbol in a frame.
///
/// Implementations may assume nothing about the frame: callers normally go
/// through [`decode_frame`], but direct calls with not-ready frames must
/// simply return `None`.
pub trait Decoder: Send + Sync {
    /// Decode the first symbol in `frame`, if any.
    fn decode(&self, frame: &Frame, options: &DecodeOptions) -> Option<String>;
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn decode(&self, frame: &Frame, options: &DecodeOptions) -> Option<String> {
        (**self).decode(frame, options)
    }
}
