//! Input checks wrapped around a decode call.

use shelfscan_camera::Frame;
use tracing::{trace, warn};

use crate::{DecodeOptions, Decoder};

/// Result of offering one frame to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Zero-sized frame; the device has no image yet.
    NotReady,

    /// Buffer length disagrees with the declared geometry. The decoder was
    /// not called.
    Malformed { expected: usize, actual: usize },

    /// Decoded, no symbol found.
    NoSymbol,

    /// A symbol was found.
    Decoded(String),
}

impl FrameOutcome {
    /// The payload, if one was decoded.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Self::Decoded(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether the decoder actually ran for this frame.
    pub fn was_decoded(&self) -> bool {
        matches!(self, Self::NoSymbol | Self::Decoded(_))
    }
}

/// Check `frame` and, if it is usable, decode it.
///
/// Zero-sized and malformed frames never reach the decoder.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::Frame;
/// use shelfscan_decoder::{DecodeOptions, FrameOutcome, QrDecoder, decode_frame};
///
/// let outcome = decode_frame(&QrDecoder::new(), &Frame::not_ready(), &DecodeOptions::default());
/// assert_eq!(outcome, FrameOutcome::NotReady);
/// ```
pub fn decode_frame<D: Decoder + ?Sized>(
    decoder: &D,
    frame: &Frame,
    options: &DecodeOptions,
) -> FrameOutcome {
    if !frame.is_ready() {
        trace!("Frame not ready, skipping decode");
        return FrameOutcome::NotReady;
    }

    if !frame.is_consistent() {
        let outcome = FrameOutcome::Malformed {
            expected: frame.expected_len(),
            actual: frame.data.len(),
        };
        warn!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            ?outcome,
            "Malformed frame, skipping decode"
        );
        return outcome;
    }

    match decoder.decode(frame, options) {
        Some(payload) => FrameOutcome::Decoded(payload),
        None => FrameOutcome::NoSymbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedDecoder;
    use shelfscan_camera::PixelFormat;

    fn blank(width: u32, height: u32) -> Frame {
        Frame::new(
            vec![255u8; (width * height) as usize],
            width,
            height,
            PixelFormat::Luma8,
        )
        .unwrap()
    }

    #[test]
    fn test_not_ready_skips_decoder() {
        let (decoder, handle) = ScriptedDecoder::new();
        handle.push(Some("ITM-1"));

        let outcome = decode_frame(&decoder, &Frame::not_ready(), &DecodeOptions::default());

        assert_eq!(outcome, FrameOutcome::NotReady);
        assert_eq!(handle.calls(), 0);
    }

    #[test]
    fn test_malformed_skips_decoder() {
        let (decoder, handle) = ScriptedDecoder::new();
        let mut frame = blank(4, 4);
        frame.data.truncate(10);

        let outcome = decode_frame(&decoder, &frame, &DecodeOptions::default());

        assert_eq!(
            outcome,
            FrameOutcome::Malformed {
                expected: 16,
                actual: 10
            }
        );
        assert!(!outcome.was_decoded());
        assert_eq!(handle.calls(), 0);
    }

    #[test]
    fn test_decoded_and_no_symbol() {
        let (decoder, handle) = ScriptedDecoder::new();
        handle.push(None);
        handle.push(Some("ITM-42"));
        let frame = blank(4, 4);

        let first = decode_frame(&decoder, &frame, &DecodeOptions::default());
        let second = decode_frame(&decoder, &frame, &DecodeOptions::default());

        assert_eq!(first, FrameOutcome::NoSymbol);
        assert_eq!(second.payload(), Some("ITM-42"));
        assert_eq!(handle.calls(), 2);
    }

    #[test]
    fn test_decode_leaves_frame_untouched() {
        let (decoder, _handle) = ScriptedDecoder::new();
        let frame = blank(3, 3);
        let before = frame.clone();

        decode_frame(&decoder, &frame, &DecodeOptions::default());

        assert_eq!(frame, before);
    }
}
