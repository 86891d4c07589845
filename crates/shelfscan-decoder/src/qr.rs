//! QR decoding backed by `rqrr`.

use shelfscan_camera::Frame;
use tracing::trace;

use crate::{DecodeOptions, Decoder};

/// Decoder for QR symbols.
///
/// The frame is reduced to greyscale, grids are detected, and the first grid
/// that decodes to a non-empty payload wins. With
/// [`tolerate_polarity`](DecodeOptions::tolerate_polarity) a second pass runs
/// on the inverted image.
///
/// # Examples
///
/// ```
/// use shelfscan_camera::{Frame, PixelFormat};
/// use shelfscan_decoder::{DecodeOptions, Decoder, QrDecoder};
///
/// let blank = Frame::new(vec![255u8; 64 * 64], 64, 64, PixelFormat::Luma8).unwrap();
/// assert_eq!(QrDecoder::new().decode(&blank, &DecodeOptions::default()), None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }

    fn scan(frame: &Frame, invert: bool) -> Option<String> {
        let width = frame.width as usize;
        let height = frame.height as usize;

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            let luma = frame.luma_at(x as u32, y as u32);
            if invert { u8::MAX - luma } else { luma }
        });

        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), invert, "Grids detected");

        grids.iter().find_map(|grid| match grid.decode() {
            Ok((_meta, content)) => normalize(&content),
            Err(e) => {
                trace!(error = ?e, "Grid failed to decode");
                None
            }
        })
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, frame: &Frame, options: &DecodeOptions) -> Option<String> {
        if !frame.is_ready() {
            return None;
        }

        Self::scan(frame, false).or_else(|| {
            if options.tolerate_polarity {
                Self::scan(frame, true)
            } else {
                None
            }
        })
    }
}

/// Trim surrounding whitespace; a blank payload is no payload.
fn normalize(content: &str) -> Option<String> {
    let trimmed = content.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
