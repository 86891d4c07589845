//! Common test utilities for decoder integration tests.
//!
//! Frames are rendered from real QR symbols so the tests exercise the
//! actual optical decoder rather than a stand-in.

#![allow(dead_code)]

use qrcode::{Color, QrCode};
use shelfscan_camera::{Frame, PixelFormat};

/// Pixels per QR module.
pub const MODULE_PX: usize = 4;

/// Quiet zone width, in modules.
pub const QUIET_ZONE: usize = 4;

/// Render `payload` as a dark-on-light greyscale frame.
pub fn render_qr(payload: &str) -> Frame {
    render(payload, false)
}

/// Render `payload` as a light-on-dark greyscale frame.
pub fn render_qr_inverted(payload: &str) -> Frame {
    render(payload, true)
}

/// Render `payload` as an RGBA frame, the layout a canvas hands out.
pub fn render_qr_rgba(payload: &str) -> Frame {
    let grey = render_qr(payload);
    let data = grey
        .data
        .iter()
        .flat_map(|&v| [v, v, v, u8::MAX])
        .collect();
    Frame::new(data, grey.width, grey.height, PixelFormat::Rgba8).unwrap()
}

/// A uniform frame with no symbol in it.
pub fn blank_frame(width: u32, height: u32) -> Frame {
    Frame::new(
        vec![u8::MAX; (width * height) as usize],
        width,
        height,
        PixelFormat::Luma8,
    )
    .unwrap()
}

fn render(payload: &str, inverted: bool) -> Frame {
    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width();
    let colors = code.to_colors();

    let (dark, light) = if inverted { (u8::MAX, 0) } else { (0, u8::MAX) };
    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;
    let mut data = vec![light; side * side];

    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules + QUIET_ZONE, i / modules + QUIET_ZONE);
        for dy in 0..MODULE_PX {
            let row = (my * MODULE_PX + dy) * side;
            for dx in 0..MODULE_PX {
                data[row + mx * MODULE_PX + dx] = dark;
            }
        }
    }

    Frame::new(data, side as u32, side as u32, PixelFormat::Luma8).unwrap()
}
