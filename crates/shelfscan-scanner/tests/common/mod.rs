//! Common fixtures for scan controller tests.

#![allow(dead_code)]

use qrcode::{Color, QrCode};
use shelfscan_camera::mock::{MockCamera, MockCameraHandle};
use shelfscan_camera::{Frame, PixelFormat};
use shelfscan_core::{Item, ItemId};
use shelfscan_decoder::mock::{ScriptedDecoder, ScriptedDecoderHandle};
use shelfscan_lookup::mock::{MockLookup, MockLookupHandle};
use shelfscan_scanner::{ChannelNavigator, ImmediateClock, ScanController, ScanState, ScannerConfig};
use tokio::sync::mpsc;

pub type TestController =
    ScanController<MockCamera, ScriptedDecoder, MockLookup, ChannelNavigator, ImmediateClock>;

/// A controller wired to mocks, plus the handles to script them.
pub struct Rig {
    pub controller: TestController,
    pub camera: MockCameraHandle,
    pub decoder: ScriptedDecoderHandle,
    pub lookup: MockLookupHandle,
    pub resolved: mpsc::UnboundedReceiver<ItemId>,
}

/// Build a rig whose camera always has a (symbol-free) frame ready.
pub fn rig(config: ScannerConfig) -> Rig {
    let (camera, camera_handle) = MockCamera::new();
    let (decoder, decoder_handle) = ScriptedDecoder::new();
    let (lookup, lookup_handle) = MockLookup::new();
    let (navigator, resolved) = ChannelNavigator::new();

    camera_handle.set_scene(grey_frame(16, 16));

    let controller = ScanController::new(camera, decoder, lookup, navigator, config)
        .unwrap()
        .with_clock(ImmediateClock);

    Rig {
        controller,
        camera: camera_handle,
        decoder: decoder_handle,
        lookup: lookup_handle,
        resolved,
    }
}

pub fn grey_frame(width: u32, height: u32) -> Frame {
    Frame::new(
        vec![0x80; (width * height) as usize],
        width,
        height,
        PixelFormat::Luma8,
    )
    .unwrap()
}

pub fn item(id: u64, name: &str) -> Item {
    Item {
        id: ItemId::new(id),
        name: name.to_string(),
        description: None,
        category: None,
        location_id: None,
        location: None,
        tags: Vec::new(),
    }
}

/// Step until `state` is reached. Returns `false` if the controller ran out
/// of events or `max_steps` was hit first.
pub async fn step_until(controller: &mut TestController, state: ScanState, max_steps: usize) -> bool {
    for _ in 0..max_steps {
        if controller.state() == state {
            return true;
        }
        if !controller.step().await {
            break;
        }
    }
    controller.state() == state
}

/// Render `payload` as a greyscale QR frame, 4 px per module with a
/// 4-module quiet zone.
pub fn render_qr(payload: &str) -> Frame {
    const MODULE_PX: usize = 4;
    const QUIET_ZONE: usize = 4;

    let code = QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width();
    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;
    let mut data = vec![u8::MAX; side * side];

    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let (mx, my) = (i % modules + QUIET_ZONE, i / modules + QUIET_ZONE);
        for dy in 0..MODULE_PX {
            let row = (my * MODULE_PX + dy) * side;
            data[row + mx * MODULE_PX..row + (mx + 1) * MODULE_PX].fill(0);
        }
    }

    Frame::new(data, side as u32, side as u32, PixelFormat::Luma8).unwrap()
}
