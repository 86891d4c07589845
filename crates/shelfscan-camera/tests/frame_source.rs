//! Integration tests for FrameSource
//!
//! These tests drive the acquire-sample-release cycle through the public
//! API, using both the mock camera and the replay camera behind
//! `AnyCamera`.

use image::{GrayImage, Luma};
use shelfscan_camera::mock::MockCamera;
use shelfscan_camera::replay::ReplayCamera;
use shelfscan_camera::{
    AnyCamera, CaptureConstraints, DeviceError, DeviceErrorKind, Frame, FrameSource, PixelFormat,
};

/// A source acquired through the enum wrapper releases the mock exactly once
#[tokio::test]
async fn test_mock_lifecycle_through_any_camera() {
    let (camera, handle) = MockCamera::new();
    handle.set_scene(Frame::new(vec![128u8; 16], 4, 4, PixelFormat::Luma8).unwrap());
    let camera = AnyCamera::from(camera);

    let mut source = FrameSource::acquire(&camera, &CaptureConstraints::default())
        .await
        .unwrap();

    for _ in 0..5 {
        let frame = source.next_frame().unwrap();
        assert!(frame.is_ready());
        assert_eq!(frame.luma_at(1, 1), 128);
    }

    assert!(source.release());
    drop(source);

    assert_eq!(handle.acquire_count(), 1);
    assert_eq!(handle.release_count(), 1);
    assert_eq!(handle.frames_served(), 5);
}

/// Permission refusal surfaces as a classified error and acquires nothing
#[tokio::test]
async fn test_permission_denied_then_recover() {
    let (camera, handle) = MockCamera::new();
    handle.fail_next_open(DeviceErrorKind::PermissionDenied);

    let error = FrameSource::acquire(&camera, &CaptureConstraints::default())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), DeviceErrorKind::PermissionDenied);
    assert!(!handle.is_streaming());

    let source = FrameSource::acquire(&camera, &CaptureConstraints::default())
        .await
        .unwrap();
    assert!(source.is_active());
    assert!(handle.is_streaming());
}

/// Two sources cannot hold the same device at once
#[tokio::test]
async fn test_second_source_is_busy() {
    let (camera, _handle) = MockCamera::new();

    let _first = FrameSource::acquire(&camera, &CaptureConstraints::default())
        .await
        .unwrap();
    let second = FrameSource::acquire(&camera, &CaptureConstraints::default()).await;

    assert!(matches!(second, Err(DeviceError::HardwareBusy { .. })));
}

/// Replay frames arrive as RGBA with the source image's geometry
#[tokio::test]
async fn test_replay_through_frame_source() {
    let dir = tempfile::tempdir().unwrap();
    GrayImage::from_pixel(8, 6, Luma([40]))
        .save(dir.path().join("0001.png"))
        .unwrap();

    let camera = AnyCamera::from(ReplayCamera::from_dir(dir.path()).unwrap());
    let mut source = FrameSource::acquire(&camera, &CaptureConstraints::default())
        .await
        .unwrap();

    let frame = source.next_frame().unwrap();
    assert_eq!(frame.format, PixelFormat::Rgba8);
    assert_eq!((frame.width, frame.height), (8, 6));
    assert!(frame.is_consistent());
    assert_eq!(frame.luma_at(3, 3), 40);

    let end = source.next_frame();
    assert!(matches!(end, Err(DeviceError::Disconnected { .. })));
}
