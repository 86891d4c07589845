//! Scan session orchestration.
//!
//! This crate ties the camera, the decoder and the lookup client together:
//!
//! - [`StateMachine`]: the legal states of a scan session and their history
//! - [`ScanController`]: the single owner and mutator of a session
//! - [`ScanSession`]: the observable snapshot of a session
//! - [`FrameClock`]: frame sampling cadence
//! - [`Navigator`]: where a resolved item goes
//!
//! # Example Usage
//!
//! ```no_run
//! use shelfscan_camera::mock::MockCamera;
//! use shelfscan_decoder::QrDecoder;
//! use shelfscan_lookup::{HttpLookupClient, LookupClientConfig};
//! use shelfscan_scanner::{ChannelNavigator, ScanCommand, ScanController, ScannerConfig};
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (camera, _handle) = MockCamera::new();
//! let lookup = HttpLookupClient::new(LookupClientConfig::new("http://127.0.0.1:5000/api"))?;
//! let (navigator, mut resolved) = ChannelNavigator::new();
//!
//! let mut controller =
//!     ScanController::new(camera, QrDecoder::new(), lookup, navigator, ScannerConfig::default())?;
//!
//! let (commands, rx) = mpsc::channel(8);
//! commands.send(ScanCommand::Start).await?;
//!
//! tokio::spawn(async move { controller.run(rx).await });
//!
//! if let Some(item_id) = resolved.recv().await {
//!     println!("open item {item_id}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod controller;
pub mod navigation;
pub mod session;
pub mod state_machine;

pub use clock::{FrameClock, ImmediateClock, RefreshClock};
pub use config::ScannerConfig;
pub use controller::{ScanCommand, ScanController, ScanEvent};
pub use navigation::{ChannelNavigator, Navigator, NoopNavigator};
pub use session::{ScanFailure, ScanSession};
pub use state_machine::{MAX_HISTORY_SIZE, ScanState, StateMachine, StateMachineBuilder, StateTransition};
