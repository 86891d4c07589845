//! Scan controller.
//!
//! [`ScanController`] is the only thing that mutates a scan session. It
//! owns the camera handle, the in-flight acquisition and lookup futures,
//! and the frame clock, and turns their completions into typed
//! [`ScanEvent`]s that are applied one at a time.
//!
//! Every asynchronous operation is tagged with the session generation at
//! the moment it was issued. Cancellation and failure bump the generation,
//! so results that arrive afterwards are recognised as stale and dropped
//! (a stale camera grant is handed straight back).
//!
//! # Driving the controller
//!
//! - [`ScanController::run`] multiplexes a command channel with in-flight
//!   completions and frame ticks until the channel closes.
//! - [`ScanController::drive`] processes events until nothing is pending,
//!   which is how one-shot tools use it.
//! - [`ScanController::step`] processes a single event, for tests.
//!
//! # Example
//!
//! ```
//! use shelfscan_camera::mock::MockCamera;
//! use shelfscan_camera::{Frame, PixelFormat};
//! use shelfscan_decoder::mock::ScriptedDecoder;
//! use shelfscan_lookup::mock::MockLookup;
//! use shelfscan_scanner::{ImmediateClock, NoopNavigator, ScanController, ScanState, ScannerConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> shelfscan_core::Result<()> {
//! let (camera, camera_handle) = MockCamera::new();
//! let (decoder, script) = ScriptedDecoder::new();
//! let (lookup, _lookup_handle) = MockLookup::new();
//!
//! camera_handle.set_scene(Frame::new(vec![0; 16], 4, 4, PixelFormat::Luma8).unwrap());
//! script.push(Some("ITM-42"));
//!
//! let config = ScannerConfig::default().auto_lookup(false);
//! let mut controller = ScanController::new(camera, decoder, lookup, NoopNavigator, config)?
//!     .with_clock(ImmediateClock);
//!
//! controller.start()?;
//! controller.drive().await;
//!
//! assert_eq!(controller.state(), ScanState::Detected);
//! assert_eq!(controller.session().decoded_payload.as_deref(), Some("ITM-42"));
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use shelfscan_camera::{CameraDevice, DeviceError, FrameSource, VideoStream};
use shelfscan_core::{Error, Generation, ItemCode, Result};
use shelfscan_decoder::{Decoder, FrameOutcome, decode_frame};
use shelfscan_lookup::{LookupClient, LookupError, LookupResult};

use crate::clock::{FrameClock, RefreshClock};
use crate::config::ScannerConfig;
use crate::navigation::Navigator;
use crate::session::{ScanFailure, ScanSession};
use crate::state_machine::{ScanState, StateMachine, StateTransition};

/// Completion delivered to the controller.
///
/// Each variant carries the generation that was current when the work was
/// issued.
pub enum ScanEvent<S: VideoStream> {
    /// A camera acquisition finished.
    Acquired {
        generation: Generation,
        result: std::result::Result<FrameSource<S>, DeviceError>,
    },

    /// Time to sample a frame.
    FrameTick { generation: Generation },

    /// A lookup finished.
    LookupResolved {
        generation: Generation,
        code: ItemCode,
        result: LookupResult,
    },
}

impl<S: VideoStream> ScanEvent<S> {
    pub fn generation(&self) -> Generation {
        match self {
            Self::Acquired { generation, .. }
            | Self::FrameTick { generation }
            | Self::LookupResolved { generation, .. } => *generation,
        }
    }
}

impl<S: VideoStream> fmt::Debug for ScanEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquired { generation, result } => f
                .debug_struct("Acquired")
                .field("generation", generation)
                .field("ok", &result.is_ok())
                .finish(),
            Self::FrameTick { generation } => f
                .debug_struct("FrameTick")
                .field("generation", generation)
                .finish(),
            Self::LookupResolved {
                generation,
                code,
                result,
            } => f
                .debug_struct("LookupResolved")
                .field("generation", generation)
                .field("code", code)
                .field("result", result)
                .finish(),
        }
    }
}

/// User commands accepted by [`ScanController::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    Start,
    Cancel,
    Retry,
    /// Cancel, then start a fresh session.
    Restart,
    /// Look up the detected code when automatic lookup is off.
    Lookup,
}

/// What the run loop woke up for.
enum Step<S: VideoStream> {
    Command(ScanCommand),
    Event(ScanEvent<S>),
    Closed,
}

/// Orchestrates acquisition, sampling, decoding and lookup for one
/// scanning surface.
pub struct ScanController<C, D, L, N, K = RefreshClock>
where
    C: CameraDevice,
{
    camera: Arc<C>,
    decoder: D,
    lookup: Arc<L>,
    navigator: N,
    clock: K,
    config: ScannerConfig,

    machine: StateMachine,
    session: ScanSession,
    source: Option<FrameSource<C::Stream>>,

    in_flight: FuturesUnordered<BoxFuture<'static, ScanEvent<C::Stream>>>,
    tick_armed: bool,

    /// At most one acquisition runs at a time. A start that arrives while a
    /// stale acquisition is still pending waits for it to settle.
    acquisition_in_flight: bool,
    acquire_wanted: bool,

    /// The pending retry follows a lookup failure, so only a lookup answer
    /// (not a new camera grant) refills the retry budget.
    retrying_lookup: bool,

    updates: watch::Sender<ScanSession>,
}

impl<C, D, L, N> ScanController<C, D, L, N, RefreshClock>
where
    C: CameraDevice + 'static,
    C::Stream: 'static,
    D: Decoder,
    L: LookupClient,
    N: Navigator,
{
    /// Create an idle controller sampling at the configured refresh rate.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` does not validate.
    pub fn new(camera: C, decoder: D, lookup: L, navigator: N, config: ScannerConfig) -> Result<Self> {
        config.validate()?;

        let session = ScanSession::new();
        let (updates, _) = watch::channel(session.clone());

        Ok(Self {
            camera: Arc::new(camera),
            decoder,
            lookup: Arc::new(lookup),
            navigator,
            clock: RefreshClock::new(config.frame_interval()),
            config,
            machine: StateMachine::new(),
            session,
            source: None,
            in_flight: FuturesUnordered::new(),
            tick_armed: false,
            acquisition_in_flight: false,
            acquire_wanted: false,
            retrying_lookup: false,
            updates,
        })
    }
}

impl<C, D, L, N, K> ScanController<C, D, L, N, K>
where
    C: CameraDevice + 'static,
    C::Stream: 'static,
    D: Decoder,
    L: LookupClient,
    N: Navigator,
    K: FrameClock,
{
    /// Replace the frame clock.
    pub fn with_clock<K2: FrameClock>(self, clock: K2) -> ScanController<C, D, L, N, K2> {
        ScanController {
            camera: self.camera,
            decoder: self.decoder,
            lookup: self.lookup,
            navigator: self.navigator,
            clock,
            config: self.config,
            machine: self.machine,
            session: self.session,
            source: self.source,
            in_flight: self.in_flight,
            tick_armed: self.tick_armed,
            acquisition_in_flight: self.acquisition_in_flight,
            acquire_wanted: self.acquire_wanted,
            retrying_lookup: self.retrying_lookup,
            updates: self.updates,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn state(&self) -> ScanState {
        self.machine.current_state()
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// Whether a camera handle is currently held.
    pub fn has_source(&self) -> bool {
        self.source.as_ref().is_some_and(FrameSource::is_active)
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Receive a snapshot of the session after every change.
    pub fn subscribe(&self) -> watch::Receiver<ScanSession> {
        self.updates.subscribe()
    }

    // ----- commands -----

    /// Begin a session: request the camera.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless the controller is idle.
    pub fn start(&mut self) -> Result<()> {
        self.require(ScanState::Idle, ScanState::Acquiring)?;
        self.machine.transition_to(ScanState::Acquiring)?;

        self.session.clear_attempt();
        self.retrying_lookup = false;
        self.session.id = Uuid::new_v4();
        info!(session = %self.session.id, generation = %self.session.generation, "Scan started");

        self.request_acquire();
        self.publish();
        Ok(())
    }

    /// Abandon the session from any state.
    ///
    /// The camera is released before this returns. Anything still in flight
    /// is discarded when it completes.
    pub fn cancel(&mut self) {
        self.release_source();
        self.session.generation = self.session.generation.next();
        self.session.decoded_payload = None;
        self.tick_armed = false;
        self.acquire_wanted = false;

        if let Some(transition) = self.machine.reset() {
            info!(
                session = %self.session.id,
                from = %transition.from,
                generation = %self.session.generation,
                "Scan cancelled"
            );
        }
        self.publish();
    }

    /// Request the camera again after a failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` outside `Error`, and
    /// `Error::RetriesExhausted` once `max_retries` retries have been spent
    /// without progress. Either way nothing changes.
    ///
    /// Progress means getting past the step that failed: a camera grant
    /// after a device failure, a lookup answer (found or not) after a lookup
    /// failure. Re-acquiring the camera alone does not refill the budget
    /// while lookups keep failing.
    pub fn retry(&mut self) -> Result<()> {
        self.require(ScanState::Error, ScanState::Acquiring)?;

        if self.session.retries >= self.config.max_retries {
            return Err(Error::RetriesExhausted {
                attempts: self.session.retries,
            });
        }

        self.machine.transition_to(ScanState::Acquiring)?;
        self.retrying_lookup = matches!(self.session.last_error, Some(ScanFailure::Lookup(_)));
        self.session.retries += 1;
        self.session.last_error = None;
        debug!(
            session = %self.session.id,
            retry = self.session.retries,
            max_retries = self.config.max_retries,
            "Retrying acquisition"
        );

        self.request_acquire();
        self.publish();
        Ok(())
    }

    /// Cancel, then start a fresh session.
    ///
    /// # Errors
    ///
    /// Only fails if the fresh start fails, which cannot happen after a
    /// cancel.
    pub fn restart(&mut self) -> Result<()> {
        self.cancel();
        self.start()
    }

    /// Look up the detected code.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` outside `Detected`.
    pub fn request_lookup(&mut self) -> Result<()> {
        self.require(ScanState::Detected, ScanState::LookingUp)?;

        let payload = self.session.decoded_payload.as_deref().unwrap_or_default();
        let code = ItemCode::new(payload)?;
        self.issue_lookup(code)?;
        self.publish();
        Ok(())
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Whatever the command itself returns.
    pub fn apply(&mut self, command: ScanCommand) -> Result<()> {
        match command {
            ScanCommand::Start => self.start(),
            ScanCommand::Cancel => {
                self.cancel();
                Ok(())
            }
            ScanCommand::Retry => self.retry(),
            ScanCommand::Restart => self.restart(),
            ScanCommand::Lookup => self.request_lookup(),
        }
    }

    // ----- event loop -----

    /// Wait for the next event.
    ///
    /// Completed in-flight work takes priority over frame ticks. Returns
    /// `None` when nothing is in flight and no tick is due, meaning the
    /// session will not move without a command.
    pub async fn next_event(&mut self) -> Option<ScanEvent<C::Stream>> {
        let generation = self.session.generation;
        let ticking = self.ticking();

        tokio::select! {
            biased;

            Some(event) = self.in_flight.next(), if !self.in_flight.is_empty() => Some(event),
            () = self.clock.tick(), if ticking => Some(ScanEvent::FrameTick { generation }),
            else => None,
        }
    }

    /// Apply an event.
    ///
    /// Returns `false` if the event was stale and ignored.
    pub fn handle_event(&mut self, event: ScanEvent<C::Stream>) -> bool {
        let applied = match event {
            ScanEvent::Acquired { generation, result } => self.on_acquired(generation, result),
            ScanEvent::FrameTick { generation } => self.on_frame_tick(generation),
            ScanEvent::LookupResolved {
                generation,
                code,
                result,
            } => self.on_lookup_resolved(generation, code, result),
        };

        self.publish();
        applied
    }

    /// Process one event.
    ///
    /// Returns `false` if nothing was pending.
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Process events until the session needs a command to move on.
    pub async fn drive(&mut self) {
        while self.step().await {}
    }

    /// Wait for all in-flight work to complete, without sampling frames.
    pub async fn settle(&mut self) {
        while let Some(event) = self.in_flight.next().await {
            self.handle_event(event);
        }
    }

    /// Cancel and wait until every acquisition has been handed back.
    pub async fn shutdown(&mut self) {
        self.cancel();
        self.settle().await;
    }

    /// Serve commands until the sender side closes, then shut down.
    ///
    /// Commands take priority over completions, and completions over frame
    /// ticks. Rejected commands are logged and otherwise ignored.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<ScanCommand>) {
        loop {
            let generation = self.session.generation;
            let ticking = self.ticking();

            let step = tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => Step::Command(command),
                    None => Step::Closed,
                },
                Some(event) = self.in_flight.next(), if !self.in_flight.is_empty() => Step::Event(event),
                () = self.clock.tick(), if ticking => Step::Event(ScanEvent::FrameTick { generation }),
            };

            match step {
                Step::Command(command) => {
                    if let Err(e) = self.apply(command) {
                        warn!(?command, state = %self.state(), error = %e, "Command rejected");
                    }
                }
                Step::Event(event) => {
                    self.handle_event(event);
                }
                Step::Closed => break,
            }
        }

        debug!(session = %self.session.id, "Command channel closed");
        self.shutdown().await;
    }

    // ----- event handlers -----

    fn on_acquired(
        &mut self,
        generation: Generation,
        result: std::result::Result<FrameSource<C::Stream>, DeviceError>,
    ) -> bool {
        self.acquisition_in_flight = false;

        let current = generation == self.session.generation
            && self.machine.current_state() == ScanState::Acquiring;

        let applied = if !current {
            match result {
                Ok(mut source) => {
                    debug!(%generation, handle = %source.id(), "Releasing stale camera grant");
                    source.release();
                }
                Err(e) => debug!(%generation, error = %e, "Discarding stale acquisition failure"),
            }
            false
        } else {
            match result {
                Ok(source) => {
                    self.source = Some(source);
                    if !self.retrying_lookup {
                        self.session.retries = 0;
                    }
                    self.advance(ScanState::Scanning);
                    self.tick_armed = true;
                }
                Err(e) => self.enter_error(ScanFailure::from(&e)),
            }
            true
        };

        if self.acquire_wanted && self.machine.current_state() == ScanState::Acquiring {
            self.request_acquire();
        }

        applied
    }

    fn on_frame_tick(&mut self, generation: Generation) -> bool {
        if generation != self.session.generation
            || self.machine.current_state() != ScanState::Scanning
        {
            debug!(%generation, "Discarding stale frame tick");
            return false;
        }

        self.tick_armed = false;

        let frame = match self.source.as_mut() {
            Some(source) => source.next_frame(),
            None => Err(DeviceError::disconnected(self.camera.info().name)),
        };

        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                self.enter_error(ScanFailure::from(&e));
                return true;
            }
        };

        self.session.frames_sampled += 1;

        match decode_frame(&self.decoder, &frame, &self.config.decode) {
            FrameOutcome::Decoded(payload) => match ItemCode::new(&payload) {
                Ok(code) => self.on_detected(code),
                Err(e) => {
                    debug!(error = %e, "Decoded payload is not an item code");
                    self.tick_armed = true;
                }
            },
            outcome => {
                trace!(?outcome, frames = self.session.frames_sampled, "No code in frame");
                self.tick_armed = true;
            }
        }

        true
    }

    fn on_detected(&mut self, code: ItemCode) {
        info!(
            session = %self.session.id,
            code = %code,
            frames = self.session.frames_sampled,
            "Code detected"
        );
        self.session.decoded_payload = Some(code.as_str().to_string());
        self.advance(ScanState::Detected);

        if self.config.auto_lookup {
            if let Err(e) = self.issue_lookup(code) {
                warn!(error = %e, "Automatic lookup not issued");
            }
        }
    }

    fn on_lookup_resolved(&mut self, generation: Generation, code: ItemCode, result: LookupResult) -> bool {
        if generation != self.session.generation
            || self.machine.current_state() != ScanState::LookingUp
        {
            debug!(%generation, code = %code, "Discarding stale lookup result");
            return false;
        }

        if !matches!(result, LookupResult::TransientError(_)) {
            self.session.retries = 0;
            self.retrying_lookup = false;
        }

        match result {
            LookupResult::Found(item) => {
                self.advance(ScanState::Done);
                self.release_source();
                info!(
                    session = %self.session.id,
                    code = %code,
                    item_id = %item.id,
                    item = %item.name,
                    "Code resolved"
                );

                let item_id = item.id;
                self.session.resolved = Some(item);
                self.navigator.on_resolved(item_id);
            }
            LookupResult::NotFound => {
                info!(session = %self.session.id, code = %code, "No item for code, scanning on");
                self.session.last_unmatched = Some(code);
                self.session.decoded_payload = None;
                self.advance(ScanState::Scanning);
                self.tick_armed = true;
            }
            LookupResult::TransientError(error) => {
                self.enter_error(ScanFailure::Lookup(error));
            }
        }

        true
    }

    // ----- helpers -----

    fn ticking(&self) -> bool {
        self.tick_armed && self.machine.current_state() == ScanState::Scanning
    }

    fn require(&self, expected: ScanState, target: ScanState) -> Result<()> {
        let current = self.machine.current_state();
        if current == expected {
            Ok(())
        } else {
            Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Take a transition the handlers have already checked.
    fn advance(&mut self, to: ScanState) {
        if let Err(e) = self.machine.transition_to(to) {
            warn!(error = %e, "Unexpected transition refused");
        }
    }

    fn enter_error(&mut self, failure: ScanFailure) {
        self.release_source();
        self.session.generation = self.session.generation.next();
        self.session.decoded_payload = None;
        self.tick_armed = false;
        self.acquire_wanted = false;

        warn!(
            session = %self.session.id,
            state = %self.machine.current_state(),
            error = %failure,
            "Scan failed"
        );
        self.session.last_error = Some(failure);
        self.advance(ScanState::Error);
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
        }
    }

    fn request_acquire(&mut self) {
        if self.acquisition_in_flight {
            debug!("Previous acquisition still pending, queueing");
            self.acquire_wanted = true;
            return;
        }

        self.acquire_wanted = false;
        self.acquisition_in_flight = true;

        let generation = self.session.generation;
        let camera = Arc::clone(&self.camera);
        let constraints = self.config.constraints.clone();

        self.in_flight.push(Box::pin(async move {
            let result = FrameSource::acquire(&*camera, &constraints).await;
            ScanEvent::Acquired { generation, result }
        }));
    }

    fn issue_lookup(&mut self, code: ItemCode) -> Result<()> {
        self.machine.transition_to(ScanState::LookingUp)?;

        let generation = self.session.generation;
        let lookup = Arc::clone(&self.lookup);
        let limit = self.config.lookup_timeout;
        debug!(code = %code, %generation, "Looking up code");

        self.in_flight.push(Box::pin(async move {
            let result = match tokio::time::timeout(limit, lookup.lookup(&code)).await {
                Ok(result) => result,
                Err(_) => {
                    let ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                    warn!(code = %code, timeout_ms = ms, "Lookup timed out");
                    LookupResult::TransientError(LookupError::Timeout(ms))
                }
            };
            ScanEvent::LookupResolved {
                generation,
                code,
                result,
            }
        }));

        Ok(())
    }

    fn publish(&mut self) {
        self.session.state = self.machine.current_state();
        self.updates.send_replace(self.session.clone());
    }
}

impl<C, D, L, N, K> fmt::Debug for ScanController<C, D, L, N, K>
where
    C: CameraDevice,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanController")
            .field("session", &self.session)
            .field("state", &self.machine.current_state())
            .field("source", &self.source)
            .field("in_flight", &self.in_flight.len())
            .field("tick_armed", &self.tick_armed)
            .field("retrying_lookup", &self.retrying_lookup)
            .finish_non_exhaustive()
    }
}
