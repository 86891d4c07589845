//! Scan session state machine.
//!
//! This module holds the legal state graph of a scan session and records
//! every transition taken, from camera acquisition through sampling,
//! detection and lookup.
//!
//! # States
//!
//! - `Idle`: No camera held, nothing in flight
//! - `Acquiring`: Waiting for the camera
//! - `Scanning`: Sampling one frame per refresh tick
//! - `Detected`: A code was decoded; the camera is still held
//! - `LookingUp`: Resolving the code against the inventory
//! - `Error`: Acquisition, the stream or the lookup failed; retryable
//! - `Done`: The code resolved to an item
//!
//! # Valid Transitions
//!
//! - Idle → Acquiring → Scanning → Detected → LookingUp → Done
//! - Acquiring → Error, Scanning → Error, LookingUp → Error
//! - LookingUp → Scanning (code not found, keep looking)
//! - Error → Acquiring (retry)
//! - any → Idle (cancel), through [`StateMachine::reset`]
//!
//! A frame without a symbol keeps the session in `Scanning`; that self-loop
//! is not a transition and is not recorded.
//!
//! # Examples
//!
//! ```
//! use shelfscan_scanner::{ScanState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), ScanState::Idle);
//!
//! machine.transition_to(ScanState::Acquiring).unwrap();
//! machine.transition_to(ScanState::Scanning).unwrap();
//!
//! // Lookup before detection is rejected
//! assert!(machine.transition_to(ScanState::LookingUp).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use shelfscan_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A successful scan takes five transitions, so this covers the last twenty
/// sessions of a long-running scanner.
pub const MAX_HISTORY_SIZE: usize = 100;

/// States of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    /// Initial state, and the state after cancellation.
    Idle,

    /// Camera requested, not yet granted.
    Acquiring,

    /// Camera held, frames being sampled.
    Scanning,

    /// A payload was decoded. Sampling has stopped.
    Detected,

    /// The decoded code is being resolved.
    LookingUp,

    /// Something failed. The camera has been released.
    Error,

    /// The code resolved to an item.
    Done,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ScanState::Idle => "Idle",
            ScanState::Acquiring => "Acquiring",
            ScanState::Scanning => "Scanning",
            ScanState::Detected => "Detected",
            ScanState::LookingUp => "LookingUp",
            ScanState::Error => "Error",
            ScanState::Done => "Done",
        };
        write!(f, "{}", state_str)
    }
}

impl ScanState {
    /// Check if transition to target state is valid from this state.
    ///
    /// Cancellation (`any → Idle`) is not a regular transition; it goes
    /// through [`StateMachine::reset`].
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfscan_scanner::ScanState;
    ///
    /// assert!(ScanState::Idle.can_transition_to(&ScanState::Acquiring));
    /// assert!(ScanState::LookingUp.can_transition_to(&ScanState::Scanning));
    /// assert!(!ScanState::Done.can_transition_to(&ScanState::Scanning));
    /// ```
    pub fn can_transition_to(&self, target: &ScanState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (ScanState::Idle, ScanState::Acquiring)
            // From Acquiring
            | (ScanState::Acquiring, ScanState::Scanning | ScanState::Error)
            // From Scanning
            | (ScanState::Scanning, ScanState::Detected | ScanState::Error)
            // From Detected
            | (ScanState::Detected, ScanState::LookingUp)
            // From LookingUp
            | (ScanState::LookingUp, ScanState::Done | ScanState::Scanning | ScanState::Error)
            // From Error
            | (ScanState::Error, ScanState::Acquiring)
        )
    }

    /// Whether the session holds, or is waiting for, the camera.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfscan_scanner::ScanState;
    ///
    /// assert!(ScanState::Scanning.holds_camera());
    /// assert!(!ScanState::Error.holds_camera());
    /// ```
    pub fn holds_camera(&self) -> bool {
        matches!(
            self,
            ScanState::Acquiring | ScanState::Scanning | ScanState::Detected | ScanState::LookingUp
        )
    }

    /// Whether nothing further happens without a user command.
    pub fn is_settled(&self) -> bool {
        matches!(self, ScanState::Idle | ScanState::Error | ScanState::Done)
    }
}

/// A single state transition with timestamp.
///
/// # Serialization Note
///
/// `timestamp` is process-local and not serialized; deserialized records
/// carry the time of deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ScanState,

    pub to: ScanState,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: ScanState, to: ScanState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine for a scan session.
///
/// Not thread-safe; the scan controller owns it and is its only mutator.
#[derive(Debug, Clone)]
pub struct StateMachine {
    current_state: ScanState,

    state_entered_at: Instant,

    /// Recent transitions, oldest first, at most `MAX_HISTORY_SIZE`.
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the `Idle` state.
    pub fn new() -> Self {
        Self {
            current_state: ScanState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Create a builder, for restoring a machine in a given state.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfscan_scanner::{ScanState, StateMachine};
    ///
    /// let machine = StateMachine::builder()
    ///     .with_initial_state(ScanState::Error)
    ///     .build();
    ///
    /// assert_eq!(machine.current_state(), ScanState::Error);
    /// ```
    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    pub fn current_state(&self) -> ScanState {
        self.current_state
    }

    /// Time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the graph does not allow
    /// the move; the machine is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelfscan_scanner::{ScanState, StateMachine};
    ///
    /// let mut machine = StateMachine::new();
    ///
    /// let transition = machine.transition_to(ScanState::Acquiring).unwrap();
    /// assert_eq!(transition.from, ScanState::Idle);
    ///
    /// assert!(machine.transition_to(ScanState::Done).is_err());
    /// assert_eq!(machine.current_state(), ScanState::Acquiring);
    /// ```
    pub fn transition_to(&mut self, new_state: ScanState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());

        Ok(transition)
    }

    /// Return to `Idle` from any state.
    ///
    /// Returns `None`, recording nothing, if the machine is already idle.
    pub fn reset(&mut self) -> Option<StateTransition> {
        if self.current_state == ScanState::Idle {
            return None;
        }

        let transition = StateTransition::new(self.current_state, ScanState::Idle);
        self.perform_state_change(ScanState::Idle, transition.clone());
        Some(transition)
    }

    fn perform_state_change(&mut self, new_state: ScanState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`StateMachine`].
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: ScanState,
    history: VecDeque<StateTransition>,
}

impl StateMachineBuilder {
    pub fn with_initial_state(mut self, state: ScanState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            current_state: self.initial_state,
            state_entered_at: Instant::now(),
            history: self.history,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: ScanState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALL_STATES: [ScanState; 7] = [
        ScanState::Idle,
        ScanState::Acquiring,
        ScanState::Scanning,
        ScanState::Detected,
        ScanState::LookingUp,
        ScanState::Error,
        ScanState::Done,
    ];

    fn machine_in(state: ScanState) -> StateMachine {
        StateMachine::builder().with_initial_state(state).build()
    }

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), ScanState::Idle);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(ScanState::Idle, ScanState::Acquiring)]
    #[case(ScanState::Acquiring, ScanState::Scanning)]
    #[case(ScanState::Acquiring, ScanState::Error)]
    #[case(ScanState::Scanning, ScanState::Detected)]
    #[case(ScanState::Scanning, ScanState::Error)]
    #[case(ScanState::Detected, ScanState::LookingUp)]
    #[case(ScanState::LookingUp, ScanState::Done)]
    #[case(ScanState::LookingUp, ScanState::Scanning)]
    #[case(ScanState::LookingUp, ScanState::Error)]
    #[case(ScanState::Error, ScanState::Acquiring)]
    fn test_valid_transition(#[case] from: ScanState, #[case] to: ScanState) {
        let mut machine = machine_in(from);

        let transition = machine.transition_to(to).unwrap();

        assert_eq!(machine.current_state(), to);
        assert_eq!((transition.from, transition.to), (from, to));
    }

    #[rstest]
    #[case(ScanState::Idle, ScanState::Scanning)]
    #[case(ScanState::Idle, ScanState::Done)]
    #[case(ScanState::Acquiring, ScanState::Detected)]
    #[case(ScanState::Scanning, ScanState::LookingUp)]
    #[case(ScanState::Scanning, ScanState::Scanning)]
    #[case(ScanState::Detected, ScanState::Done)]
    #[case(ScanState::Error, ScanState::Scanning)]
    #[case(ScanState::Done, ScanState::Acquiring)]
    fn test_invalid_transition(#[case] from: ScanState, #[case] to: ScanState) {
        let mut machine = machine_in(from);

        let result = machine.transition_to(to);

        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
        assert_eq!(machine.current_state(), from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_idle_is_only_reachable_through_reset() {
        for state in ALL_STATES {
            assert!(!state.can_transition_to(&ScanState::Idle), "{state}");
        }
    }

    #[test]
    fn test_reset_from_every_state() {
        for state in ALL_STATES {
            let mut machine = machine_in(state);
            let transition = machine.reset();

            assert_eq!(machine.current_state(), ScanState::Idle);
            if state == ScanState::Idle {
                assert!(transition.is_none());
                assert!(machine.history().is_empty());
            } else {
                let transition = transition.unwrap();
                assert_eq!((transition.from, transition.to), (state, ScanState::Idle));
            }
        }
    }

    #[test]
    fn test_successful_scan_history() {
        let mut machine = StateMachine::new();

        for state in [
            ScanState::Acquiring,
            ScanState::Scanning,
            ScanState::Detected,
            ScanState::LookingUp,
            ScanState::Done,
        ] {
            machine.transition_to(state).unwrap();
        }

        let path: Vec<_> = machine.history().iter().map(|t| t.to).collect();
        assert_eq!(
            path,
            vec![
                ScanState::Acquiring,
                ScanState::Scanning,
                ScanState::Detected,
                ScanState::LookingUp,
                ScanState::Done
            ]
        );
    }

    #[test]
    fn test_last_transitions_returns_most_recent() {
        let mut machine = StateMachine::new();
        machine.transition_to(ScanState::Acquiring).unwrap();
        machine.transition_to(ScanState::Error).unwrap();
        machine.transition_to(ScanState::Acquiring).unwrap();

        let last_two = machine.last_transitions(2);
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].to, ScanState::Error);
        assert_eq!(last_two[1].to, ScanState::Acquiring);
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();

        for _ in 0..150 {
            machine.transition_to(ScanState::Acquiring).unwrap();
            machine.transition_to(ScanState::Error).unwrap();
            machine.reset();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        assert_eq!(machine.history().back().unwrap().to, ScanState::Idle);
    }

    #[test]
    fn test_holds_camera() {
        let holding: Vec<_> = ALL_STATES.iter().filter(|s| s.holds_camera()).collect();
        assert_eq!(
            holding,
            vec![
                &ScanState::Acquiring,
                &ScanState::Scanning,
                &ScanState::Detected,
                &ScanState::LookingUp
            ]
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ScanState::LookingUp).unwrap();
        assert_eq!(json, r#""looking_up""#);
    }

    #[test]
    fn test_state_display_formatting() {
        assert_eq!(ScanState::LookingUp.to_string(), "LookingUp");
        assert_eq!(ScanState::Done.to_string(), "Done");
    }
}
