//! Scripted lookup client for testing and development.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use shelfscan_core::ItemCode;

use crate::{LookupClient, LookupResult};

#[derive(Debug, Default)]
struct Script {
    results: VecDeque<LookupResult>,
    delay: Option<Duration>,
    requests: Vec<ItemCode>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lookup client answering from a queue.
///
/// Once the queue is empty every lookup resolves to
/// [`LookupResult::NotFound`].
///
/// # Examples
///
/// ```
/// use shelfscan_core::{ItemCode, ItemId, Item};
/// use shelfscan_lookup::mock::MockLookup;
/// use shelfscan_lookup::{LookupClient, LookupResult};
///
/// #[tokio::main]
/// async fn main() {
///     let (client, handle) = MockLookup::new();
///     handle.push(LookupResult::NotFound);
///
///     let code = ItemCode::new("ITM-42").unwrap();
///     assert_eq!(client.lookup(&code).await, LookupResult::NotFound);
///     assert_eq!(handle.requests(), vec![code]);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockLookup {
    script: Arc<Mutex<Script>>,
}

impl MockLookup {
    pub fn new() -> (Self, MockLookupHandle) {
        let script = Arc::new(Mutex::new(Script::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            MockLookupHandle { script },
        )
    }
}

impl LookupClient for MockLookup {
    async fn lookup(&self, code: &ItemCode) -> LookupResult {
        let delay = {
            let mut script = lock(&self.script);
            script.requests.push(code.clone());
            script.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.script)
            .results
            .pop_front()
            .unwrap_or(LookupResult::NotFound)
    }
}

/// Handle for scripting a [`MockLookup`].
#[derive(Debug, Clone)]
pub struct MockLookupHandle {
    script: Arc<Mutex<Script>>,
}

impl MockLookupHandle {
    /// Queue the answer to one lookup.
    pub fn push(&self, result: LookupResult) {
        lock(&self.script).results.push_back(result);
    }

    /// Make every subsequent lookup take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.script).delay = Some(delay);
    }

    /// Codes looked up so far, in order.
    pub fn requests(&self) -> Vec<ItemCode> {
        lock(&self.script).requests.clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.script).requests.len()
    }
}
