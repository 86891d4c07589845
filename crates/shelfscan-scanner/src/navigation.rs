//! Hand-off of resolved items to the rest of the application.

use shelfscan_core::ItemId;
use tokio::sync::mpsc;
use tracing::warn;

/// Receives the item a successful session resolved to.
///
/// Called exactly once per successful session, and never for a session
/// that was cancelled before its lookup came back.
pub trait Navigator: Send {
    fn on_resolved(&mut self, item_id: ItemId);
}

/// Navigator that forwards resolved ids over a channel.
///
/// # Examples
///
/// ```
/// use shelfscan_core::ItemId;
/// use shelfscan_scanner::{ChannelNavigator, Navigator};
///
/// let (mut navigator, mut rx) = ChannelNavigator::new();
/// navigator.on_resolved(ItemId::new(42));
///
/// assert_eq!(rx.try_recv().unwrap(), ItemId::new(42));
/// ```
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<ItemId>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ItemId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn on_resolved(&mut self, item_id: ItemId) {
        if self.tx.send(item_id).is_err() {
            warn!(%item_id, "Navigation receiver dropped, resolved item discarded");
        }
    }
}

/// Navigator that ignores resolutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn on_resolved(&mut self, _item_id: ItemId) {}
}
