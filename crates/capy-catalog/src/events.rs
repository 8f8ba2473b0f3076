//! Change notifications for the presentation layer.
//!
//! Uses tokio::sync::broadcast so every view gets every event.

use crate::view::View;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Broadcast channel capacity.
/// Lagging receivers skip old events; views re-pull state anyway.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum CatalogEvent {
    /// Items of `View` may have changed. `View::All` means every view.
    DataChanged(View),
    CategoryListChanged,
    NewInstallListChanged,
    /// Show or hide the "No search results" hint.
    SearchTips { no_results: bool },
    /// Backend could not be reached; the catalog kept its previous state.
    BackendUnavailable(String),
}

#[derive(Clone, Debug)]
pub struct EventSender {
    tx: Sender<CatalogEvent>,
}

impl EventSender {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Non-blocking. Dropped when nobody listens.
    #[inline]
    pub fn send(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain pending events without blocking. Lagged receivers keep draining.
pub fn drain(rx: &mut Receiver<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}
