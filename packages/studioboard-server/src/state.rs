/// Shared application state passed to axum handlers.
use std::sync::Arc;
use studioboard_core::events::BoardChangeEvent;
use studioboard_core::SqliteStorage;
use tokio::sync::broadcast;

use crate::preferences::PreferenceStore;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SqliteStorage>,
    pub event_tx: broadcast::Sender<BoardChangeEvent>,
    pub prefs: Arc<PreferenceStore>,
    pub port: u16,
    pub bind_address: String,
}

impl AppState {
    pub fn new(storage: Arc<SqliteStorage>, port: u16, bind_address: String) -> Self {
        let (event_tx, _event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            prefs: Arc::new(PreferenceStore::default()),
            port,
            bind_address,
        }
    }

    /// Notify subscribers of a committed change. No subscribers is fine.
    pub fn publish(&self, event: BoardChangeEvent) {
        let _ = self.event_tx.send(event);
    }
}
