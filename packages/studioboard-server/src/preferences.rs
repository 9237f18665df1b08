/// Per-client key-value preferences, kept in memory.
///
/// Clients identify themselves with the `x-client-id` header; requests
/// without one share the `anonymous` slot.
use axum::http::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use studioboard_core::types::BoardId;

pub const CLIENT_HEADER: &str = "x-client-id";
pub const ANONYMOUS_CLIENT: &str = "anonymous";
pub const CURRENT_BOARD_KEY: &str = "current_board";

pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get(CLIENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

#[derive(Default)]
pub struct PreferenceStore {
    values: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl PreferenceStore {
    pub fn get(&self, client: &str, key: &str) -> Option<Value> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(client).and_then(|prefs| prefs.get(key)).cloned()
    }

    pub fn set(&self, client: &str, key: &str, value: Value) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values
            .entry(client.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, client: &str, key: &str) -> Option<Value> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.get_mut(client).and_then(|prefs| prefs.remove(key))
    }

    pub fn current_board(&self, client: &str) -> Option<BoardId> {
        self.get(client, CURRENT_BOARD_KEY).and_then(|v| v.as_i64())
    }

    pub fn remember_board(&self, client: &str, board_id: BoardId) {
        self.set(client, CURRENT_BOARD_KEY, Value::from(board_id));
    }
}
