use crate::history::{HistoryEntry, HistoryProvider};
use serde::Serialize;
use wasm_bindgen::JsValue;
use web_sys::History;

/// [`HistoryProvider`] over `window.history`.
#[derive(Debug, Clone)]
pub struct WindowHistory(pub History);

impl WindowHistory {
	fn state(entry: &HistoryEntry) -> Result<JsValue, JsValue> {
		Ok(entry.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
	}
}

impl HistoryProvider for WindowHistory {
	type Error = JsValue;

	fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), JsValue> {
		self.0.push_state_with_url(&Self::state(entry)?, title, Some(url))
	}

	fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), JsValue> {
		self.0.replace_state_with_url(&Self::state(entry)?, title, Some(url))
	}
}

/// Reads a `popstate` state. Anything that isn't shaped like a [`HistoryEntry`] yields `None`.
#[must_use]
pub fn read_state(state: JsValue) -> Option<HistoryEntry> {
	if state.is_null() || state.is_undefined() {
		return None;
	}
	serde_wasm_bindgen::from_value(state).ok()
}
