use core::fmt::Debug;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

/// The state stored with each history entry the shell creates.
///
/// Deserializing is lenient so that foreign state objects simply fail [`HistoryController::restore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	#[serde(default)]
	pub url: String,
	/// Set on every entry the shell writes, telling them apart from entries created by other scripts.
	#[serde(default)]
	pub enhanced: bool,
}

impl HistoryEntry {
	#[must_use]
	pub fn enhanced(url: impl Into<String>) -> Self {
		Self { url: url.into(), enhanced: true }
	}
}

/// Access to the session history, `window.history` in a browser.
pub trait HistoryProvider {
	type Error: Debug;

	fn push_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), Self::Error>;
	fn replace_state(&self, entry: &HistoryEntry, title: &str, url: &str) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub struct HistoryController<H> {
	provider: H,
}

impl<H: HistoryProvider> HistoryController<H> {
	pub fn new(provider: H) -> Self {
		Self { provider }
	}

	pub fn push_entry(&self, url: &str, title: &str) {
		trace!("Pushing history entry for {}", url);
		if let Err(error) = self.provider.push_state(&HistoryEntry::enhanced(url), title, url) {
			error!("Failed to push history entry for {}: {:?}", url, error);
		}
	}

	pub fn replace_entry(&self, url: &str, title: &str) {
		trace!("Replacing history entry with {}", url);
		if let Err(error) = self.provider.replace_state(&HistoryEntry::enhanced(url), title, url) {
			error!("Failed to replace history entry with {}: {:?}", url, error);
		}
	}

	/// The URL to restore for a `popstate` state, or `None` if the entry wasn't written by the shell.
	#[must_use]
	pub fn restore(&self, state: Option<&HistoryEntry>) -> Option<String> {
		match state {
			Some(HistoryEntry { url, enhanced: true }) if !url.is_empty() => Some(url.clone()),
			_ => {
				trace!("Not an enhanced history entry: {:?}", state);
				None
			}
		}
	}
}
