use serde::Deserialize;
use thiserror::Error;

/// Markup conventions and protocol constants of an [`AppShell`](`crate::shell::AppShell`).
///
/// Every field has a default, so partial overrides (for example from a JS object passed to [`enhance`](`crate::web::enhance`)) are fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShellConfig {
	/// Class that, on a link or any of its ancestors, leaves the click to the browser.
	pub standard_navigation_class: String,
	/// Class that, on a form or any of its ancestors, leaves the submission to the browser.
	pub standard_form_class: String,
	pub update_header_name: String,
	pub update_header_value: String,
	/// Response header carrying a profiler link, surfaced when a response can't be decoded.
	pub debug_link_header: String,
	pub notification_bar_selector: String,
	pub notification_element: String,
	pub discovery_element: String,
	/// In seconds. Applies to notifications without an explicit timeout.
	pub default_timeout: u32,
	/// In seconds. `0` keeps the notification until dismissed.
	pub default_error_timeout: u32,
	/// Maximum nesting of `children` in an update tree.
	pub depth_limit: usize,
}

impl Default for ShellConfig {
	fn default() -> Self {
		Self {
			standard_navigation_class: "ez-js-standard-navigation".to_owned(),
			standard_form_class: "ez-js-standard-form".to_owned(),
			update_header_name: "X-AJAX-Update".to_owned(),
			update_header_value: "1".to_owned(),
			debug_link_header: "X-Debug-Token-Link".to_owned(),
			notification_bar_selector: "#ez-notification-bar".to_owned(),
			notification_element: "ez-notification".to_owned(),
			discovery_element: "ez-universal-discovery".to_owned(),
			default_timeout: 10,
			default_error_timeout: 0,
			depth_limit: 64,
		}
	}
}

impl ShellConfig {
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		serde_json::from_str(json).map_err(ConfigError::Json)
	}

	/// Selector matching an opted-out link, whether the class sits on the link itself or on an ancestor.
	#[must_use]
	pub fn standard_navigation_selector(&self) -> String {
		format!(".{0}, .{0} a", self.standard_navigation_class)
	}

	/// Selector matching an opted-out form, whether the class sits on the form itself or on an ancestor.
	#[must_use]
	pub fn standard_form_selector(&self) -> String {
		format!(".{0}, .{0} form", self.standard_form_class)
	}
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Invalid shell configuration JSON: {0}")]
	Json(#[source] serde_json::Error),
	#[error("Invalid shell configuration object: {0}")]
	Object(String),
}
