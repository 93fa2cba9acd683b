use crate::config::ShellConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{instrument, trace};

/// The notification type that defaults to staying on screen.
pub const ERROR: &str = "error";

/// A message for the user, as received from `ez:notify` events, the server or the shell itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
	/// `error`, `processing`, `positive`, … Empty if missing.
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Markup.
	#[serde(default)]
	pub content: String,
	/// In seconds, `0` meaning it stays until dismissed. Numeric strings are accepted, anything else counts as unset.
	#[serde(default, deserialize_with = "lenient_timeout")]
	pub timeout: Option<u32>,
	#[serde(default)]
	pub details: Option<String>,
	/// Anything truthy counts.
	#[serde(default, deserialize_with = "lenient_flag")]
	pub copyable: bool,
}

impl Notification {
	#[must_use]
	pub fn error(content: impl Into<String>) -> Self {
		Self {
			kind: ERROR.to_owned(),
			content: content.into(),
			..Self::default()
		}
	}
}

/// A [`Notification`] with its timeout settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedNotification {
	pub kind: String,
	pub content: String,
	pub timeout: u32,
	pub details: Option<String>,
	pub copyable: bool,
}

/// Where notifications end up. Each rendered notification is responsible for its own expiry.
pub trait NotificationSink {
	fn render(&self, notification: &DisplayedNotification);
}

#[derive(Debug)]
pub struct NotificationRelay<S> {
	sink: S,
	default_timeout: u32,
	default_error_timeout: u32,
}

impl<S: NotificationSink> NotificationRelay<S> {
	pub fn new(config: &ShellConfig, sink: S) -> Self {
		Self {
			sink,
			default_timeout: config.default_timeout,
			default_error_timeout: config.default_error_timeout,
		}
	}

	/// Renders `notifications` in order. Nothing is deduplicated or replaced.
	#[instrument(skip(self, notifications))]
	pub fn notify(&self, notifications: impl IntoIterator<Item = Notification>) {
		for notification in notifications {
			let timeout = notification.timeout.unwrap_or(if notification.kind == ERROR { self.default_error_timeout } else { self.default_timeout });
			trace!("Rendering {:?} notification ({}s).", notification.kind, timeout);
			self.sink.render(&DisplayedNotification {
				kind: notification.kind,
				content: notification.content,
				timeout,
				details: notification.details,
				copyable: notification.copyable,
			});
		}
	}
}

fn lenient_timeout<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Number(number) => number
			.as_u64()
			.or_else(|| number.as_f64().filter(|seconds| seconds.is_finite() && *seconds >= 0.).map(|seconds| seconds.trunc() as u64))
			.and_then(|seconds| u32::try_from(seconds).ok()),
		Value::String(string) => {
			let string = string.trim_start();
			let digits = string.find(|c: char| !c.is_ascii_digit()).unwrap_or(string.len());
			string[..digits].parse().ok()
		}
		_ => None,
	})
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::Null => false,
		Value::Bool(flag) => flag,
		Value::Number(number) => number.as_f64().map_or(false, |number| number != 0.),
		Value::String(string) => !string.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	})
}
