//! Event names and listener registration.

use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Event, EventTarget};

/// Dispatched (bubbling) on the shell element after each applied response. `detail.response` is the `Response`.
pub const APP_UPDATED: &str = "ez:app:updated";
/// `detail.url`: Navigates to that URL.
pub const NAVIGATE_TO: &str = "ez:navigateTo";
/// `detail.notification`: Displays that notification.
pub const NOTIFY: &str = "ez:notify";
/// `detail.config` and `detail.listeners`: Opens the content picker.
pub const CONTENT_DISCOVER: &str = "ez:contentDiscover";
/// Dispatched by the content picker when it should close.
pub const CONFIRM: &str = "ez:confirm";
pub const CANCEL: &str = "ez:cancel";

/// An event listener that is removed again when this handle is dropped.
pub struct EventListener {
	target: EventTarget,
	name: &'static str,
	closure: Closure<dyn FnMut(Event)>,
}

impl EventListener {
	/// # Errors
	///
	/// Iff the platform refuses the listener.
	pub fn new(target: &EventTarget, name: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, wasm_bindgen::JsValue> {
		let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
		target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
		trace!("Listening for {}", name);
		Ok(Self {
			target: target.clone(),
			name,
			closure,
		})
	}
}

impl Drop for EventListener {
	fn drop(&mut self) {
		if let Err(error) = self.target.remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref()) {
			error!("Failed to remove {} listener: {:?}", self.name, error);
		}
	}
}

impl core::fmt::Debug for EventListener {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("EventListener").field("target", &self.target).field("name", &self.name).finish_non_exhaustive()
	}
}
