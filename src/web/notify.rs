use crate::notify::{DisplayedNotification, NotificationSink};
use js_sys::Reflect;
use tracing::{error, instrument, warn};
use wasm_bindgen::JsValue;
use web_sys::Element;

/// Renders notifications as custom elements inside the notification bar.
///
/// The bar is looked up in the shell element on each render, so it may be replaced by updates.
#[derive(Debug, Clone)]
pub struct NotificationBar {
	host: Element,
	bar_selector: String,
	element_name: String,
}

impl NotificationBar {
	pub fn new(host: Element, bar_selector: impl Into<String>, element_name: impl Into<String>) -> Self {
		Self {
			host,
			bar_selector: bar_selector.into(),
			element_name: element_name.into(),
		}
	}

	fn create(&self, notification: &DisplayedNotification) -> Result<Element, JsValue> {
		let document = self.host.owner_document().ok_or_else(|| JsValue::from_str("Shell element has no owner document"))?;
		let element = document.create_element(&self.element_name)?;
		Reflect::set(&element, &"type".into(), &JsValue::from_str(&notification.kind))?;
		Reflect::set(&element, &"timeout".into(), &JsValue::from(notification.timeout))?;
		Reflect::set(
			&element,
			&"details".into(),
			&notification.details.as_deref().map_or(JsValue::UNDEFINED, JsValue::from_str),
		)?;
		Reflect::set(&element, &"copyable".into(), &JsValue::from_bool(notification.copyable))?;
		element.set_inner_html(&notification.content);
		Ok(element)
	}
}

impl NotificationSink for NotificationBar {
	#[instrument(skip(self, notification), fields(kind = notification.kind.as_str()))]
	fn render(&self, notification: &DisplayedNotification) {
		let bar = match self.host.query_selector(&self.bar_selector) {
			Ok(Some(bar)) => bar,
			Ok(None) => return warn!("No notification bar matches {:?}. Dropping notification.", self.bar_selector),
			Err(error) => return error!("Failed to look up the notification bar: {:?}", error),
		};

		match self.create(notification) {
			Ok(element) => {
				if let Err(error) = bar.append_child(&element) {
					error!("Failed to append notification: {:?}", error);
				}
			}
			Err(error) => error!("Failed to create notification: {:?}", error),
		}
	}
}
