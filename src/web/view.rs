use super::events::APP_UPDATED;
use crate::{coordinator::ShellView, transport::FetchResponse};
use js_sys::{Object, Reflect};
use tracing::{error, trace};
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit, Element, Response};

/// The shell element, reflecting shell state as `updating` and `url` attributes.
#[derive(Debug, Clone)]
pub struct ElementView {
	element: Element,
}

impl ElementView {
	#[must_use]
	pub fn new(element: Element) -> Self {
		Self { element }
	}

	fn dispatch_updated(&self, response: &Response) -> Result<(), JsValue> {
		let detail = Object::new();
		Reflect::set(&detail, &"response".into(), response)?;

		let init = CustomEventInit::new();
		init.set_bubbles(true);
		init.set_detail(&detail);
		let event = CustomEvent::new_with_event_init_dict(APP_UPDATED, &init)?;
		self.element.dispatch_event(&event).map(drop)
	}
}

impl ShellView<Response> for ElementView {
	type Root = Element;

	fn root(&self) -> Element {
		self.element.clone()
	}

	fn reflect_updating(&self, updating: bool) {
		let result = if updating {
			self.element.set_attribute("updating", "")
		} else {
			self.element.remove_attribute("updating")
		};
		if let Err(error) = result {
			error!("Failed to reflect `updating`: {:?}", error);
		}
	}

	fn reflect_url(&self, url: &str) {
		if let Err(error) = self.element.set_attribute("url", url) {
			error!("Failed to reflect `url`: {:?}", error);
		}
	}

	fn set_document_title(&self, title: &str) {
		match self.element.owner_document() {
			Some(document) => document.set_title(title),
			None => error!("Shell element has no owner document. Can't set the title."),
		}
	}

	fn app_updated(&self, response: &FetchResponse<Response>) {
		trace!("Dispatching {}", APP_UPDATED);
		if let Err(error) = self.dispatch_updated(&response.raw) {
			error!("Failed to dispatch {}: {:?}", APP_UPDATED, error);
		}
	}
}
