//! [`web_sys::Element`] as patch target and navigation node, and reading forms out of the document.

use crate::{
	form::{ControlKind, FormControl, FormDescriptor, FormMethod, SelectOption},
	intercept::NavigationNode,
	patch::PatchTarget,
};
use js_sys::Reflect;
use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, trace, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlAnchorElement, HtmlButtonElement, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement};

impl PatchTarget for Element {
	type Error = JsValue;

	fn replace_content(&self, markup: &str) {
		self.set_inner_html(markup);
	}

	fn set_attribute(&self, name: &str, value: &str) -> Result<(), JsValue> {
		Element::set_attribute(self, name, value)
	}

	/// Assigns the JS equivalent of `value`. Objects become plain objects, not `Map`s.
	fn set_property(&self, name: &str, value: &Value) -> Result<(), JsValue> {
		let value = value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?;
		Reflect::set(self, &JsValue::from_str(name), &value).map(drop)
	}

	fn query_selector(&self, selector: &str) -> Result<Option<Self>, JsValue> {
		Element::query_selector(self, selector)
	}
}

impl NavigationNode for Element {
	fn closest(&self, selector: &str) -> Option<Self> {
		Element::closest(self, selector).unwrap_or_else(|error| {
			warn!("Invalid selector {:?}: {:?}", selector, error);
			None
		})
	}

	fn matches(&self, selector: &str) -> bool {
		Element::matches(self, selector).unwrap_or_else(|error| {
			warn!("Invalid selector {:?}: {:?}", selector, error);
			false
		})
	}

	fn attribute(&self, name: &str) -> Option<String> {
		self.get_attribute(name)
	}

	fn resolved_href(&self) -> String {
		self.dyn_ref::<HtmlAnchorElement>().map(HtmlAnchorElement::href).unwrap_or_default()
	}
}

/// Serializes `form` as it would be submitted by `submitter`.
///
/// `None` for methods the shell doesn't handle (`dialog`).
#[instrument(skip(form, submitter))]
pub fn read_form(form: &HtmlFormElement, submitter: Option<&HtmlElement>) -> Option<FormDescriptor> {
	let method = FormMethod::parse(&form.method())?;

	let elements = form.elements();
	let controls: Vec<FormControl> = (0..elements.length()).filter_map(|i| elements.item(i)).filter_map(|element| read_control(&element)).collect();
	trace!("Read {} control(s).", controls.len());

	let submitter = submitter.and_then(submitter_entry);
	Some(FormDescriptor::from_controls(
		method,
		form.action(),
		&controls,
		submitter.as_ref().map(|(name, value)| (name.as_str(), value.as_str())),
	))
}

fn read_control(element: &Element) -> Option<FormControl> {
	if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
		let kind = match input.type_().to_ascii_lowercase().as_str() {
			"checkbox" => ControlKind::Checkbox {
				checked: input.checked(),
				value: input.value(),
			},
			"radio" => ControlKind::Radio {
				checked: input.checked(),
				value: input.value(),
			},
			"button" | "image" | "reset" | "submit" => ControlKind::Button,
			_ => ControlKind::Value(input.value()),
		};
		Some(FormControl {
			name: input.name(),
			disabled: input.disabled(),
			kind,
		})
	} else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
		let kind = if select.multiple() {
			let options = select.options();
			ControlKind::SelectMultiple {
				options: (0..options.length())
					.filter_map(|i| options.item(i))
					.filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
					.map(|option| SelectOption {
						value: option.value(),
						selected: option.selected(),
					})
					.collect(),
			}
		} else {
			ControlKind::SelectOne {
				selected: (select.selected_index() >= 0).then(|| select.value()),
			}
		};
		Some(FormControl {
			name: select.name(),
			disabled: select.disabled(),
			kind,
		})
	} else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
		Some(FormControl {
			name: textarea.name(),
			disabled: textarea.disabled(),
			kind: ControlKind::Value(textarea.value()),
		})
	} else if let Some(button) = element.dyn_ref::<HtmlButtonElement>() {
		Some(FormControl {
			name: button.name(),
			disabled: button.disabled(),
			kind: ControlKind::Button,
		})
	} else {
		None
	}
}

fn submitter_entry(submitter: &HtmlElement) -> Option<(String, String)> {
	if let Some(button) = submitter.dyn_ref::<HtmlButtonElement>() {
		Some((button.name(), button.value()))
	} else {
		submitter.dyn_ref::<HtmlInputElement>().map(|input| (input.name(), input.value()))
	}
}
