use super::events::{CANCEL, CONFIRM};
use core::cell::RefCell;
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use tracing::{instrument, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Element, Event};

fn own_entries(object: &JsValue) -> Result<Vec<(JsValue, JsValue)>, JsValue> {
	match object.dyn_ref::<Object>() {
		Some(object) => Object::keys(object).iter().map(|key| Reflect::get(object, &key).map(|value| (key, value))).collect(),
		None => Ok(vec![]),
	}
}

/// Opens the content picker for an `ez:contentDiscover` `detail`.
///
/// `detail.config` is assigned property by property, `detail.listeners` maps event names to functions.
/// The picker removes itself once confirmed or cancelled.
///
/// # Errors
///
/// Iff the picker couldn't be created or attached.
#[instrument(skip(host, detail))]
pub fn open_picker(host: &Element, element_name: &str, detail: &JsValue) -> Result<Element, JsValue> {
	let document = host.owner_document().ok_or_else(|| JsValue::from_str("Shell element has no owner document"))?;
	let picker = document.create_element(element_name)?;

	for (key, value) in own_entries(&Reflect::get(detail, &"config".into())?)? {
		Reflect::set(&picker, &key, &value)?;
	}

	for (name, listener) in own_entries(&Reflect::get(detail, &"listeners".into())?)? {
		match (name.as_string(), listener.dyn_ref::<Function>()) {
			(Some(name), Some(listener)) => picker.add_event_listener_with_callback(&name, listener)?,
			_ => warn!("Ignoring picker listener {:?}: Not a function.", name),
		}
	}

	// Holds the closing listener until it runs, which detaches and frees it.
	let slot: Rc<RefCell<Option<Closure<dyn FnMut(Event)>>>> = Rc::default();
	let remove = Closure::wrap(Box::new({
		let picker = picker.clone();
		let slot = Rc::clone(&slot);
		move |_: Event| {
			trace!("Closing content picker.");
			picker.remove();

			let remove = slot.borrow_mut().take();
			if let Some(remove) = remove {
				for event in [CONFIRM, CANCEL] {
					if let Err(error) = picker.remove_event_listener_with_callback(event, remove.as_ref().unchecked_ref()) {
						warn!("Failed to detach picker listener for {}: {:?}", event, error);
					}
				}
			}
		}
	}) as Box<dyn FnMut(Event)>);
	picker.add_event_listener_with_callback(CONFIRM, remove.as_ref().unchecked_ref())?;
	picker.add_event_listener_with_callback(CANCEL, remove.as_ref().unchecked_ref())?;
	*slot.borrow_mut() = Some(remove);

	host.append_child(&picker)?;
	Ok(picker)
}
