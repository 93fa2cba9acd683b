//! Browser bindings: the platform implementations of the shell's collaborators, and mounting onto an element.

mod discovery;
mod dom;
pub mod events;
mod fetch;
mod history;
mod notify;
mod view;

pub use discovery::open_picker;
pub use dom::read_form;
pub use fetch::FetchTransport;
pub use history::{read_state, WindowHistory};
pub use notify::NotificationBar;
pub use view::ElementView;

use crate::{
	config::{ConfigError, ShellConfig},
	coordinator::UpdateCoordinator,
	notify::Notification,
	shell::AppShell,
};
use events::{EventListener, CONTENT_DISCOVER, NAVIGATE_TO, NOTIFY};
use futures::FutureExt;
use js_sys::Reflect;
use std::{rc::Rc, sync::Once};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{CustomEvent, Element, Event, EventTarget, HtmlFormElement, PopStateEvent, SubmitEvent};

pub type WebShell = AppShell<FetchTransport, WindowHistory, ElementView, NotificationBar>;

#[derive(Debug, Error)]
pub enum MountError {
	#[error("No global `window`")]
	NoWindow,
	#[error("The window has no document")]
	NoDocument,
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("Failed to access {what}: {message}")]
	Window { what: &'static str, message: String },
	#[error("Failed to listen for {event}: {message}")]
	Listener { event: &'static str, message: String },
}

fn describe(value: &JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// A shell attached to its element. Dropping it removes every listener it added.
pub struct MountedShell {
	shell: Rc<WebShell>,
	_listeners: Vec<EventListener>,
}

impl MountedShell {
	#[must_use]
	pub fn shell(&self) -> &Rc<WebShell> {
		&self.shell
	}
}

fn listen(target: &EventTarget, event: &'static str, handler: Box<dyn FnMut(Event)>) -> Result<EventListener, MountError> {
	EventListener::new(target, event, handler).map_err(|error| MountError::Listener { event, message: describe(&error) })
}

fn detail(event: &Event) -> Option<JsValue> {
	event.dyn_ref::<CustomEvent>().map(CustomEvent::detail)
}

/// Attaches a shell to `element`, taking the current location and document title as its initial state.
///
/// # Errors
///
/// Iff the browser environment is missing pieces or refuses a listener.
#[instrument(skip(element, config))]
pub fn mount(element: Element, config: ShellConfig) -> Result<MountedShell, MountError> {
	let window = web_sys::window().ok_or(MountError::NoWindow)?;
	let document = window.document().ok_or(MountError::NoDocument)?;
	let history = window.history().map_err(|error| MountError::Window {
		what: "history",
		message: describe(&error),
	})?;
	let url = window.location().href().map_err(|error| MountError::Window {
		what: "location",
		message: describe(&error),
	})?;

	let coordinator = UpdateCoordinator::new(
		&config,
		FetchTransport,
		WindowHistory(history),
		ElementView::new(element.clone()),
		NotificationBar::new(element.clone(), config.notification_bar_selector.as_str(), config.notification_element.as_str()),
	);
	coordinator.initialize(&url, &document.title());
	let shell = Rc::new(AppShell::new(&config, coordinator));

	let listeners = vec![
		listen(&element, "click", {
			let shell = Rc::clone(&shell);
			Box::new(move |event: Event| {
				let target = match event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
					Some(target) => target,
					None => return,
				};
				if let Some(task) = shell.on_click(&target) {
					event.prevent_default();
					spawn_local(task.map(drop));
				}
			})
		})?,
		listen(&element, "submit", {
			let shell = Rc::clone(&shell);
			Box::new(move |event: Event| {
				let form = match event.target().and_then(|target| target.dyn_into::<HtmlFormElement>().ok()) {
					Some(form) => form,
					None => return,
				};
				if !shell.interceptor().is_enhanced_form::<Element>(&form) {
					return;
				}
				let submitter = event.dyn_ref::<SubmitEvent>().and_then(SubmitEvent::submitter);
				if let Some(descriptor) = read_form(&form, submitter.as_ref()) {
					event.prevent_default();
					spawn_local(shell.on_submit(descriptor).map(drop));
				}
			})
		})?,
		listen(&element, NAVIGATE_TO, {
			let shell = Rc::clone(&shell);
			Box::new(move |event: Event| {
				match detail(&event).and_then(|detail| Reflect::get(&detail, &"url".into()).ok()).and_then(|url| url.as_string()) {
					Some(url) => spawn_local(shell.navigate_to(url).map(drop)),
					None => warn!("{} without `detail.url`. Ignoring.", NAVIGATE_TO),
				}
			})
		})?,
		listen(&element, NOTIFY, {
			let shell = Rc::clone(&shell);
			Box::new(move |event: Event| {
				let notification = detail(&event).and_then(|detail| Reflect::get(&detail, &"notification".into()).ok()).unwrap_or(JsValue::UNDEFINED);
				match serde_wasm_bindgen::from_value::<Notification>(notification) {
					Ok(notification) => shell.on_notify(notification),
					Err(error) => error!("Invalid {} notification: {}", NOTIFY, error),
				}
			})
		})?,
		listen(&element, CONTENT_DISCOVER, {
			let host = element.clone();
			let picker = config.discovery_element.clone();
			Box::new(move |event: Event| {
				let detail = detail(&event).unwrap_or(JsValue::UNDEFINED);
				if let Err(error) = open_picker(&host, &picker, &detail) {
					error!("Failed to open the content picker: {:?}", error);
				}
			})
		})?,
		listen(&window, "popstate", {
			let shell = Rc::clone(&shell);
			Box::new(move |event: Event| {
				let state = event.dyn_ref::<PopStateEvent>().and_then(|event| read_state(event.state()));
				spawn_local(shell.on_popstate(state).map(drop));
			})
		})?,
	];

	info!("Shell mounted at {}", url);
	Ok(MountedShell { shell, _listeners: listeners })
}

/// Installs the panic hook and routes `tracing` output to the browser console. Only the first call does anything.
pub fn init_logging() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		console_error_panic_hook::set_once();
		if tracing_wasm::try_set_as_global_default().is_err() {
			debug!("A global subscriber is already set.");
		}
	});
}

/// A mounted shell as seen from JavaScript.
#[wasm_bindgen]
pub struct ShellHandle {
	mounted: Option<MountedShell>,
}

#[wasm_bindgen]
impl ShellHandle {
	/// The current URL, unless the shell was destroyed.
	#[wasm_bindgen(getter)]
	#[must_use]
	pub fn url(&self) -> Option<String> {
		self.mounted.as_ref().and_then(|mounted| mounted.shell.coordinator().current_url())
	}

	#[wasm_bindgen(getter)]
	#[must_use]
	pub fn updating(&self) -> bool {
		self.mounted.as_ref().map_or(false, |mounted| mounted.shell.coordinator().is_updating())
	}

	/// Removes the shell's listeners. Updates already in flight still complete.
	pub fn destroy(&mut self) {
		if self.mounted.take().is_some() {
			info!("Shell destroyed.");
		}
	}
}

/// Mounts a shell onto `element`. `config` is a partial [`ShellConfig`] object, or `undefined` for the defaults.
///
/// # Errors
///
/// Iff `config` is invalid or mounting fails.
#[wasm_bindgen]
pub fn enhance(element: Element, config: JsValue) -> Result<ShellHandle, JsValue> {
	init_logging();
	let config = if config.is_undefined() || config.is_null() {
		Ok(ShellConfig::default())
	} else {
		serde_wasm_bindgen::from_value(config).map_err(|error| MountError::from(ConfigError::Object(error.to_string())))
	};
	config
		.and_then(|config| mount(element, config))
		.map(|mounted| ShellHandle { mounted: Some(mounted) })
		.map_err(|error| js_sys::Error::new(&error.to_string()).into())
}
