//! The update cycle: fetch, decode, patch, record history, announce.
//!
//! At most one cycle runs at a time. Triggers arriving while one is in flight are dropped, not queued,
//! and the running request is never cancelled.

use crate::{
	config::ShellConfig,
	envelope::{attribute_value, UpdateEnvelope},
	form::{FormDescriptor, FormMethod},
	history::{HistoryController, HistoryEntry, HistoryProvider},
	notify::{Notification, NotificationRelay, NotificationSink},
	patch::{DomPatcher, PatchReport, PatchTarget},
	transport::{FetchRequest, FetchResponse, Transport, TransportError},
};
use core::cell::RefCell;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// The element the shell is mounted on, and the page around it.
pub trait ShellView<R> {
	type Root: PatchTarget;

	/// Where the update tree is applied.
	fn root(&self) -> Self::Root;
	fn reflect_updating(&self, updating: bool);
	fn reflect_url(&self, url: &str);
	fn set_document_title(&self, title: &str);
	/// Announces the end of a cycle that applied a response (`ez:app:updated`).
	fn app_updated(&self, response: &FetchResponse<R>);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
	/// `None` until initialized.
	pub current_url: Option<String>,
	pub updating: bool,
	pub page_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRequest {
	Url(String),
	Form(FormDescriptor),
}

impl UpdateRequest {
	/// Where the request goes, before any query is appended.
	fn target(&self) -> &str {
		match self {
			Self::Url(url) => url,
			Self::Form(form) => &form.action,
		}
	}

	fn is_post(&self) -> bool {
		matches!(self, Self::Form(FormDescriptor { method: FormMethod::Post, .. }))
	}

	fn to_fetch_request(&self, config: &ShellConfig) -> FetchRequest {
		let mut headers = vec![(config.update_header_name.clone(), config.update_header_value.clone())];
		match self {
			Self::Url(url) => FetchRequest {
				method: FormMethod::Get,
				url: url.clone(),
				headers,
				body: None,
			},
			Self::Form(form) => match form.method {
				FormMethod::Get => FetchRequest {
					method: FormMethod::Get,
					url: form.query_url(),
					headers,
					body: None,
				},
				FormMethod::Post => {
					headers.push(("Content-Type".to_owned(), "application/x-www-form-urlencoded".to_owned()));
					FetchRequest {
						method: FormMethod::Post,
						url: form.action.clone(),
						headers,
						body: Some(form.encoded_entries()),
					}
				}
			},
		}
	}
}

/// What happened to a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Triggered {
	/// The first URL assignment, which only records the page's own URL.
	Initialized,
	/// The URL was already current.
	Unchanged,
	/// Another update was in flight.
	Dropped,
	Ran(UpdateOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
	Completed { status: u16, report: PatchReport },
	/// The response was applied, but the tracked URL was rolled back.
	HttpError { status: u16, report: PatchReport },
	NetworkFailure,
	ParseFailure,
}

#[derive(Debug, Error)]
pub enum FailureKind {
	#[error(transparent)]
	Network(#[from] TransportError),
	#[error("Response is not JSON: {0}")]
	Parse(#[source] serde_json::Error),
}

/// Context of a failed update cycle.
#[derive(Debug)]
pub struct UpdateFailure<R> {
	pub old_url: String,
	pub request: UpdateRequest,
	/// Present iff a response was received.
	pub response: Option<FetchResponse<R>>,
	pub kind: FailureKind,
}

/// Per-cycle context, discarded once the cycle ends.
struct UpdateInfo {
	old_url: String,
	request: UpdateRequest,
	from_history: bool,
}

struct Decoded<R> {
	response: FetchResponse<R>,
	envelope: UpdateEnvelope,
}

pub struct UpdateCoordinator<T: Transport, H, V, N> {
	config: ShellConfig,
	patcher: DomPatcher,
	state: RefCell<AppState>,
	transport: T,
	history: HistoryController<H>,
	view: V,
	relay: NotificationRelay<N>,
}

impl<T, H, V, N> UpdateCoordinator<T, H, V, N>
where
	T: Transport,
	H: HistoryProvider,
	V: ShellView<T::Raw>,
	N: NotificationSink,
{
	pub fn new(config: &ShellConfig, transport: T, history: H, view: V, sink: N) -> Self {
		Self {
			config: config.clone(),
			patcher: DomPatcher::new(config.depth_limit),
			state: RefCell::new(AppState::default()),
			transport,
			history: HistoryController::new(history),
			view,
			relay: NotificationRelay::new(config, sink),
		}
	}

	#[must_use]
	pub fn state(&self) -> AppState {
		self.state.borrow().clone()
	}

	pub fn current_url(&self) -> Option<String> {
		self.state.borrow().current_url.clone()
	}

	pub fn is_updating(&self) -> bool {
		self.state.borrow().updating
	}

	/// Records the page's own URL and title without fetching anything.
	pub fn initialize(&self, url: &str, page_title: &str) {
		self.set_page_title(page_title);
		self.store_url(url);
	}

	pub fn set_page_title(&self, title: &str) {
		self.state.borrow_mut().page_title = title.to_owned();
		self.view.set_document_title(title);
	}

	pub fn notify(&self, notifications: impl IntoIterator<Item = Notification>) {
		self.relay.notify(notifications);
	}

	/// Navigates to `url`, unless that's the first URL ever set, the current one, or an update is in flight.
	#[instrument(skip(self))]
	pub async fn set_url(&self, url: &str) -> Triggered {
		match self.begin_navigation(url) {
			Ok(old_url) => Triggered::Ran(self.update(UpdateRequest::Url(url.to_owned()), old_url, false).await),
			Err(triggered) => triggered,
		}
	}

	/// Submits a form directly. GET forms are better routed through [`set_url`](`UpdateCoordinator::set_url`).
	#[instrument(skip(self, form), fields(action = form.action.as_str()))]
	pub async fn submit(&self, form: FormDescriptor) -> Triggered {
		if self.is_updating() {
			debug!("Update in flight. Dropping submission.");
			return Triggered::Dropped;
		}
		let old_url = self.current_url().unwrap_or_default();
		Triggered::Ran(self.update(UpdateRequest::Form(form), old_url, false).await)
	}

	/// Handles a `popstate` state. `None` if it isn't an entry the shell created, in which case the browser should handle it.
	///
	/// A restoring update doesn't push another history entry.
	#[instrument(skip(self))]
	pub async fn restore(&self, state: Option<&HistoryEntry>) -> Option<Triggered> {
		let url = self.history.restore(state)?;
		Some(match self.begin_navigation(&url) {
			Ok(old_url) => Triggered::Ran(self.update(UpdateRequest::Url(url), old_url, true).await),
			Err(triggered) => triggered,
		})
	}

	/// Performs the synchronous part of a URL change. `Ok` carries the previous URL if an update should run.
	fn begin_navigation(&self, url: &str) -> Result<String, Triggered> {
		let old_url = match self.current_url() {
			None => {
				self.store_url(url);
				return Err(Triggered::Initialized);
			}
			Some(current) if current == url => return Err(Triggered::Unchanged),
			Some(current) => current,
		};

		if self.is_updating() {
			debug!("Update in flight. Dropping navigation.");
			return Err(Triggered::Dropped);
		}

		self.store_url(url);
		Ok(old_url)
	}

	async fn update(&self, request: UpdateRequest, old_url: String, from_history: bool) -> UpdateOutcome {
		self.set_updating(true);
		let info = UpdateInfo { old_url, request, from_history };

		match self.fetch_and_decode(&info).await {
			Ok(decoded) => self.finish(&info, decoded),
			Err(failure) => self.recover(failure),
		}
	}

	async fn fetch_and_decode(&self, info: &UpdateInfo) -> Result<Decoded<T::Raw>, UpdateFailure<T::Raw>> {
		let fetch_request = info.request.to_fetch_request(&self.config);
		let url = fetch_request.url.clone();

		let response = match self.transport.fetch(fetch_request).await {
			Ok(response) => response,
			Err(error) => {
				return Err(UpdateFailure {
					old_url: info.old_url.clone(),
					request: info.request.clone(),
					response: None,
					kind: error.into(),
				})
			}
		};

		info!("{} {} -> {} {} ({} bytes)", if info.request.is_post() { "POST" } else { "GET" }, url, response.status, response.url, response.text.len());
		if !response.url.is_empty() {
			self.store_url(&response.url);
		}

		match UpdateEnvelope::parse(&response.text) {
			Ok(envelope) => Ok(Decoded { response, envelope }),
			Err(error) => Err(UpdateFailure {
				old_url: info.old_url.clone(),
				request: info.request.clone(),
				response: Some(response),
				kind: FailureKind::Parse(error),
			}),
		}
	}

	fn finish(&self, info: &UpdateInfo, Decoded { response, envelope }: Decoded<T::Raw>) -> UpdateOutcome {
		let root = self.view.root();
		let report = self.patcher.apply_with_root_properties(&root, envelope.update.as_ref(), |name, value| self.root_property(name, value));

		let status = response.status;
		let outcome = if status >= 400 {
			warn!("Server responded with {}. Keeping {} as the current URL.", status, info.old_url);
			self.store_url(&info.old_url);
			UpdateOutcome::HttpError { status, report }
		} else {
			let AppState { current_url, page_title, .. } = self.state();
			let url = current_url.unwrap_or_default();
			if info.request.is_post() {
				self.history.replace_entry(&url, &page_title);
			} else if !info.from_history {
				self.history.push_entry(&url, &page_title);
			}
			UpdateOutcome::Completed { status, report }
		};

		self.set_updating(false);
		self.view.app_updated(&response);
		outcome
	}

	fn recover(&self, failure: UpdateFailure<T::Raw>) -> UpdateOutcome {
		error!("Update of {} failed: {}", failure.request.target(), failure.kind);
		if cfg!(feature = "dangerous-logging") {
			if let Some(response) = &failure.response {
				error!("Response body: {:?}", response.text);
			}
		}

		self.store_url(&failure.old_url);
		self.set_updating(false);

		let outcome = match &failure.kind {
			FailureKind::Network(_) => UpdateOutcome::NetworkFailure,
			FailureKind::Parse(_) => UpdateOutcome::ParseFailure,
		};
		self.relay.notify(Some(self.failure_notification(&failure)));
		outcome
	}

	fn failure_notification(&self, failure: &UpdateFailure<T::Raw>) -> Notification {
		match &failure.kind {
			FailureKind::Parse(error) => {
				let response = failure.response.as_ref();
				let debug_link = response
					.and_then(|response| response.header(&self.config.debug_link_header))
					.map(|link| format!(r#" <a href="{}">View in Symfony Profiler</a>"#, escape_attribute(link)))
					.unwrap_or_default();
				Notification {
					content: format!("<p>Unable to decode the server response.{}</p>", debug_link),
					details: Some(format!(
						"Error message:\n{}\n\nJSON Server response:\n{}",
						error,
						response.map_or("", |response| response.text.as_str())
					)),
					copyable: true,
					..Notification::error("")
				}
			}
			FailureKind::Network(_) => Notification::error("<p>Looks like the server is taking to long to respond. Please try again</p>"),
		}
	}

	/// Properties of the update root that belong to the shell rather than the element.
	fn root_property(&self, name: &str, value: &Value) -> bool {
		match name {
			"pageTitle" => {
				self.set_page_title(&attribute_value(value));
				true
			}
			"url" => {
				match value.as_str() {
					Some(url) => self.store_url(url),
					None => warn!("Ignoring non-string `url` {:?}.", value),
				}
				true
			}
			"notifications" => {
				match value {
					Value::Null => (),
					Value::Array(entries) => self.relay.notify(entries.iter().filter_map(|entry| {
						Notification::deserialize(entry)
							.map_err(|error| warn!("Skipping invalid notification {}: {}", entry, error))
							.ok()
					})),
					other => warn!("Ignoring `notifications` that aren't a list: {}", other),
				}
				true
			}
			_ => false,
		}
	}

	fn store_url(&self, url: &str) {
		self.state.borrow_mut().current_url = Some(url.to_owned());
		self.view.reflect_url(url);
	}

	fn set_updating(&self, updating: bool) {
		self.state.borrow_mut().updating = updating;
		self.view.reflect_updating(updating);
	}
}

fn escape_attribute(value: &str) -> String {
	value.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;").replace('>', "&gt;")
}
