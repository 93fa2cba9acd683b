use crate::{
	config::ShellConfig,
	coordinator::{ShellView, Triggered, UpdateCoordinator},
	form::FormDescriptor,
	history::{HistoryEntry, HistoryProvider},
	intercept::{NavigationInterceptor, NavigationNode, Submission},
	notify::{Notification, NotificationSink},
	transport::Transport,
};
use futures::future::{FutureExt, LocalBoxFuture};
use std::rc::Rc;
use tracing::{debug, instrument};

/// An update started by an event. Nothing happens until it's driven, for example with `wasm_bindgen_futures::spawn_local`.
pub type Task<T = Triggered> = LocalBoxFuture<'static, T>;

/// The application shell: routes events to the [`NavigationInterceptor`] and the [`UpdateCoordinator`].
///
/// Each handler decides synchronously, so the caller can cancel the browser's default action before driving the returned [`Task`].
pub struct AppShell<T: Transport, H, V, N> {
	interceptor: NavigationInterceptor,
	coordinator: Rc<UpdateCoordinator<T, H, V, N>>,
}

impl<T, H, V, N> AppShell<T, H, V, N>
where
	T: Transport + 'static,
	H: HistoryProvider + 'static,
	V: ShellView<T::Raw> + 'static,
	N: NotificationSink + 'static,
{
	pub fn new(config: &ShellConfig, coordinator: UpdateCoordinator<T, H, V, N>) -> Self {
		Self {
			interceptor: NavigationInterceptor::new(config),
			coordinator: Rc::new(coordinator),
		}
	}

	pub fn coordinator(&self) -> &Rc<UpdateCoordinator<T, H, V, N>> {
		&self.coordinator
	}

	pub fn interceptor(&self) -> &NavigationInterceptor {
		&self.interceptor
	}

	/// `Some` iff the click on `target` is enhanced, in which case default navigation must be prevented.
	#[instrument(skip(self, target))]
	pub fn on_click<E: NavigationNode>(&self, target: &E) -> Option<Task> {
		let url = self.interceptor.link_target(target)?;
		debug!("Enhancing navigation to {}", url);
		Some(self.navigate_to(url))
	}

	/// Handles a submission the caller has already checked with [`NavigationInterceptor::is_enhanced_form`] and cancelled.
	#[instrument(skip(self, form), fields(action = form.action.as_str()))]
	pub fn on_submit(&self, form: FormDescriptor) -> Task {
		match self.interceptor.route_submission(form) {
			Submission::Navigate(url) => self.navigate_to(url),
			Submission::Post(form) => {
				let coordinator = Rc::clone(&self.coordinator);
				async move { coordinator.submit(form).await }.boxed_local()
			}
		}
	}

	/// `ez:navigateTo`.
	pub fn navigate_to(&self, url: String) -> Task {
		let coordinator = Rc::clone(&self.coordinator);
		async move { coordinator.set_url(&url).await }.boxed_local()
	}

	/// `popstate`. Resolves to `None` if the state isn't the shell's.
	pub fn on_popstate(&self, state: Option<HistoryEntry>) -> Task<Option<Triggered>> {
		let coordinator = Rc::clone(&self.coordinator);
		async move { coordinator.restore(state.as_ref()).await }.boxed_local()
	}

	/// `ez:notify`.
	pub fn on_notify(&self, notification: Notification) {
		self.coordinator.notify(Some(notification));
	}
}
