use crate::{
	config::ShellConfig,
	form::{FormDescriptor, FormMethod},
};
use tracing::{instrument, trace};

/// The element-tree queries needed to decide whether a click or submission is enhanced.
pub trait NavigationNode: Sized {
	/// The element itself or its nearest ancestor matching `selector`.
	fn closest(&self, selector: &str) -> Option<Self>;
	fn matches(&self, selector: &str) -> bool;
	fn attribute(&self, name: &str) -> Option<String>;
	/// The absolute URL of a link (its `href` *property*). Empty if it has none.
	fn resolved_href(&self) -> String;
}

/// Where an enhanced submission goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
	/// GET: browse to the serialized URL like a link click would.
	Navigate(String),
	/// POST: submit the form directly.
	Post(FormDescriptor),
}

/// Decides which clicks and submissions are taken away from the browser.
#[derive(Debug, Clone)]
pub struct NavigationInterceptor {
	standard_navigation_selector: String,
	standard_form_selector: String,
}

impl NavigationInterceptor {
	#[must_use]
	pub fn new(config: &ShellConfig) -> Self {
		Self {
			standard_navigation_selector: config.standard_navigation_selector(),
			standard_form_selector: config.standard_form_selector(),
		}
	}

	/// The URL to update to instead of following the link `target` is in, or `None` to let the browser (or someone else) handle the click.
	#[instrument(skip(self, target))]
	pub fn link_target<N: NavigationNode>(&self, target: &N) -> Option<String> {
		let anchor = target.closest("a")?;
		if self.is_enhanced_link(&anchor) {
			Some(anchor.resolved_href())
		} else {
			trace!("Standard navigation.");
			None
		}
	}

	pub fn is_enhanced_link<N: NavigationNode>(&self, anchor: &N) -> bool {
		anchor.attribute("href").map_or(false, |href| !href.is_empty() && !href.starts_with('#'))
			&& !anchor.resolved_href().is_empty()
			&& !anchor.matches(&self.standard_navigation_selector)
	}

	/// Whether `target` is in a form that is submitted through the shell.
	///
	/// Elements outside any form never are.
	pub fn is_enhanced_form<N: NavigationNode>(&self, target: &N) -> bool {
		match target.closest("form") {
			Some(form) => !form.matches(&self.standard_form_selector),
			None => false,
		}
	}

	#[must_use]
	pub fn route_submission(&self, form: FormDescriptor) -> Submission {
		match form.method {
			FormMethod::Get => Submission::Navigate(form.query_url()),
			FormMethod::Post => Submission::Post(form),
		}
	}
}
