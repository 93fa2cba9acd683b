use crate::envelope::{attribute_value, StructuredUpdate, UpdateNode};
use core::fmt::Debug;
use serde_json::Value;
use tracing::{error, instrument, trace, trace_span, warn};

/// An element an [`UpdateNode`] can be applied to.
///
/// Implemented for [`web_sys::Element`] in [`crate::web`].
pub trait PatchTarget: Sized {
	type Error: Debug;

	/// Replaces the entire content with trusted markup.
	fn replace_content(&self, markup: &str);

	fn set_attribute(&self, name: &str, value: &str) -> Result<(), Self::Error>;

	/// Assigns `value` directly to the property `name`, which may trigger the element's own reactions.
	fn set_property(&self, name: &str, value: &Value) -> Result<(), Self::Error>;

	/// The first descendant matching `selector`.
	fn query_selector(&self, selector: &str) -> Result<Option<Self>, Self::Error>;
}

/// What a single [`DomPatcher::apply`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
	pub replaced_contents: usize,
	pub attributes_set: usize,
	pub properties_set: usize,
	/// Child selectors that matched nothing.
	pub missed_selectors: Vec<String>,
	/// Attribute/property assignments and selector lookups that threw.
	pub failures: usize,
}

impl PatchReport {
	#[must_use]
	pub fn touched_anything(&self) -> bool {
		self.replaced_contents + self.attributes_set + self.properties_set != 0
	}
}

/// Applies [`UpdateNode`] trees to live elements.
///
/// There is no diffing: markup replaces content wholesale,
/// attributes and properties are assigned as given and children are looked up by selector each time.
#[derive(Debug, Clone, Copy)]
pub struct DomPatcher {
	depth_limit: usize,
}

impl DomPatcher {
	#[must_use]
	pub fn new(depth_limit: usize) -> Self {
		Self { depth_limit }
	}

	#[instrument(skip(self, target, node))]
	pub fn apply<T: PatchTarget>(&self, target: &T, node: Option<&UpdateNode>) -> PatchReport {
		let mut report = PatchReport::default();
		self.apply_node(target, node, self.depth_limit, &mut None, &mut report);
		report
	}

	/// Like [`apply`](`DomPatcher::apply`), but offers each property of the *root* update to `root_property` first.
	///
	/// Properties for which `root_property` returns `true` are considered handled and not assigned to `target`.
	#[instrument(skip(self, target, node, root_property))]
	pub fn apply_with_root_properties<T: PatchTarget>(&self, target: &T, node: Option<&UpdateNode>, mut root_property: impl FnMut(&str, &Value) -> bool) -> PatchReport {
		let mut report = PatchReport::default();
		let mut root_property: Option<&mut dyn FnMut(&str, &Value) -> bool> = Some(&mut root_property);
		self.apply_node(target, node, self.depth_limit, &mut root_property, &mut report);
		report
	}

	#[allow(clippy::type_complexity)]
	fn apply_node<T: PatchTarget>(&self, target: &T, node: Option<&UpdateNode>, depth_limit: usize, root_property: &mut Option<&mut dyn FnMut(&str, &Value) -> bool>, report: &mut PatchReport) {
		if depth_limit == 0 {
			return error!("Depth limit reached");
		}

		match node {
			None => trace!("Empty update."),
			Some(UpdateNode::Markup(markup)) => {
				trace!("Replacing content ({} bytes).", markup.len());
				target.replace_content(markup);
				report.replaced_contents += 1;
			}
			Some(UpdateNode::Structured(structured)) => self.apply_structured(target, structured, depth_limit, root_property, report),
			Some(UpdateNode::Other(other)) => warn!("Ignoring update that is neither markup nor an object: {}", other),
		}
	}

	#[allow(clippy::type_complexity)]
	fn apply_structured<T: PatchTarget>(&self, target: &T, update: &StructuredUpdate, depth_limit: usize, root_property: &mut Option<&mut dyn FnMut(&str, &Value) -> bool>, report: &mut PatchReport) {
		for (name, value) in &update.attributes {
			match target.set_attribute(name, &attribute_value(value)) {
				Ok(()) => report.attributes_set += 1,
				Err(error) => {
					error!("Failed to set attribute {:?}: {:?}", name, error);
					report.failures += 1;
				}
			}
		}

		for (name, value) in &update.properties {
			if let Some(root_property) = root_property.as_mut() {
				if (*root_property)(name, value) {
					trace!("Root property {:?} handled by the shell.", name);
					report.properties_set += 1;
					continue;
				}
			}

			match target.set_property(name, value) {
				Ok(()) => report.properties_set += 1,
				Err(error) => {
					error!("Failed to assign property {:?}: {:?}", name, error);
					report.failures += 1;
				}
			}
		}

		for child in update.children.iter().flatten() {
			if child.selector.is_empty() {
				warn!("Skipping child update without selector.");
				continue;
			}

			let span = trace_span!("Updating child", selector = child.selector.as_str());
			let _enter = span.enter();

			match target.query_selector(&child.selector) {
				Ok(Some(element)) => self.apply_node(&element, child.update.as_ref(), depth_limit - 1, &mut None, report),
				Ok(None) => {
					warn!("Unable to find {:?} under the update target.", child.selector);
					report.missed_selectors.push(child.selector.clone());
				}
				Err(error) => {
					error!("Invalid selector {:?}: {:?}", child.selector, error);
					report.failures += 1;
				}
			}
		}
	}
}
