//! Form serialization for enhanced submissions.
//!
//! The browser's own form data set isn't used: the server side expects multi-value fields as `key[]=value` pairs,
//! and a later control with an already seen name replaces the earlier value in place.

use core::fmt::Write as _;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
	Get,
	Post,
}

impl FormMethod {
	/// Parses a form's (already normalised) `method` property.
	///
	/// `"dialog"` and anything else unknown yields `None`, which leaves the submission to the browser.
	#[must_use]
	pub fn parse(method: &str) -> Option<Self> {
		if method.eq_ignore_ascii_case("get") {
			Some(Self::Get)
		} else if method.eq_ignore_ascii_case("post") {
			Some(Self::Post)
		} else {
			None
		}
	}

	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
		}
	}
}

/// A form-associated element as seen by the serializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormControl {
	pub name: String,
	pub disabled: bool,
	pub kind: ControlKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
	/// `button`, `reset` and `submit`, which are never serialized on their own.
	Button,
	Checkbox { checked: bool, value: String },
	Radio { checked: bool, value: String },
	/// The value of the selected option, if any.
	SelectOne { selected: Option<String> },
	SelectMultiple { options: Vec<SelectOption> },
	/// Anything else that carries a raw `value`.
	Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
	pub value: String,
	pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
	Single(String),
	/// Serialized as repeated `key[]=value` pairs.
	Multiple(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormEntry {
	pub name: String,
	pub value: FieldValue,
}

/// A form ready to be submitted: where, how and what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDescriptor {
	pub method: FormMethod,
	/// The resolved `action` URL.
	pub action: String,
	/// In document order of first occurrence.
	pub entries: Vec<FormEntry>,
}

impl FormDescriptor {
	/// Collects the values of `controls` (in document order) and of the `submitter` that triggered the submission, if any.
	#[must_use]
	pub fn from_controls<'a>(method: FormMethod, action: impl Into<String>, controls: impl IntoIterator<Item = &'a FormControl>, submitter: Option<(&str, &str)>) -> Self {
		let mut descriptor = Self {
			method,
			action: action.into(),
			entries: vec![],
		};

		for control in controls {
			if control.disabled || control.name.is_empty() {
				continue;
			}

			match &control.kind {
				ControlKind::Button => (),
				ControlKind::Checkbox { checked, value } => {
					if *checked {
						descriptor.set(&control.name, if value.is_empty() { "on".to_owned() } else { value.clone() });
					}
				}
				ControlKind::Radio { checked, value } => {
					if *checked {
						descriptor.set(&control.name, value.clone());
					}
				}
				ControlKind::SelectOne { selected } => {
					if let Some(selected) = selected {
						descriptor.set(&control.name, selected.clone());
					}
				}
				ControlKind::SelectMultiple { options } => {
					for option in options.iter().filter(|option| option.selected) {
						descriptor.push(&control.name, option.value.clone());
					}
				}
				ControlKind::Value(value) => descriptor.set(&control.name, value.clone()),
			}
		}

		if let Some((name, value)) = submitter {
			if !name.is_empty() {
				descriptor.set(name, value.to_owned());
			}
		}

		#[cfg(feature = "dangerous-logging")]
		trace!("Serialized form: {:?}", descriptor.entries);
		#[cfg(not(feature = "dangerous-logging"))]
		trace!("Serialized {} form field(s).", descriptor.entries.len());

		descriptor
	}

	fn entry_mut(&mut self, name: &str) -> Option<&mut FormEntry> {
		self.entries.iter_mut().find(|entry| entry.name == name)
	}

	fn set(&mut self, name: &str, value: String) {
		match self.entry_mut(name) {
			Some(entry) => entry.value = FieldValue::Single(value),
			None => self.entries.push(FormEntry {
				name: name.to_owned(),
				value: FieldValue::Single(value),
			}),
		}
	}

	fn push(&mut self, name: &str, value: String) {
		match self.entry_mut(name) {
			Some(FormEntry { value: FieldValue::Multiple(values), .. }) => values.push(value),
			Some(entry) => entry.value = FieldValue::Multiple(vec![value]),
			None => self.entries.push(FormEntry {
				name: name.to_owned(),
				value: FieldValue::Multiple(vec![value]),
			}),
		}
	}

	/// The entries as `key=value&` pairs, multi-value keys repeated as `key[]=value&`.
	///
	/// Keys and values are percent-encoded, the `[]` suffix is kept literal.
	#[must_use]
	pub fn encoded_entries(&self) -> String {
		let mut encoded = String::new();
		for entry in &self.entries {
			let key = urlencoding::encode(&entry.name);
			match &entry.value {
				FieldValue::Single(value) => {
					let _ = write!(encoded, "{}={}&", key, urlencoding::encode(value));
				}
				FieldValue::Multiple(values) => {
					for value in values {
						let _ = write!(encoded, "{}[]={}&", key, urlencoding::encode(value));
					}
				}
			}
		}
		encoded
	}

	/// The URL a GET submission navigates to.
	#[must_use]
	pub fn query_url(&self) -> String {
		format!("{}?{}", self.action, self.encoded_entries())
	}
}
