//! The JSON payload a server renders in response to an update request.
//!
//! ```json
//! {
//!   "update": {
//!     "properties": { "pageTitle": "Dashboard" },
//!     "attributes": { "class": "dashboard" },
//!     "children": [
//!       { "selector": "main", "update": "<h1>Dashboard</h1>" }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateEnvelope {
	/// `None` (absent or `null`) leaves the page as is.
	#[serde(default)]
	pub update: Option<UpdateNode>,
}

impl UpdateEnvelope {
	/// Parses a response body.
	///
	/// Any JSON is accepted. Parts that don't have the expected shape are kept as [`UpdateNode::Other`] or dropped, so they don't spoil the rest of the update.
	///
	/// # Errors
	///
	/// Iff `text` is not JSON.
	pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
		let mut body: Value = serde_json::from_str(text)?;
		let update = match body.get_mut("update").map(Value::take) {
			None | Some(Value::Null) => None,
			Some(update) => Some(serde_json::from_value(update)?),
		};
		Ok(Self { update })
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UpdateNode {
	/// Replaces the target's entire content.
	Markup(String),
	Structured(StructuredUpdate),
	/// Anything else, which is ignored.
	Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructuredUpdate {
	/// Assigned directly to the target object, in order.
	#[serde(default, deserialize_with = "null_as_default")]
	pub properties: Map<String, Value>,
	/// Set via `setAttribute`, in order. Non-string values are stringified.
	#[serde(default, deserialize_with = "null_as_default")]
	pub attributes: Map<String, Value>,
	/// `null` and malformed entries are skipped.
	#[serde(default, deserialize_with = "lenient_children")]
	pub children: Vec<Option<ChildUpdate>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChildUpdate {
	/// Resolved against the element the parent update applies to. Only the first match is updated.
	///
	/// Empty if missing, in which case the child is skipped.
	#[serde(default)]
	pub selector: String,
	#[serde(default)]
	pub update: Option<UpdateNode>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_children<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Option<ChildUpdate>>, D::Error> {
	Ok(Option::<Vec<Value>>::deserialize(deserializer)?
		.unwrap_or_default()
		.into_iter()
		.map(|child| match child {
			Value::Null => None,
			child => ChildUpdate::deserialize(&child)
				.map_err(|error| warn!("Skipping malformed child update: {}", error))
				.ok(),
		})
		.collect())
}

/// How a JSON value ends up as an attribute value, following the usual string conversion.
#[must_use]
pub fn attribute_value(value: &Value) -> String {
	match value {
		Value::String(string) => string.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn markup_update() {
		let envelope = UpdateEnvelope::parse(r#"{"update": "<p>Hi</p>"}"#).unwrap();
		assert_eq!(envelope.update, Some(UpdateNode::Markup("<p>Hi</p>".to_owned())));
	}

	#[test]
	fn structured_update_keeps_order() {
		let envelope = UpdateEnvelope::parse(
			r##"{"update": {
				"attributes": {"z": "1", "a": 2},
				"properties": {"pageTitle": "T", "checked": true},
				"children": [null, {"selector": "#main", "update": "x"}, {"selector": "aside"}]
			}}"##,
		)
		.unwrap();

		let structured = match envelope.update {
			Some(UpdateNode::Structured(structured)) => structured,
			other => panic!("Expected structured update, got {:?}", other),
		};
		assert_eq!(structured.attributes.keys().collect::<Vec<_>>(), ["z", "a"]);
		assert_eq!(structured.properties.get("checked"), Some(&json!(true)));
		assert_eq!(structured.children.len(), 3);
		assert!(structured.children[0].is_none());
		assert_eq!(structured.children[1].as_ref().unwrap().update, Some(UpdateNode::Markup("x".to_owned())));
		assert_eq!(structured.children[2].as_ref().unwrap().update, None);
	}

	#[test]
	fn null_collections_are_empty() {
		let envelope = UpdateEnvelope::parse(r#"{"update": {"properties": null, "attributes": null, "children": null}}"#).unwrap();
		assert_eq!(envelope.update, Some(UpdateNode::Structured(StructuredUpdate::default())));
	}

	#[test]
	fn missing_or_null_update_is_a_no_op() {
		assert_eq!(UpdateEnvelope::parse("{}").unwrap().update, None);
		assert_eq!(UpdateEnvelope::parse(r#"{"update": null}"#).unwrap().update, None);
	}

	#[test]
	fn non_json_bodies_are_rejected() {
		assert!(UpdateEnvelope::parse("<!DOCTYPE html><html></html>").is_err());
		assert!(UpdateEnvelope::parse("").is_err());
	}

	#[test]
	fn unexpected_shapes_are_tolerated() {
		assert_eq!(UpdateEnvelope::parse(r#"{"update": 5}"#).unwrap().update, Some(UpdateNode::Other(json!(5))));
		assert_eq!(UpdateEnvelope::parse("[1, 2]").unwrap().update, None);
		assert_eq!(UpdateEnvelope::parse(r#""text""#).unwrap().update, None);

		let envelope = UpdateEnvelope::parse(
			r#"{"update": {
				"attributes": {"data-x": "1"},
				"children": [{"selector": "main", "update": "<p>new</p>"}, {"update": "<p>lost</p>"}, 7, {"selector": "nav", "update": [1]}]
			}}"#,
		)
		.unwrap();
		let structured = match envelope.update {
			Some(UpdateNode::Structured(structured)) => structured,
			other => panic!("Expected structured update, got {:?}", other),
		};
		assert_eq!(structured.attributes.get("data-x"), Some(&json!("1")));
		assert_eq!(structured.children.len(), 4);
		assert_eq!(structured.children[0].as_ref().unwrap().update, Some(UpdateNode::Markup("<p>new</p>".to_owned())));
		assert_eq!(structured.children[1].as_ref().unwrap().selector, "");
		assert!(structured.children[2].is_none());
		assert_eq!(structured.children[3].as_ref().unwrap().update, Some(UpdateNode::Other(json!([1]))));
	}

	#[test]
	fn attribute_values_are_stringified() {
		assert_eq!(attribute_value(&json!("plain")), "plain");
		assert_eq!(attribute_value(&json!(3)), "3");
		assert_eq!(attribute_value(&json!(false)), "false");
		assert_eq!(attribute_value(&Value::Null), "null");
	}
}
