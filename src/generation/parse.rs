//! Decoding service output into a [`TopicMap`].
//!
//! Every optional field is resolved here, once: absent titles become
//! [`PLACEHOLDER`], absent keywords an empty list, absent counts
//! [`WordCount::Missing`]. Nothing downstream has to check.

use serde::Deserialize;
use serde_json::Value;

use super::ParseError;
use crate::model::{Cluster, PLACEHOLDER, Page, TopicMap, WordCount};

#[derive(Deserialize)]
struct WireMap {
	pillar_topic: Option<Value>,
	clusters: Vec<WireCluster>,
}

#[derive(Deserialize)]
struct WireCluster {
	cluster_title: Option<Value>,
	pages: Option<Vec<WirePage>>,
}

// Leaf fields stay as raw values so an odd type degrades to a placeholder
// instead of failing the whole map.
#[derive(Deserialize)]
struct WirePage {
	page_title: Option<Value>,
	keywords: Option<Value>,
	word_count: Option<Value>,
}

/// Decode `raw` into a map.
///
/// Fails with [`ParseError::MalformedJson`] when `raw` is not JSON and with
/// [`ParseError::SchemaMismatch`] when the top-level object or its `clusters`
/// array is missing or the wrong shape. Missing or mistyped leaf fields never fail.
pub fn parse_response(raw: &str) -> Result<TopicMap, ParseError> {
	let body = strip_code_fence(raw);
	let value: Value =
		serde_json::from_str(body).map_err(|e| ParseError::MalformedJson(e.to_string()))?;
	if !value.is_object() {
		return Err(ParseError::SchemaMismatch(
			"expected a JSON object at the top level".to_string(),
		));
	}
	let wire: WireMap =
		serde_json::from_value(value).map_err(|e| ParseError::SchemaMismatch(e.to_string()))?;
	Ok(wire.into_map())
}

/// Some models wrap JSON in a markdown fence even when asked not to.
fn strip_code_fence(text: &str) -> &str {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let rest = rest.strip_prefix("json").unwrap_or(rest);
	rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Scalars are stringified; null, blank, arrays and objects become [`PLACEHOLDER`].
fn title(value: Option<Value>) -> String {
	let text = match value {
		Some(Value::String(s)) => s.trim().to_string(),
		Some(Value::Number(n)) => n.to_string(),
		Some(Value::Bool(b)) => b.to_string(),
		_ => String::new(),
	};
	if text.is_empty() { PLACEHOLDER.to_string() } else { text }
}

/// A list keeps its string entries; a single string is split on commas.
fn keywords(value: Option<Value>) -> Vec<String> {
	let raw: Vec<String> = match value {
		Some(Value::Array(items)) => items
			.into_iter()
			.filter_map(|item| match item {
				Value::String(s) => Some(s),
				_ => None,
			})
			.collect(),
		Some(Value::String(joined)) => joined.split(',').map(str::to_string).collect(),
		_ => Vec::new(),
	};
	raw.into_iter()
		.map(|k| k.trim().to_string())
		.filter(|k| !k.is_empty())
		.collect()
}

impl WireMap {
	fn into_map(self) -> TopicMap {
		TopicMap {
			pillar_topic: title(self.pillar_topic),
			clusters: self.clusters.into_iter().map(WireCluster::into_cluster).collect(),
		}
	}
}

impl WireCluster {
	fn into_cluster(self) -> Cluster {
		Cluster {
			cluster_title: title(self.cluster_title),
			pages: self
				.pages
				.unwrap_or_default()
				.into_iter()
				.map(WirePage::into_page)
				.collect(),
		}
	}
}

impl WirePage {
	fn into_page(self) -> Page {
		Page {
			page_title: title(self.page_title),
			keywords: keywords(self.keywords),
			word_count: match self.word_count {
				Some(Value::Number(n)) => WordCount::Number(n),
				Some(Value::String(s)) => WordCount::Text(s),
				Some(Value::Null) | None => WordCount::Missing,
				Some(other) => WordCount::Text(other.to_string()),
			},
		}
	}
}
