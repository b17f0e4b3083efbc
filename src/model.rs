//! In-memory topical map: a pillar topic, its clusters, and their pages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stand-in for any text the generation service left out.
pub const PLACEHOLDER: &str = "N/A";

/// Separator used wherever a keyword list is shown as one string.
pub const KEYWORD_SEPARATOR: &str = ", ";

/// A generated map. Built once per successful generation and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopicMap {
	/// Root subject of the map.
	pub pillar_topic: String,
	/// Thematic groupings in display order.
	pub clusters: Vec<Cluster>,
}

/// A group of related page ideas under the pillar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
	/// Cluster heading.
	pub cluster_title: String,
	/// Page ideas in display order.
	pub pages: Vec<Page>,
}

/// A single proposed article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
	/// Article title.
	pub page_title: String,
	/// Target keywords, in the order the service listed them.
	pub keywords: Vec<String>,
	/// Suggested length.
	pub word_count: WordCount,
}

/// Suggested article length as the service reported it.
///
/// Numbers keep their literal JSON text and strings are kept verbatim, so a
/// value like `"1,200+"` survives to the table and export untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum WordCount {
	/// A JSON number.
	Number(serde_json::Number),
	/// Any string, numeric or not.
	Text(String),
	/// Absent or null.
	#[default]
	Missing,
}

impl WordCount {
	/// Whole-number value, when the count reads as one.
	pub fn as_u64(&self) -> Option<u64> {
		match self {
			Self::Number(n) => n
				.as_u64()
				.or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
			Self::Text(s) => s.trim().parse().ok(),
			Self::Missing => None,
		}
	}
}

impl fmt::Display for WordCount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(n) => write!(f, "{n}"),
			Self::Text(s) => f.write_str(s),
			Self::Missing => f.write_str(PLACEHOLDER),
		}
	}
}

impl Page {
	/// Keywords joined with `", "`; empty when there are none.
	pub fn keywords_joined(&self) -> String {
		self.keywords.join(KEYWORD_SEPARATOR)
	}
}

impl TopicMap {
	/// Map with no clusters.
	pub fn empty(pillar_topic: impl Into<String>) -> Self {
		Self {
			pillar_topic: pillar_topic.into(),
			clusters: Vec::new(),
		}
	}

	/// Number of clusters under the pillar.
	pub fn cluster_count(&self) -> usize {
		self.clusters.len()
	}

	/// Number of pages across every cluster.
	pub fn page_count(&self) -> usize {
		self.clusters.iter().map(|c| c.pages.len()).sum()
	}

	/// True when there is nothing under the pillar.
	pub fn is_empty(&self) -> bool {
		self.clusters.is_empty()
	}

	/// Sum of every word count that reads as a whole number, saturating at
	/// `u64::MAX`.
	pub fn total_word_count(&self) -> u64 {
		self.clusters
			.iter()
			.flat_map(|c| &c.pages)
			.filter_map(|p| p.word_count.as_u64())
			.fold(0, u64::saturating_add)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn page(title: &str, word_count: WordCount) -> Page {
		Page {
			page_title: title.into(),
			keywords: vec!["a".into(), "b".into()],
			word_count,
		}
	}

	#[test]
	fn word_count_display_keeps_representation() {
		assert_eq!(WordCount::Number(800.into()).to_string(), "800");
		assert_eq!(WordCount::Text("1200".into()).to_string(), "1200");
		assert_eq!(WordCount::Text("about 900".into()).to_string(), "about 900");
		assert_eq!(WordCount::Missing.to_string(), PLACEHOLDER);
	}

	#[test]
	fn word_count_numeric_value() {
		assert_eq!(WordCount::Number(800.into()).as_u64(), Some(800));
		assert_eq!(WordCount::Text(" 1500 ".into()).as_u64(), Some(1500));
		assert_eq!(WordCount::Text("1,500".into()).as_u64(), None);
		assert_eq!(WordCount::Missing.as_u64(), None);
	}

	#[test]
	fn counts_and_totals() {
		let map = TopicMap {
			pillar_topic: "Tea".into(),
			clusters: vec![
				Cluster {
					cluster_title: "Green".into(),
					pages: vec![
						page("Matcha", WordCount::Number(1000.into())),
						page("Sencha", WordCount::Text("n/a".into())),
					],
				},
				Cluster {
					cluster_title: "Black".into(),
					pages: vec![page("Assam", WordCount::Text("500".into()))],
				},
				Cluster {
					cluster_title: "Empty".into(),
					pages: Vec::new(),
				},
			],
		};
		assert_eq!(map.cluster_count(), 3);
		assert_eq!(map.page_count(), 3);
		assert_eq!(map.total_word_count(), 1500);
		assert!(!map.is_empty());
		assert!(TopicMap::empty("Tea").is_empty());
	}

	#[test]
	fn total_word_count_saturates() {
		let map = TopicMap {
			pillar_topic: "Big".into(),
			clusters: vec![Cluster {
				cluster_title: "C".into(),
				pages: vec![
					page("a", WordCount::Text("18446744073709551615".into())),
					page("b", WordCount::Text("1".into())),
				],
			}],
		};
		assert_eq!(map.total_word_count(), u64::MAX);
	}

	#[test]
	fn keywords_join() {
		let p = page("x", WordCount::Missing);
		assert_eq!(p.keywords_joined(), "a, b");
		let bare = Page {
			keywords: Vec::new(),
			..p
		};
		assert_eq!(bare.keywords_joined(), "");
	}
}
