//! One-row-per-page view of a map, and its CSV encoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TopicMap;

/// CSV encoding or decoding failed.
#[derive(Debug, Error)]
pub enum ExportError {
	/// Writer or reader error from the CSV layer.
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),

	/// The writer could not hand back its buffer.
	#[error("CSV buffer error: {0}")]
	Buffer(String),
}

/// A single page with its ancestry, as shown in the table and the export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
	/// Pillar the page belongs to.
	#[serde(rename = "Pillar Topic")]
	pub pillar_topic: String,
	/// Parent cluster.
	#[serde(rename = "Cluster Title")]
	pub cluster_title: String,
	/// The page itself.
	#[serde(rename = "Page Title")]
	pub page_title: String,
	/// Keywords joined with `", "`.
	#[serde(rename = "Keywords")]
	pub keywords: String,
	/// Word count as displayed.
	#[serde(rename = "Suggested Word Count")]
	pub word_count: String,
}

/// Rows in document order: clusters as listed, pages as listed within each.
pub fn flatten(map: &TopicMap) -> Vec<Row> {
	map.clusters
		.iter()
		.flat_map(|cluster| {
			cluster.pages.iter().map(move |page| Row {
				pillar_topic: map.pillar_topic.clone(),
				cluster_title: cluster.cluster_title.clone(),
				page_title: page.page_title.clone(),
				keywords: page.keywords_joined(),
				word_count: page.word_count.to_string(),
			})
		})
		.collect()
}

/// UTF-8 CSV with a header row, even when `rows` is empty.
pub fn to_csv(rows: &[Row]) -> Result<Vec<u8>, ExportError> {
	let mut writer = csv::WriterBuilder::new()
		.has_headers(false)
		.from_writer(Vec::new());
	writer.write_record(HEADER)?;
	for row in rows {
		writer.serialize(row)?;
	}
	writer
		.into_inner()
		.map_err(|e| ExportError::Buffer(e.error().to_string()))
}

/// Reads back what [`to_csv`] wrote.
pub fn from_csv(bytes: &[u8]) -> Result<Vec<Row>, ExportError> {
	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.from_reader(bytes);
	reader
		.deserialize()
		.collect::<Result<Vec<Row>, _>>()
		.map_err(ExportError::from)
}

/// Download name, e.g. `topical_map_Digital_Marketing_Strategies.csv`.
pub fn export_filename(topic: &str) -> String {
	format!("topical_map_{}.csv", topic.trim().replace(' ', "_"))
}

const HEADER: [&str; 5] = [
	"Pillar Topic",
	"Cluster Title",
	"Page Title",
	"Keywords",
	"Suggested Word Count",
];

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Cluster, Page, WordCount};

	fn page(title: &str, keywords: &[&str], word_count: WordCount) -> Page {
		Page {
			page_title: title.into(),
			keywords: keywords.iter().map(|k| k.to_string()).collect(),
			word_count,
		}
	}

	fn sample() -> TopicMap {
		TopicMap {
			pillar_topic: "Home Gardening".into(),
			clusters: vec![
				Cluster {
					cluster_title: "Soil".into(),
					pages: vec![
						page("Composting 101", &["compost", "soil health"], WordCount::Number(1200.into())),
						page("pH Testing", &[], WordCount::Missing),
					],
				},
				Cluster {
					cluster_title: "Empty".into(),
					pages: Vec::new(),
				},
				Cluster {
					cluster_title: "Pests".into(),
					pages: vec![page("Aphids", &["aphids"], WordCount::Text("900".into()))],
				},
			],
		}
	}

	#[test]
	fn flatten_one_row_per_page_in_document_order() {
		let rows = flatten(&sample());
		assert_eq!(rows.len(), 3);
		let titles: Vec<_> = rows.iter().map(|r| r.page_title.as_str()).collect();
		assert_eq!(titles, ["Composting 101", "pH Testing", "Aphids"]);
		assert_eq!(rows[0].cluster_title, "Soil");
		assert_eq!(rows[2].cluster_title, "Pests");
		assert!(rows.iter().all(|r| r.pillar_topic == "Home Gardening"));
	}

	#[test]
	fn flatten_joins_keywords_and_substitutes_missing_count() {
		let rows = flatten(&sample());
		assert_eq!(rows[0].keywords, "compost, soil health");
		assert_eq!(rows[0].word_count, "1200");
		assert_eq!(rows[1].keywords, "");
		assert_eq!(rows[1].word_count, "N/A");
		assert_eq!(rows[2].word_count, "900");
	}

	#[test]
	fn flatten_empty_map() {
		assert!(flatten(&TopicMap::empty("Nothing")).is_empty());
	}

	#[test]
	fn csv_has_header_and_quotes_separators() {
		let rows = vec![Row {
			pillar_topic: "Coffee".into(),
			cluster_title: "Methods".into(),
			page_title: "The \"Perfect\" Pour".into(),
			keywords: "pour over, v60".into(),
			word_count: "800".into(),
		}];
		let bytes = to_csv(&rows).unwrap();
		let text = String::from_utf8(bytes).unwrap();
		assert_eq!(
			text,
			"Pillar Topic,Cluster Title,Page Title,Keywords,Suggested Word Count\n\
			 Coffee,Methods,\"The \"\"Perfect\"\" Pour\",\"pour over, v60\",800\n"
		);
	}

	#[test]
	fn csv_of_no_rows_is_header_only() {
		let text = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
		assert_eq!(text, "Pillar Topic,Cluster Title,Page Title,Keywords,Suggested Word Count\n");
		assert!(from_csv(text.as_bytes()).unwrap().is_empty());
	}

	#[test]
	fn csv_round_trip_with_awkward_text() {
		let mut rows = flatten(&sample());
		rows.push(Row {
			pillar_topic: "Café, \"naïve\"".into(),
			cluster_title: "multi\nline".into(),
			page_title: String::new(),
			keywords: "a, \"b\", c".into(),
			word_count: "1,500+".into(),
		});
		let bytes = to_csv(&rows).unwrap();
		assert_eq!(from_csv(&bytes).unwrap(), rows);
		assert_eq!(to_csv(&rows).unwrap(), bytes);
	}

	#[test]
	fn filename_replaces_spaces() {
		assert_eq!(
			export_filename("Digital Marketing Strategies"),
			"topical_map_Digital_Marketing_Strategies.csv"
		);
		assert_eq!(export_filename("SEO"), "topical_map_SEO.csv");
	}
}
