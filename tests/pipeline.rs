use std::cell::Cell;

use async_trait::async_trait;
use futures::executor::block_on;
use secrecy::SecretString;
use topical_map::export::{Row, flatten, from_csv, to_csv};
use topical_map::generation::{GenerateError, GenerationService, ParseError, ServiceError, generate_map};
use topical_map::graph::{NodeKind, to_graph};
use topical_map::session::Session;

/// Stands in for the model: returns canned text and counts calls.
struct Canned {
	reply: Result<&'static str, ServiceError>,
	calls: Cell<usize>,
}

impl Canned {
	fn new(reply: Result<&'static str, ServiceError>) -> Self {
		Self {
			reply,
			calls: Cell::new(0),
		}
	}
}

#[async_trait(?Send)]
impl GenerationService for Canned {
	async fn generate(&self, _prompt: &str, _credential: &SecretString) -> Result<String, ServiceError> {
		self.calls.set(self.calls.get() + 1);
		self.reply.clone().map(str::to_string)
	}
}

const COFFEE: &str = r#"{
	"pillar_topic": "Coffee Brewing",
	"clusters": [
		{
			"cluster_title": "Brewing Methods",
			"pages": [
				{
					"page_title": "French Press Guide",
					"keywords": ["french press", "coffee"],
					"word_count": 800
				}
			]
		}
	]
}"#;

fn key() -> SecretString {
	SecretString::from("k")
}

#[test]
fn coffee_brewing_end_to_end() {
	let service = Canned::new(Ok(COFFEE));
	let map = block_on(generate_map(&service, "Coffee Brewing", &key())).unwrap();

	let rows = flatten(&map);
	assert_eq!(
		rows,
		[Row {
			pillar_topic: "Coffee Brewing".into(),
			cluster_title: "Brewing Methods".into(),
			page_title: "French Press Guide".into(),
			keywords: "french press, coffee".into(),
			word_count: "800".into(),
		}]
	);

	let graph = to_graph(&map);
	assert_eq!(graph.nodes.len(), 3);
	assert_eq!(graph.edges.len(), 2);
	assert_eq!(graph.node("Coffee Brewing").unwrap().kind, NodeKind::Pillar);
	assert_eq!(
		graph.node("French Press Guide").unwrap().tooltip.as_deref(),
		Some("Keywords: french press, coffee\nWord Count: 800")
	);

	let csv = to_csv(&rows).unwrap();
	assert_eq!(from_csv(&csv).unwrap(), rows);
	assert_eq!(service.calls.get(), 1);
}

#[test]
fn missing_word_count_reaches_table_and_tooltip_as_placeholder() {
	let raw = r#"{"pillar_topic":"P","clusters":[{"cluster_title":"C","pages":[{"page_title":"X","keywords":[]}]}]}"#;
	let map = block_on(generate_map(&Canned::new(Ok(raw)), "P", &key())).unwrap();
	assert_eq!(flatten(&map)[0].word_count, "N/A");
	assert_eq!(
		to_graph(&map).node("X").unwrap().tooltip.as_deref(),
		Some("Keywords: \nWord Count: N/A")
	);
}

#[test]
fn session_keeps_map_on_service_failure_and_clears_on_bad_json() {
	let mut session = Session::default();
	let first = block_on(generate_map(&Canned::new(Ok(COFFEE)), "Coffee Brewing", &key()));
	session.apply("Coffee Brewing", first).unwrap();

	let outage = block_on(generate_map(
		&Canned::new(Err(ServiceError::Http {
			status: 503,
			body: "unavailable".into(),
		})),
		"Tea",
		&key(),
	));
	assert!(matches!(session.apply("Tea", outage), Err(GenerateError::Service(_))));
	assert_eq!(session.current().unwrap().pillar_topic, "Coffee Brewing");
	assert_eq!(session.last_topic(), "Coffee Brewing");

	let garbage = block_on(generate_map(&Canned::new(Ok("not json")), "Tea", &key()));
	assert!(matches!(
		session.apply("Tea", garbage),
		Err(GenerateError::Parse(ParseError::MalformedJson(_)))
	));
	assert!(session.current().is_none());
}

#[test]
fn large_map_counts() {
	let clusters: Vec<String> = (0..5)
		.map(|c| {
			let pages: Vec<String> = (0..4)
				.map(|p| format!(r#"{{"page_title":"c{c} p{p}","keywords":["k"],"word_count":"1000"}}"#))
				.collect();
			format!(r#"{{"cluster_title":"cluster {c}","pages":[{}]}}"#, pages.join(","))
		})
		.collect();
	let raw = format!(r#"{{"pillar_topic":"Big","clusters":[{}]}}"#, clusters.join(","));

	let map = topical_map::generation::parse_response(&raw).unwrap();
	assert_eq!(flatten(&map).len(), 20);
	let graph = to_graph(&map);
	assert_eq!(graph.nodes.len(), 1 + 5 + 20);
	assert_eq!(graph.edges.len(), 5 + 20);
	assert_eq!(map.total_word_count(), 20_000);
}
