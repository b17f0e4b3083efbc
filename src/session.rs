//! Per-visit state: the map currently on screen and the topic it answers.

use log::{info, warn};

use crate::generation::GenerateError;
use crate::model::TopicMap;

/// Lives for one browser session; nothing is persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
	current: Option<TopicMap>,
	last_topic: String,
}

impl Session {
	/// Map on screen, if any.
	pub fn current(&self) -> Option<&TopicMap> {
		self.current.as_ref()
	}

	/// Topic the current map was generated for; empty when there is none.
	pub fn last_topic(&self) -> &str {
		&self.last_topic
	}

	/// Install a freshly generated map, discarding the previous one.
	pub fn replace(&mut self, topic: &str, map: TopicMap) {
		info!("Showing map for {:?}", topic.trim());
		self.last_topic = topic.trim().to_string();
		self.current = Some(map);
	}

	/// Drop the map and its topic.
	pub fn clear(&mut self) {
		self.current = None;
		self.last_topic.clear();
	}

	/// Apply the failure policy for `err`: unreadable responses clear the
	/// screen, every other failure leaves the previous map in place.
	pub fn record_failure(&mut self, err: &GenerateError) {
		if err.invalidates_map() {
			warn!("Clearing map after failed generation: {err}");
			self.clear();
		}
	}

	/// Replace on success, apply the failure policy otherwise.
	pub fn apply(&mut self, topic: &str, outcome: Result<TopicMap, GenerateError>) -> Result<(), GenerateError> {
		match outcome {
			Ok(map) => {
				self.replace(topic, map);
				Ok(())
			}
			Err(err) => {
				self.record_failure(&err);
				Err(err)
			}
		}
	}
}
