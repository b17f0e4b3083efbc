//! Turning a topic into a [`TopicMap`] through an external text generator.
//!
//! The flow is `build_prompt` → [`GenerationService::generate`] →
//! `parse_response`; [`generate_map`] runs all three.

mod gemini;
mod parse;
mod prompt;

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{Either, select};
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::model::TopicMap;

pub use gemini::GeminiClient;
pub use parse::parse_response;
pub use prompt::build_prompt;

/// Rejected before any request is made.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputError {
	/// Topic is empty or whitespace.
	#[error("Please enter a topic to generate the map.")]
	EmptyTopic,

	/// No API key was supplied.
	#[error("Please enter your Gemini API key in the sidebar.")]
	MissingCredential,
}

/// The generation service could not produce text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ServiceError {
	/// The request never got an HTTP answer.
	#[error("request failed: {0}")]
	Request(String),

	/// Non-success status other than 429.
	#[error("HTTP {status}: {body}")]
	Http {
		/// Status code.
		status: u16,
		/// Response body, for the log and the notice.
		body: String,
	},

	/// HTTP 429.
	#[error("rate limit exceeded")]
	RateLimited,

	/// Answer carried no candidate text.
	#[error("no text in response: {0}")]
	EmptyResponse(String),

	/// The deadline passed first.
	#[error("no response within {0:?}")]
	Timeout(Duration),

	/// The HTTP client could not be built.
	#[error("invalid client configuration: {0}")]
	Config(String),
}

/// The service answered, but not with a usable map.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
	/// Text is not JSON at all.
	#[error("response is not valid JSON: {0}")]
	MalformedJson(String),

	/// JSON, but without a usable top-level object or `clusters` array.
	#[error("response does not match the topical map schema: {0}")]
	SchemaMismatch(String),
}

/// Anything that can stop a generate action.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerateError {
	/// Caught by [`validate_request`].
	#[error(transparent)]
	InvalidInput(#[from] InputError),

	/// Transport or service failure.
	#[error("The generation service failed: {0}")]
	Service(ServiceError),

	/// Deadline exceeded; never retried.
	#[error("The generation service did not answer within {} seconds.", .0.as_secs())]
	Timeout(Duration),

	/// Answer could not be decoded into a map.
	#[error("Could not read the generated map: {0}")]
	Parse(#[from] ParseError),
}

impl From<ServiceError> for GenerateError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Timeout(limit) => Self::Timeout(limit),
			other => Self::Service(other),
		}
	}
}

impl GenerateError {
	/// Whether a previously shown map should be dropped after this failure.
	///
	/// Only an unreadable response does; transport failures leave the old map up.
	pub fn invalidates_map(&self) -> bool {
		matches!(self, Self::Parse(_))
	}
}

/// Source of raw map text for a prompt.
#[async_trait(?Send)]
pub trait GenerationService {
	/// Send `prompt` and return the text the service produced.
	async fn generate(&self, prompt: &str, credential: &SecretString) -> Result<String, ServiceError>;
}

/// Check a request before spending a call on it.
pub fn validate_request(topic: &str, credential: &SecretString) -> Result<(), InputError> {
	if credential.expose_secret().trim().is_empty() {
		return Err(InputError::MissingCredential);
	}
	if topic.trim().is_empty() {
		return Err(InputError::EmptyTopic);
	}
	Ok(())
}

/// Build the prompt, call `service`, and parse what comes back.
pub async fn generate_map<S>(
	service: &S,
	topic: &str,
	credential: &SecretString,
) -> Result<TopicMap, GenerateError>
where
	S: GenerationService + ?Sized,
{
	validate_request(topic, credential)?;
	let prompt = build_prompt(topic)?;

	info!("Generating topical map for {:?}", topic.trim());
	let raw = service.generate(&prompt, credential).await.inspect_err(|e| {
		warn!("Generation service failed: {e}");
	})?;
	debug!("Received {} bytes from generation service", raw.len());

	let map = parse_response(&raw).inspect_err(|e| warn!("Discarding response: {e}"))?;
	info!(
		"Parsed topical map: {} clusters, {} pages",
		map.cluster_count(),
		map.page_count()
	);
	Ok(map)
}

/// Race `work` against `deadline`; if the deadline finishes first the call is
/// abandoned and reported as [`ServiceError::Timeout`].
pub async fn with_deadline<T, W, D>(work: W, deadline: D, limit: Duration) -> Result<T, ServiceError>
where
	W: Future<Output = Result<T, ServiceError>>,
	D: Future<Output = ()>,
{
	match select(pin!(work), pin!(deadline)).await {
		Either::Left((result, _)) => result,
		Either::Right(((), _)) => Err(ServiceError::Timeout(limit)),
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;

	use futures::executor::block_on;
	use futures::future::{pending, ready};

	use super::*;

	/// Replays one scripted outcome and remembers the prompt it was given.
	struct Scripted {
		reply: Result<String, ServiceError>,
		prompts: RefCell<Vec<String>>,
	}

	impl Scripted {
		fn new(reply: Result<&str, ServiceError>) -> Self {
			Self {
				reply: reply.map(str::to_string),
				prompts: RefCell::new(Vec::new()),
			}
		}
	}

	#[async_trait(?Send)]
	impl GenerationService for Scripted {
		async fn generate(&self, prompt: &str, _credential: &SecretString) -> Result<String, ServiceError> {
			self.prompts.borrow_mut().push(prompt.to_string());
			self.reply.clone()
		}
	}

	fn key() -> SecretString {
		SecretString::from("test-key")
	}

	#[test]
	fn empty_topic_is_rejected_without_calling_service() {
		let service = Scripted::new(Ok("{}"));
		let err = block_on(generate_map(&service, "   ", &key())).unwrap_err();
		assert_eq!(err, GenerateError::InvalidInput(InputError::EmptyTopic));
		assert!(service.prompts.borrow().is_empty());
	}

	#[test]
	fn missing_credential_is_rejected_first() {
		let service = Scripted::new(Ok("{}"));
		let err = block_on(generate_map(&service, "Tea", &SecretString::from(" "))).unwrap_err();
		assert_eq!(err, GenerateError::InvalidInput(InputError::MissingCredential));
		assert!(service.prompts.borrow().is_empty());
	}

	#[test]
	fn successful_generation_parses_map() {
		let service = Scripted::new(Ok(r#"{"pillar_topic":"Tea","clusters":[{"cluster_title":"Green","pages":[]}]}"#));
		let map = block_on(generate_map(&service, "Tea", &key())).unwrap();
		assert_eq!(map.pillar_topic, "Tea");
		assert_eq!(map.cluster_count(), 1);
		assert!(service.prompts.borrow()[0].contains("\"Tea\""));
	}

	#[test]
	fn service_failure_is_reported_as_service_error() {
		let service = Scripted::new(Err(ServiceError::RateLimited));
		let err = block_on(generate_map(&service, "Tea", &key())).unwrap_err();
		assert_eq!(err, GenerateError::Service(ServiceError::RateLimited));
		assert!(!err.invalidates_map());
	}

	#[test]
	fn service_timeout_becomes_distinct_kind() {
		let limit = Duration::from_secs(60);
		let service = Scripted::new(Err(ServiceError::Timeout(limit)));
		let err = block_on(generate_map(&service, "Tea", &key())).unwrap_err();
		assert_eq!(err, GenerateError::Timeout(limit));
		assert_eq!(err.to_string(), "The generation service did not answer within 60 seconds.");
		assert!(!err.invalidates_map());
	}

	#[test]
	fn unreadable_response_invalidates_map() {
		let service = Scripted::new(Ok("not json"));
		let err = block_on(generate_map(&service, "Tea", &key())).unwrap_err();
		assert!(matches!(err, GenerateError::Parse(ParseError::MalformedJson(_))));
		assert!(err.invalidates_map());
	}

	#[test]
	fn deadline_not_reached() {
		let limit = Duration::from_secs(1);
		let result = block_on(with_deadline(ready(Ok::<_, ServiceError>(7)), pending::<()>(), limit));
		assert_eq!(result, Ok(7));
	}

	#[test]
	fn deadline_reached_first() {
		let limit = Duration::from_secs(1);
		let result = block_on(with_deadline(pending::<Result<u8, ServiceError>>(), ready(()), limit));
		assert_eq!(result, Err(ServiceError::Timeout(limit)));
	}
}
