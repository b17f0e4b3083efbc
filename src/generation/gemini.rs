//! Google Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{GenerationService, ServiceError, with_deadline};
use crate::config::GeneratorConfig;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
	contents: Vec<Content<'a>>,
	generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
	parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
	text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
	response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
	#[serde(default)]
	candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
	content: Option<CandidateContent>,
	finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
	#[serde(default)]
	parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
	text: Option<String>,
}

/// Calls Gemini with JSON output mode switched on.
pub struct GeminiClient {
	client: Client,
	config: GeneratorConfig,
}

impl GeminiClient {
	/// Build the HTTP client for `config`.
	pub fn new(config: GeneratorConfig) -> Result<Self, ServiceError> {
		let client = Client::builder()
			.build()
			.map_err(|e| ServiceError::Config(e.to_string()))?;
		Ok(Self { client, config })
	}

	async fn request(&self, prompt: &str, credential: &SecretString) -> Result<String, ServiceError> {
		let body = GenerateRequest {
			contents: vec![Content {
				parts: vec![Part { text: prompt }],
			}],
			generation_config: GenerationConfig {
				response_mime_type: "application/json",
			},
		};

		let request = self
			.client
			.post(self.config.endpoint())
			.header("x-goog-api-key", credential.expose_secret())
			.json(&body);
		#[cfg(not(target_arch = "wasm32"))]
		let request = request.timeout(self.config.timeout);

		let response = request.send().await.map_err(|e| self.transport_error(e))?;

		let status = response.status();
		if status == StatusCode::TOO_MANY_REQUESTS {
			return Err(ServiceError::RateLimited);
		}
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(ServiceError::Http {
				status: status.as_u16(),
				body,
			});
		}

		let decoded: GenerateResponse = response
			.json()
			.await
			.map_err(|e| self.transport_error(e))?;
		first_text(decoded)
	}

	fn transport_error(&self, err: reqwest::Error) -> ServiceError {
		if err.is_timeout() {
			ServiceError::Timeout(self.config.timeout)
		} else {
			ServiceError::Request(err.to_string())
		}
	}
}

fn first_text(response: GenerateResponse) -> Result<String, ServiceError> {
	let Some(candidate) = response.candidates.into_iter().next() else {
		return Err(ServiceError::EmptyResponse("no candidates".to_string()));
	};
	let text: String = candidate
		.content
		.map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
		.unwrap_or_default();
	if text.trim().is_empty() {
		let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
		return Err(ServiceError::EmptyResponse(format!("finish reason {reason}")));
	}
	Ok(text)
}

#[async_trait(?Send)]
impl GenerationService for GeminiClient {
	async fn generate(&self, prompt: &str, credential: &SecretString) -> Result<String, ServiceError> {
		debug!("POST {} ({} prompt bytes)", self.config.endpoint(), prompt.len());
		let limit = self.config.timeout;
		with_deadline(self.request(prompt, credential), sleep(limit), limit).await
	}
}

#[cfg(target_arch = "wasm32")]
async fn sleep(duration: Duration) {
	let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
	let promise = js_sys::Promise::new(&mut |resolve, _reject| {
		if let Some(window) = web_sys::window() {
			let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
		}
	});
	let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

// Native builds rely on reqwest's own request timeout.
#[cfg(not(target_arch = "wasm32"))]
async fn sleep(_duration: Duration) {
	futures::future::pending::<()>().await
}
