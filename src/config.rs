//! Generation client settings.
//!
//! There is no runtime environment in the browser, so overrides are read at
//! build time: `TOPICAL_MAP_BASE_URL`, `TOPICAL_MAP_MODEL` and
//! `TOPICAL_MAP_TIMEOUT_SECS`.

use std::time::Duration;

/// Public Gemini API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used unless overridden.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Deadline for one generate call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the generation service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
	/// API root, without a trailing slash.
	pub base_url: String,
	/// Model name, e.g. `gemini-1.5-flash`.
	pub model: String,
	/// Deadline for one generate call.
	pub timeout: Duration,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			model: DEFAULT_MODEL.to_string(),
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

impl GeneratorConfig {
	/// Defaults, with any build-time overrides applied.
	pub fn from_env() -> Self {
		Self::default().with_overrides(
			option_env!("TOPICAL_MAP_BASE_URL"),
			option_env!("TOPICAL_MAP_MODEL"),
			option_env!("TOPICAL_MAP_TIMEOUT_SECS"),
		)
	}

	fn with_overrides(
		mut self,
		base_url: Option<&str>,
		model: Option<&str>,
		timeout_secs: Option<&str>,
	) -> Self {
		if let Some(url) = base_url.map(str::trim).filter(|s| !s.is_empty()) {
			self.base_url = url.trim_end_matches('/').to_string();
		}
		if let Some(model) = model.map(str::trim).filter(|s| !s.is_empty()) {
			self.model = model.to_string();
		}
		match timeout_secs.map(|s| s.trim().parse::<u64>()) {
			Some(Ok(secs)) if secs > 0 => self.timeout = Duration::from_secs(secs),
			Some(_) => log::warn!("Ignoring TOPICAL_MAP_TIMEOUT_SECS: not a positive integer"),
			None => {}
		}
		self
	}

	/// Full URL of the generate endpoint.
	pub fn endpoint(&self) -> String {
		format!("{}/models/{}:generateContent", self.base_url, self.model)
	}
}
