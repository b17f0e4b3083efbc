mod component;
mod render;
mod state;

use thiserror::Error;
use wasm_bindgen::JsValue;

pub use component::ForceGraphCanvas;

/// The mind map canvas could not be set up.
#[derive(Clone, Debug, Error)]
pub enum RenderError {
	/// `window` is unavailable.
	#[error("no browser window")]
	NoWindow,

	/// The canvas refused a 2D context.
	#[error("2D canvas context unavailable")]
	NoContext,

	/// A DOM call threw.
	#[error("canvas call failed: {0}")]
	Js(String),
}

impl RenderError {
	fn from_js(value: JsValue) -> Self {
		Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
