//! CSV export button backed by a browser download.

use js_sys::{Array, Uint8Array};
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

use crate::export::{Row, to_csv};

/// Hand `bytes` to the browser as a file download named `filename`.
pub fn download_bytes(bytes: &[u8], filename: &str, mime: &str) -> Result<(), JsValue> {
	let parts = Array::of1(&Uint8Array::from(bytes).into());
	let options = BlobPropertyBag::new();
	options.set_type(mime);
	let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
	let url = Url::create_object_url_with_blob(&blob)?;

	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let anchor: HtmlAnchorElement = document
		.create_element("a")?
		.dyn_into()
		.map_err(JsValue::from)?;
	anchor.set_href(&url);
	anchor.set_download(filename);
	anchor.click();
	Url::revoke_object_url(&url)
}

fn js_message(value: JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Encodes `rows` as CSV on click and downloads them as `filename`.
#[component]
pub fn ExportButton(rows: Vec<Row>, filename: String) -> impl IntoView {
	let export_error = RwSignal::new(None::<String>);

	let on_click = move |_| {
		let outcome = to_csv(&rows)
			.map_err(|e| e.to_string())
			.and_then(|bytes| download_bytes(&bytes, &filename, "text/csv").map_err(js_message));
		match outcome {
			Ok(()) => {
				info!("Exported {} rows to {}", rows.len(), filename);
				export_error.set(None);
			}
			Err(e) => {
				warn!("CSV export failed: {e}");
				export_error.set(Some(e));
			}
		}
	};

	view! {
		<div class="export">
			<button class="export-button" on:click=on_click>"📥 Export as CSV"</button>
			{move || export_error.get().map(|e| view! { <p class="error">"Export failed: " {e}</p> })}
		</div>
	}
}
