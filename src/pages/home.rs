use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};
use secrecy::SecretString;

use crate::components::content_plan::ContentPlan;
use crate::components::force_graph::ForceGraphCanvas;
use crate::config::GeneratorConfig;
use crate::generation::{GeminiClient, GenerateError, generate_map, validate_request};
use crate::graph::{TopicGraph, to_graph};
use crate::model::TopicMap;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tab {
	MindMap,
	Details,
}

/// Topic form, generate action, and the two result views.
#[component]
pub fn Home() -> impl IntoView {
	let api_key = RwSignal::new(String::new());
	let topic = RwSignal::new(String::new());
	let session = RwSignal::new(Session::default());
	let failure = RwSignal::new(None::<GenerateError>);
	let pending = RwSignal::new(false);
	let tab = RwSignal::new(Tab::MindMap);

	let on_generate = move |_| {
		if pending.get_untracked() {
			return;
		}
		let credential = SecretString::from(api_key.get_untracked());
		let requested = topic.get_untracked();
		if let Err(e) = validate_request(&requested, &credential) {
			failure.set(Some(e.into()));
			return;
		}
		failure.set(None);
		pending.set(true);

		spawn_local(async move {
			let outcome = match GeminiClient::new(GeneratorConfig::from_env()) {
				Ok(client) => generate_map(&client, &requested, &credential).await,
				Err(e) => Err(e.into()),
			};
			match session.try_update(|s| s.apply(&requested, outcome)) {
				Some(Err(e)) => {
					warn!("Generation for {requested:?} failed: {e}");
					failure.set(Some(e));
				}
				Some(Ok(())) => info!("Generation for {requested:?} finished"),
				None => {}
			}
			pending.set(false);
		});
	};

	view! {
		<div class="layout">
			<aside class="sidebar">
				<h2>"🔑 API Configuration"</h2>
				<p>"Enter your Google Gemini API key to get started."</p>
				<label>
					"Gemini API Key"
					<input
						type="password"
						autocomplete="off"
						prop:value=move || api_key.get()
						on:input=move |ev| api_key.set(event_target_value(&ev))
					/>
				</label>
				<a href="https://aistudio.google.com/app/apikey" target="_blank" rel="noopener">
					"Get your API key here"
				</a>
			</aside>

			<main class="main">
				<h1>"🗺️ AI Topical Map Generator"</h1>
				<p>
					"Enter a main topic to generate a comprehensive topical map, including content pillars, clusters, page topics, and keyword suggestions."
				</p>
				<label>
					"Enter your main topic or search term:"
					<input
						type="text"
						placeholder="e.g., 'Digital Marketing Strategies'"
						prop:value=move || topic.get()
						on:input=move |ev| topic.set(event_target_value(&ev))
					/>
				</label>
				<button class="primary" on:click=on_generate disabled=move || pending.get()>
					"Generate Topical Map"
				</button>

				<Show when=move || pending.get()>
					<p class="spinner">"🧠 The AI is thinking... This may take a moment."</p>
				</Show>
				{move || failure.get().map(|e| view! { <FailureNotice error=e /> })}

				{move || {
					session
						.with(|s| {
							s.current()
								.cloned()
								.map(|map| {
									let last_topic = s.last_topic().to_string();
									view! { <Results map=map topic=last_topic tab=tab /> }
								})
						})
				}}
			</main>
		</div>
	}
}

#[component]
fn FailureNotice(error: GenerateError) -> impl IntoView {
	// bad input is a nudge, not an error
	let class = match error {
		GenerateError::InvalidInput(_) => "warning",
		_ => "error",
	};
	let text = match &error {
		GenerateError::InvalidInput(_) => error.to_string(),
		other => format!("An error occurred: {other}"),
	};
	view! { <p class=class>{text}</p> }
}

#[component]
fn Results(map: TopicMap, topic: String, tab: RwSignal<Tab>) -> impl IntoView {
	let graph = to_graph(&map);
	let banner = topic.clone();

	view! {
		<div class="success">"Topical Map generated for: " <strong>{banner}</strong></div>
		<div class="tabs">
			<button
				class:active=move || tab.get() == Tab::MindMap
				on:click=move |_| tab.set(Tab::MindMap)
			>
				"📊 Visual Mind Map"
			</button>
			<button
				class:active=move || tab.get() == Tab::Details
				on:click=move |_| tab.set(Tab::Details)
			>
				"📄 Detailed View & Export"
			</button>
		</div>
		{move || match tab.get() {
			Tab::MindMap => view! { <MindMap graph=graph.clone() /> }.into_any(),
			Tab::Details => view! { <ContentPlan map=map.clone() topic=topic.clone() /> }.into_any(),
		}}
	}
}

#[component]
fn MindMap(graph: TopicGraph) -> impl IntoView {
	let shared: Vec<String> = graph.collisions.iter().map(|c| c.title.clone()).collect();
	let notice = (!shared.is_empty()).then(|| {
		view! {
			<p class="warning">
				"Some titles appear more than once and are drawn as a single node: "
				{shared.join(", ")}
			</p>
		}
	});

	view! {
		<section class="mind-map">
			<h3>"Interactive Topical Map Visualization"</h3>
			<p>
				"Click and drag nodes to explore the map. Hover over page nodes (blue) for more details."
			</p>
			{notice}
			<ForceGraphCanvas graph=graph />
		</section>
	}
}
