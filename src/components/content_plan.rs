//! Tabular view of a map: one collapsible table per cluster.

use leptos::prelude::*;

use crate::components::download::ExportButton;
use crate::export::{export_filename, flatten};
use crate::model::{Cluster, TopicMap};

#[component]
pub fn ContentPlan(map: TopicMap, topic: String) -> impl IntoView {
	let rows = flatten(&map);
	let filename = export_filename(&topic);
	let pillar = map.pillar_topic.clone();
	let summary = format!(
		"{} clusters · {} pages · {} suggested words",
		map.cluster_count(),
		map.page_count(),
		map.total_word_count()
	);

	view! {
		<section class="content-plan">
			<h3>"Detailed Content Plan"</h3>
			<ExportButton rows=rows filename=filename />
			<div class="info">
				<h4>"Pillar Topic: " {pillar}</h4>
				<p class="summary">{summary}</p>
			</div>
			{map
				.clusters
				.into_iter()
				.enumerate()
				.map(|(i, cluster)| view! { <ClusterTable number={i + 1} cluster=cluster /> })
				.collect_view()}
		</section>
	}
}

#[component]
fn ClusterTable(number: usize, cluster: Cluster) -> impl IntoView {
	let heading = format!("Cluster {number}: {}", cluster.cluster_title);
	let body = (!cluster.pages.is_empty()).then(|| {
		view! {
			<table>
				<thead>
					<tr>
						<th>"Page Topic / Article Title"</th>
						<th>"Keywords"</th>
						<th>"Suggested Word Count"</th>
					</tr>
				</thead>
				<tbody>
					{cluster
						.pages
						.iter()
						.map(|page| {
							view! {
								<tr>
									<td>{page.page_title.clone()}</td>
									<td>{page.keywords_joined()}</td>
									<td>{page.word_count.to_string()}</td>
								</tr>
							}
						})
						.collect_view()}
				</tbody>
			</table>
		}
	});

	view! {
		<details class="cluster" open=true>
			<summary>
				<strong>{heading}</strong>
			</summary>
			{body}
		</details>
	}
}
