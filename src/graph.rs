//! Pillar → cluster → page graph, with the display metadata the canvas needs.
//!
//! Nodes are keyed by their title text. Two entries with the same title land
//! on the same node; the first one seen keeps its metadata and every later
//! one is recorded in [`TopicGraph::collisions`].

use std::collections::HashMap;

use log::warn;

use crate::model::TopicMap;

/// Fill for the pillar node.
pub const PILLAR_COLOR: &str = "#FF4B4B";
/// Fill for cluster nodes.
pub const CLUSTER_COLOR: &str = "#00C49A";
/// Fill for page nodes.
pub const PAGE_COLOR: &str = "#1E90FF";

/// Level of a node in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// The single root.
	Pillar,
	/// A child of the pillar.
	Cluster,
	/// A child of a cluster.
	Page,
}

impl NodeKind {
	/// Fill colour as a `#RRGGBB` string.
	pub fn color(self) -> &'static str {
		match self {
			Self::Pillar => PILLAR_COLOR,
			Self::Cluster => CLUSTER_COLOR,
			Self::Page => PAGE_COLOR,
		}
	}

	/// Relative node size; the pillar is drawn largest.
	pub fn size(self) -> u32 {
		match self {
			Self::Pillar => 30,
			Self::Cluster => 20,
			Self::Page => 15,
		}
	}
}

/// A graph vertex. `id` and `label` are both the title.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Unique key; edges refer to nodes by it.
	pub id: String,
	/// Text drawn in the box.
	pub label: String,
	/// Level in the hierarchy.
	pub kind: NodeKind,
	/// Fill, from [`NodeKind::color`].
	pub color: &'static str,
	/// Size, from [`NodeKind::size`].
	pub size: u32,
	/// Hover text; only page nodes carry one.
	pub tooltip: Option<String>,
}

/// Directed parent → child link, by node id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
	/// Parent id.
	pub source: String,
	/// Child id.
	pub target: String,
}

/// A title that was claimed by more than one entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleCollision {
	/// The shared title.
	pub title: String,
	/// Kind of the node that kept the title.
	pub kept: NodeKind,
	/// Kind of the entry that was folded into it.
	pub merged: NodeKind,
}

/// Renderer-agnostic description of a map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicGraph {
	/// Distinct nodes in first-seen order.
	pub nodes: Vec<GraphNode>,
	/// One per cluster and one per page, in document order.
	pub edges: Vec<GraphEdge>,
	/// Titles that were merged into an existing node.
	pub collisions: Vec<TitleCollision>,
}

impl TopicGraph {
	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// True when at least one title was merged.
	pub fn has_collisions(&self) -> bool {
		!self.collisions.is_empty()
	}
}

/// Hover text for a page node.
pub fn page_tooltip(keywords_joined: &str, word_count: &str) -> String {
	format!("Keywords: {keywords_joined}\nWord Count: {word_count}")
}

/// Build the graph for `map`.
pub fn to_graph(map: &TopicMap) -> TopicGraph {
	let mut builder = GraphBuilder::default();
	let pillar = &map.pillar_topic;
	builder.add_node(pillar, NodeKind::Pillar, None);

	for cluster in &map.clusters {
		let cluster_id = &cluster.cluster_title;
		builder.add_node(cluster_id, NodeKind::Cluster, None);
		builder.add_edge(pillar, cluster_id);

		for page in &cluster.pages {
			let tooltip = page_tooltip(&page.keywords_joined(), &page.word_count.to_string());
			builder.add_node(&page.page_title, NodeKind::Page, Some(tooltip));
			builder.add_edge(cluster_id, &page.page_title);
		}
	}

	for collision in &builder.graph.collisions {
		warn!(
			"Title {:?} is used by a {:?} and a {:?}; they share one graph node",
			collision.title, collision.kept, collision.merged
		);
	}
	builder.graph
}

#[derive(Default)]
struct GraphBuilder {
	graph: TopicGraph,
	index: HashMap<String, usize>,
}

impl GraphBuilder {
	fn add_node(&mut self, title: &str, kind: NodeKind, tooltip: Option<String>) {
		if let Some(&i) = self.index.get(title) {
			self.graph.collisions.push(TitleCollision {
				title: title.to_string(),
				kept: self.graph.nodes[i].kind,
				merged: kind,
			});
			return;
		}
		self.index.insert(title.to_string(), self.graph.nodes.len());
		self.graph.nodes.push(GraphNode {
			id: title.to_string(),
			label: title.to_string(),
			kind,
			color: kind.color(),
			size: kind.size(),
			tooltip,
		});
	}

	fn add_edge(&mut self, source: &str, target: &str) {
		self.graph.edges.push(GraphEdge {
			source: source.to_string(),
			target: target.to_string(),
		});
	}
}
