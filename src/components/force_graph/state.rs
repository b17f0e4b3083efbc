use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::debug;

use crate::graph::{NodeKind, TopicGraph};

pub const BOX_PADDING: f64 = 6.0;
// Rough average glyph width for sans-serif, as a fraction of font size.
const GLYPH_WIDTH: f64 = 0.58;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;
pub const PAN_STEP: f64 = 40.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub label: String,
	pub color: String,
	pub tooltip: Option<String>,
	pub font_px: f64,
	pub half_width: f64,
	pub half_height: f64,
}

impl NodeInfo {
	fn new(label: &str, color: &str, size: u32, tooltip: Option<String>) -> Self {
		let font_px = 8.0 + size as f64 * 0.4;
		let text_width = label.chars().count() as f64 * font_px * GLYPH_WIDTH;
		Self {
			label: label.to_string(),
			color: color.to_string(),
			tooltip,
			font_px,
			half_width: text_width / 2.0 + BOX_PADDING,
			half_height: font_px / 2.0 + BOX_PADDING,
		}
	}

	pub fn contains(&self, dx: f64, dy: f64) -> bool {
		dx.abs() <= self.half_width && dy.abs() <= self.half_height
	}

	/// Distance from the box centre to its border along unit direction `(ux, uy)`.
	pub fn border_distance(&self, ux: f64, uy: f64) -> f64 {
		let tx = if ux.abs() > f64::EPSILON { self.half_width / ux.abs() } else { f64::INFINITY };
		let ty = if uy.abs() > f64::EPSILON { self.half_height / uy.abs() } else { f64::INFINITY };
		tx.min(ty)
	}
}

#[derive(Clone, Debug)]
pub struct TooltipAnchor {
	pub x: f64,
	pub y: f64,
	pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	pub flow_time: f64,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
}

impl ForceGraphState {
	pub fn new(data: &TopicGraph, width: f64, height: f64) -> Self {
		// Strong repulsion and long springs keep the boxed labels apart.
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 1200.0,
			force_spring: 0.04,
			force_max: 120.0,
			node_speed: 3000.0,
			damping_factor: 0.85,
		});
		let mut id_to_idx = HashMap::new();
		let mut edges = Vec::new();

		let rings = ring_positions(data);
		for node in &data.nodes {
			let (x, y) = rings.get(node.id.as_str()).copied().unwrap_or((0.0, 0.0));
			let idx = graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: node.size as f32,
				// pillar stays put at the origin
				is_anchor: node.kind == NodeKind::Pillar,
				user_data: NodeInfo::new(&node.label, node.color, node.size, node.tooltip.clone()),
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		for link in &data.edges {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(link.source.as_str()),
				id_to_idx.get(link.target.as_str()),
			) {
				if src == tgt {
					debug!("Skipping self edge on {:?}", link.source);
					continue;
				}
				graph.add_edge(src, tgt, EdgeData::default());
				edges.push((src, tgt));
			}
		}

		Self {
			graph,
			edges,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			flow_time: 0.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if node.data.user_data.contains(dx, dy) {
				found = Some(node.index());
			}
		});
		found
	}

	/// Zoom by `factor`, keeping screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn zoom_centered(&mut self, factor: f64) {
		self.zoom_at(factor, self.width / 2.0, self.height / 2.0);
	}

	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Recentre on the origin at the zoom level that fits every node.
	pub fn fit_view(&mut self) {
		let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			let (x, y) = (node.x() as f64, node.y() as f64);
			min_x = min_x.min(x - info.half_width);
			max_x = max_x.max(x + info.half_width);
			min_y = min_y.min(y - info.half_height);
			max_y = max_y.max(y + info.half_height);
		});
		// the pillar sits at the origin, so fit the larger half-extent on each axis
		let half_w = min_x.abs().max(max_x) + BOX_PADDING;
		let half_h = min_y.abs().max(max_y) + BOX_PADDING;
		let k = (self.width / (2.0 * half_w))
			.min(self.height / (2.0 * half_h))
			.clamp(MIN_ZOOM, 1.0);
		self.transform = ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k,
		};
	}

	/// Hover text of `idx` and the graph point just below its box.
	pub fn tooltip_of(&self, idx: DefaultNodeIdx) -> Option<TooltipAnchor> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let info = &node.data.user_data;
			if node.index() != idx {
				return;
			}
			if let Some(text) = &info.tooltip {
				found = Some(TooltipAnchor {
					x: node.x() as f64,
					y: node.y() as f64 + info.half_height,
					text: text.clone(),
				});
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the old highlight around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Starting layout: pillar at the origin, clusters on an inner ring, each
/// cluster's pages fanned out on an outer ring around their cluster's angle.
fn ring_positions(data: &TopicGraph) -> HashMap<&str, (f64, f64)> {
	const CLUSTER_RING: f64 = 220.0;
	const PAGE_RING: f64 = 420.0;

	let mut positions = HashMap::new();
	let clusters: Vec<&str> = data
		.nodes
		.iter()
		.filter(|n| n.kind == NodeKind::Cluster)
		.map(|n| n.id.as_str())
		.collect();
	let slice = 2.0 * PI / clusters.len().max(1) as f64;

	for (i, cluster) in clusters.iter().enumerate() {
		let angle = i as f64 * slice;
		positions.insert(*cluster, (CLUSTER_RING * angle.cos(), CLUSTER_RING * angle.sin()));

		let pages: Vec<&str> = data
			.edges
			.iter()
			.filter(|e| e.source == *cluster)
			.filter_map(|e| data.node(&e.target))
			.filter(|n| n.kind == NodeKind::Page)
			.map(|n| n.id.as_str())
			.collect();
		for (j, page) in pages.iter().enumerate() {
			let offset = (j as f64 + 0.5) / pages.len() as f64 - 0.5;
			let a = angle + offset * slice * 0.9;
			positions
				.entry(*page)
				.or_insert((PAGE_RING * a.cos(), PAGE_RING * a.sin()));
		}
	}
	positions
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::to_graph;
	use crate::model::{Cluster, Page, TopicMap, WordCount};

	fn sample_graph() -> TopicGraph {
		to_graph(&TopicMap {
			pillar_topic: "Coffee Brewing".into(),
			clusters: vec![Cluster {
				cluster_title: "Brewing Methods".into(),
				pages: vec![Page {
					page_title: "French Press Guide".into(),
					keywords: vec!["french press".into()],
					word_count: WordCount::Number(800.into()),
				}],
			}],
		})
	}

	#[test]
	fn pillar_is_hit_at_canvas_centre() {
		let state = ForceGraphState::new(&sample_graph(), 800.0, 600.0);
		let idx = state.node_at_position(400.0, 300.0).unwrap();
		let mut label = String::new();
		state.graph.visit_nodes(|n| {
			if n.index() == idx {
				label = n.data.user_data.label.clone();
			}
		});
		assert_eq!(label, "Coffee Brewing");
		assert!(state.node_at_position(5.0, 5.0).is_none());
	}

	#[test]
	fn zoom_keeps_anchor_point_and_clamps() {
		let mut state = ForceGraphState::new(&sample_graph(), 800.0, 600.0);
		let before = state.screen_to_graph(100.0, 100.0);
		state.zoom_at(2.0, 100.0, 100.0);
		let after = state.screen_to_graph(100.0, 100.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
		assert_eq!(state.transform.k, 2.0);

		for _ in 0..50 {
			state.zoom_centered(2.0);
		}
		assert_eq!(state.transform.k, MAX_ZOOM);
	}

	#[test]
	fn fit_view_recentres() {
		let mut state = ForceGraphState::new(&sample_graph(), 800.0, 600.0);
		state.pan_by(300.0, -200.0);
		state.zoom_centered(5.0);
		state.fit_view();
		assert_eq!((state.transform.x, state.transform.y), (400.0, 300.0));
		assert!(state.transform.k <= 1.0 && state.transform.k >= MIN_ZOOM);
	}

	#[test]
	fn only_pages_have_tooltips() {
		let state = ForceGraphState::new(&sample_graph(), 800.0, 600.0);
		let mut with_tooltip = Vec::new();
		state.graph.visit_nodes(|n| {
			if state.tooltip_of(n.index()).is_some() {
				with_tooltip.push(n.data.user_data.label.clone());
			}
		});
		assert_eq!(with_tooltip, ["French Press Guide"]);
	}

	#[test]
	fn hover_collects_neighbors() {
		let mut state = ForceGraphState::new(&sample_graph(), 800.0, 600.0);
		let pillar = state.node_at_position(400.0, 300.0).unwrap();
		state.set_hover(Some(pillar));
		assert_eq!(state.hover.neighbors.len(), 1);
		assert!(state.is_hovered(pillar));
		state.set_hover(None);
		assert_eq!(state.hover.prev_node, Some(pillar));
	}

	#[test]
	fn box_border_distance() {
		let info = NodeInfo::new("abcd", "#fff", 15, None);
		assert_eq!(info.border_distance(1.0, 0.0), info.half_width);
		assert_eq!(info.border_distance(0.0, -1.0), info.half_height);
		assert!(info.contains(0.0, 0.0));
		assert!(!info.contains(info.half_width + 1.0, 0.0));
	}
}
