pub mod content_plan;
pub mod download;
pub mod force_graph;
