use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, NodeInfo, TooltipAnchor};

const BACKGROUND: &str = "#222222";
const TOOLTIP_FONT_PX: f64 = 13.0;
const TOOLTIP_LINE_PX: f64 = 17.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	draw_tooltip(state, ctx);
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	state.graph.visit_edges(|n1, n2, _| {
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (start, end) = (
			n1.data.user_data.border_distance(ux, uy),
			n2.data.user_data.border_distance(ux, uy),
		);
		// overlapping boxes: nothing visible to connect
		if start + end + arrow_size >= dist {
			return;
		}

		let is_highlighted = state.is_highlighted(n1.index()) && state.is_highlighted(n2.index());

		// t=0: every edge at base alpha; t=1: highlighted edges brighten, the rest fade
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};
		// edges take the colour of the node they leave, like inherited edge colours
		let rgb = hex_to_rgb(&n1.data.user_data.color).unwrap_or((100, 180, 255));

		ctx.set_stroke_style_str(&rgba(rgb, edge_alpha));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		ctx.begin_path();
		ctx.move_to(x1 + ux * start, y1 + uy * start);
		ctx.line_to(x2 - ux * (end + arrow_size), y2 - uy * (end + arrow_size));
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&rgba(rgb, arrow_alpha));
		let (tip_x, tip_y) = (x2 - ux * end, y2 - uy * end);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	});
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if has_highlight && state.is_highlighted(idx) {
			return;
		}
		let alpha = 1.0 - 0.7 * t;
		ctx.set_global_alpha(alpha);
		draw_box(ctx, node.x() as f64, node.y() as f64, &node.data.user_data, 1.0, 2.0 / k);
		ctx.set_global_alpha(1.0);
	});

	if !has_highlight {
		return;
	}

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if !state.is_highlighted(idx) {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let info = &node.data.user_data;
		let is_hovered = state.is_hovered(idx);
		let is_neighbor =
			state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx);

		let (scale, glow) = if is_hovered {
			(1.0 + 0.15 * t, 1.8 + 1.2 * t)
		} else if is_neighbor {
			(1.0 + 0.08 * t, 1.4 + 0.6 * t)
		} else {
			(1.0, 0.0)
		};

		if glow > 0.0 && t > 0.01 {
			let inner = info.half_height * 0.3;
			let outer = info.half_width.max(info.half_height) * glow;
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, inner, x, y, outer) {
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient
					.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, outer, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		// borders thicken on selection
		let border = if is_hovered { 4.0 } else { 2.0 };
		draw_box(ctx, x, y, info, scale, border / k);
	});
}

fn draw_box(
	ctx: &CanvasRenderingContext2d,
	x: f64,
	y: f64,
	info: &NodeInfo,
	scale: f64,
	border: f64,
) {
	let (hw, hh) = (info.half_width * scale, info.half_height * scale);
	ctx.begin_path();
	ctx.rect(x - hw, y - hh, 2.0 * hw, 2.0 * hh);
	ctx.set_fill_style_str(&info.color);
	ctx.fill();
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.85)");
	ctx.set_line_width(border);
	ctx.stroke();

	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("{}px sans-serif", info.font_px * scale));
	let _ = ctx.fill_text(&info.label, x, y);
}

/// Hover text in screen space so it stays legible at any zoom.
fn draw_tooltip(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let Some(idx) = state.hover.node else {
		return;
	};
	let Some(TooltipAnchor { x, y, text }) = state.tooltip_of(idx) else {
		return;
	};
	if t < 0.05 {
		return;
	}

	let sx = x * state.transform.k + state.transform.x;
	let sy = y * state.transform.k + state.transform.y + 8.0;
	let lines: Vec<&str> = text.lines().collect();

	ctx.set_font(&format!("{}px sans-serif", TOOLTIP_FONT_PX));
	ctx.set_text_align("left");
	ctx.set_text_baseline("top");
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max)
		+ 16.0;
	let height = lines.len() as f64 * TOOLTIP_LINE_PX + 10.0;
	// keep the box on the canvas
	let left = (sx - width / 2.0).clamp(4.0, (state.width - width - 4.0).max(4.0));
	let top = sy.min(state.height - height - 4.0).max(4.0);

	ctx.set_global_alpha(t);
	ctx.set_fill_style_str("rgba(20, 20, 20, 0.92)");
	ctx.fill_rect(left, top, width, height);
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.4)");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(left, top, width, height);
	ctx.set_fill_style_str("white");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, left + 8.0, top + 5.0 + i as f64 * TOOLTIP_LINE_PX);
	}
	ctx.set_global_alpha(1.0);
}

fn rgba((r, g, b): (u8, u8, u8), alpha: f64) -> String {
	format!("rgba({r}, {g}, {b}, {alpha})")
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
	let hex = hex.strip_prefix('#')?;
	if hex.len() != 6 {
		return None;
	}
	let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
	Some((channel(0)?, channel(2)?, channel(4)?))
}
