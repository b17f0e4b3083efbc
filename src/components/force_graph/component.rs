use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::ev;
use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::RenderError;
use super::render;
use super::state::{ForceGraphState, PAN_STEP};
use crate::graph::TopicGraph;

const FALLBACK_WIDTH: f64 = 800.0;

type SharedState = Rc<RefCell<Option<ForceGraphState>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Interactive force-directed view of a topic graph.
///
/// Drag nodes to pin them, drag the background to pan, scroll or use
/// `+`/`-` to zoom, arrow keys to pan and `0` to fit. Hovering a page shows
/// its keywords and word count.
#[component]
pub fn ForceGraphCanvas(
	graph: TopicGraph,
	#[prop(default = 750.0)] height: f64,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let stopped = Arc::new(AtomicBool::new(false));
	let render_error = RwSignal::new(None::<String>);

	let (state_init, animate_init, stopped_init) = (state.clone(), animate.clone(), stopped.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let started = start(
			canvas,
			&graph,
			height,
			state_init.clone(),
			animate_init.clone(),
			stopped_init.clone(),
		);
		if let Err(e) = started {
			error!("Mind map failed to start: {e}");
			render_error.set(Some(e.to_string()));
		}
	});

	let state_rs = state.clone();
	let resize = window_event_listener(ev::resize, move |_| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let width = parent_width(&canvas);
		canvas.set_width(width as u32);
		if let Some(ref mut s) = *state_rs.borrow_mut() {
			s.resize(width, height);
		}
	});
	on_cleanup(move || {
		stopped.store(true, Ordering::Relaxed);
		resize.remove();
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_coords(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_coords(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_coords(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(factor, x, y);
		}
	};

	let state_kd = state.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if let Some(ref mut s) = *state_kd.borrow_mut() {
			match ev.key().as_str() {
				"+" | "=" => s.zoom_centered(1.1),
				"-" | "_" => s.zoom_centered(0.9),
				"0" => s.fit_view(),
				"ArrowLeft" => s.pan_by(PAN_STEP, 0.0),
				"ArrowRight" => s.pan_by(-PAN_STEP, 0.0),
				"ArrowUp" => s.pan_by(0.0, PAN_STEP),
				"ArrowDown" => s.pan_by(0.0, -PAN_STEP),
				_ => return,
			}
			ev.prevent_default();
		}
	};

	let nav = move |action: fn(&mut ForceGraphState)| {
		let state = state.clone();
		move |_: MouseEvent| {
			if let Some(ref mut s) = *state.borrow_mut() {
				action(s);
			}
		}
	};

	view! {
		<div class="force-graph" style=format!("position: relative; height: {height}px;")>
			{move || {
				render_error
					.get()
					.map(|msg| view! { <p class="render-error">"Could not draw the mind map: " {msg}</p> })
			}}
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:keydown=on_keydown
				style="display: block; cursor: grab; outline: none;"
			/>
			<div class="graph-nav">
				<button title="Zoom in" on:click=nav(|s| s.zoom_centered(1.2))>"+"</button>
				<button title="Zoom out" on:click=nav(|s| s.zoom_centered(1.0 / 1.2))>"−"</button>
				<button title="Fit" on:click=nav(ForceGraphState::fit_view)>"⤢"</button>
			</div>
		</div>
	}
}

/// Size the canvas, build the simulation and start the frame loop.
fn start(
	canvas: HtmlCanvasElement,
	graph: &TopicGraph,
	height: f64,
	state: SharedState,
	animate: FrameCallback,
	stopped: Arc<AtomicBool>,
) -> Result<(), RenderError> {
	let window = web_sys::window().ok_or(RenderError::NoWindow)?;
	let width = parent_width(&canvas);
	canvas.set_width(width as u32);
	canvas.set_height(height as u32);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(RenderError::from_js)?
		.ok_or(RenderError::NoContext)?
		.dyn_into()
		.map_err(|_| RenderError::NoContext)?;

	let mut initial = ForceGraphState::new(graph, width, height);
	initial.fit_view();
	debug!("Mind map canvas {width}x{height}, {} nodes", graph.nodes.len());
	*state.borrow_mut() = Some(initial);

	let (state_anim, animate_inner) = (state.clone(), animate.clone());
	*animate.borrow_mut() = Some(Closure::new(move || {
		if release_if_stopped(&animate_inner, &stopped) {
			debug!("Mind map frame loop stopped");
			return;
		}
		if let Some(ref mut s) = *state_anim.borrow_mut() {
			if s.animation_running {
				s.tick(0.016);
			}
			render::render(s, &ctx);
		}
		if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		window
			.request_animation_frame(cb.as_ref().unchecked_ref())
			.map_err(RenderError::from_js)?;
	}
	Ok(())
}

/// Empty `slot` once the loop has been told to stop.
///
/// The frame callback holds a handle on its own slot, so the slot has to be
/// emptied from inside the loop or the callback is never freed. wasm-bindgen
/// defers freeing a closure dropped during its own call until it returns.
fn release_if_stopped<T>(slot: &RefCell<Option<T>>, stopped: &AtomicBool) -> bool {
	if !stopped.load(Ordering::Relaxed) {
		return false;
	}
	let released = slot.borrow_mut().take();
	drop(released);
	true
}

fn parent_width(canvas: &HtmlCanvasElement) -> f64 {
	canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(FALLBACK_WIDTH)
}

fn local_coords(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[cfg(test)]
mod tests {
	use std::rc::Weak;

	use super::*;

	type Slot = Rc<RefCell<Option<Box<dyn Fn() -> usize>>>>;

	fn self_referencing_slot() -> (Slot, Weak<RefCell<Option<Box<dyn Fn() -> usize>>>>) {
		let slot: Slot = Rc::new(RefCell::new(None));
		let inner = slot.clone();
		*slot.borrow_mut() = Some(Box::new(move || Rc::strong_count(&inner)));
		let weak = Rc::downgrade(&slot);
		(slot, weak)
	}

	#[test]
	fn running_loop_keeps_its_callback() {
		let (slot, weak) = self_referencing_slot();
		let stopped = AtomicBool::new(false);
		assert!(!release_if_stopped(&slot, &stopped));
		assert!(slot.borrow().is_some());
		drop(slot);
		assert!(weak.upgrade().is_some(), "callback still owns its slot");
	}

	#[test]
	fn stopped_loop_frees_its_callback() {
		let (slot, weak) = self_referencing_slot();
		let stopped = AtomicBool::new(true);
		assert!(release_if_stopped(&slot, &stopped));
		assert!(slot.borrow().is_none());
		drop(slot);
		assert!(weak.upgrade().is_none());
	}
}
