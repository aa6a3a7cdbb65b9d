use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use super::io;
use super::projection::Projection;
use super::render;
use super::state::FlowMapState;
use super::topology::MapShapes;

const TOPOLOGY_URL: &str = "data/us-10m.v1.json";
const SAVED_POSITIONS_URL: &str = "data/xycoords.json";

/// Dropdown entries: pollutant × variable combinations.
fn dataset_options() -> Vec<String> {
	let mut options = Vec::new();
	for poll in ["CO2", "SO2", "NOX"] {
		for variable in ["E", poll] {
			options.push(format!("data/graph_{variable}_{poll}i.json"));
		}
	}
	options
}

#[derive(Clone, Copy, Debug)]
enum DragTarget {
	Node(usize),
	Label(usize),
}

/// State shared between the mount effect, event closures, and fetch futures.
/// Single-threaded: everything is mutated synchronously inside handlers.
#[derive(Default)]
struct Shared {
	state: RefCell<Option<FlowMapState>>,
	shapes: RefCell<Option<MapShapes>>,
	drag: Cell<Option<DragTarget>>,
	/// Monotonic id so only the newest in-flight dataset fetch applies.
	request_id: Cell<u64>,
}

fn draw(canvas_ref: NodeRef<leptos::html::Canvas>, shared: &Shared) {
	let Some(canvas) = canvas_ref.get_untracked() else {
		return;
	};
	let canvas: HtmlCanvasElement = canvas.into();
	let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
		Ok(Some(ctx)) => ctx.unchecked_into(),
		_ => return,
	};
	if let Some(state) = shared.state.borrow().as_ref() {
		render::render(state, shared.shapes.borrow().as_ref(), &ctx);
	}
}

/// Fetch a dataset and replace the session state wholesale; last request wins.
fn load_dataset(
	url: String,
	shared: Rc<Shared>,
	canvas_ref: NodeRef<leptos::html::Canvas>,
	set_load_error: WriteSignal<Option<String>>,
) {
	let id = shared.request_id.get() + 1;
	shared.request_id.set(id);
	spawn_local(async move {
		match io::load_graph(&url).await {
			Ok(doc) => {
				if shared.request_id.get() != id {
					// Superseded by a newer selection while in flight.
					return;
				}
				*shared.state.borrow_mut() = Some(FlowMapState::new(doc, Projection::new()));
				set_load_error.set(None);
				draw(canvas_ref, &shared);
			}
			Err(err) => {
				error!("failed to load {url}: {err}");
				if shared.request_id.get() == id {
					set_load_error.set(Some(err.to_string()));
				}
			}
		}
	});
}

fn event_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Interactive energy-flow map: dataset dropdown, draggable nodes and labels,
/// and manual save/load of dragged positions.
#[component]
pub fn FlowMapCanvas() -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let shared: Rc<Shared> = Rc::new(Shared::default());
	let (load_error, set_load_error) = signal(None::<String>);
	let options = dataset_options();
	let initial_url = options[0].clone();

	let shared_init = shared.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(render::WIDTH as u32);
		canvas.set_height(render::HEIGHT as u32);

		let shared = shared_init.clone();
		let url = initial_url.clone();
		spawn_local(async move {
			match io::load_map_shapes(TOPOLOGY_URL).await {
				Ok(shapes) => {
					*shared.shapes.borrow_mut() = Some(shapes);
					draw(canvas_ref, &shared);
				}
				Err(err) => {
					error!("failed to load {TOPOLOGY_URL}: {err}");
					set_load_error.set(Some(err.to_string()));
				}
			}
		});
		load_dataset(url, shared_init.clone(), canvas_ref, set_load_error);
	});

	let shared_md = shared.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(state) = shared_md.state.borrow().as_ref() {
			// Nodes sit on top of the small labels.
			let target = state
				.node_at(x, y)
				.map(DragTarget::Node)
				.or_else(|| state.label_at(x, y).map(DragTarget::Label));
			shared_md.drag.set(target);
		}
	};

	let shared_mm = shared.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(target) = shared_mm.drag.get() else {
			return;
		};
		let Some((x, y)) = event_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(state) = shared_mm.state.borrow_mut().as_mut() {
			match target {
				DragTarget::Node(idx) => state.drag_node(idx, x, y),
				DragTarget::Label(idx) => state.drag_label(idx, x, y),
			}
		}
		draw(canvas_ref, &shared_mm);
	};

	let shared_mu = shared.clone();
	let on_mouseup = move |_: MouseEvent| {
		shared_mu.drag.set(None);
	};
	let shared_ml = shared.clone();
	let on_mouseleave = move |_: MouseEvent| {
		shared_ml.drag.set(None);
	};

	let shared_sel = shared.clone();
	let on_select = move |ev: web_sys::Event| {
		load_dataset(
			event_target_value(&ev),
			shared_sel.clone(),
			canvas_ref,
			set_load_error,
		);
	};

	let shared_save = shared.clone();
	let on_save_nodes = move |_: MouseEvent| {
		if let Some(state) = shared_save.state.borrow().as_ref() {
			io::download_positions(&state.node_positions(), "xycoords.json");
		}
	};
	let shared_save_lab = shared.clone();
	let on_save_labels = move |_: MouseEvent| {
		if let Some(state) = shared_save_lab.state.borrow().as_ref() {
			io::download_positions(&state.label_positions(), "xycoords_lab.json");
		}
	};

	let shared_load = shared.clone();
	let on_load_nodes = move |_: MouseEvent| {
		let shared = shared_load.clone();
		spawn_local(async move {
			match io::load_positions(SAVED_POSITIONS_URL).await {
				Ok(saved) => {
					if let Some(state) = shared.state.borrow_mut().as_mut() {
						state.apply_node_positions(&saved);
					}
					draw(canvas_ref, &shared);
				}
				Err(err) => {
					error!("failed to load {SAVED_POSITIONS_URL}: {err}");
					set_load_error.set(Some(err.to_string()));
				}
			}
		});
	};

	view! {
		<div class="flow-map">
			<canvas
				node_ref=canvas_ref
				class="flow-map-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				style="display: block; cursor: grab;"
			/>
			<div class="flow-map-controls">
				<select on:change=on_select>
					{options
						.into_iter()
						.map(|o| view! { <option value=o.clone()>{o.clone()}</option> })
						.collect_view()}
				</select>
				<input type="button" value="Save node positions" on:click=on_save_nodes />
				<input type="button" value="Load node positions" on:click=on_load_nodes />
				<input type="button" value="Save label positions" on:click=on_save_labels />
				{move || {
					load_error
						.get()
						.map(|msg| view! { <p class="load-error">{msg}</p> })
				}}
			</div>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dropdown_lists_every_pollutant_variable_pair() {
		let options = dataset_options();
		assert_eq!(
			options,
			vec![
				"data/graph_E_CO2i.json",
				"data/graph_CO2_CO2i.json",
				"data/graph_E_SO2i.json",
				"data/graph_SO2_SO2i.json",
				"data/graph_E_NOXi.json",
				"data/graph_NOX_NOXi.json",
			]
		);
	}
}
