//! Immediate-mode canvas rendering of the flow map.
//!
//! Every call redraws the full frame from current session state: background
//! map, links with arrowheads, nodes, small labels, the three legends, and the
//! titles. Absent data simply stops being drawn, which replaces DOM-style
//! enter/update/exit reconciliation.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scale::{LinearScale, si_format};
use super::state::{FlowMapState, RADIUS_TEXT, RADIUS_TEXT_NUMBER};
use super::topology::MapShapes;
use super::types::CONSUMPTION_FIELD;

pub const WIDTH: f64 = 960.0;
pub const HEIGHT: f64 = 670.0;
pub const MAP_HEIGHT: f64 = 600.0;

const SEA_FILL: &str = "#b3c9d9";
const LAND_FILL: &str = "#dddddd";
const BORDER_STROKE: &str = "#ffffff";
const INTERCONNECT_STROKE: &str = "grey";
const TEXT_FILL: &str = "#222222";

/// Divider polylines between the three interconnects, in map pixels.
const INTERCONNECT_LINES: [&[(f64, f64)]; 2] = [
	&[(420.0, 50.0), (420.0, 370.0), (320.0, 530.0)],
	&[(420.0, 370.0), (650.0, 530.0)],
];

pub fn render(state: &FlowMapState, shapes: Option<&MapShapes>, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(SEA_FILL);
	ctx.fill_rect(0.0, 0.0, WIDTH, HEIGHT);
	if let Some(shapes) = shapes {
		draw_background(shapes, ctx);
	}
	draw_links(state, ctx);
	draw_nodes(state, ctx);
	draw_labels(state, ctx);
	draw_color_legend(state, ctx);
	draw_circle_legend(state, ctx);
	draw_line_legend(state, ctx);
	draw_titles(state, ctx);
}

fn trace(ctx: &CanvasRenderingContext2d, points: &[(f64, f64)]) {
	ctx.begin_path();
	for (i, (x, y)) in points.iter().enumerate() {
		if i == 0 {
			ctx.move_to(*x, *y);
		} else {
			ctx.line_to(*x, *y);
		}
	}
}

fn draw_background(shapes: &MapShapes, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(LAND_FILL);
	for ring in &shapes.land {
		trace(ctx, ring);
		ctx.close_path();
		ctx.fill();
	}

	ctx.set_stroke_style_str(BORDER_STROKE);
	ctx.set_line_width(1.0);
	for border in &shapes.borders {
		trace(ctx, border);
		ctx.stroke();
	}

	ctx.set_stroke_style_str(INTERCONNECT_STROKE);
	ctx.set_line_width(2.0);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(6.0),
		&JsValue::from_f64(4.0),
	));
	for line in INTERCONNECT_LINES {
		trace(ctx, line);
		ctx.stroke();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

/// Arrowhead scaled by stroke width: tip 2.7 stroke-widths past the line end,
/// half-height 1.5 stroke-widths.
fn draw_arrowhead(
	ctx: &CanvasRenderingContext2d,
	end: (f64, f64),
	dir: (f64, f64),
	width: f64,
	color: &str,
) {
	let (ux, uy) = dir;
	let (tip_x, tip_y) = (end.0 + ux * 2.7 * width, end.1 + uy * 2.7 * width);
	let (base_x, base_y) = (end.0 + ux * 0.3 * width, end.1 + uy * 0.3 * width);
	let (px, py) = (-uy * 1.5 * width, ux * 1.5 * width);
	ctx.set_fill_style_str(color);
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(base_x + px, base_y + py);
	ctx.line_to(base_x - px, base_y - py);
	ctx.close_path();
	ctx.fill();
}

fn draw_links(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	for link in &state.links {
		let Some(((sx, sy), (tx, ty))) = state.line_endpoints(link) else {
			continue;
		};
		let width = state.link_width(link);
		let color = state.link_color(link);

		ctx.set_stroke_style_str(color);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(sx, sy);
		ctx.line_to(tx, ty);
		ctx.stroke();

		let (dx, dy) = (tx - sx, ty - sy);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist > 0.0 {
			draw_arrowhead(ctx, (tx, ty), (dx / dist, dy / dist), width, color);
		}
	}
}

fn draw_nodes(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	for node in &state.nodes {
		let r = state.node_radius(node);

		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(state.node_color(node));
		ctx.fill();
		ctx.set_stroke_style_str("black");
		ctx.set_line_width(1.0);
		ctx.stroke();

		ctx.set_fill_style_str(TEXT_FILL);
		ctx.set_font("13px sans-serif");
		ctx.set_text_align("center");
		if r > RADIUS_TEXT_NUMBER {
			// Short name with the consumption value underneath.
			let _ = ctx.fill_text(&node.data.short_nm, node.x, node.y - 4.0);
			if let Some(value) = node.data.metric(CONSUMPTION_FIELD) {
				let _ = ctx.fill_text(&format!("{value:.0}"), node.x, node.y + 12.0);
			}
		} else if r > RADIUS_TEXT {
			let _ = ctx.fill_text(&node.data.short_nm, node.x, node.y + 4.0);
		}
	}
}

fn draw_labels(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(TEXT_FILL);
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("center");
	for label in &state.labels {
		// Only shown when the node circle is too small for inline text.
		if state.label_radius(label) <= RADIUS_TEXT {
			let _ = ctx.fill_text(&label.data.short_nm, label.x, label.y + 4.0);
		}
	}
}

fn draw_color_legend(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	let origin = (430.0, MAP_HEIGHT + 30.0);
	let axis = LinearScale::new(state.scales.color_extent, (0.0, 500.0));
	let color = &state.scales.circle_color;

	for (i, segment_color) in color.range().iter().enumerate() {
		let (lo, hi) = color.invert_extent(i);
		let lo = lo.unwrap_or(state.scales.color_extent.0);
		let hi = hi.unwrap_or(state.scales.color_extent.1);
		let x0 = axis.scale(lo);
		let x1 = axis.scale(hi);
		ctx.set_fill_style_str(segment_color);
		ctx.fill_rect(origin.0 + x0.min(x1), origin.1, (x1 - x0).abs(), 8.0);
	}

	ctx.set_stroke_style_str(TEXT_FILL);
	ctx.set_fill_style_str(TEXT_FILL);
	ctx.set_line_width(1.0);
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("center");
	for cut in color.domain() {
		let x = origin.0 + axis.scale(*cut);
		ctx.begin_path();
		ctx.move_to(x, origin.1);
		ctx.line_to(x, origin.1 - 5.0);
		ctx.stroke();
		let _ = ctx.fill_text(&format!("{cut:.0}"), x, origin.1 - 8.0);
	}

	ctx.set_font("12px sans-serif");
	ctx.set_text_align("left");
	let _ = ctx.fill_text(&state.meta.leg_color_title, origin.0, origin.1 + 25.0);
}

fn draw_circle_legend(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	let origin = (120.0, MAP_HEIGHT + 40.0);
	let max = state.scales.radius.domain_max();

	ctx.set_stroke_style_str(TEXT_FILL);
	ctx.set_fill_style_str(TEXT_FILL);
	ctx.set_line_width(1.0);
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("center");
	for value in [0.1 * max, 0.35 * max, 0.9 * max] {
		let r = state.scales.radius.scale(value);
		ctx.begin_path();
		let _ = ctx.arc(origin.0, origin.1 - r, r, 0.0, 2.0 * PI);
		ctx.stroke();
		let _ = ctx.fill_text(&si_format(value, 1), origin.0, origin.1 - 2.0 * r - 3.0);
	}

	ctx.set_font("12px sans-serif");
	let _ = ctx.fill_text(&state.meta.leg_circle_title, origin.0, origin.1 + 15.0);
}

fn draw_line_legend(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	// Datasets without links carry no width domain to sample.
	if state.links.is_empty() {
		return;
	}
	let origin = (320.0, MAP_HEIGHT + 40.0);
	let max = state.scales.line_width.domain_max();

	// Sample weights, each with its own x offset so the rows line up.
	for (value, offset) in [(0.15 * max, 120.0), (0.5 * max, 78.0), (max, 43.0)] {
		let w = state.scales.line_width.scale(value);
		let y = origin.1 - 5.0 - w / 2.0;

		ctx.set_stroke_style_str(INTERCONNECT_STROKE);
		ctx.set_line_width(w);
		ctx.begin_path();
		ctx.move_to(origin.0 + offset - 48.0, y);
		ctx.line_to(origin.0 - 48.0, y);
		ctx.stroke();
		draw_arrowhead(
			ctx,
			(origin.0 - 48.0, y),
			(-1.0, 0.0),
			w,
			INTERCONNECT_STROKE,
		);

		ctx.set_fill_style_str(TEXT_FILL);
		ctx.set_font("11px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(
			&si_format(value, 2),
			origin.0 + offset - 60.0,
			origin.1 - 14.0 - w,
		);
	}

	ctx.set_fill_style_str(TEXT_FILL);
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&state.meta.leg_line_title, origin.0, origin.1 + 15.0);
}

fn draw_titles(state: &FlowMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(TEXT_FILL);
	ctx.set_text_align("center");

	ctx.set_font("16px sans-serif");
	let title = format!(
		"2016 {} CONSUMPTION ({:.0} {} total)",
		state.meta.title,
		state.total(),
		state.meta.unit
	);
	let _ = ctx.fill_text(&title, 1.2 * WIDTH / 2.0, 35.0);

	ctx.set_font("13px sans-serif");
	for (group, name, x, y) in [
		("wecc", "Western Interconnect", 120.0, 485.0),
		("eic", "Eastern Interconnect", 750.0, 85.0),
	] {
		let _ = ctx.fill_text(name, x, y);
		let subtotal = format!("{:.0} {}", state.group_total(group), state.meta.unit);
		let _ = ctx.fill_text(&subtotal, x, y + 17.0);
	}
}
