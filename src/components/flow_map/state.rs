//! Session state for one loaded dataset.
//!
//! Created wholesale on every dataset load (so scale domains never leak across
//! switches), mutated in place by drags. Rendering reads this state each frame.

use std::collections::BTreeMap;

use super::projection::Projection;
use super::scale::{
	self, LINE_WIDTH_RANGE, LinearScale, RADIUS_RANGE, SqrtScale, ThresholdScale,
};
use super::types::{CONSUMPTION_FIELD, GraphDocument, Label, Link, Meta, Node};

/// Fallbacks for entities missing (or zeroing) their metric field.
pub const DEFAULT_RADIUS: f64 = 5.0;
pub const DEFAULT_LINE_WIDTH: f64 = 3.0;
pub const DEFAULT_COLOR: &str = "grey";

/// Cutoff radius above which the short name fits inside the node.
pub const RADIUS_TEXT: f64 = 19.0;
/// Cutoff radius above which the metric value is added below the name.
pub const RADIUS_TEXT_NUMBER: f64 = 21.0;

/// Hit radius for the small standalone labels.
pub const LABEL_HIT_RADIUS: f64 = 12.0;

/// A node with its derived screen position.
#[derive(Clone, Debug)]
pub struct PlacedNode {
	pub data: Node,
	pub x: f64,
	pub y: f64,
}

/// A standalone label with its derived screen position.
#[derive(Clone, Debug)]
pub struct PlacedLabel {
	pub data: Label,
	pub x: f64,
	pub y: f64,
}

/// The four scales derived from the current dataset.
#[derive(Clone, Debug)]
pub struct VisualScales {
	pub radius: SqrtScale,
	pub line_width: LinearScale,
	pub circle_color: ThresholdScale,
	/// [min, max] of the circle-color metric, for the legend axis.
	pub color_extent: (f64, f64),
}

impl VisualScales {
	fn from_document(doc: &GraphDocument) -> Self {
		let radius_extent = extent(
			doc.nodes
				.iter()
				.filter_map(|n| n.metric(&doc.meta.field_radius)),
		);
		let color_extent = extent(
			doc.nodes
				.iter()
				.map(|n| n.metric(&doc.meta.field_circle).unwrap_or(0.0)),
		);
		let width_extent = extent(
			doc.links
				.iter()
				.filter_map(|l| l.metric(&doc.meta.field_line_width)),
		);

		let domain = if doc.meta.color_mode_auto {
			scale::auto_color_domain(color_extent.0, color_extent.1)
		} else {
			scale::DEFAULT_COLOR_DOMAIN.to_vec()
		};

		Self {
			radius: SqrtScale::new(radius_extent, RADIUS_RANGE),
			line_width: LinearScale::new(width_extent, LINE_WIDTH_RANGE),
			circle_color: ThresholdScale::new(domain, scale::COLOR_SCHEME.to_vec()),
			color_extent,
		}
	}
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
	values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
		(lo.min(v), hi.max(v))
	})
}

/// Everything the renderer and the interaction handlers need for one dataset.
pub struct FlowMapState {
	pub meta: Meta,
	pub nodes: Vec<PlacedNode>,
	pub labels: Vec<PlacedLabel>,
	pub links: Vec<Link>,
	pub scales: VisualScales,
	pub projection: Projection,
}

impl FlowMapState {
	pub fn new(doc: GraphDocument, projection: Projection) -> Self {
		let scales = VisualScales::from_document(&doc);
		let nodes = doc
			.nodes
			.into_iter()
			.map(|data| {
				let (x, y) = projection.project(data.coords[0], data.coords[1]);
				PlacedNode { data, x, y }
			})
			.collect();
		let labels = doc
			.labels
			.into_iter()
			.map(|data| {
				let (x, y) = projection.project(data.coords[0], data.coords[1]);
				PlacedLabel { data, x, y }
			})
			.collect();
		Self {
			meta: doc.meta,
			nodes,
			labels,
			links: doc.links,
			scales,
			projection,
		}
	}

	/// Rendered radius, falling back when the metric is absent or zero.
	pub fn node_radius(&self, node: &PlacedNode) -> f64 {
		match node.data.metric(&self.meta.field_radius) {
			Some(v) if v != 0.0 => self.scales.radius.scale(v),
			_ => DEFAULT_RADIUS,
		}
	}

	pub fn node_color(&self, node: &PlacedNode) -> &'static str {
		match node.data.metric(&self.meta.field_circle) {
			Some(v) if v != 0.0 => self.scales.circle_color.scale(v),
			_ => DEFAULT_COLOR,
		}
	}

	/// Radius the label's node would render at, deciding label visibility.
	pub fn label_radius(&self, label: &PlacedLabel) -> f64 {
		match label.data.metric(&self.meta.field_radius) {
			Some(v) if v != 0.0 => self.scales.radius.scale(v),
			_ => DEFAULT_RADIUS,
		}
	}

	pub fn link_width(&self, link: &Link) -> f64 {
		match link.metric(&self.meta.field_line_width) {
			Some(v) if v != 0.0 => self.scales.line_width.scale(v),
			_ => DEFAULT_LINE_WIDTH,
		}
	}

	pub fn link_color(&self, link: &Link) -> &'static str {
		match link.metric(&self.meta.field_line_color) {
			Some(v) if v != 0.0 => self.scales.circle_color.scale(v),
			_ => DEFAULT_COLOR,
		}
	}

	/// Topmost node whose circle covers the position.
	pub fn node_at(&self, x: f64, y: f64) -> Option<usize> {
		let mut found = None;
		for (i, node) in self.nodes.iter().enumerate() {
			let (dx, dy) = (node.x - x, node.y - y);
			if (dx * dx + dy * dy).sqrt() <= self.node_radius(node) {
				found = Some(i);
			}
		}
		found
	}

	/// Topmost visible label near the position. Hidden labels (node text shown
	/// inline instead) are not drag targets.
	pub fn label_at(&self, x: f64, y: f64) -> Option<usize> {
		let mut found = None;
		for (i, label) in self.labels.iter().enumerate() {
			if self.label_radius(label) > RADIUS_TEXT {
				continue;
			}
			let (dx, dy) = (label.x - x, label.y - y);
			if (dx * dx + dy * dy).sqrt() <= LABEL_HIT_RADIUS {
				found = Some(i);
			}
		}
		found
	}

	pub fn drag_node(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.x = x;
			node.y = y;
		}
	}

	pub fn drag_label(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(label) = self.labels.get_mut(idx) {
			label.x = x;
			label.y = y;
		}
	}

	/// Endpoints of a link's line, padded so the stroke clears the source
	/// circle and leaves arrowhead room at the target (target radius plus
	/// twice the stroke width). `None` for degenerate zero-length links or
	/// dangling indices.
	pub fn line_endpoints(&self, link: &Link) -> Option<((f64, f64), (f64, f64))> {
		let source = self.nodes.get(link.source)?;
		let target = self.nodes.get(link.target)?;
		let (dx, dy) = (target.x - source.x, target.y - source.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 1e-6 {
			return None;
		}
		let (nx, ny) = (dx / dist, dy / dist);
		let source_padding = self.node_radius(source);
		let target_padding = self.node_radius(target) + 2.0 * self.link_width(link);
		Some((
			(source.x + source_padding * nx, source.y + source_padding * ny),
			(target.x - target_padding * nx, target.y - target_padding * ny),
		))
	}

	/// Sum of the consumption metric over all nodes, for the title.
	pub fn total(&self) -> f64 {
		self.nodes
			.iter()
			.filter_map(|n| n.data.metric(CONSUMPTION_FIELD))
			.sum()
	}

	/// Sum over the nodes tagged with the given interconnect group.
	pub fn group_total(&self, group: &str) -> f64 {
		self.nodes
			.iter()
			.filter(|n| n.data.interconnect.as_deref() == Some(group))
			.filter_map(|n| n.data.metric(CONSUMPTION_FIELD))
			.sum()
	}

	/// Current node positions as geographic coordinates, keyed by short name.
	pub fn node_positions(&self) -> BTreeMap<String, [f64; 2]> {
		self.nodes
			.iter()
			.map(|n| {
				let (lon, lat) = self.projection.invert(n.x, n.y);
				(n.data.short_nm.clone(), [lon, lat])
			})
			.collect()
	}

	/// Current label positions as geographic coordinates, keyed by short name.
	pub fn label_positions(&self) -> BTreeMap<String, [f64; 2]> {
		self.labels
			.iter()
			.map(|l| {
				let (lon, lat) = self.projection.invert(l.x, l.y);
				(l.data.short_nm.clone(), [lon, lat])
			})
			.collect()
	}

	/// Re-project saved geographic coordinates onto matching nodes. Names with
	/// no matching node are ignored.
	pub fn apply_node_positions(&mut self, saved: &BTreeMap<String, [f64; 2]>) {
		for node in &mut self.nodes {
			if let Some([lon, lat]) = saved.get(&node.data.short_nm) {
				let (x, y) = self.projection.project(*lon, *lat);
				node.x = x;
				node.y = y;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_map::types::tests::sample_document;

	fn state() -> FlowMapState {
		FlowMapState::new(sample_document(), Projection::new())
	}

	/// Document whose entities carry no radius/width metrics, so everything
	/// renders at the defaults (radius 5, width 3).
	fn bare_state() -> FlowMapState {
		let doc = GraphDocument::from_json(
			r#"{
				"meta": {
					"colorModeAuto": false,
					"fieldRadius": "E_D", "fieldLineWidth": "E_X",
					"fieldCircle": "CO2i", "fieldLineColor": "CO2i",
					"legColorTitle": "", "legCircleTitle": "", "legLineTitle": "",
					"title": "ELECTRICITY", "unit": "TWh"
				},
				"nodes": [
					{ "shortNm": "A", "coords": [-100.0, 40.0] },
					{ "shortNm": "B", "coords": [-90.0, 40.0] }
				],
				"labels": [],
				"links": [{ "source": 0, "target": 1 }]
			}"#,
		)
		.expect("valid document");
		FlowMapState::new(doc, Projection::new())
	}

	#[test]
	fn line_endpoints_are_padded_along_the_direction() {
		let mut s = bare_state();
		s.drag_node(0, 0.0, 0.0);
		s.drag_node(1, 100.0, 0.0);
		let link = s.links[0].clone();
		let ((sx, sy), (tx, ty)) = s.line_endpoints(&link).expect("non-degenerate");
		// source padding = radius 5; target padding = radius 5 + 2 * width 3.
		assert!((sx - 5.0).abs() < 1e-12 && sy.abs() < 1e-12);
		assert!((tx - 89.0).abs() < 1e-12 && ty.abs() < 1e-12);
	}

	#[test]
	fn vertical_links_pad_vertically() {
		let mut s = bare_state();
		s.drag_node(0, 10.0, 10.0);
		s.drag_node(1, 10.0, 110.0);
		let link = s.links[0].clone();
		let ((sx, sy), (tx, ty)) = s.line_endpoints(&link).expect("non-degenerate");
		assert_eq!((sx, sy), (10.0, 15.0));
		assert_eq!((tx, ty), (10.0, 99.0));
	}

	#[test]
	fn coincident_nodes_have_no_line() {
		let mut s = bare_state();
		s.drag_node(0, 50.0, 50.0);
		s.drag_node(1, 50.0, 50.0);
		let link = s.links[0].clone();
		assert!(s.line_endpoints(&link).is_none());
	}

	#[test]
	fn drag_moves_the_link_with_the_node() {
		let mut s = bare_state();
		s.drag_node(0, 0.0, 0.0);
		s.drag_node(1, 100.0, 0.0);
		let link = s.links[0].clone();
		let before = s.line_endpoints(&link).expect("endpoints");
		s.drag_node(1, 0.0, 100.0);
		let after = s.line_endpoints(&link).expect("endpoints");
		assert_ne!(before, after);
		assert_eq!(after.0, (0.0, 5.0));
		assert_eq!(after.1, (0.0, 89.0));
	}

	#[test]
	fn radii_stay_in_range_across_the_dataset() {
		let s = state();
		for node in &s.nodes {
			let r = s.node_radius(node);
			assert!((5.0..=50.0).contains(&r));
		}
	}

	#[test]
	fn missing_metrics_use_default_visuals() {
		let s = bare_state();
		assert_eq!(s.node_radius(&s.nodes[0]), DEFAULT_RADIUS);
		assert_eq!(s.node_color(&s.nodes[0]), DEFAULT_COLOR);
		assert_eq!(s.link_width(&s.links[0].clone()), DEFAULT_LINE_WIDTH);
		assert_eq!(s.link_color(&s.links[0].clone()), DEFAULT_COLOR);
	}

	#[test]
	fn totals_and_group_totals() {
		let s = state();
		assert_eq!(s.total(), 1218.0);
		let wecc = s.group_total("wecc");
		let eic = s.group_total("eic");
		assert_eq!(wecc, 228.0);
		assert_eq!(eic, 640.0);
		// Untagged nodes count toward the total but neither group.
		assert!(wecc + eic <= s.total());
	}

	#[test]
	fn save_then_load_restores_positions() {
		let mut s = state();
		s.drag_node(0, 123.4, 456.7);
		s.drag_node(1, 800.0, 90.0);
		let saved = s.node_positions();

		let mut restored = state();
		restored.apply_node_positions(&saved);
		for (a, b) in s.nodes.iter().zip(&restored.nodes) {
			assert!((a.x - b.x).abs() < 1e-9);
			assert!((a.y - b.y).abs() < 1e-9);
		}
	}

	#[test]
	fn hit_testing_respects_rendered_radius() {
		let mut s = state();
		s.drag_node(0, 100.0, 100.0);
		let r = s.node_radius(&s.nodes[0]);
		assert_eq!(s.node_at(100.0 + r - 0.5, 100.0), Some(0));
		assert_eq!(s.node_at(100.0 + r + 1.0, 100.0), None);
	}

	#[test]
	fn auto_color_domain_comes_from_this_dataset() {
		let auto = crate::components::flow_map::types::tests::SAMPLE
			.replacen("\"colorModeAuto\": false", "\"colorModeAuto\": true", 1);
		let doc = GraphDocument::from_json(&auto).expect("valid document");
		let s = FlowMapState::new(doc, Projection::new());
		// CO2i extent is [210, 520]; all cuts fall strictly inside it.
		let domain = s.scales.circle_color.domain().to_vec();
		assert_eq!(domain.len(), 8);
		assert!(domain.iter().all(|d| *d > 210.0 && *d < 520.0));
		assert!(domain.windows(2).all(|w| w[0] < w[1]));
	}
}
