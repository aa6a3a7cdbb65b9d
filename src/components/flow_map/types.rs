//! Graph-data document types and schema validation.
//!
//! Per-entity metric fields are dataset-defined, so each entity carries a
//! flattened map of its remaining JSON fields next to the required ones.
//! Missing meta fields and dangling link indices are schema errors; missing
//! per-entity metrics stay optional and fall back to default visuals.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Metric summed for the title and the interconnect subtitles.
pub const CONSUMPTION_FIELD: &str = "E_D";

#[derive(Debug, Error)]
pub enum SchemaError {
	#[error("missing required meta field `{0}`")]
	MissingField(&'static str),
	#[error("link endpoint {index} out of range for {len} nodes")]
	LinkOutOfRange { index: usize, len: usize },
}

/// Why a fetched document could not be used.
#[derive(Debug, Error)]
pub enum DocumentError {
	#[error("malformed JSON: {0}")]
	Parse(#[from] serde_json::Error),
	#[error(transparent)]
	Schema(#[from] SchemaError),
}

/// Dataset-wide configuration: which fields drive the visual encodings plus
/// the display strings.
#[derive(Clone, Debug)]
pub struct Meta {
	pub color_mode_auto: bool,
	pub field_radius: String,
	pub field_line_width: String,
	pub field_circle: String,
	pub field_line_color: String,
	pub leg_color_title: String,
	pub leg_circle_title: String,
	pub leg_line_title: String,
	pub title: String,
	pub unit: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
	#[serde(rename = "colorModeAuto")]
	color_mode_auto: Option<bool>,
	#[serde(rename = "fieldRadius")]
	field_radius: Option<String>,
	#[serde(rename = "fieldLineWidth")]
	field_line_width: Option<String>,
	#[serde(rename = "fieldCircle")]
	field_circle: Option<String>,
	#[serde(rename = "fieldLineColor")]
	field_line_color: Option<String>,
	#[serde(rename = "legColorTitle")]
	leg_color_title: Option<String>,
	#[serde(rename = "legCircleTitle")]
	leg_circle_title: Option<String>,
	#[serde(rename = "legLineTitle")]
	leg_line_title: Option<String>,
	title: Option<String>,
	unit: Option<String>,
}

impl RawMeta {
	fn validate(self) -> Result<Meta, SchemaError> {
		fn req<T>(v: Option<T>, name: &'static str) -> Result<T, SchemaError> {
			v.ok_or(SchemaError::MissingField(name))
		}
		Ok(Meta {
			color_mode_auto: req(self.color_mode_auto, "colorModeAuto")?,
			field_radius: req(self.field_radius, "fieldRadius")?,
			field_line_width: req(self.field_line_width, "fieldLineWidth")?,
			field_circle: req(self.field_circle, "fieldCircle")?,
			field_line_color: req(self.field_line_color, "fieldLineColor")?,
			leg_color_title: req(self.leg_color_title, "legColorTitle")?,
			leg_circle_title: req(self.leg_circle_title, "legCircleTitle")?,
			leg_line_title: req(self.leg_line_title, "legLineTitle")?,
			title: req(self.title, "title")?,
			unit: req(self.unit, "unit")?,
		})
	}
}

/// A region rendered as a sized and colored circle.
#[derive(Clone, Debug, Deserialize)]
pub struct Node {
	#[serde(rename = "shortNm")]
	pub short_nm: String,
	pub coords: [f64; 2],
	#[serde(default)]
	pub interconnect: Option<String>,
	#[serde(flatten)]
	fields: BTreeMap<String, serde_json::Value>,
}

impl Node {
	pub fn metric(&self, field: &str) -> Option<f64> {
		self.fields.get(field).and_then(serde_json::Value::as_f64)
	}
}

/// A directed flow between two nodes, endpoints given as node indices.
#[derive(Clone, Debug, Deserialize)]
pub struct Link {
	pub source: usize,
	pub target: usize,
	#[serde(flatten)]
	fields: BTreeMap<String, serde_json::Value>,
}

impl Link {
	pub fn metric(&self, field: &str) -> Option<f64> {
		self.fields.get(field).and_then(serde_json::Value::as_f64)
	}
}

/// A standalone draggable short-name marker for nodes too small for inline text.
#[derive(Clone, Debug, Deserialize)]
pub struct Label {
	#[serde(rename = "shortNm")]
	pub short_nm: String,
	pub coords: [f64; 2],
	#[serde(flatten)]
	fields: BTreeMap<String, serde_json::Value>,
}

impl Label {
	pub fn metric(&self, field: &str) -> Option<f64> {
		self.fields.get(field).and_then(serde_json::Value::as_f64)
	}
}

#[derive(Debug, Deserialize)]
struct RawGraphDocument {
	meta: RawMeta,
	nodes: Vec<Node>,
	#[serde(default)]
	labels: Vec<Label>,
	#[serde(default)]
	links: Vec<Link>,
}

/// A validated graph-data document.
#[derive(Debug)]
pub struct GraphDocument {
	pub meta: Meta,
	pub nodes: Vec<Node>,
	pub labels: Vec<Label>,
	pub links: Vec<Link>,
}

impl GraphDocument {
	pub fn from_json(json: &str) -> Result<Self, DocumentError> {
		let raw: RawGraphDocument = serde_json::from_str(json)?;
		Ok(Self::validate(raw)?)
	}

	fn validate(raw: RawGraphDocument) -> Result<Self, SchemaError> {
		let meta = raw.meta.validate()?;
		let len = raw.nodes.len();
		for link in &raw.links {
			for index in [link.source, link.target] {
				if index >= len {
					return Err(SchemaError::LinkOutOfRange { index, len });
				}
			}
		}
		Ok(Self {
			meta,
			nodes: raw.nodes,
			labels: raw.labels,
			links: raw.links,
		})
	}
}
