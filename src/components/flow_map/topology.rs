//! Minimal reader for the quantized TopoJSON background file.
//!
//! Only the subset the map needs: a transform, delta-encoded arcs, and
//! polygonal objects referencing arcs by index. The us-10m file is
//! pre-projected, so decoded positions are already screen pixels.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Topology {
	pub transform: Option<Transform>,
	pub arcs: Vec<Vec<Vec<f64>>>,
	pub objects: BTreeMap<String, Geometry>,
}

#[derive(Debug, Deserialize)]
pub struct Transform {
	pub scale: [f64; 2],
	pub translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
	GeometryCollection { geometries: Vec<Geometry> },
	Polygon { arcs: Vec<Vec<i32>> },
	MultiPolygon { arcs: Vec<Vec<Vec<i32>>> },
}

/// Decoded background shapes ready for canvas drawing.
#[derive(Debug, Default)]
pub struct MapShapes {
	/// Every polygon ring of the states object, for the land fill.
	pub land: Vec<Vec<(f64, f64)>>,
	/// Arcs shared by two or more states: the interior borders.
	pub borders: Vec<Vec<(f64, f64)>>,
}

impl MapShapes {
	/// Decode the object named `key` (e.g. "states") out of a topology.
	pub fn from_topology(topo: &Topology, key: &str) -> Option<Self> {
		let object = topo.objects.get(key)?;
		let arcs = decode_arcs(topo);

		let mut land = Vec::new();
		let mut usage: HashMap<usize, usize> = HashMap::new();
		for rings in polygon_rings(object) {
			for ring in &rings {
				for &arc in ring {
					*usage.entry(arc_index(arc)).or_insert(0) += 1;
				}
			}
			for ring in rings {
				land.push(stitch_ring(&ring, &arcs));
			}
		}

		let borders = usage
			.iter()
			.filter(|(_, count)| **count > 1)
			.map(|(&idx, _)| arcs[idx].clone())
			.collect();

		Some(Self { land, borders })
	}
}

/// Expand delta-encoded, quantized arc coordinates to absolute positions.
fn decode_arcs(topo: &Topology) -> Vec<Vec<(f64, f64)>> {
	topo.arcs
		.iter()
		.map(|arc| {
			let (mut x, mut y) = (0.0, 0.0);
			arc.iter()
				.map(|point| {
					let (px, py) = (point[0], point[1]);
					match &topo.transform {
						Some(t) => {
							x += px;
							y += py;
							(
								x * t.scale[0] + t.translate[0],
								y * t.scale[1] + t.translate[1],
							)
						}
						None => (px, py),
					}
				})
				.collect()
		})
		.collect()
}

/// Flatten a geometry into its rings, each ring a list of signed arc indices.
fn polygon_rings(geometry: &Geometry) -> Vec<Vec<Vec<i32>>> {
	match geometry {
		Geometry::Polygon { arcs } => vec![arcs.clone()],
		Geometry::MultiPolygon { arcs } => arcs.clone(),
		Geometry::GeometryCollection { geometries } => {
			geometries.iter().flat_map(polygon_rings).collect()
		}
	}
}

/// A negative arc index means the ones'-complement arc, traversed backwards.
fn arc_index(arc: i32) -> usize {
	if arc < 0 { !arc as usize } else { arc as usize }
}

fn stitch_ring(ring: &[i32], arcs: &[Vec<(f64, f64)>]) -> Vec<(f64, f64)> {
	let mut out: Vec<(f64, f64)> = Vec::new();
	for &signed in ring {
		let arc = &arcs[arc_index(signed)];
		let points: Vec<(f64, f64)> = if signed < 0 {
			arc.iter().rev().copied().collect()
		} else {
			arc.clone()
		};
		// Consecutive arcs share their junction point.
		let skip = usize::from(!out.is_empty());
		out.extend(points.into_iter().skip(skip));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Topology {
		// Two unit squares side by side sharing the vertical arc 1.
		// Arc 0 is the left square's open boundary, arc 2 the right one's.
		let json = r#"{
			"transform": { "scale": [0.5, 0.5], "translate": [10.0, 20.0] },
			"arcs": [
				[[2, 0], [-2, 0], [0, 2], [2, 0]],
				[[2, 0], [0, 2]],
				[[2, 2], [2, 0], [0, -2], [-2, 0]]
			],
			"objects": {
				"states": {
					"type": "GeometryCollection",
					"geometries": [
						{ "type": "Polygon", "arcs": [[0, -2]] },
						{ "type": "Polygon", "arcs": [[2, 1]] }
					]
				}
			}
		}"#;
		serde_json::from_str(json).expect("sample topology parses")
	}

	#[test]
	fn arcs_are_delta_decoded_and_transformed() {
		let topo = sample();
		let arcs = decode_arcs(&topo);
		assert_eq!(
			arcs[0],
			vec![(11.0, 20.0), (10.0, 20.0), (10.0, 21.0), (11.0, 21.0)]
		);
		assert_eq!(arcs[1], vec![(11.0, 20.0), (11.0, 21.0)]);
	}

	#[test]
	fn rings_stitch_reversed_arcs() {
		let topo = sample();
		let shapes = MapShapes::from_topology(&topo, "states").expect("states object");
		assert_eq!(shapes.land.len(), 2);
		// Left square: arc 0 forward then the shared arc reversed closes it.
		assert_eq!(
			shapes.land[0],
			vec![
				(11.0, 20.0),
				(10.0, 20.0),
				(10.0, 21.0),
				(11.0, 21.0),
				(11.0, 20.0)
			]
		);
		assert_eq!(shapes.land[0].first(), shapes.land[0].last());
		assert_eq!(shapes.land[1].first(), shapes.land[1].last());
	}

	#[test]
	fn only_shared_arcs_form_the_border_mesh() {
		let topo = sample();
		let shapes = MapShapes::from_topology(&topo, "states").expect("states object");
		assert_eq!(shapes.borders.len(), 1);
		assert_eq!(shapes.borders[0], vec![(11.0, 20.0), (11.0, 21.0)]);
	}

	#[test]
	fn missing_object_yields_none() {
		let topo = sample();
		assert!(MapShapes::from_topology(&topo, "counties").is_none());
	}
}
