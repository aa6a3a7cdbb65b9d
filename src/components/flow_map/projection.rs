//! Fixed Albers conic equal-area projection for the continental US.
//!
//! Standard parallels 29.5°/45.5°,
//! rotation 96°W, center (-0.6°, 38.7°), scale 1280, translate (480, 300).
//! Invertible so dragged screen positions can be written back as geographic
//! coordinates.

use std::f64::consts::PI;

const PARALLEL_LO: f64 = 29.5;
const PARALLEL_HI: f64 = 45.5;
const ROTATE_LON: f64 = 96.0;
const CENTER: (f64, f64) = (-0.6, 38.7);
const SCALE: f64 = 1280.0;
const TRANSLATE: (f64, f64) = (480.0, 300.0);

#[derive(Clone, Debug)]
pub struct Projection {
	n: f64,
	c: f64,
	r0: f64,
	/// Projected center in raw (unit-sphere) coordinates.
	center: (f64, f64),
}

impl Default for Projection {
	fn default() -> Self {
		Self::new()
	}
}

impl Projection {
	pub fn new() -> Self {
		let sy0 = PARALLEL_LO.to_radians().sin();
		let n = (sy0 + PARALLEL_HI.to_radians().sin()) / 2.0;
		let c = 1.0 + sy0 * (2.0 * n - sy0);
		let r0 = c.sqrt() / n;
		let mut proj = Self {
			n,
			c,
			r0,
			center: (0.0, 0.0),
		};
		proj.center = proj.raw(CENTER.0.to_radians(), CENTER.1.to_radians());
		proj
	}

	/// Conic equal-area forward projection on the rotated sphere.
	fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
		let r = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
		(
			r * (lambda * self.n).sin(),
			self.r0 - r * (lambda * self.n).cos(),
		)
	}

	fn raw_invert(&self, x: f64, y: f64) -> (f64, f64) {
		let r0y = self.r0 - y;
		let mut lambda = x.atan2(r0y.abs()) * r0y.signum();
		if r0y * self.n < 0.0 {
			lambda -= PI * x.signum() * r0y.signum();
		}
		let phi = ((self.c - (x * x + r0y * r0y) * self.n * self.n) / (2.0 * self.n)).asin();
		(lambda / self.n, phi)
	}

	/// Geographic (lon, lat) in degrees to screen pixels.
	pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
		let lambda = wrap(lon.to_radians() + ROTATE_LON.to_radians());
		let (x, y) = self.raw(lambda, lat.to_radians());
		(
			TRANSLATE.0 + SCALE * (x - self.center.0),
			TRANSLATE.1 - SCALE * (y - self.center.1),
		)
	}

	/// Screen pixels back to geographic (lon, lat) in degrees.
	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		let x = self.center.0 + (sx - TRANSLATE.0) / SCALE;
		let y = self.center.1 - (sy - TRANSLATE.1) / SCALE;
		let (lambda, phi) = self.raw_invert(x, y);
		(
			wrap(lambda - ROTATE_LON.to_radians()).to_degrees(),
			phi.to_degrees(),
		)
	}
}

fn wrap(lambda: f64) -> f64 {
	if lambda.abs() > PI {
		lambda - (lambda / (2.0 * PI)).round() * 2.0 * PI
	} else {
		lambda
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CITIES: [(f64, f64); 5] = [
		(-122.42, 37.77), // San Francisco
		(-87.63, 41.88),  // Chicago
		(-74.01, 40.71),  // New York
		(-95.37, 29.76),  // Houston
		(-104.99, 39.74), // Denver
	];

	#[test]
	fn center_projects_to_translate() {
		let proj = Projection::new();
		// Effective center: the configured center shifted by the 96°W rotation.
		let (x, y) = proj.project(-96.6, 38.7);
		assert!((x - 480.0).abs() < 1e-9, "x = {x}");
		assert!((y - 300.0).abs() < 1e-9, "y = {y}");
	}

	#[test]
	fn round_trip_is_identity() {
		let proj = Projection::new();
		for (lon, lat) in CITIES {
			let (x, y) = proj.project(lon, lat);
			let (lon2, lat2) = proj.invert(x, y);
			assert!((lon - lon2).abs() < 1e-9, "{lon} vs {lon2}");
			assert!((lat - lat2).abs() < 1e-9, "{lat} vs {lat2}");
		}
	}

	#[test]
	fn west_is_left_and_north_is_up() {
		let proj = Projection::new();
		let (sf_x, _) = proj.project(CITIES[0].0, CITIES[0].1);
		let (ny_x, _) = proj.project(CITIES[2].0, CITIES[2].1);
		assert!(sf_x < ny_x);
		let (_, chi_y) = proj.project(CITIES[1].0, CITIES[1].1);
		let (_, hou_y) = proj.project(CITIES[3].0, CITIES[3].1);
		assert!(chi_y < hou_y);
	}

	#[test]
	fn continental_us_fits_the_map_area() {
		let proj = Projection::new();
		for (lon, lat) in CITIES {
			let (x, y) = proj.project(lon, lat);
			assert!((0.0..960.0).contains(&x), "x = {x}");
			assert!((0.0..600.0).contains(&y), "y = {y}");
		}
	}
}
