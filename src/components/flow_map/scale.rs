//! Scales mapping dataset metrics to visual attributes.
//!
//! Rebuilt wholesale on every dataset load so no domain state leaks across
//! dataset switches.

/// RdYlGn 9-color scheme, reversed so low values read green and high values red.
pub const COLOR_SCHEME: [&str; 9] = [
	"#1a9850", "#66bd63", "#a6d96a", "#d9ef8b", "#ffffbf", "#fee08b", "#fdae61", "#f46d43",
	"#d73027",
];

/// Threshold domain used when the dataset does not request an automatic one.
pub const DEFAULT_COLOR_DOMAIN: [f64; 8] = [100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 900.0];

/// Node radius range in pixels.
pub const RADIUS_RANGE: (f64, f64) = (5.0, 50.0);
/// Link stroke-width range in pixels.
pub const LINE_WIDTH_RANGE: (f64, f64) = (3.0, 15.0);

/// Square-root scale: rendered circle *area* is proportional to the value.
#[derive(Clone, Debug)]
pub struct SqrtScale {
	domain: (f64, f64),
	range: (f64, f64),
}

impl SqrtScale {
	pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
		Self { domain, range }
	}

	pub fn scale(&self, v: f64) -> f64 {
		let (d0, d1) = (self.domain.0.sqrt(), self.domain.1.sqrt());
		if (d1 - d0).abs() < f64::EPSILON {
			return self.range.0;
		}
		let t = (v.sqrt() - d0) / (d1 - d0);
		self.range.0 + t * (self.range.1 - self.range.0)
	}

	pub fn domain_max(&self) -> f64 {
		self.domain.1
	}
}

/// Plain linear scale, used for link widths and the color-legend axis.
#[derive(Clone, Debug)]
pub struct LinearScale {
	domain: (f64, f64),
	range: (f64, f64),
}

impl LinearScale {
	pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
		Self { domain, range }
	}

	pub fn scale(&self, v: f64) -> f64 {
		let (d0, d1) = self.domain;
		if (d1 - d0).abs() < f64::EPSILON {
			return self.range.0;
		}
		self.range.0 + (v - d0) / (d1 - d0) * (self.range.1 - self.range.0)
	}

	pub fn domain_max(&self) -> f64 {
		self.domain.1
	}
}

/// Step scale mapping numeric ranges to discrete colors. With n domain cuts the
/// scale has n + 1 output colors.
#[derive(Clone, Debug)]
pub struct ThresholdScale {
	domain: Vec<f64>,
	range: Vec<&'static str>,
}

impl ThresholdScale {
	pub fn new(domain: Vec<f64>, range: Vec<&'static str>) -> Self {
		debug_assert_eq!(range.len(), domain.len() + 1);
		Self { domain, range }
	}

	pub fn scale(&self, v: f64) -> &'static str {
		let idx = self.domain.partition_point(|cut| *cut <= v);
		self.range[idx]
	}

	pub fn domain(&self) -> &[f64] {
		&self.domain
	}

	pub fn range(&self) -> &[&'static str] {
		&self.range
	}

	/// The [lo, hi) value extent covered by the i-th color. `None` at either
	/// end means unbounded.
	pub fn invert_extent(&self, i: usize) -> (Option<f64>, Option<f64>) {
		let lo = i.checked_sub(1).and_then(|j| self.domain.get(j)).copied();
		(lo, self.domain.get(i).copied())
	}
}

/// `n` evenly spaced points from `start` to `stop` inclusive, rounded to integers.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
	let step = (stop - start) / (n as f64 - 1.0);
	(0..n).map(|i| (start + step * i as f64).round()).collect()
}

/// The 8 interior quantization points used for an automatic color domain.
pub fn auto_color_domain(min: f64, max: f64) -> Vec<f64> {
	linspace(min, max, 10)[1..9].to_vec()
}

const SI_PREFIXES: [&str; 17] = [
	"y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// SI-prefix formatting with the given number of significant digits, for the
/// legend value labels ("1.2k", "42k").
pub fn si_format(v: f64, significant: u32) -> String {
	if v == 0.0 {
		return "0".to_string();
	}
	let exp = v.abs().log10().floor() as i32;
	let mut prefix_exp = (exp.div_euclid(3) * 3).clamp(-24, 24);
	let mut scaled = v / 10f64.powi(prefix_exp);
	let digits = significant as i32 - 1 - scaled.abs().log10().floor() as i32;
	let factor = 10f64.powi(digits);
	scaled = (scaled * factor).round() / factor;
	if scaled.abs() >= 1000.0 && prefix_exp < 24 {
		scaled /= 1000.0;
		prefix_exp += 3;
	}
	let decimals = (significant as i32 - 1 - scaled.abs().log10().floor() as i32).max(0) as usize;
	let prefix = SI_PREFIXES[(prefix_exp / 3 + 8) as usize];
	format!("{scaled:.decimals$}{prefix}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radius_stays_in_range_and_is_monotone() {
		let radius = SqrtScale::new((2.0, 800.0), RADIUS_RANGE);
		let mut prev = f64::NEG_INFINITY;
		for i in 0..=100 {
			let v = 2.0 + (800.0 - 2.0) * i as f64 / 100.0;
			let r = radius.scale(v);
			assert!((5.0..=50.0).contains(&r), "radius {r} out of range for {v}");
			assert!(r >= prev);
			prev = r;
		}
		assert_eq!(radius.scale(2.0), 5.0);
		assert_eq!(radius.scale(800.0), 50.0);
	}

	#[test]
	fn degenerate_domain_returns_range_start() {
		let radius = SqrtScale::new((7.0, 7.0), RADIUS_RANGE);
		assert_eq!(radius.scale(7.0), 5.0);
		let width = LinearScale::new((3.0, 3.0), LINE_WIDTH_RANGE);
		assert_eq!(width.scale(3.0), 3.0);
	}

	#[test]
	fn linear_maps_endpoints_and_midpoint() {
		let width = LinearScale::new((0.0, 10.0), LINE_WIDTH_RANGE);
		assert_eq!(width.scale(0.0), 3.0);
		assert_eq!(width.scale(10.0), 15.0);
		assert_eq!(width.scale(5.0), 9.0);
	}

	#[test]
	fn linspace_rounds_to_integers() {
		assert_eq!(
			linspace(0.0, 9.0, 10),
			vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]
		);
		let pts = linspace(0.0, 100.0, 7);
		assert_eq!(pts, vec![0.0, 17.0, 33.0, 50.0, 67.0, 83.0, 100.0]);
	}

	#[test]
	fn auto_domain_has_eight_interior_points() {
		let domain = auto_color_domain(0.0, 900.0);
		assert_eq!(
			domain,
			vec![100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0]
		);
		assert!(domain.iter().all(|d| *d > 0.0 && *d < 900.0));
	}

	#[test]
	fn threshold_steps_at_cut_values() {
		let color = ThresholdScale::new(DEFAULT_COLOR_DOMAIN.to_vec(), COLOR_SCHEME.to_vec());
		assert_eq!(color.scale(0.0), "#1a9850");
		assert_eq!(color.scale(99.9), "#1a9850");
		assert_eq!(color.scale(100.0), "#66bd63");
		assert_eq!(color.scale(899.9), "#f46d43");
		assert_eq!(color.scale(900.0), "#d73027");
		assert_eq!(color.scale(1e9), "#d73027");
	}

	#[test]
	fn invert_extent_is_open_at_the_ends() {
		let color = ThresholdScale::new(DEFAULT_COLOR_DOMAIN.to_vec(), COLOR_SCHEME.to_vec());
		assert_eq!(color.invert_extent(0), (None, Some(100.0)));
		assert_eq!(color.invert_extent(1), (Some(100.0), Some(200.0)));
		assert_eq!(color.invert_extent(8), (Some(900.0), None));
	}

	#[test]
	fn si_formatting() {
		assert_eq!(si_format(0.0, 1), "0");
		assert_eq!(si_format(4000.0, 1), "4k");
		assert_eq!(si_format(4000.0, 2), "4.0k");
		assert_eq!(si_format(42_000.0, 2), "42k");
		assert_eq!(si_format(1234.0, 2), "1.2k");
		assert_eq!(si_format(150.0, 2), "150");
		assert_eq!(si_format(0.0042, 1), "4m");
	}
}
