use anyhow::{Result, ensure};
use std::fmt::Debug;

static MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;
static MAX_MERCATOR_LNG: f64 = 180.0;
static RADIUS: f64 = 6_378_137.0; // meters

/// A geographical bounding box defined by minimum and maximum longitude (x)
/// and latitude (y) in degrees: `[west, south, east, north]`.
///
/// # Examples
///
/// ```
/// use orthotiles_core::GeoBBox;
///
/// let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
/// assert_eq!(bbox.as_array(), [-10.0, -5.0, 10.0, 5.0]);
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct GeoBBox {
	pub x_min: f64,
	pub y_min: f64,
	pub x_max: f64,
	pub y_max: f64,
}

impl GeoBBox {
	/// Creates a new `GeoBBox` from `west, south, east, north`.
	///
	/// Fails if any coordinate is outside the valid longitude/latitude
	/// ranges or if minimum exceeds maximum.
	pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<GeoBBox> {
		GeoBBox {
			x_min,
			y_min,
			x_max,
			y_max,
		}
		.checked()
	}

	/// Builds a `GeoBBox` from two arbitrary corner points, sorting the
	/// coordinates and clamping them to valid longitude/latitude ranges.
	/// Never fails.
	pub fn new_clamped(x0: f64, y0: f64, x1: f64, y1: f64) -> GeoBBox {
		GeoBBox {
			x_min: x0.min(x1).clamp(-180.0, 180.0),
			y_min: y0.min(y1).clamp(-90.0, 90.0),
			x_max: x0.max(x1).clamp(-180.0, 180.0),
			y_max: y0.max(y1).clamp(-90.0, 90.0),
		}
	}

	/// Returns the bounding box as `[west, south, east, north]`.
	#[must_use]
	pub fn as_array(&self) -> [f64; 4] {
		[self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// Returns the bounding box as a `Vec<f64>` in the form `[west, south, east, north]`.
	#[must_use]
	pub fn as_vec(&self) -> Vec<f64> {
		vec![self.x_min, self.y_min, self.x_max, self.y_max]
	}

	/// True if `self` and `other` overlap (touching edges count as overlap).
	#[must_use]
	pub fn intersects(&self, other: &GeoBBox) -> bool {
		self.x_min <= other.x_max && self.x_max >= other.x_min && self.y_min <= other.y_max && self.y_max >= other.y_min
	}

	/// Clamps the bounding box in place to the latitude/longitude limits of
	/// the Web Mercator projection.
	pub fn limit_to_mercator(&mut self) {
		self.x_min = self.x_min.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.y_min = self.y_min.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
		self.x_max = self.x_max.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
		self.y_max = self.y_max.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
	}

	/// Convert this WGS84 (EPSG:4326) bounding box to Web-Mercator meters
	/// (EPSG:3857). Latitudes are clamped to the valid Mercator domain.
	#[must_use]
	pub fn to_mercator(&self) -> [f64; 4] {
		fn x_from_lon(lon_deg: f64) -> f64 {
			let lon = lon_deg.clamp(-MAX_MERCATOR_LNG, MAX_MERCATOR_LNG);
			RADIUS * lon.to_radians()
		}
		fn y_from_lat(lat_deg: f64) -> f64 {
			let lat = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
			let phi = lat.to_radians();
			RADIUS * ((std::f64::consts::FRAC_PI_4 + phi / 2.0).tan()).ln()
		}

		[
			x_from_lon(self.x_min),
			y_from_lat(self.y_min),
			x_from_lon(self.x_max),
			y_from_lat(self.y_max),
		]
	}

	fn checked(self) -> Result<Self> {
		ensure!(self.x_min >= -180., "x_min ({}) must be >= -180", self.x_min);
		ensure!(self.y_min >= -90., "y_min ({}) must be >= -90", self.y_min);
		ensure!(self.x_max <= 180., "x_max ({}) must be <= 180", self.x_max);
		ensure!(self.y_max <= 90., "y_max ({}) must be <= 90", self.y_max);
		ensure!(
			self.x_min <= self.x_max,
			"x_min ({}) must be <= x_max ({})",
			self.x_min,
			self.x_max
		);
		ensure!(
			self.y_min <= self.y_max,
			"y_min ({}) must be <= y_max ({})",
			self.y_min,
			self.y_max
		);
		Ok(self)
	}
}

impl Debug for GeoBBox {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"GeoBBox({}, {}, {}, {})",
			self.x_min, self.y_min, self.x_max, self.y_max
		)
	}
}

impl TryFrom<&[f64]> for GeoBBox {
	type Error = anyhow::Error;

	/// Builds a `GeoBBox` from a slice with exactly four elements
	/// `[west, south, east, north]`.
	fn try_from(input: &[f64]) -> Result<Self> {
		ensure!(
			input.len() == 4,
			"GeoBBox must have 4 elements (west, south, east, north)"
		);
		GeoBBox::new(input[0], input[1], input[2], input[3])
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn creation_and_accessors() {
		let bbox = GeoBBox::new(-10.0, -5.0, 10.0, 5.0).unwrap();
		assert_eq!(bbox.as_array(), [-10.0, -5.0, 10.0, 5.0]);
		assert_eq!(bbox.as_vec(), vec![-10.0, -5.0, 10.0, 5.0]);
		assert_eq!(format!("{bbox:?}"), "GeoBBox(-10, -5, 10, 5)");
	}

	#[test]
	fn invalid_ranges_are_rejected() {
		assert!(GeoBBox::new(-190.0, -5.0, 10.0, 5.0).is_err());
		assert!(GeoBBox::new(-10.0, -95.0, 10.0, 5.0).is_err());
		assert!(GeoBBox::new(-10.0, -5.0, 190.0, 5.0).is_err());
		assert!(GeoBBox::new(-10.0, -5.0, 10.0, 95.0).is_err());
		assert!(GeoBBox::new(10.0, -5.0, -10.0, 5.0).is_err());
		assert!(GeoBBox::new(-10.0, 6.0, 10.0, 5.0).is_err());
	}

	#[test]
	fn new_clamped_sorts_and_clamps() {
		let bbox = GeoBBox::new_clamped(200.0, 95.0, -200.0, -95.0);
		assert_eq!(bbox.as_array(), [-180.0, -90.0, 180.0, 90.0]);
	}

	#[test]
	fn try_from_slice() {
		let bbox = GeoBBox::try_from([-10.0, -5.0, 10.0, 5.0].as_slice()).unwrap();
		assert_eq!(bbox.as_array(), [-10.0, -5.0, 10.0, 5.0]);
		assert!(GeoBBox::try_from([-10.0, -5.0, 10.0].as_slice()).is_err());
	}

	#[rstest]
	#[case([0.0, 0.0, 1.0, 1.0], [0.5, 0.5, 2.0, 2.0], true)]
	#[case([0.0, 0.0, 1.0, 1.0], [1.0, 1.0, 2.0, 2.0], true)]
	#[case([0.0, 0.0, 1.0, 1.0], [1.5, 0.0, 2.0, 1.0], false)]
	#[case([0.0, 0.0, 1.0, 1.0], [0.0, 1.5, 1.0, 2.0], false)]
	fn intersects_cases(#[case] a: [f64; 4], #[case] b: [f64; 4], #[case] expected: bool) {
		let a = GeoBBox::try_from(a.as_slice()).unwrap();
		let b = GeoBBox::try_from(b.as_slice()).unwrap();
		assert_eq!(a.intersects(&b), expected);
		assert_eq!(b.intersects(&a), expected);
	}

	#[test]
	fn limit_to_mercator_clamps_latitude() {
		let mut bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
		bbox.limit_to_mercator();
		assert_eq!(bbox.as_array(), [-180.0, -85.05112877980659, 180.0, 85.05112877980659]);
	}

	#[test]
	fn to_mercator_world_bounds() {
		let bbox = GeoBBox::new(-180.0, -90.0, 180.0, 90.0).unwrap();
		let [xmin, ymin, xmax, ymax] = bbox.to_mercator();
		let e = 20_037_508.342789244_f64;
		assert!((xmin + e).abs() < 2.0, "xmin={xmin}");
		assert!((ymin + e).abs() < 2.0, "ymin={ymin}");
		assert!((xmax - e).abs() < 2.0, "xmax={xmax}");
		assert!((ymax - e).abs() < 2.0, "ymax={ymax}");
	}

	#[test]
	fn to_mercator_midlat() {
		let bbox = GeoBBox::new(-10.0, 40.0, 10.0, 50.0).unwrap();
		let [xmin, ymin, xmax, ymax] = bbox.to_mercator();
		assert_eq!(xmin as i32, -1_113_194);
		assert_eq!(xmax as i32, 1_113_194);
		assert_eq!(ymin as i32, 4_865_942);
		assert_eq!(ymax as i32, 6_446_275);
	}
}
