use anyhow::{Result, ensure};
use std::fmt::{self, Debug};

/// An inclusive zoom level window `[min, max]`.
///
/// The tile pipeline widens the window outward by a configured number of
/// extra levels before checking requests against it; both bounds are
/// inclusive, so a request at exactly `min` or `max` is in range.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ZoomRange {
	pub min: u8,
	pub max: u8,
}

impl ZoomRange {
	pub fn new(min: u8, max: u8) -> Result<ZoomRange> {
		ensure!(min <= max, "min zoom ({min}) must be <= max zoom ({max})");
		Ok(ZoomRange { min, max })
	}

	/// Widen both bounds outward by `extra` levels, saturating at 0 and 255.
	#[must_use]
	pub fn widened(&self, extra: u8) -> ZoomRange {
		ZoomRange {
			min: self.min.saturating_sub(extra),
			max: self.max.saturating_add(extra),
		}
	}

	/// True if `level` lies within the inclusive window. Takes an `i32`
	/// because the effective zoom of a request can be driven below zero by
	/// the 512-pixel tile-size adjustment.
	#[must_use]
	pub fn contains(&self, level: i32) -> bool {
		level >= i32::from(self.min) && level <= i32::from(self.max)
	}
}

impl Debug for ZoomRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ZoomRange({}..={})", self.min, self.max)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn new_validates_order() {
		assert!(ZoomRange::new(9, 8).is_err());
		let range = ZoomRange::new(8, 50).unwrap();
		assert_eq!(range.min, 8);
		assert_eq!(range.max, 50);
	}

	#[test]
	fn widened_saturates() {
		let range = ZoomRange::new(1, 254).unwrap();
		let wide = range.widened(3);
		assert_eq!(wide.min, 0);
		assert_eq!(wide.max, 255);

		let same = range.widened(0);
		assert_eq!(same, range);
	}

	#[test]
	fn contains_is_inclusive() {
		let range = ZoomRange::new(8, 22).unwrap();
		assert!(!range.contains(7));
		assert!(range.contains(8));
		assert!(range.contains(22));
		assert!(!range.contains(23));
		assert!(!range.contains(-1));
	}
}
