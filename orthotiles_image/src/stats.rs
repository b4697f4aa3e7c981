//! Per-band statistics for the metadata endpoint.
//!
//! Statistics are computed over valid (unmasked) samples only. The
//! histogram follows the numpy convention: ten equal-width bins over
//! `[min, max]`, reported as `[counts, bin_edges]`.

use crate::RasterTile;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BandStatistics {
	pub min: f64,
	pub max: f64,
	pub mean: f64,
	pub count: u64,
	pub sum: f64,
	pub std: f64,
	pub median: f64,
	pub majority: f64,
	pub minority: f64,
	pub unique: u64,
	pub histogram: (Vec<u64>, Vec<f64>),
	pub valid_percent: f64,
	pub masked_percent: f64,
	pub percentile_2: f64,
	pub percentile_98: f64,
}

/// Computes statistics for every band of `tile`, keyed `"1"`, `"2"`, …
/// Bands with no valid samples are omitted.
pub fn band_statistics(tile: &RasterTile) -> BTreeMap<String, BandStatistics> {
	let channels = tile.channels() as usize;
	let pixels = (tile.width() as usize) * (tile.height() as usize);
	let mut result = BTreeMap::new();

	for channel in 0..channels {
		let mut counts = [0u64; 256];
		for (i, &m) in tile.mask().iter().enumerate() {
			if m != 0 {
				counts[tile.data()[i * channels + channel] as usize] += 1;
			}
		}
		if let Some(stats) = from_counts(&counts, pixels as u64) {
			result.insert((channel + 1).to_string(), stats);
		}
	}

	result
}

fn from_counts(counts: &[u64; 256], total_pixels: u64) -> Option<BandStatistics> {
	let count: u64 = counts.iter().sum();
	if count == 0 {
		return None;
	}

	let min = counts.iter().position(|&c| c > 0).unwrap_or(0) as f64;
	let max = counts.iter().rposition(|&c| c > 0).unwrap_or(0) as f64;

	let sum: f64 = counts.iter().enumerate().map(|(v, &c)| (v as f64) * (c as f64)).sum();
	let mean = sum / count as f64;

	let variance: f64 = counts
		.iter()
		.enumerate()
		.map(|(v, &c)| (c as f64) * (v as f64 - mean).powi(2))
		.sum::<f64>()
		/ count as f64;
	let std = variance.sqrt();

	let majority = counts
		.iter()
		.enumerate()
		.max_by_key(|&(_, &c)| c)
		.map(|(v, _)| v as f64)
		.unwrap_or(min);
	let minority = counts
		.iter()
		.enumerate()
		.filter(|&(_, &c)| c > 0)
		.min_by_key(|&(_, &c)| c)
		.map(|(v, _)| v as f64)
		.unwrap_or(min);
	let unique = counts.iter().filter(|&&c| c > 0).count() as u64;

	let valid_percent = (count as f64) / (total_pixels as f64) * 100.0;

	Some(BandStatistics {
		min,
		max,
		mean,
		count,
		sum,
		std,
		median: percentile(counts, count, 50.0),
		majority,
		minority,
		unique,
		histogram: histogram(counts, min, max),
		valid_percent,
		masked_percent: 100.0 - valid_percent,
		percentile_2: percentile(counts, count, 2.0),
		percentile_98: percentile(counts, count, 98.0),
	})
}

/// Linear-interpolated percentile over the value counts (numpy's default
/// `linear` method).
fn percentile(counts: &[u64; 256], count: u64, p: f64) -> f64 {
	let rank = (count as f64 - 1.0) * p / 100.0;
	let lo_rank = rank.floor() as u64;
	let hi_rank = rank.ceil() as u64;

	let value_at = |target: u64| -> f64 {
		let mut seen = 0u64;
		for (v, &c) in counts.iter().enumerate() {
			seen += c;
			if seen > target {
				return v as f64;
			}
		}
		255.0
	};

	let lo = value_at(lo_rank);
	let hi = value_at(hi_rank);
	lo + (hi - lo) * (rank - rank.floor())
}

/// Ten equal-width bins over `[min, max]`, returned as `(counts, edges)`.
fn histogram(counts: &[u64; 256], min: f64, max: f64) -> (Vec<u64>, Vec<f64>) {
	let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
	let width = (hi - lo) / 10.0;

	let edges: Vec<f64> = (0..=10).map(|i| lo + width * i as f64).collect();
	let mut bins = vec![0u64; 10];
	for (v, &c) in counts.iter().enumerate() {
		if c == 0 {
			continue;
		}
		let v = v as f64;
		if v < lo || v > hi {
			continue;
		}
		let bin = (((v - lo) / width) as usize).min(9);
		bins[bin] += c;
	}

	(bins, edges)
}
