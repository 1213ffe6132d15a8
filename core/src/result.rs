// This file is part of das-sim.

// das-sim is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// das-sim is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with das-sim.  If not, see <http://www.gnu.org/licenses/>.

//! Output types: what a run hands back to its caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shape::Shape;

/// Named progress series keys, exactly as the orchestrator's XML contract
/// expects them (spec Section 6).
pub mod series {
	pub const SAMPLES_RECEIVED: &str = "samples received";
	pub const NODES_READY: &str = "nodes ready";
	pub const VALIDATORS_READY: &str = "validators ready";
	pub const TX_BUILDER_MEAN: &str = "TX builder mean";
	pub const TX_CLASS1_MEAN: &str = "TX class1 mean";
	pub const TX_CLASS2_MEAN: &str = "TX class2 mean";
	pub const RX_CLASS1_MEAN: &str = "RX class1 mean";
	pub const RX_CLASS2_MEAN: &str = "RX class2 mean";
	pub const DUP_CLASS1_MEAN: &str = "Dup class1 mean";
	pub const DUP_CLASS2_MEAN: &str = "Dup class2 mean";
}

/// Aggregate availability snapshot for one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
	pub missing_samples: usize,
	pub sample_progress: f64,
	pub node_progress: f64,
	pub validator_progress: f64,
}

/// Mean/min/max/std of one metric within a step, computed across a class
/// of validators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassStat {
	pub mean: f64,
	pub min: f64,
	pub max: f64,
	pub std: f64,
}

impl ClassStat {
	pub fn from_samples(samples: &[f64]) -> Self {
		if samples.is_empty() {
			return ClassStat::default();
		}
		let n = samples.len() as f64;
		let mean = samples.iter().sum::<f64>() / n;
		let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
		let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
		let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
		ClassStat { mean, min, max, std: variance.sqrt() }
	}
}

/// Per-class traffic stats for one step: proposer ("builder"), class 1,
/// class 2.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrafficStats {
	pub tx_builder: ClassStat,
	pub tx_class1: ClassStat,
	pub tx_class2: ClassStat,
	pub rx_class1: ClassStat,
	pub rx_class2: ClassStat,
	pub dup_class1: ClassStat,
	pub dup_class2: ClassStat,
}

/// Everything a run produces: the Shape it ran with, the per-step missing
/// vector, optional progress series, and terminal metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
	pub shape: Shape,
	/// One entry per step: the post-step `missing_samples` count, appended
	/// exactly once per step including the terminal one (success or
	/// stall). No duplicate trailing entry is appended on top of it; see
	/// DESIGN.md's "single terminal missingVector append" resolution.
	pub missing_vector: Vec<usize>,
	pub progress: Option<BTreeMap<String, Vec<f64>>>,
	/// Step index at which `missing_samples` first reached zero, or
	/// `None` if the run stalled instead.
	pub tta: Option<usize>,
	pub missing_samples: usize,
}

impl RunResult {
	pub fn new(shape: Shape) -> Self {
		RunResult { shape, missing_vector: Vec::new(), progress: None, tta: None, missing_samples: 0 }
	}

	/// Appends one step's worth of named scalars into the progress map,
	/// creating series lazily. Only called when `Config::save_progress`.
	pub fn push_progress(&mut self, values: &[(&str, f64)]) {
		let progress = self.progress.get_or_insert_with(BTreeMap::new);
		for (key, value) in values {
			progress.entry((*key).to_string()).or_insert_with(Vec::new).push(*value);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn class_stat_on_empty_samples_is_zeroed() {
		let stat = ClassStat::from_samples(&[]);
		assert_eq!(stat, ClassStat::default());
	}

	#[test]
	fn class_stat_matches_hand_computed_values() {
		let stat = ClassStat::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
		assert!((stat.mean - 5.0).abs() < 1e-9);
		assert_eq!(stat.min, 2.0);
		assert_eq!(stat.max, 9.0);
		assert!((stat.std - 2.0).abs() < 1e-9);
	}

	#[test]
	fn push_progress_accumulates_across_calls() {
		let mut result = RunResult::new(Shape::default());
		result.push_progress(&[(series::NODES_READY, 0.1)]);
		result.push_progress(&[(series::NODES_READY, 0.4)]);
		let progress = result.progress.unwrap();
		assert_eq!(progress[series::NODES_READY], vec![0.1, 0.4]);
	}
}
