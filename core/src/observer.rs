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

//! Pure inspector over a validator population. Never mutates anything;
//! everything it returns is derived from the validators it's handed.

use tracing::warn;

use crate::block::Block;
use crate::dim::Dim;
use crate::result::{ClassStat, Progress, TrafficStats};
use crate::shape::Shape;
use crate::validator::Validator;

const LOG_TARGET: &str = "das_sim_core::observer";

/// Verifies every row and column has at least one assigned non-proposer
/// validator. A line with zero coverage can never be reconstructed;
/// warns at setup rather than failing the run.
pub fn check_rows_columns(validators: &[Validator], block_size: usize) {
	let mut row_coverage = vec![0usize; block_size];
	let mut col_coverage = vec![0usize; block_size];
	for v in validators.iter().filter(|v| !v.is_proposer) {
		for &r in v.row_ids() {
			row_coverage[r] += 1;
		}
		for &c in v.column_ids() {
			col_coverage[c] += 1;
		}
	}
	for (index, &count) in row_coverage.iter().enumerate() {
		if count == 0 {
			warn!(target: LOG_TARGET, dim = ?Dim::Row, index, "line has zero assigned validators, cannot be completed");
		}
	}
	for (index, &count) in col_coverage.iter().enumerate() {
		if count == 0 {
			warn!(target: LOG_TARGET, dim = ?Dim::Column, index, "line has zero assigned validators, cannot be completed");
		}
	}
}

/// Aggregate availability snapshot across the population.
///
/// `validatorProgress` is kept as a distinct field from `nodeProgress` to
/// satisfy the external progress-series contract, but in the absence of
/// any Byzantine or cryptographic validation model (explicitly out of
/// scope) the two collapse to the same computation: a validator is
/// "ready" and "validated" under identical conditions here.
pub fn get_progress(validators: &[Validator], block_size: usize) -> Progress {
	let mut globally_known = Block::new(block_size);
	let mut non_proposer_count = 0usize;
	let mut ready_count = 0usize;
	for v in validators.iter().filter(|v| !v.is_proposer) {
		globally_known.merge(v.block());
		non_proposer_count += 1;
		if v.lines_complete() {
			ready_count += 1;
		}
	}

	let total_expected = block_size * block_size;
	let arrived = globally_known.count_ones();
	let missing_samples = total_expected.saturating_sub(arrived);
	let sample_progress = if total_expected == 0 { 1.0 } else { arrived as f64 / total_expected as f64 };

	let node_progress = if non_proposer_count == 0 { 1.0 } else { ready_count as f64 / non_proposer_count as f64 };
	let validator_progress = node_progress;

	Progress { missing_samples, sample_progress, node_progress, validator_progress }
}

/// Per-class mean/min/max/std of TX, RX, and dup-RX within the current
/// slot. Must be called with each validator's *current* (pre-reset) slot
/// counters — i.e. after RESTORE but before `finish_step`.
pub fn get_traffic_stats(validators: &[Validator], shape: &Shape) -> TrafficStats {
	let mut tx_builder = Vec::new();
	let mut tx_class1 = Vec::new();
	let mut tx_class2 = Vec::new();
	let mut rx_class1 = Vec::new();
	let mut rx_class2 = Vec::new();
	let mut dup_class1 = Vec::new();
	let mut dup_class2 = Vec::new();

	for v in validators {
		if v.is_proposer {
			tx_builder.push(v.stats_tx_in_slot() as f64);
			continue;
		}
		if shape.is_class1(v.id) {
			tx_class1.push(v.stats_tx_in_slot() as f64);
			rx_class1.push(v.stats_rx_in_slot() as f64);
			dup_class1.push(v.stats_dup_in_slot() as f64);
		} else {
			tx_class2.push(v.stats_tx_in_slot() as f64);
			rx_class2.push(v.stats_rx_in_slot() as f64);
			dup_class2.push(v.stats_dup_in_slot() as f64);
		}
	}

	TrafficStats {
		tx_builder: ClassStat::from_samples(&tx_builder),
		tx_class1: ClassStat::from_samples(&tx_class1),
		tx_class2: ClassStat::from_samples(&tx_class2),
		rx_class1: ClassStat::from_samples(&rx_class1),
		rx_class2: ClassStat::from_samples(&rx_class2),
		dup_class1: ClassStat::from_samples(&dup_class1),
		dup_class2: ClassStat::from_samples(&dup_class2),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::shape::Config;

	fn make_validator(id: usize, is_proposer: bool, block_size: usize, rows: Vec<usize>, cols: Vec<usize>) -> Validator {
		Validator::new(id, is_proposer, block_size, rows, cols, usize::MAX, Config::default())
	}

	#[test]
	fn progress_is_complete_once_every_cell_reaches_some_non_proposer() {
		let mut proposer = make_validator(0, true, 4, (0..4).collect(), (0..4).collect());
		let mut rng = crate::rng::DasRng::from_seed(1);
		proposer.publish(0, &mut rng);
		let mut full = make_validator(1, false, 4, (0..4).collect(), (0..4).collect());
		for row in 0..4 {
			for col in 0..4 {
				full.receive_segment(row, col, 0);
			}
		}
		full.commit_receive();
		let validators = vec![proposer, full];
		let progress = get_progress(&validators, 4);
		assert_eq!(progress.missing_samples, 0);
		assert_eq!(progress.sample_progress, 1.0);
	}

	#[test]
	fn progress_reports_all_missing_when_nothing_disseminated() {
		let proposer = make_validator(0, true, 4, (0..4).collect(), (0..4).collect());
		let incomplete = make_validator(1, false, 4, vec![0], vec![]);
		let validators = vec![proposer, incomplete];
		let progress = get_progress(&validators, 4);
		assert_eq!(progress.missing_samples, 16);
		assert_eq!(progress.sample_progress, 0.0);
	}

	#[test]
	fn node_progress_reflects_fraction_of_complete_validators() {
		let mut proposer = make_validator(0, true, 4, (0..4).collect(), (0..4).collect());
		let mut rng = crate::rng::DasRng::from_seed(1);
		proposer.publish(0, &mut rng);
		let mut complete = make_validator(1, false, 4, vec![0], vec![]);
		for col in 0..4 {
			complete.receive_segment(0, col, 0);
		}
		complete.commit_receive();
		let incomplete = make_validator(2, false, 4, vec![1], vec![]);
		let validators = vec![proposer, complete, incomplete];
		let progress = get_progress(&validators, 4);
		assert_eq!(progress.node_progress, 0.5);
	}

	#[test]
	fn traffic_stats_split_proposer_and_classes() {
		let shape = Shape { number_validators: 3, class1_ratio: 1.0, ..Shape::default() };
		let validators =
			vec![make_validator(0, true, 4, (0..4).collect(), (0..4).collect()), make_validator(1, false, 4, vec![0], vec![])];
		let stats = get_traffic_stats(&validators, &shape);
		assert_eq!(stats.tx_builder.mean, 0.0);
		assert_eq!(stats.tx_class1.mean, 0.0);
	}
}
