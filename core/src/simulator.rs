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

//! Builds the validator population and overlay, then drives the
//! synchronous round loop until availability or stall.
//!
//! `Simulator` is the only place in `core::` that owns every validator at
//! once: everywhere else (Validator, Neighbor, Observer) operates either
//! on one validator's own state or on a borrowed slice. Cross-validator
//! effects are staged as [`validator::OutboundSegment`]s during SEND and
//! applied here in a second pass, so `Validator::receive_segment` is the
//! only method that ever touches a *different* validator's fields, and it
//! does so through the arena rather than a cyclic reference.

use rand::seq::{index, SliceRandom};
use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dim::Dim;
use crate::observer;
use crate::overlay;
use crate::result::{series, RunResult};
use crate::rng::DasRng;
use crate::shape::{Config, Shape};
use crate::validator::Validator;

const LOG_TARGET: &str = "das_sim_core::simulator";

/// Safety valve against a runaway loop. `missing_samples` is monotonically
/// non-increasing (block state only ever gains bits), so the stall check
/// always fires in practice; this bounds pathological configurations
/// (e.g. a disconnected overlay that keeps dribbling one cell at a time)
/// without changing any reported result for a run that would have
/// terminated anyway.
const MAX_STEPS: usize = 100_000;

pub struct Simulator {
	shape: Shape,
	config: Config,
	rng: DasRng,
	diagnostics: Diagnostics,
	validators: Vec<Validator>,
}

impl Simulator {
	pub fn new(shape: Shape, config: Config) -> Self {
		let (shape, diagnostics) = shape.validate();
		let rng = DasRng::from_seed(shape.run);
		Simulator { shape, config, rng, diagnostics, validators: Vec::new() }
	}

	pub fn diagnostics(&self) -> &Diagnostics {
		&self.diagnostics
	}

	/// Allocates `number_validators` validators. Validator 0 is the
	/// proposer, interested in every row and column. Every other
	/// validator's interest set is either dealt deterministically (even
	/// line distribution) or sampled uniformly without replacement.
	pub fn init_validators(&mut self) {
		let shape = self.shape;
		let block_size = shape.block_size;
		let all_lines: Vec<usize> = (0..block_size).collect();

		let mut validators = Vec::with_capacity(shape.number_validators);
		validators.push(Validator::new(
			0,
			true,
			block_size,
			all_lines.clone(),
			all_lines,
			shape.bw_uplink_for(0),
			self.config.clone(),
		));

		if self.config.even_line_distribution {
			self.deal_even_line_distribution(&mut validators);
		} else {
			for id in 1..shape.number_validators {
				let is_class1 = shape.is_class1(id);
				let chi = shape.chi_for_class(is_class1);
				let rows = sample_without_replacement(&mut self.rng, block_size, chi);
				let cols = sample_without_replacement(&mut self.rng, block_size, chi);
				validators.push(Validator::new(
					id,
					false,
					block_size,
					rows,
					cols,
					shape.bw_uplink_for(id),
					self.config.clone(),
				));
			}
		}

		debug!(target: LOG_TARGET, count = validators.len(), "validators initialized");
		self.validators = validators;
	}

	/// Deterministic dealing: builds one shuffled pool of row indices and
	/// one of column indices, each long enough to cover every
	/// non-proposer validator's `chi * vpn` slots, then hands out
	/// contiguous chunks in ID order. A chunk can collide with itself
	/// (the pool repeats `0..blockSize` to reach the needed length) so a
	/// validator's final interest set, after deduplication, may be
	/// slightly smaller than `chi`; this mirrors the reference
	/// simulator's own stride-and-dedup behavior (see DESIGN.md).
	fn deal_even_line_distribution(&mut self, validators: &mut Vec<Validator>) {
		let shape = self.shape;
		let block_size = shape.block_size;

		let slot_size = |id: usize| -> usize {
			let is_class1 = shape.is_class1(id);
			let chi = shape.chi_for_class(is_class1);
			let vpn = if is_class1 { shape.vpn1 } else { shape.vpn2 };
			chi * vpn.max(1)
		};
		let total_slots: usize = (1..shape.number_validators).map(slot_size).sum();

		let row_pool = stride_pool(block_size, total_slots, &mut self.rng);
		let col_pool = stride_pool(block_size, total_slots, &mut self.rng);

		let mut cursor = 0usize;
		for id in 1..shape.number_validators {
			let n = slot_size(id);
			let rows: Vec<usize> = dedup_sorted(&row_pool[cursor..cursor + n]);
			let cols: Vec<usize> = dedup_sorted(&col_pool[cursor..cursor + n]);
			cursor += n;
			validators.push(Validator::new(
				id,
				false,
				block_size,
				rows,
				cols,
				shape.bw_uplink_for(id),
				self.config.clone(),
			));
		}
	}

	/// Builds the row and column overlays: one topic mesh per line, plus
	/// the proposer's one-directional publish links when
	/// `proposer_publish_only` is set.
	pub fn init_network(&mut self) {
		let block_size = self.shape.block_size;
		let publish_only = self.shape.proposer_publish_only;
		let net_degree = self.shape.net_degree;
		let send_until = crate::block::send_line_until(block_size);

		for dim in [Dim::Row, Dim::Column] {
			let members_by_line = self.topic_membership(dim, publish_only);

			for (line, members) in members_by_line.iter().enumerate() {
				if members.is_empty() {
					self.diagnostics.push(Diagnostic::EmptyTopic { dim, index: line });
					continue;
				}
				let edges = overlay::build_topic_graph(members.len(), net_degree, &mut self.rng, &mut self.diagnostics);
				for (u, v) in edges {
					let (id_a, id_b) = (members[u], members[v]);
					self.validators[id_a].add_neighbor(dim, line, id_b, send_until);
					self.validators[id_b].add_neighbor(dim, line, id_a, send_until);
				}
			}

			if publish_only {
				self.wire_proposer_publish_links(dim, &members_by_line, send_until);
			}
		}
	}

	/// Validator IDs (in ascending order) interested in each line of
	/// `dim`, excluding the proposer when publish-only.
	fn topic_membership(&self, dim: Dim, publish_only: bool) -> Vec<Vec<usize>> {
		let block_size = self.shape.block_size;
		let mut members = vec![Vec::new(); block_size];
		for v in &self.validators {
			if publish_only && v.is_proposer {
				continue;
			}
			let ids = match dim {
				Dim::Row => v.row_ids(),
				Dim::Column => v.column_ids(),
			};
			for &line in ids {
				members[line].push(v.id);
			}
		}
		members
	}

	fn wire_proposer_publish_links(&mut self, dim: Dim, members_by_line: &[Vec<usize>], send_until: usize) {
		let proposer_lines: Vec<usize> = match dim {
			Dim::Row => self.validators[0].row_ids().to_vec(),
			Dim::Column => self.validators[0].column_ids().to_vec(),
		};
		let publish_to = self.shape.proposer_publish_to();
		for line in proposer_lines {
			let members = &members_by_line[line];
			if members.is_empty() {
				continue;
			}
			let count = publish_to.min(members.len());
			let chosen = index::sample(&mut self.rng, members.len(), count);
			for idx in chosen.iter() {
				self.validators[0].add_neighbor(dim, line, members[idx], send_until);
			}
		}
	}

	/// Publishes the block, then drives the SEND/RECEIVE/RESTORE/LOG loop
	/// until the block is fully available or a step makes no net
	/// progress.
	pub fn run(mut self) -> RunResult {
		observer::check_rows_columns(&self.validators, self.shape.block_size);

		self.validators[0].publish(self.shape.failure_rate, &mut self.rng);

		let mut result = RunResult::new(self.shape);
		let mut last_missing = observer::get_progress(&self.validators, self.shape.block_size).missing_samples;

		for step in 1..=MAX_STEPS {
			self.run_step();

			let progress = observer::get_progress(&self.validators, self.shape.block_size);
			let traffic = observer::get_traffic_stats(&self.validators, &self.shape);
			for v in self.validators.iter_mut() {
				v.finish_step();
			}

			result.missing_vector.push(progress.missing_samples);
			if self.config.save_progress {
				result.push_progress(&[
					(series::SAMPLES_RECEIVED, progress.sample_progress),
					(series::NODES_READY, progress.node_progress),
					(series::VALIDATORS_READY, progress.validator_progress),
					(series::TX_BUILDER_MEAN, traffic.tx_builder.mean),
					(series::TX_CLASS1_MEAN, traffic.tx_class1.mean),
					(series::TX_CLASS2_MEAN, traffic.tx_class2.mean),
					(series::RX_CLASS1_MEAN, traffic.rx_class1.mean),
					(series::RX_CLASS2_MEAN, traffic.rx_class2.mean),
					(series::DUP_CLASS1_MEAN, traffic.dup_class1.mean),
					(series::DUP_CLASS2_MEAN, traffic.dup_class2.mean),
				]);
			}

			if progress.missing_samples == 0 {
				info!(target: LOG_TARGET, step, "block fully available");
				result.tta = Some(step);
				result.missing_samples = 0;
				return result;
			}
			if progress.missing_samples == last_missing {
				info!(target: LOG_TARGET, step, missing = progress.missing_samples, "run stalled, no net progress");
				result.tta = None;
				result.missing_samples = progress.missing_samples;
				return result;
			}
			last_missing = progress.missing_samples;
		}

		result.tta = None;
		result.missing_samples = last_missing;
		result
	}

	fn run_step(&mut self) {
		let mut outbound = Vec::new();
		for v in self.validators.iter_mut() {
			outbound.extend(v.send(&mut self.rng));
		}
		for seg in &outbound {
			self.validators[seg.target].receive_segment(seg.row, seg.col, seg.src);
		}
		for v in self.validators.iter_mut() {
			v.commit_receive();
		}
		for v in self.validators.iter_mut() {
			v.restore();
		}
	}

	#[cfg(test)]
	pub fn validators(&self) -> &[Validator] {
		&self.validators
	}
}

fn sample_without_replacement(rng: &mut DasRng, n: usize, k: usize) -> Vec<usize> {
	let k = k.min(n);
	index::sample(rng, n, k).into_vec()
}

/// `0..block_size` repeated enough times to reach `total_slots`, shuffled
/// once as a whole.
fn stride_pool(block_size: usize, total_slots: usize, rng: &mut DasRng) -> Vec<usize> {
	if block_size == 0 {
		return Vec::new();
	}
	let repeats = total_slots / block_size + 1;
	let mut pool: Vec<usize> = (0..block_size).collect::<Vec<_>>().repeat(repeats);
	pool.shuffle(rng);
	pool
}

fn dedup_sorted(slice: &[usize]) -> Vec<usize> {
	let mut v = slice.to_vec();
	v.sort_unstable();
	v.dedup();
	v
}

#[cfg(test)]
mod tests {
	use super::*;

	fn shape(block_size: usize, number_validators: usize, net_degree: usize) -> Shape {
		Shape {
			block_size,
			number_validators,
			net_degree,
			chi: block_size,
			chi1: block_size,
			chi2: block_size,
			class1_ratio: 0.5,
			..Shape::default()
		}
	}

	#[test]
	fn zero_failure_rate_reaches_full_availability_quickly() {
		let s = Shape { failure_rate: 0, run: 1, ..shape(4, 8, 3) };
		let mut sim = Simulator::new(s, Config::default());
		sim.init_validators();
		sim.init_network();
		let result = sim.run();
		assert_eq!(result.missing_samples, 0);
		assert!(result.tta.is_some());
		assert!(result.tta.unwrap() <= 12);
	}

	#[test]
	fn full_failure_rate_stalls_after_one_step() {
		let s = Shape { failure_rate: 100, chi1: 2, chi2: 2, run: 1, ..shape(4, 8, 3) };
		let mut sim = Simulator::new(s, Config::default());
		sim.init_validators();
		sim.init_network();
		let result = sim.run();
		assert_eq!(result.missing_samples, 16);
		assert!(result.tta.is_none());
		assert_eq!(result.missing_vector.len(), 1);
	}

	#[test]
	fn complete_graph_used_when_degree_plus_one_equals_membership() {
		let s = Shape { run: 2, ..shape(4, 5, 3) };
		let mut sim = Simulator::new(s, Config::default());
		sim.init_validators();
		sim.init_network();
		for line in 0..4 {
			assert_eq!(sim.validators()[1].neighbor_count(Dim::Row, line), 3);
		}
	}

	#[test]
	fn deterministic_seed_reproduces_missing_vector() {
		let s = Shape { failure_rate: 50, run: 7, ..shape(16, 64, 6) };
		let mut sim_a = Simulator::new(s, Config::default());
		sim_a.init_validators();
		sim_a.init_network();
		let result_a = sim_a.run();

		let mut sim_b = Simulator::new(s, Config::default());
		sim_b.init_validators();
		sim_b.init_network();
		let result_b = sim_b.run();

		assert_eq!(result_a.missing_vector, result_b.missing_vector);
		assert_eq!(result_a.tta, result_b.tta);
	}

	#[test]
	fn even_line_distribution_covers_every_line() {
		let s = Shape { chi1: 2, chi2: 2, run: 3, ..shape(8, 16, 3) };
		let config = Config { even_line_distribution: true, ..Config::default() };
		let mut sim = Simulator::new(s, config);
		sim.init_validators();
		sim.init_network();
		let mut row_coverage = [0usize; 8];
		for v in sim.validators().iter().filter(|v| !v.is_proposer) {
			for &r in v.row_ids() {
				row_coverage[r] += 1;
			}
		}
		assert!(row_coverage.iter().all(|&c| c > 0), "{row_coverage:?}");
	}

	#[test]
	fn zero_coverage_line_is_flagged_and_stays_missing() {
		let mut s = shape(4, 3, 2);
		s.failure_rate = 0;
		s.run = 5;
		let mut sim = Simulator::new(s, Config::default());
		sim.init_validators();
		// Force row 3 to have no non-proposer subscribers.
		for v in sim.validators.iter_mut().skip(1) {
			*v = Validator::new(v.id, false, 4, vec![0, 1, 2], vec![0, 1, 2, 3], usize::MAX, Config::default());
		}
		sim.init_network();
		let flagged = sim.diagnostics().as_slice().iter().any(|d| matches!(d, Diagnostic::EmptyTopic { dim: Dim::Row, index: 3 }));
		assert!(flagged);
		let result = sim.run();
		assert!(result.missing_samples > 0);
	}
}
