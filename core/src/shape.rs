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

//! `Shape` and `Config`: the plain data carriers at the core's boundary.
//!
//! Both are `serde`-derived so the CLI crate can load them straight off a
//! TOML sweep file; the core itself only ever consumes them by value.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Diagnostics};

/// Simulation parameters for one run.
///
/// Adopts the richer of the two constructor shapes the original tooling
/// carried (per-class bandwidths, `chi1`/`chi2` split by validator class)
/// rather than the flatter single-`bwUplink` variant; see `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
	pub block_size: usize,
	pub number_validators: usize,
	/// Integer percent, `[0, 100]`.
	pub failure_rate: u8,
	/// Legacy external-reporting field; mirrors `chi1`. Not consulted by
	/// the dissemination engine, which is driven entirely by `chi1`/`chi2`.
	pub chi: usize,
	/// Rows/columns subscribed to by a class-1 ("light") validator.
	pub chi1: usize,
	/// Rows/columns subscribed to by a class-2 validator.
	pub chi2: usize,
	/// Target overlay degree. Must be even for the pairing model to fully
	/// match stubs; an odd value is accepted but flagged.
	pub net_degree: usize,
	/// Fraction of non-proposer validators that are class 1, in `[0, 1]`.
	pub class1_ratio: f64,
	pub vpn1: usize,
	pub vpn2: usize,
	pub bw_uplink_prod: usize,
	pub bw_uplink1: usize,
	pub bw_uplink2: usize,
	/// Seed / sweep index. Feeds `DasRng::from_seed`.
	pub run: u64,
	/// If true, the proposer is excluded from topic meshes and instead
	/// injects via one-directional publish links. Defaults to `true`,
	/// matching the reference simulator's hardcoded behavior.
	pub proposer_publish_only: bool,
	/// Peers per owned line the proposer publishes to directly, when
	/// `proposer_publish_only` is set. Defaults to `net_degree` when unset.
	pub proposer_publish_to: Option<usize>,
}

impl Shape {
	/// Validates range constraints that the reference simulator treats as
	/// non-fatal: out-of-range `chi1`/`chi2` are clamped into
	/// `[1, block_size]`, and an odd `net_degree` is flagged but left
	/// alone. Returns the (possibly clamped) shape plus any diagnostics.
	pub fn validate(mut self) -> (Shape, Diagnostics) {
		let mut diagnostics = Diagnostics::new();

		let clamp_chi = |field: &'static str, value: usize, block_size: usize, diagnostics: &mut Diagnostics| -> usize {
			let clamped = value.clamp(1, block_size.max(1));
			if clamped != value {
				diagnostics.push(Diagnostic::ChiOutOfRange {
					field,
					value: value as i64,
					clamped_to: clamped.min(u8::MAX as usize) as u8,
				});
			}
			clamped
		};

		self.chi1 = clamp_chi("chi1", self.chi1, self.block_size, &mut diagnostics);
		self.chi2 = clamp_chi("chi2", self.chi2, self.block_size, &mut diagnostics);

		if self.net_degree % 2 != 0 {
			diagnostics.push(Diagnostic::NetDegreeOdd { value: self.net_degree });
		}

		(self, diagnostics)
	}

	/// Number of peers the proposer publishes each owned cell to, per
	/// line, when publish-only. Falls back to `net_degree`.
	pub fn proposer_publish_to(&self) -> usize {
		self.proposer_publish_to.unwrap_or(self.net_degree)
	}

	/// `chi` (interest-set size) for a validator of the given class.
	pub fn chi_for_class(&self, is_class1: bool) -> usize {
		if is_class1 {
			self.chi1
		} else {
			self.chi2
		}
	}

	/// Whether validator `id` (1-indexed among non-proposer validators, 0
	/// being the proposer) falls into class 1 under `class1_ratio`.
	pub fn is_class1(&self, validator_id: usize) -> bool {
		if validator_id == 0 {
			return false;
		}
		let non_proposer = self.number_validators.saturating_sub(1).max(1);
		let class1_count = (non_proposer as f64 * self.class1_ratio).round() as usize;
		validator_id <= class1_count
	}

	pub fn bw_uplink_for(&self, validator_id: usize) -> usize {
		if validator_id == 0 {
			self.bw_uplink_prod
		} else if self.is_class1(validator_id) {
			self.bw_uplink1
		} else {
			self.bw_uplink2
		}
	}
}

impl Default for Shape {
	fn default() -> Self {
		Shape {
			block_size: 16,
			number_validators: 64,
			failure_rate: 0,
			chi: 2,
			chi1: 2,
			chi2: 2,
			net_degree: 4,
			class1_ratio: 0.5,
			vpn1: 1,
			vpn2: 1,
			bw_uplink_prod: usize::MAX,
			bw_uplink1: 4,
			bw_uplink2: 4,
			run: 0,
			proposer_publish_only: true,
			proposer_publish_to: None,
		}
	}
}

/// Orchestrator-facing run configuration. Only `even_line_distribution`,
/// `save_progress`, and `log_level` are consulted by the core; the rest
/// are carried through for the CLI's sweep driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	pub even_line_distribution: bool,
	pub save_progress: bool,
	pub log_level: String,
	pub deterministic: bool,
	pub random_seed: Option<String>,
	pub num_jobs: usize,

	// Scheduler toggles. Not part of the orchestrator's external contract
	// in Section 6, but referenced by Section 4.3 as "configuration
	// flags" gating the node-level and per-neighbor send queues; carried
	// here alongside the other per-validator behavior switches.
	pub node_queue_enabled: bool,
	pub per_neighbor_queue_enabled: bool,
	pub segment_shuffle_enabled: bool,
	pub segment_shuffle_persist: bool,
	pub dumb_random_enabled: bool,
	pub dumb_random_tries: usize,
	/// Whether neighbor iteration order within a scheduler pass is
	/// shuffled or left in insertion order.
	pub shuffle_neighbor_order: bool,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			even_line_distribution: false,
			save_progress: true,
			log_level: "info".to_string(),
			deterministic: true,
			random_seed: None,
			num_jobs: 1,
			node_queue_enabled: false,
			per_neighbor_queue_enabled: true,
			segment_shuffle_enabled: true,
			segment_shuffle_persist: true,
			dumb_random_enabled: false,
			dumb_random_tries: 8,
			shuffle_neighbor_order: true,
		}
	}
}
