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

//! Integration tests for the six concrete scenarios from spec Section 8,
//! exercised purely through the public `Shape`/`Config`/`Simulator`
//! boundary (no access to validator internals).

use das_sim_core::{Config, Shape, Simulator};

fn base_shape(block_size: usize, number_validators: usize, net_degree: usize) -> Shape {
	Shape {
		block_size,
		number_validators,
		net_degree,
		class1_ratio: 0.5,
		..Shape::default()
	}
}

/// Scenario 1: blockSize=4, numberValidators=8, chi=4, failureRate=0,
/// netDegree=3. Expect termination with missingSamples=0 within a few
/// steps.
#[test]
fn scenario_1_full_chi_zero_failure_terminates_quickly() {
	let shape = Shape {
		chi1: 4,
		chi2: 4,
		failure_rate: 0,
		run: 11,
		..base_shape(4, 8, 3)
	};
	let mut sim = Simulator::new(shape, Config::default());
	sim.init_validators();
	sim.init_network();
	let result = sim.run();

	assert_eq!(result.missing_samples, 0);
	assert!(result.tta.is_some());
	assert!(result.tta.unwrap() <= 10, "expected a quick termination, got {:?}", result.tta);
}

/// Scenario 2: blockSize=4, numberValidators=8, chi=2, failureRate=100.
/// Expect halt after step 1 with missingSamples=16, reported as a stall.
#[test]
fn scenario_2_full_failure_rate_stalls_immediately() {
	let shape = Shape {
		chi1: 2,
		chi2: 2,
		failure_rate: 100,
		run: 12,
		..base_shape(4, 8, 3)
	};
	let mut sim = Simulator::new(shape, Config::default());
	sim.init_validators();
	sim.init_network();
	let result = sim.run();

	assert_eq!(result.missing_samples, 16);
	assert!(result.tta.is_none());
	assert_eq!(result.missing_vector.len(), 1);
}

/// Scenario 3: a fixed seed reproduces the same missingVector and tta
/// across independent runs.
#[test]
fn scenario_3_fixed_seed_is_deterministic() {
	let shape = Shape {
		chi1: 4,
		chi2: 4,
		failure_rate: 50,
		run: 13,
		..base_shape(32, 256, 6)
	};

	let mut sim_a = Simulator::new(shape, Config::default());
	sim_a.init_validators();
	sim_a.init_network();
	let result_a = sim_a.run();

	let mut sim_b = Simulator::new(shape, Config::default());
	sim_b.init_validators();
	sim_b.init_network();
	let result_b = sim_b.run();

	assert_eq!(result_a.missing_vector, result_b.missing_vector);
	assert_eq!(result_a.tta, result_b.tta);
}

/// Scenario 4: publish-only proposer with proposerPublishTo=1 and zero
/// failure rate still reaches full availability, relying on topic
/// meshes to carry segments the rest of the way.
#[test]
fn scenario_4_publish_only_proposer_still_reaches_availability() {
	let shape = Shape {
		chi1: 3,
		chi2: 3,
		failure_rate: 0,
		proposer_publish_only: true,
		proposer_publish_to: Some(1),
		run: 14,
		..base_shape(8, 32, 4)
	};
	let mut sim = Simulator::new(shape, Config::default());
	sim.init_validators();
	sim.init_network();
	let result = sim.run();

	assert_eq!(result.missing_samples, 0);
	assert!(result.tta.is_some());
}

/// Scenario 5: even line distribution covers every row and column index
/// with at least one non-proposer validator.
#[test]
fn scenario_5_even_line_distribution_covers_every_line() {
	let shape = Shape {
		chi1: 2,
		chi2: 2,
		run: 15,
		..base_shape(8, 16, 3)
	};
	let config = Config { even_line_distribution: true, ..Config::default() };
	let mut sim = Simulator::new(shape, config);
	sim.init_validators();
	sim.init_network();

	// Full availability is not guaranteed by even distribution alone, but
	// the diagnostics must be clean: no EmptyTopic should have fired.
	assert!(sim.diagnostics().as_slice().is_empty(), "{:?}", sim.diagnostics().as_slice());

	let result = sim.run();
	let _ = result;
}

/// Scenario 6: a row with zero assigned validators cannot be completed;
/// the observer warns at setup and the run reports a stall.
#[test]
fn scenario_6_zero_coverage_row_stalls() {
	// blockSize=16 with only chi=4 per validator and few validators makes
	// it likely, but not certain, that some line goes uncovered; instead
	// construct the gap directly via a sweep file is out of scope here —
	// this crate's unit tests (`simulator::tests::zero_coverage_line_is_flagged_and_stays_missing`)
	// cover the deterministic construction of this case against private
	// state. This integration-level test instead checks the public
	// contract: a very small validator population relative to blockSize
	// reliably leaves some line uncovered and the run never reaches zero.
	let shape = Shape {
		chi1: 1,
		chi2: 1,
		failure_rate: 0,
		run: 16,
		..base_shape(16, 3, 2)
	};
	let mut sim = Simulator::new(shape, Config::default());
	sim.init_validators();
	sim.init_network();
	let result = sim.run();

	assert!(result.missing_samples > 0);
	assert!(result.tta.is_none());
}
