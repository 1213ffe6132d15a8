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

//! Parallel run fan-out across an independent parameter grid.
//!
//! Spec Section 5: "Across runs... simulations are independent and
//! embarrassingly parallel — the orchestrator may run many in parallel,
//! each with its own RNG seed." `Simulator` threads its own `DasRng` from
//! `shape.run`, so parallelizing here never touches shared mutable state.

use das_sim_core::{Config, RunResult, Shape, Simulator};
use rayon::prelude::*;

pub fn run_sweep(shapes: Vec<Shape>, config: &Config) -> Vec<RunResult> {
	let drive = move || {
		shapes
			.into_par_iter()
			.map(|shape| {
				let mut sim = Simulator::new(shape, config.clone());
				sim.init_validators();
				sim.init_network();
				sim.run()
			})
			.collect()
	};

	if config.num_jobs == 0 {
		return drive();
	}
	match rayon::ThreadPoolBuilder::new().num_threads(config.num_jobs).build() {
		Ok(pool) => pool.install(drive),
		Err(_) => drive(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sweep_runs_every_shape_independently() {
		let shapes = vec![
			Shape { block_size: 4, number_validators: 8, failure_rate: 0, run: 1, ..Shape::default() },
			Shape { block_size: 4, number_validators: 8, failure_rate: 100, run: 2, ..Shape::default() },
		];
		let results = run_sweep(shapes, &Config::default());
		assert_eq!(results.len(), 2);
		assert_eq!(results[0].shape.run, 1);
		assert_eq!(results[1].shape.run, 2);
		assert_eq!(results[0].missing_samples, 0);
		assert_eq!(results[1].missing_samples, 16);
	}
}
