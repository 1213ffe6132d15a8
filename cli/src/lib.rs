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

//! Thin orchestrator around `das_sim_core`: TOML configuration loading,
//! parameter sweep driving, parallel run fan-out, and XML result export.
//! The core engine only ever sees a `Shape`/`Config` in and a
//! `RunResult` out (spec Section 1); everything else lives here.

mod args;
mod config;
mod error;
mod sweep;
mod xml;

use clap::Parser;
use das_sim_core::Config;
use tracing_subscriber::EnvFilter;

use args::Args;
use error::Error;

pub fn run() -> color_eyre::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => config::load_config(path)?,
		None => Config::default(),
	};

	init_tracing(&config.log_level);

	let shapes = match (&args.shape, &args.sweep) {
		(Some(path), None) => vec![config::load_shape(path)?],
		(None, Some(path)) => config::load_sweep(path)?,
		(Some(_), Some(_)) => return Err(Error::ConflictingInputs.into()),
		(None, None) => return Err(Error::MissingInput.into()),
	};

	std::fs::create_dir_all(&args.out).map_err(|source| Error::Io { path: args.out.clone(), source })?;

	let results = sweep::run_sweep(shapes, &config);
	for result in &results {
		let path = args.out.join(format!("run-{}.xml", result.shape.run));
		xml::write_result(&path, result)?;
		tracing::info!(
			run = result.shape.run,
			tta = ?result.tta,
			missing_samples = result.missing_samples,
			"run complete"
		);
	}

	Ok(())
}

/// `RUST_LOG` takes precedence when set; otherwise falls back to the
/// orchestrator `Config`'s `log_level`.
fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
