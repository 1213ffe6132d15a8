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

use std::path::PathBuf;

use clap::Parser;

/// Runs the two-dimensional Data Availability Sampling dissemination
/// simulator over one shape or a sweep of shapes, writing one XML result
/// file per run.
#[derive(Debug, Parser)]
#[command(name = "das-sim", version, about)]
pub struct Args {
	/// TOML file describing a single run's `Shape`.
	#[arg(long)]
	pub shape: Option<PathBuf>,

	/// TOML file naming a `[[shapes]]` grid to run, one simulation per
	/// entry. Mutually exclusive with `--shape`.
	#[arg(long)]
	pub sweep: Option<PathBuf>,

	/// TOML file describing the orchestrator `Config`. Defaults to
	/// `Config::default()` when omitted.
	#[arg(long)]
	pub config: Option<PathBuf>,

	/// Directory to write per-run XML result files into. Created if it
	/// doesn't exist.
	#[arg(long, default_value = "results")]
	pub out: PathBuf,
}
