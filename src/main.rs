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

//! Entry point for the `das-sim` binary.
//!
//! Mirrors the teacher's own root crate: a thin `main` that hands off to
//! the CLI crate's `run`, keeping argument parsing and orchestration out
//! of the workspace root.

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	das_sim_cli::run()
}
