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

//! Hard failures at the CLI boundary: bad paths, malformed TOML,
//! conflicting arguments. Distinct from `das_sim_core::diagnostics`,
//! which carries *non-fatal* run degradations the core keeps going
//! through (spec Section 7: "only programming errors surface as hard
//! failures").

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse TOML at {path}: {source}")]
	Toml {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("no shape given; pass --shape <file> or --sweep <file>")]
	MissingInput,

	#[error("pass either --shape or --sweep, not both")]
	ConflictingInputs,

	#[error("failed to write result to {path}: {source}")]
	ResultWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to encode XML result: {0}")]
	XmlEncode(#[from] quick_xml::Error),
}
