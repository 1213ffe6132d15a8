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

//! TOML loading for `Shape`, `Config`, and sweep grids.
//!
//! `das_sim_core` never parses its own boundary types off disk (spec
//! Section 1: "Their only contract with the core is the Shape... going
//! in and a Result... coming out"); this module is the only place in the
//! workspace that does.

use std::path::Path;

use das_sim_core::{Config, Shape};
use serde::Deserialize;

use crate::error::Error;

/// A sweep file names a list of shapes to run, one simulation per entry,
/// all sharing the same orchestrator `Config`.
#[derive(Debug, Deserialize)]
pub struct SweepFile {
	pub shapes: Vec<Shape>,
}

fn read(path: &Path) -> Result<String, Error> {
	std::fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn parse<T: for<'de> Deserialize<'de>>(path: &Path, contents: &str) -> Result<T, Error> {
	toml::from_str(contents).map_err(|source| Error::Toml { path: path.to_path_buf(), source })
}

pub fn load_shape(path: &Path) -> Result<Shape, Error> {
	let contents = read(path)?;
	parse(path, &contents)
}

pub fn load_config(path: &Path) -> Result<Config, Error> {
	let contents = read(path)?;
	parse(path, &contents)
}

pub fn load_sweep(path: &Path) -> Result<Vec<Shape>, Error> {
	let contents = read(path)?;
	let sweep: SweepFile = parse(path, &contents)?;
	Ok(sweep.shapes)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn load_shape_parses_camel_case_toml() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			blockSize = 8
			numberValidators = 16
			failureRate = 10
			chi = 2
			chi1 = 2
			chi2 = 2
			netDegree = 4
			class1Ratio = 0.5
			vpn1 = 1
			vpn2 = 1
			bwUplinkProd = 100000
			bwUplink1 = 4
			bwUplink2 = 4
			run = 1
			proposerPublishOnly = true
			"#
		)
		.unwrap();
		let shape = load_shape(file.path()).unwrap();
		assert_eq!(shape.block_size, 8);
		assert_eq!(shape.number_validators, 16);
	}

	#[test]
	fn load_sweep_parses_multiple_shapes() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			[[shapes]]
			blockSize = 4
			numberValidators = 8
			failureRate = 0
			chi = 2
			chi1 = 2
			chi2 = 2
			netDegree = 3
			class1Ratio = 0.5
			vpn1 = 1
			vpn2 = 1
			bwUplinkProd = 100000
			bwUplink1 = 4
			bwUplink2 = 4
			run = 1
			proposerPublishOnly = true

			[[shapes]]
			blockSize = 4
			numberValidators = 8
			failureRate = 50
			chi = 2
			chi1 = 2
			chi2 = 2
			netDegree = 3
			class1Ratio = 0.5
			vpn1 = 1
			vpn2 = 1
			bwUplinkProd = 100000
			bwUplink1 = 4
			bwUplink2 = 4
			run = 2
			proposerPublishOnly = true
			"#
		)
		.unwrap();
		let shapes = load_sweep(file.path()).unwrap();
		assert_eq!(shapes.len(), 2);
		assert_eq!(shapes[1].failure_rate, 50);
	}

	#[test]
	fn missing_file_is_an_io_error() {
		let err = load_shape(Path::new("/nonexistent/shape.toml")).unwrap_err();
		assert!(matches!(err, Error::Io { .. }));
	}
}
