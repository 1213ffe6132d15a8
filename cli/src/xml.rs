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

//! Flat XML result export — the only place in the workspace that
//! understands the persisted form (spec Section 6: "The core neither
//! reads nor writes this format; it is the orchestrator's contract").

use std::io::Cursor;
use std::path::Path;

use das_sim_core::RunResult;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Error;

fn write_scalar(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, value: impl std::fmt::Display) -> Result<(), Error> {
	writer.write_event(Event::Start(BytesStart::new(tag)))?;
	writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
	writer.write_event(Event::End(BytesEnd::new(tag)))?;
	Ok(())
}

/// Writes one `RunResult` as the flat XML element list from spec Section
/// 6: `run`, `blockSize`, `failureRate`, `numberNodes`, `netDegree`,
/// `chi`, `vpn1`, `vpn2`, `bwUplinkProd`, `bwUplink1`, `bwUplink2`,
/// `tta`, plus optional progress arrays.
pub fn write_result(path: &Path, result: &RunResult) -> Result<(), Error> {
	let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
	writer.write_event(Event::Start(BytesStart::new("result")))?;

	write_scalar(&mut writer, "run", result.shape.run)?;
	write_scalar(&mut writer, "blockSize", result.shape.block_size)?;
	write_scalar(&mut writer, "failureRate", result.shape.failure_rate)?;
	write_scalar(&mut writer, "numberNodes", result.shape.number_validators)?;
	write_scalar(&mut writer, "netDegree", result.shape.net_degree)?;
	write_scalar(&mut writer, "chi", result.shape.chi)?;
	write_scalar(&mut writer, "vpn1", result.shape.vpn1)?;
	write_scalar(&mut writer, "vpn2", result.shape.vpn2)?;
	write_scalar(&mut writer, "bwUplinkProd", result.shape.bw_uplink_prod)?;
	write_scalar(&mut writer, "bwUplink1", result.shape.bw_uplink1)?;
	write_scalar(&mut writer, "bwUplink2", result.shape.bw_uplink2)?;
	write_scalar(&mut writer, "missingSamples", result.missing_samples)?;
	match result.tta {
		Some(tta) => write_scalar(&mut writer, "tta", tta)?,
		None => write_scalar(&mut writer, "tta", "stall")?,
	}

	writer.write_event(Event::Start(BytesStart::new("missingVector")))?;
	for (step, missing) in result.missing_vector.iter().enumerate() {
		writer.write_event(Event::Start(BytesStart::new("step")))?;
		write_scalar(&mut writer, "index", step)?;
		write_scalar(&mut writer, "missing", missing)?;
		writer.write_event(Event::End(BytesEnd::new("step")))?;
	}
	writer.write_event(Event::End(BytesEnd::new("missingVector")))?;

	if let Some(progress) = &result.progress {
		writer.write_event(Event::Start(BytesStart::new("progress")))?;
		for (name, values) in progress {
			let mut series = BytesStart::new("series");
			series.push_attribute(("name", name.as_str()));
			writer.write_event(Event::Start(series))?;
			for value in values {
				write_scalar(&mut writer, "value", value)?;
			}
			writer.write_event(Event::End(BytesEnd::new("series")))?;
		}
		writer.write_event(Event::End(BytesEnd::new("progress")))?;
	}

	writer.write_event(Event::End(BytesEnd::new("result")))?;

	let bytes = writer.into_inner().into_inner();
	std::fs::write(path, bytes).map_err(|source| Error::ResultWrite { path: path.to_path_buf(), source })
}
