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

//! Non-fatal run-time findings.
//!
//! Nothing in the core dissemination loop returns a `Result`: a malformed
//! shape or a disconnected overlay doesn't abort a sweep, it degrades the
//! run and gets recorded so the caller can decide whether to keep the
//! result. Hard errors (bad config files, CLI argument errors) are
//! `thiserror` types at the CLI boundary instead; see `das-sim-cli`.

use tracing::warn;

const LOG_TARGET: &str = "das_sim_core::diagnostics";

/// A condition worth surfacing to the caller without aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
	/// `chi1` or `chi2` fell outside `[0, 100]` and was clamped.
	ChiOutOfRange { field: &'static str, value: i64, clamped_to: u8 },
	/// A row or column topic ended up with zero participating peers.
	/// Segments on that line can never propagate to anyone.
	EmptyTopic { dim: crate::dim::Dim, index: usize },
	/// The random regular graph construction could not find a connected
	/// graph within the retry budget; the last attempt was kept anyway.
	GraphDisconnected { attempts: u32 },
	/// `netDegree` must be even to pair stubs in the configuration model;
	/// the odd value was used as-is and may yield a lopsided graph.
	NetDegreeOdd { value: usize },
}

impl Diagnostic {
	/// Logs this diagnostic at a level appropriate to its severity.
	pub fn log(&self) {
		match self {
			Diagnostic::ChiOutOfRange { field, value, clamped_to } => {
				warn!(target: LOG_TARGET, field, value, clamped_to, "shape field out of range, clamped");
			}
			Diagnostic::EmptyTopic { dim, index } => {
				warn!(target: LOG_TARGET, ?dim, index, "topic has no participating validators, line cannot be completed");
			}
			Diagnostic::GraphDisconnected { attempts } => {
				warn!(target: LOG_TARGET, attempts, "overlay graph remained disconnected after retry budget");
			}
			Diagnostic::NetDegreeOdd { value } => {
				warn!(target: LOG_TARGET, value, "net_degree is odd, pairing model may leave a stub unmatched");
			}
		}
	}
}

/// Accumulates diagnostics over the course of one run.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
	pub fn new() -> Self {
		Diagnostics(Vec::new())
	}

	pub fn push(&mut self, diagnostic: Diagnostic) {
		diagnostic.log();
		self.0.push(diagnostic);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_slice(&self) -> &[Diagnostic] {
		&self.0
	}

	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.0
	}
}
