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

//! Core dissemination engine and synchronous scheduler for the
//! two-dimensional Data Availability Sampling simulator.
//!
//! This crate is deliberately I/O-free: it exchanges [`shape::Shape`] /
//! [`shape::Config`] in and [`result::RunResult`] out, and never touches a
//! filesystem, a clock, or a random source that isn't explicitly threaded
//! through it (see [`rng::DasRng`]). Configuration loading, parameter
//! sweeps, parallel run fan-out, and result serialization live in the
//! `das-sim-cli` crate instead.

pub mod block;
pub mod diagnostics;
pub mod dim;
pub mod neighbor;
pub mod observer;
pub mod overlay;
pub mod result;
pub mod rng;
pub mod shape;
pub mod simulator;
pub mod validator;

pub use result::RunResult;
pub use shape::{Config, Shape};
pub use simulator::Simulator;
