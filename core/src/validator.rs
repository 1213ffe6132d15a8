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

//! The validator: owns a `Block` view, its line interests, its per-topic
//! neighbor tables, and the send scheduling strategies.
//!
//! Cross-validator effects never reach directly into another validator's
//! state. `send()` returns a list of [`OutboundSegment`]s instead; the
//! simulator applies them by indexing into its validator arena. This
//! keeps `Neighbor::peer` a plain integer ID rather than a cyclic
//! reference (spec design note in `DESIGN.md`).

use std::collections::{HashMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::block::Block;
use crate::dim::Dim;
use crate::neighbor::Neighbor;
use crate::rng::DasRng;
use crate::shape::Config;

const LOG_TARGET: &str = "das_sim_core::validator";

/// A segment emitted during SEND, addressed to a peer by ID. Applied by
/// the simulator in a second pass once every validator has had its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboundSegment {
	pub target: usize,
	pub row: usize,
	pub col: usize,
	pub src: usize,
}

pub struct Validator {
	pub id: usize,
	pub is_proposer: bool,
	block_size: usize,
	block: Block,
	/// Staging area for this step's arrivals ("receivedBlock" in the
	/// spec); folded into `block` at the start of RECEIVE.
	pending: Block,
	row_ids: Vec<usize>,
	column_ids: Vec<usize>,
	row_neighbors: HashMap<usize, Vec<Neighbor>>,
	column_neighbors: HashMap<usize, Vec<Neighbor>>,
	node_send_queue: VecDeque<(usize, usize)>,
	node_receive_queue: VecDeque<(usize, usize)>,
	bw_uplink: usize,
	stats_tx_in_slot: usize,
	stats_rx_in_slot: usize,
	stats_dup_in_slot: usize,
	segment_shuffle_gen: VecDeque<(Dim, usize, usize)>,
	config: Config,
}

impl Validator {
	pub fn new(
		id: usize,
		is_proposer: bool,
		block_size: usize,
		row_ids: Vec<usize>,
		column_ids: Vec<usize>,
		bw_uplink: usize,
		config: Config,
	) -> Self {
		Validator {
			id,
			is_proposer,
			block_size,
			block: Block::new(block_size),
			pending: Block::new(block_size),
			row_ids,
			column_ids,
			row_neighbors: HashMap::new(),
			column_neighbors: HashMap::new(),
			node_send_queue: VecDeque::new(),
			node_receive_queue: VecDeque::new(),
			bw_uplink,
			stats_tx_in_slot: 0,
			stats_rx_in_slot: 0,
			stats_dup_in_slot: 0,
			segment_shuffle_gen: VecDeque::new(),
			config,
		}
	}

	pub fn block_size(&self) -> usize {
		self.block_size
	}

	pub fn row_ids(&self) -> &[usize] {
		&self.row_ids
	}

	pub fn column_ids(&self) -> &[usize] {
		&self.column_ids
	}

	pub fn block(&self) -> &Block {
		&self.block
	}

	pub fn stats_tx_in_slot(&self) -> usize {
		self.stats_tx_in_slot
	}

	pub fn stats_rx_in_slot(&self) -> usize {
		self.stats_rx_in_slot
	}

	pub fn stats_dup_in_slot(&self) -> usize {
		self.stats_dup_in_slot
	}

	/// Wires a one-directional or mesh link from this validator to `peer`
	/// on the given topic. Mesh edges are installed on both endpoints by
	/// the caller; the proposer's publish-only links are installed on the
	/// proposer's side alone (see `Simulator::init_network`).
	pub fn add_neighbor(&mut self, dim: Dim, line: usize, peer: usize, send_line_until: usize) {
		let neighbor = Neighbor::new(peer, dim, self.block_size, send_line_until);
		match dim {
			Dim::Row => self.row_neighbors.entry(line).or_default().push(neighbor),
			Dim::Column => self.column_neighbors.entry(line).or_default().push(neighbor),
		}
	}

	pub fn neighbor_count(&self, dim: Dim, line: usize) -> usize {
		match dim {
			Dim::Row => self.row_neighbors.get(&line).map_or(0, Vec::len),
			Dim::Column => self.column_neighbors.get(&line).map_or(0, Vec::len),
		}
	}

	/// Whether every cell on every line this validator cares about is
	/// known. Used by the observer's `nodeProgress`/`validatorProgress`.
	pub fn lines_complete(&self) -> bool {
		self.row_ids.iter().all(|&r| self.block.get_row(r).all())
			&& self.column_ids.iter().all(|&c| self.block.get_column(c).all())
	}

	/// Distinct cells this validator could ever learn: the union of its
	/// owned rows and columns.
	pub fn expected_samples(&self) -> usize {
		self.row_ids.len() * self.block_size + self.column_ids.len() * self.block_size
			- self.row_ids.len() * self.column_ids.len()
	}

	pub fn known_samples(&self) -> usize {
		self.block.count_ones()
	}

	/// Proposer-only: fills and randomizes the block under the given
	/// failure rate, then enqueues every published cell for sending. This
	/// reuses the same send machinery as a repaired line: the proposer's
	/// interest set is every row and column, so publishing is just a
	/// very large simultaneous repair.
	pub fn publish(&mut self, failure_rate: u8, rng: &mut DasRng) {
		debug_assert!(self.is_proposer, "only the proposer publishes");
		self.block.publish(failure_rate, rng);
		for row in 0..self.block_size {
			for col in 0..self.block_size {
				if self.block.get_segment(row, col) {
					self.add_to_send_queue(row, col);
				}
			}
		}
	}

	/// Registers a cell arriving from `src`. Suppresses reflection back
	/// toward `src` on any topic where it's a mesh neighbor, then merges
	/// the cell into the pending (not-yet-committed) block view.
	pub fn receive_segment(&mut self, row: usize, col: usize, src: usize) {
		if let Some(neighbors) = self.row_neighbors.get_mut(&row) {
			for n in neighbors.iter_mut() {
				if n.peer == src {
					n.mark_receiving(col);
				}
			}
		}
		if let Some(neighbors) = self.column_neighbors.get_mut(&col) {
			for n in neighbors.iter_mut() {
				if n.peer == src {
					n.mark_receiving(row);
				}
			}
		}

		self.stats_rx_in_slot += 1;
		let already_known = self.block.get_segment(row, col) || self.pending.get_segment(row, col);
		if already_known {
			self.stats_dup_in_slot += 1;
			trace!(target: LOG_TARGET, validator = self.id, row, col, src, "dup segment");
			return;
		}
		self.pending.set_segment(row, col);
		trace!(target: LOG_TARGET, validator = self.id, row, col, src, "new segment");
		if self.config.node_queue_enabled || self.config.per_neighbor_queue_enabled {
			self.node_receive_queue.push_back((row, col));
		}
	}

	/// Fans a freshly-known cell out to whichever queues are enabled.
	pub fn add_to_send_queue(&mut self, row: usize, col: usize) {
		if self.config.node_queue_enabled {
			self.node_send_queue.push_back((row, col));
		}
		if self.config.per_neighbor_queue_enabled {
			if self.row_ids.contains(&row) {
				if let Some(neighbors) = self.row_neighbors.get_mut(&row) {
					for n in neighbors.iter_mut() {
						n.send_queue.push_back(col);
					}
				}
			}
			if self.column_ids.contains(&col) {
				if let Some(neighbors) = self.column_neighbors.get_mut(&col) {
					for n in neighbors.iter_mut() {
						n.send_queue.push_back(row);
					}
				}
			}
		}
	}

	fn budget_remaining(&self) -> usize {
		self.bw_uplink.saturating_sub(self.stats_tx_in_slot)
	}

	/// Runs the SEND phase: the four schedulers in spec order, each
	/// short-circuiting once the uplink budget for this step is spent.
	pub fn send(&mut self, rng: &mut DasRng) -> Vec<OutboundSegment> {
		let mut outbound = Vec::new();
		if self.budget_remaining() == 0 {
			return outbound;
		}
		self.process_send_queue(&mut outbound, rng);
		if self.budget_remaining() == 0 {
			return outbound;
		}
		self.process_per_neighbor_send_queue(&mut outbound, rng);
		if self.budget_remaining() == 0 {
			return outbound;
		}
		if self.config.segment_shuffle_enabled {
			self.run_segment_shuffle_scheduler(&mut outbound, rng);
			if self.budget_remaining() == 0 {
				return outbound;
			}
		}
		if self.config.dumb_random_enabled {
			self.run_dumb_random_scheduler(&mut outbound, rng);
		}
		outbound
	}

	fn send_to_line_neighbors(
		&mut self,
		dim: Dim,
		line: usize,
		axis_index: usize,
		outbound: &mut Vec<OutboundSegment>,
		rng: &mut DasRng,
	) {
		let neighbors = match dim {
			Dim::Row => self.row_neighbors.get_mut(&line),
			Dim::Column => self.column_neighbors.get_mut(&line),
		};
		let Some(neighbors) = neighbors else { return };
		let mut order: Vec<usize> = (0..neighbors.len()).collect();
		if self.config.shuffle_neighbor_order {
			order.shuffle(rng);
		}
		for idx in order {
			if self.stats_tx_in_slot >= self.bw_uplink {
				return;
			}
			let neighbor = &mut neighbors[idx];
			if neighbor.should_send(axis_index) {
				neighbor.mark_sent(axis_index);
				let (row, col) = match dim {
					Dim::Row => (line, axis_index),
					Dim::Column => (axis_index, line),
				};
				outbound.push(OutboundSegment { target: neighbor.peer, row, col, src: self.id });
				self.stats_tx_in_slot += 1;
			}
		}
	}

	/// Node-level FIFO. Pops `(r, c)` only once both dimensions have been
	/// visited; a budget-exhausted partial visit leaves the head in place
	/// so the remaining dimension is retried next step.
	fn process_send_queue(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) {
		if !self.config.node_queue_enabled {
			return;
		}
		while let Some(&(row, col)) = self.node_send_queue.front() {
			if self.budget_remaining() == 0 {
				return;
			}
			if self.row_ids.contains(&row) {
				self.send_to_line_neighbors(Dim::Row, row, col, outbound, rng);
			}
			if self.budget_remaining() == 0 {
				return;
			}
			if self.column_ids.contains(&col) {
				self.send_to_line_neighbors(Dim::Column, col, row, outbound, rng);
			}
			self.node_send_queue.pop_front();
		}
	}

	/// Shuffled round-robin over every (dim, line, neighbor) whose own
	/// queue is non-empty. Repeats passes until one makes no progress.
	fn process_per_neighbor_send_queue(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) {
		if !self.config.per_neighbor_queue_enabled {
			return;
		}
		loop {
			if self.budget_remaining() == 0 {
				return;
			}
			let mut triples: Vec<(Dim, usize, usize)> = Vec::new();
			for (&line, neighbors) in self.row_neighbors.iter() {
				for (idx, n) in neighbors.iter().enumerate() {
					if !n.send_queue.is_empty() {
						triples.push((Dim::Row, line, idx));
					}
				}
			}
			for (&line, neighbors) in self.column_neighbors.iter() {
				for (idx, n) in neighbors.iter().enumerate() {
					if !n.send_queue.is_empty() {
						triples.push((Dim::Column, line, idx));
					}
				}
			}
			if triples.is_empty() {
				return;
			}
			triples.shuffle(rng);

			let mut progressed = false;
			for (dim, line, idx) in triples {
				if self.budget_remaining() == 0 {
					return;
				}
				let neighbors = match dim {
					Dim::Row => self.row_neighbors.get_mut(&line),
					Dim::Column => self.column_neighbors.get_mut(&line),
				}
				.expect("triple collected from this map moments ago");
				let Some(axis_index) = neighbors[idx].send_queue.pop_front() else { continue };
				// A popped entry counts as progress whether or not it was
				// actually sendable, so a pass fully drains every
				// per-neighbor queue in one step rather than deferring
				// already-dead entries to the next.
				progressed = true;
				if neighbors[idx].should_send(axis_index) {
					neighbors[idx].mark_sent(axis_index);
					let (row, col) = match dim {
						Dim::Row => (line, axis_index),
						Dim::Column => (axis_index, line),
					};
					outbound.push(OutboundSegment { target: neighbors[idx].peer, row, col, src: self.id });
					self.stats_tx_in_slot += 1;
				}
			}
			if !progressed {
				return;
			}
		}
	}

	/// Cells worth offering this pass: known locally, and `should_send`
	/// for at least one neighbor on that line.
	fn compute_worth_sending(&self) -> Vec<(Dim, usize, usize)> {
		let mut triples = Vec::new();
		for &row in &self.row_ids {
			if let Some(neighbors) = self.row_neighbors.get(&row) {
				let line = self.block.get_row(row);
				for col in 0..self.block_size {
					if line[col] && neighbors.iter().any(|n| n.should_send(col)) {
						triples.push((Dim::Row, row, col));
					}
				}
			}
		}
		for &col in &self.column_ids {
			if let Some(neighbors) = self.column_neighbors.get(&col) {
				let line = self.block.get_column(col);
				for row in 0..self.block_size {
					if line[row] && neighbors.iter().any(|n| n.should_send(row)) {
						triples.push((Dim::Column, col, row));
					}
				}
			}
		}
		triples
	}

	fn send_first_available(
		&mut self,
		dim: Dim,
		line: usize,
		axis_index: usize,
		outbound: &mut Vec<OutboundSegment>,
		rng: &mut DasRng,
	) -> bool {
		let neighbors = match dim {
			Dim::Row => self.row_neighbors.get_mut(&line),
			Dim::Column => self.column_neighbors.get_mut(&line),
		};
		let Some(neighbors) = neighbors else { return false };
		let mut order: Vec<usize> = (0..neighbors.len()).collect();
		if self.config.shuffle_neighbor_order {
			order.shuffle(rng);
		}
		for idx in order {
			if self.stats_tx_in_slot >= self.bw_uplink {
				return false;
			}
			let neighbor = &mut neighbors[idx];
			if neighbor.should_send(axis_index) {
				neighbor.mark_sent(axis_index);
				let (row, col) = match dim {
					Dim::Row => (line, axis_index),
					Dim::Column => (axis_index, line),
				};
				outbound.push(OutboundSegment { target: neighbor.peer, row, col, src: self.id });
				self.stats_tx_in_slot += 1;
				return true;
			}
		}
		false
	}

	/// Recomputes the worth-sending set and shuffles it whenever the
	/// carried-over generator runs dry, so that each pass sees fresh
	/// state without recomputing mid-pass.
	fn run_segment_shuffle_scheduler(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) {
		loop {
			if self.budget_remaining() == 0 {
				if !self.config.segment_shuffle_persist {
					self.segment_shuffle_gen.clear();
				}
				return;
			}
			if self.segment_shuffle_gen.is_empty() {
				let mut triples = self.compute_worth_sending();
				triples.shuffle(rng);
				self.segment_shuffle_gen = triples.into();
				if self.segment_shuffle_gen.is_empty() {
					return;
				}
			}

			let mut progressed = false;
			let pass_len = self.segment_shuffle_gen.len();
			for _ in 0..pass_len {
				if self.budget_remaining() == 0 {
					if !self.config.segment_shuffle_persist {
						self.segment_shuffle_gen.clear();
					}
					return;
				}
				let Some((dim, line, axis_index)) = self.segment_shuffle_gen.pop_front() else { break };
				if self.send_first_available(dim, line, axis_index, outbound, rng) {
					progressed = true;
				}
			}
			if !progressed {
				return;
			}
		}
	}

	fn send_single(
		&mut self,
		dim: Dim,
		line: usize,
		axis_index: usize,
		neighbor_idx: usize,
		outbound: &mut Vec<OutboundSegment>,
	) -> bool {
		if self.budget_remaining() == 0 {
			return false;
		}
		let neighbors = match dim {
			Dim::Row => self.row_neighbors.get_mut(&line),
			Dim::Column => self.column_neighbors.get_mut(&line),
		}
		.expect("caller already checked this line has neighbors");
		let neighbor = &mut neighbors[neighbor_idx];
		if !neighbor.should_send(axis_index) {
			return false;
		}
		neighbor.mark_sent(axis_index);
		let (row, col) = match dim {
			Dim::Row => (line, axis_index),
			Dim::Column => (axis_index, line),
		};
		outbound.push(OutboundSegment { target: neighbor.peer, row, col, src: self.id });
		self.stats_tx_in_slot += 1;
		true
	}

	fn try_random_row(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) -> bool {
		if self.row_ids.is_empty() {
			return false;
		}
		let row = *self.row_ids.choose(rng).expect("non-empty");
		let col = rng.gen_range(0..self.block_size);
		if !self.block.get_segment(row, col) {
			return false;
		}
		let Some(len) = self.row_neighbors.get(&row).map(Vec::len).filter(|&l| l > 0) else {
			return false;
		};
		let idx = rng.gen_range(0..len);
		self.send_single(Dim::Row, row, col, idx, outbound)
	}

	fn try_random_column(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) -> bool {
		if self.column_ids.is_empty() {
			return false;
		}
		let col = *self.column_ids.choose(rng).expect("non-empty");
		let row = rng.gen_range(0..self.block_size);
		if !self.block.get_segment(row, col) {
			return false;
		}
		let Some(len) = self.column_neighbors.get(&col).map(Vec::len).filter(|&l| l > 0) else {
			return false;
		};
		let idx = rng.gen_range(0..len);
		self.send_single(Dim::Column, col, row, idx, outbound)
	}

	/// Baseline scheduler: random owned cell, random neighbor, send if
	/// allowed. Not combined with the others by default.
	fn run_dumb_random_scheduler(&mut self, outbound: &mut Vec<OutboundSegment>, rng: &mut DasRng) {
		let mut attempts = 0;
		while attempts < self.config.dumb_random_tries {
			if self.budget_remaining() == 0 {
				return;
			}
			let progressed = self.try_random_row(outbound, rng) || self.try_random_column(outbound, rng);
			if progressed {
				attempts = 0;
			} else {
				attempts += 1;
			}
		}
	}

	/// RECEIVE phase: commits `pending` into `block`, commits every
	/// neighbor's in-flight bits, then drains the node-level receive
	/// queue into the send queues.
	pub fn commit_receive(&mut self) {
		self.block.merge(&self.pending);
		self.pending = Block::new(self.block_size);
		for neighbors in self.row_neighbors.values_mut() {
			for n in neighbors.iter_mut() {
				n.commit();
			}
		}
		for neighbors in self.column_neighbors.values_mut() {
			for n in neighbors.iter_mut() {
				n.commit();
			}
		}
		while let Some((row, col)) = self.node_receive_queue.pop_front() {
			self.add_to_send_queue(row, col);
		}
	}

	/// RESTORE phase: attempts repair on every owned line, enqueuing any
	/// newly-repaired cells. The proposer never repairs: it has no
	/// incomplete lines to begin with.
	pub fn restore(&mut self) {
		if self.is_proposer {
			return;
		}
		for row in self.row_ids.clone() {
			let delta = self.block.repair_row(row);
			if delta.count_ones() > 0 {
				for col in 0..self.block_size {
					if delta[col] {
						self.add_to_send_queue(row, col);
					}
				}
			}
		}
		for col in self.column_ids.clone() {
			let delta = self.block.repair_column(col);
			if delta.count_ones() > 0 {
				for row in 0..self.block_size {
					if delta[row] {
						self.add_to_send_queue(row, col);
					}
				}
			}
		}
	}

	/// LOG/STATS phase: returns this step's (tx, rx, dup) and resets the
	/// per-slot counters.
	pub fn finish_step(&mut self) -> (usize, usize, usize) {
		let stats = (self.stats_tx_in_slot, self.stats_rx_in_slot, self.stats_dup_in_slot);
		self.stats_tx_in_slot = 0;
		self.stats_rx_in_slot = 0;
		self.stats_dup_in_slot = 0;
		stats
	}
}
