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

//! Per-link bookkeeping for one side of one overlay topic.
//!
//! A `Neighbor` tracks what has been sent to / received from one peer on
//! one row or column topic, so that a validator never reflects a segment
//! back to the peer it came from and never sends the same cell twice.

use std::collections::VecDeque;

use bitvec::prelude::*;

use crate::dim::Dim;

/// One directed (validator, topic, peer) bookkeeping record.
#[derive(Debug, Clone)]
pub struct Neighbor {
	/// The peer's validator ID. Not an owning reference: lookups into the
	/// peer's state go through the validator arena (spec Section 9).
	pub peer: usize,
	pub dim: Dim,
	/// Cells arriving this step, not yet committed into `received`.
	receiving: BitVec,
	/// Cells seen from this peer in prior steps.
	received: BitVec,
	/// Cells sent to this peer.
	sent: BitVec,
	/// Cell indices (along the line's off-axis) queued for send.
	pub send_queue: VecDeque<usize>,
	send_line_until: usize,
}

impl Neighbor {
	pub fn new(peer: usize, dim: Dim, block_size: usize, send_line_until: usize) -> Self {
		Neighbor {
			peer,
			dim,
			receiving: bitvec![0; block_size],
			received: bitvec![0; block_size],
			sent: bitvec![0; block_size],
			send_queue: VecDeque::new(),
			send_line_until,
		}
	}

	fn sent_or_received_count(&self) -> usize {
		let mut count = 0;
		for i in 0..self.sent.len() {
			if self.sent[i] || self.received[i] {
				count += 1;
			}
		}
		count
	}

	/// True iff this cell hasn't been sent or received yet on this link,
	/// and the line-level threshold to this peer hasn't been reached.
	pub fn should_send(&self, cell_index: usize) -> bool {
		if self.sent_or_received_count() >= self.send_line_until {
			return false;
		}
		!self.sent[cell_index] && !self.received[cell_index]
	}

	pub fn mark_sent(&mut self, cell_index: usize) {
		debug_assert!(
			!self.sent[cell_index] && !self.received[cell_index],
			"marking sent a cell that was already sent or received"
		);
		self.sent.set(cell_index, true);
	}

	pub fn mark_receiving(&mut self, cell_index: usize) {
		self.receiving.set(cell_index, true);
	}

	/// Folds this step's arrivals into `received` and clears `receiving`.
	/// Called once per step, after all in-step receives.
	pub fn commit(&mut self) {
		for i in 0..self.receiving.len() {
			if self.receiving[i] {
				self.received.set(i, true);
			}
		}
		self.receiving.set_all(false);
	}

	pub fn sent(&self) -> &BitSlice {
		&self.sent
	}

	pub fn received(&self) -> &BitSlice {
		&self.received
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn should_send_false_once_sent() {
		let mut n = Neighbor::new(1, Dim::Row, 8, 5);
		assert!(n.should_send(3));
		n.mark_sent(3);
		assert!(!n.should_send(3));
	}

	#[test]
	fn should_send_false_once_received() {
		let mut n = Neighbor::new(1, Dim::Row, 8, 5);
		n.mark_receiving(2);
		n.commit();
		assert!(!n.should_send(2));
	}

	#[test]
	fn freezes_sends_once_threshold_reached() {
		let mut n = Neighbor::new(1, Dim::Row, 8, 3);
		n.mark_sent(0);
		n.mark_sent(1);
		assert!(n.should_send(2));
		n.mark_sent(2);
		// threshold (3) reached: no further sends on this line to this peer
		assert!(!n.should_send(3));
	}

	#[test]
	fn commit_is_the_only_way_receiving_becomes_received() {
		let mut n = Neighbor::new(1, Dim::Column, 8, 8);
		n.mark_receiving(4);
		assert!(!n.received()[4]);
		n.commit();
		assert!(n.received()[4]);
		assert!(!n.receiving[4]);
	}

	#[test]
	fn sent_and_received_monotonic_union_never_shrinks() {
		let mut n = Neighbor::new(1, Dim::Row, 8, 8);
		n.mark_sent(0);
		let before = n.sent_or_received_count();
		n.mark_receiving(1);
		n.commit();
		let after = n.sent_or_received_count();
		assert!(after >= before);
	}
}
