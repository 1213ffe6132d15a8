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

//! The block: a square matrix of single-bit cells.
//!
//! A cell set to `1` means "known to the holder". The repair rule stands
//! in for Reed-Solomon recovery: once at least half a line is known, the
//! whole line is declared recoverable (spec Section 4.1 / 3).

use bitvec::prelude::*;
use rand::Rng;

/// Square `block_size x block_size` bit-matrix, stored row-major.
#[derive(Debug, Clone)]
pub struct Block {
	block_size: usize,
	data: BitVec,
}

/// Minimum number of known cells in a line for it to be repairable.
pub fn repair_threshold(block_size: usize) -> usize {
	(block_size + 1) / 2
}

/// Threshold at which a validator stops sending further cells on a line
/// to a given peer, because the peer can reconstruct the rest locally.
pub fn send_line_until(block_size: usize) -> usize {
	(block_size + 2) / 2
}

impl Block {
	pub fn new(block_size: usize) -> Self {
		Block { block_size, data: bitvec![0; block_size * block_size] }
	}

	pub fn block_size(&self) -> usize {
		self.block_size
	}

	/// Sets every cell to known. Used by the proposer before publication
	/// randomization.
	pub fn fill(&mut self) {
		self.data.set_all(true);
	}

	fn index(&self, row: usize, col: usize) -> usize {
		row * self.block_size + col
	}

	pub fn get_segment(&self, row: usize, col: usize) -> bool {
		self.data[self.index(row, col)]
	}

	pub fn set_segment(&mut self, row: usize, col: usize) {
		let idx = self.index(row, col);
		self.data.set(idx, true);
	}

	/// Immutable view of a row's bits.
	pub fn get_row(&self, row: usize) -> BitVec {
		let start = row * self.block_size;
		self.data[start..start + self.block_size].to_bitvec()
	}

	/// Immutable view of a column's bits.
	pub fn get_column(&self, col: usize) -> BitVec {
		let mut out = bitvec![0; self.block_size];
		for row in 0..self.block_size {
			out.set(row, self.data[self.index(row, col)]);
		}
		out
	}

	/// Bitwise-OR merge. Idempotent and commutative.
	pub fn merge(&mut self, other: &Block) {
		debug_assert_eq!(self.block_size, other.block_size);
		for i in 0..self.data.len() {
			if other.data[i] {
				self.data.set(i, true);
			}
		}
	}

	/// Repairs a row if at least half its cells are known, setting every
	/// remaining zero cell. Returns the delta: which columns were newly
	/// set (empty if the line was not repairable).
	pub fn repair_row(&mut self, row: usize) -> BitVec {
		let line = self.get_row(row);
		let block_size = self.block_size;
		let mut delta = bitvec![0; block_size];
		if line.count_ones() < repair_threshold(block_size) {
			return delta;
		}
		for col in 0..block_size {
			if !line[col] {
				let idx = self.index(row, col);
				self.data.set(idx, true);
				delta.set(col, true);
			}
		}
		delta
	}

	/// Repairs a column if at least half its cells are known. Returns the
	/// delta: which rows were newly set.
	pub fn repair_column(&mut self, col: usize) -> BitVec {
		let line = self.get_column(col);
		let block_size = self.block_size;
		let mut delta = bitvec![0; block_size];
		if line.count_ones() < repair_threshold(block_size) {
			return delta;
		}
		for row in 0..block_size {
			if !line[row] {
				let idx = self.index(row, col);
				self.data.set(idx, true);
				delta.set(row, true);
			}
		}
		delta
	}

	/// Publishes the block: each cell is independently set with
	/// probability `1 - failure_rate / 100`. `failure_rate` is an integer
	/// percent, matching the Shape contract.
	pub fn publish(&mut self, failure_rate: u8, rng: &mut impl Rng) {
		for i in 0..self.data.len() {
			let keep = rng.gen_range(0..100) >= failure_rate as u32;
			self.data.set(i, keep);
		}
	}

	pub fn count_ones(&self) -> usize {
		self.data.count_ones()
	}

	pub fn len(&self) -> usize {
		self.data.len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;

	#[test]
	fn fill_sets_every_cell() {
		let mut b = Block::new(4);
		b.fill();
		assert_eq!(b.count_ones(), 16);
	}

	#[test]
	fn get_set_segment_roundtrip() {
		let mut b = Block::new(4);
		assert!(!b.get_segment(1, 2));
		b.set_segment(1, 2);
		assert!(b.get_segment(1, 2));
	}

	#[test]
	fn row_and_column_views_agree_with_segments() {
		let mut b = Block::new(3);
		b.set_segment(0, 2);
		b.set_segment(2, 2);
		let row0 = b.get_row(0);
		assert!(row0[2]);
		assert!(!row0[0]);
		let col2 = b.get_column(2);
		assert!(col2[0]);
		assert!(col2[2]);
		assert!(!col2[1]);
	}

	#[test]
	fn merge_is_idempotent_and_commutative() {
		let mut a = Block::new(4);
		a.set_segment(0, 0);
		let mut b = Block::new(4);
		b.set_segment(1, 1);

		let mut merged_ab = a.clone();
		merged_ab.merge(&b);
		let mut merged_ba = b.clone();
		merged_ba.merge(&a);
		assert_eq!(merged_ab.get_row(0), merged_ba.get_row(0));
		assert_eq!(merged_ab.get_row(1), merged_ba.get_row(1));

		let mut merged_twice = merged_ab.clone();
		merged_twice.merge(&b);
		assert_eq!(merged_twice.get_row(0), merged_ab.get_row(0));
		assert_eq!(merged_twice.get_row(1), merged_ab.get_row(1));
	}

	#[test]
	fn repair_row_sets_full_line_once_half_known() {
		let size = 5; // threshold = ceil(6/2) = 3
		let mut b = Block::new(size);
		b.set_segment(0, 0);
		b.set_segment(0, 1);
		// only 2 known: not yet repairable
		let delta = b.repair_row(0);
		assert_eq!(delta.count_ones(), 0);

		b.set_segment(0, 2);
		// 3 known out of 5: repairable
		let delta = b.repair_row(0);
		assert_eq!(delta.count_ones(), 2);
		assert!(b.get_row(0).all());
	}

	#[test]
	fn repair_column_delta_equals_pre_restore_complement() {
		let size = 4; // threshold = ceil(5/2) = 2... actually (4+1)/2 = 2
		let mut b = Block::new(size);
		b.set_segment(0, 1);
		b.set_segment(2, 1);
		let pre = b.get_column(1);
		let delta = b.repair_column(1);
		assert_eq!(delta.count_ones(), pre.count_zeros());
		for i in 0..size {
			if !pre[i] {
				assert!(delta[i]);
			}
		}
		assert!(b.get_column(1).all());
	}

	#[test]
	fn publish_zero_failure_rate_fills_block() {
		let mut b = Block::new(4);
		let mut rng = rand::rngs::StdRng::seed_from_u64(1);
		b.publish(0, &mut rng);
		assert_eq!(b.count_ones(), 16);
	}

	#[test]
	fn send_line_until_matches_ceil_half_plus_one() {
		assert_eq!(send_line_until(4), 3);
		assert_eq!(send_line_until(5), 3);
		assert_eq!(send_line_until(8), 5);
	}

	#[test]
	fn publish_full_failure_rate_leaves_block_empty() {
		let mut b = Block::new(4);
		let mut rng = rand::rngs::StdRng::seed_from_u64(1);
		b.publish(100, &mut rng);
		assert_eq!(b.count_ones(), 0);
	}
}
