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

//! Overlay graph construction for one topic (one row or one column).
//!
//! Each topic is connected either as a complete graph, when its membership
//! is small enough that a complete graph wouldn't exceed the configured
//! degree, or as a random `net_degree`-regular graph built with the
//! configuration-model (stub-pairing) method and rejection-sampled until
//! connected or a retry budget is exhausted.

use rand::seq::SliceRandom;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::rng::DasRng;

const MAX_PAIRING_ATTEMPTS: u32 = 64;

/// Builds the overlay edges (as indices into `members`) for one topic.
///
/// `net_degree` is the target regular degree. When
/// `members.len() <= net_degree + 1` a complete graph is returned instead,
/// since a `net_degree`-regular graph can't do better than connecting
/// everyone to everyone. Otherwise attempts the pairing model up to
/// [`MAX_PAIRING_ATTEMPTS`] times; if every attempt is disconnected, the
/// last attempt is kept and a [`Diagnostic::GraphDisconnected`] is raised.
pub fn build_topic_graph(
	members_len: usize,
	net_degree: usize,
	rng: &mut DasRng,
	diagnostics: &mut Diagnostics,
) -> Vec<(usize, usize)> {
	if members_len == 0 {
		return Vec::new();
	}
	if members_len <= net_degree + 1 {
		return complete_graph(members_len);
	}

	let mut last_attempt = Vec::new();
	for attempt in 1..=MAX_PAIRING_ATTEMPTS {
		let edges = pairing_model(members_len, net_degree, rng);
		if is_connected(members_len, &edges) {
			return edges;
		}
		last_attempt = edges;
		if attempt == MAX_PAIRING_ATTEMPTS {
			diagnostics.push(Diagnostic::GraphDisconnected { attempts: attempt });
		}
	}
	last_attempt
}

/// All-pairs edges over `n` nodes.
fn complete_graph(n: usize) -> Vec<(usize, usize)> {
	let mut edges = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
	for i in 0..n {
		for j in (i + 1)..n {
			edges.push((i, j));
		}
	}
	edges
}

/// One draw of the configuration model: each node gets `degree` stubs,
/// stubs are shuffled and paired off. Self-loops and parallel edges are
/// dropped, which can leave a node under-degree — the connectivity check
/// downstream is what ultimately decides whether to accept the draw.
fn pairing_model(n: usize, degree: usize, rng: &mut DasRng) -> Vec<(usize, usize)> {
	let mut stubs: Vec<usize> = Vec::with_capacity(n * degree);
	for node in 0..n {
		for _ in 0..degree {
			stubs.push(node);
		}
	}
	stubs.shuffle(rng);

	let mut seen = std::collections::HashSet::new();
	let mut edges = Vec::new();
	for pair in stubs.chunks_exact(2) {
		let (a, b) = (pair[0], pair[1]);
		if a == b {
			continue;
		}
		let key = if a < b { (a, b) } else { (b, a) };
		if seen.insert(key) {
			edges.push(key);
		}
	}
	edges
}

/// BFS connectivity check over `n` nodes and the given edge list.
fn is_connected(n: usize, edges: &[(usize, usize)]) -> bool {
	if n <= 1 {
		return true;
	}
	let mut adjacency = vec![Vec::new(); n];
	for &(a, b) in edges {
		adjacency[a].push(b);
		adjacency[b].push(a);
	}

	let mut visited = vec![false; n];
	let mut queue = std::collections::VecDeque::new();
	queue.push_back(0);
	visited[0] = true;
	let mut visited_count = 1;
	while let Some(node) = queue.pop_front() {
		for &next in &adjacency[node] {
			if !visited[next] {
				visited[next] = true;
				visited_count += 1;
				queue.push_back(next);
			}
		}
	}
	visited_count == n
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn complete_graph_has_expected_edge_count() {
		let edges = complete_graph(5);
		assert_eq!(edges.len(), 10);
	}

	#[test]
	fn build_uses_complete_graph_when_membership_is_small() {
		let mut rng = DasRng::from_seed(1);
		let mut diagnostics = Diagnostics::new();
		let edges = build_topic_graph(4, 6, &mut rng, &mut diagnostics);
		assert_eq!(edges.len(), 6);
		assert!(diagnostics.is_empty());
	}

	#[test]
	fn build_produces_connected_graph_for_larger_membership() {
		let mut rng = DasRng::from_seed(7);
		let mut diagnostics = Diagnostics::new();
		let edges = build_topic_graph(64, 6, &mut rng, &mut diagnostics);
		assert!(is_connected(64, &edges));
	}

	#[test]
	fn empty_membership_yields_no_edges() {
		let mut rng = DasRng::from_seed(1);
		let mut diagnostics = Diagnostics::new();
		let edges = build_topic_graph(0, 6, &mut rng, &mut diagnostics);
		assert!(edges.is_empty());
	}

	#[test]
	fn is_connected_detects_isolated_node() {
		let edges = vec![(0, 1), (1, 2)];
		assert!(!is_connected(4, &edges));
		assert!(is_connected(3, &edges));
	}
}
