//! Greedy tracing of closed vertex loops along marked boundary edges.
//!
//! The walk never backtracks. A vertex where the marked edges branch is
//! reported and abandoned rather than guessed through, so a boundary with a
//! junction yields no loop at all for the branch that hit it.

use crate::mesh::{Edge, Mesh};
use hashbrown::{HashMap, HashSet};
use std::fmt::{self, Debug};

/// The marked subset of a mesh's edges.
pub type EdgeMarks = HashSet<Edge>;

/// Mark every edge that does not border exactly two polygons.
pub fn mark_non_manifold<S: Clone + Send + Sync + Debug>(mesh: &Mesh<S>) -> EdgeMarks {
    mesh.non_manifold_edges().into_iter().collect()
}

/// Why part of the marked boundary produced no loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceIssue {
    /// The walk from `start` ran out of marked edges at `stalled_at`
    OpenChain { start: usize, stalled_at: usize },
    /// `vertex` has `branches` marked edges, more than a simple loop allows
    Ambiguous { vertex: usize, branches: usize },
}

impl fmt::Display for TraceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceIssue::OpenChain { start, stalled_at } => {
                write!(f, "open boundary chain from vertex {start} stops at vertex {stalled_at}")
            },
            TraceIssue::Ambiguous { vertex, branches } => {
                write!(f, "boundary branches {branches} ways at vertex {vertex}")
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceResult {
    /// Closed loops, each listing its vertices once in walking order
    pub loops: Vec<Vec<usize>>,
    pub issues: Vec<TraceIssue>,
}

/// Extract closed loops from the marked edges.
///
/// Edges are visited in sorted order so results are deterministic. Each walk
/// starts at the lower endpoint of an unvisited edge and follows the single
/// other marked edge at each vertex until it returns to the start (a loop of
/// at least three vertices), finds no continuation (an open chain) or finds
/// several (an ambiguous junction).
pub fn trace_loops(marked: &EdgeMarks) -> TraceResult {
    let mut incident: HashMap<usize, Vec<Edge>> = HashMap::new();
    for edge in marked {
        incident.entry(edge.0).or_default().push(*edge);
        incident.entry(edge.1).or_default().push(*edge);
    }
    let degree = |v: usize| incident.get(&v).map_or(0, Vec::len);

    let mut edges: Vec<Edge> = marked.iter().copied().collect();
    edges.sort_unstable();

    let mut visited: HashSet<Edge> = HashSet::with_capacity(edges.len());
    let mut result = TraceResult::default();

    for first in edges {
        if !visited.insert(first) {
            continue;
        }
        let start = first.0;
        if degree(start) > 2 {
            result.issues.push(TraceIssue::Ambiguous {
                vertex: start,
                branches: degree(start),
            });
            continue;
        }

        let mut walk = vec![start];
        let mut arriving = first;
        let mut current = first.1;

        loop {
            if current == start {
                if walk.len() >= 3 {
                    result.loops.push(walk);
                }
                break;
            }
            walk.push(current);

            let candidates: Vec<Edge> = incident
                .get(&current)
                .map(|edges| edges.iter().copied().filter(|e| *e != arriving).collect())
                .unwrap_or_default();

            let next = match candidates.as_slice() {
                [] => {
                    result.issues.push(TraceIssue::OpenChain {
                        start,
                        stalled_at: current,
                    });
                    break;
                },
                [only] => *only,
                _ => {
                    result.issues.push(TraceIssue::Ambiguous {
                        vertex: current,
                        branches: candidates.len() + 1,
                    });
                    break;
                },
            };
            if !visited.insert(next) {
                // Joined a walk that was already abandoned
                result.issues.push(TraceIssue::OpenChain {
                    start,
                    stalled_at: current,
                });
                break;
            }

            let Some(other) = next.other(current) else {
                break;
            };
            arriving = next;
            current = other;
        }
    }

    for issue in &result.issues {
        log::debug!("loop tracer: {issue}");
    }
    result
}
