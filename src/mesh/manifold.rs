//! Manifold topology checks and winding repair.

use crate::mesh::{Edge, Mesh};
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::fmt::Debug;

/// Summary of the edge/vertex topology of a mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifoldAnalysis {
    /// Edges used by exactly one polygon
    pub boundary_edges: usize,
    /// Edges used by three or more polygons
    pub non_manifold_edges: usize,
    /// Vertices no polygon references
    pub isolated_vertices: usize,
    /// Every interior edge is walked in opposite directions by its two polygons
    pub consistent_orientation: bool,
    /// Number of edge-connected polygon shells
    pub connected_components: usize,
    pub is_manifold: bool,
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Edge-based topology report.
    pub fn analyze_manifold(&self) -> ManifoldAnalysis {
        let counts = self.edge_face_counts();
        let boundary_edges = counts.values().filter(|&&c| c == 1).count();
        let non_manifold_edges = counts.values().filter(|&&c| c > 2).count();

        let mut referenced = vec![false; self.vertices.len()];
        for polygon in &self.polygons {
            for &i in &polygon.indices {
                referenced[i] = true;
            }
        }
        let isolated_vertices = referenced.iter().filter(|r| !**r).count();

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for polygon in &self.polygons {
            for edge in polygon.edges() {
                *directed.entry(edge).or_insert(0) += 1;
            }
        }
        let consistent_orientation = counts
            .iter()
            .filter(|&(_, &c)| c == 2)
            .all(|(e, _)| {
                directed.get(&(e.0, e.1)) == Some(&1) && directed.get(&(e.1, e.0)) == Some(&1)
            });

        let connected_components = self.shells().len();

        ManifoldAnalysis {
            boundary_edges,
            non_manifold_edges,
            isolated_vertices,
            consistent_orientation,
            connected_components,
            is_manifold: boundary_edges == 0 && non_manifold_edges == 0 && consistent_orientation,
        }
    }

    /// Non-empty, and every edge borders exactly two polygons.
    pub fn is_closed(&self) -> bool {
        !self.polygons.is_empty() && self.edge_face_counts().values().all(|&c| c == 2)
    }

    /// Edges bordering any number of polygons other than two, sorted.
    pub fn non_manifold_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .edge_face_counts()
            .into_iter()
            .filter(|&(_, c)| c != 2)
            .map(|(e, _)| e)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Polygon indices grouped into shells joined by two-polygon edges.
    pub fn shells(&self) -> Vec<Vec<usize>> {
        let adjacency = self.manifold_adjacency();
        let mut seen = vec![false; self.polygons.len()];
        let mut shells = Vec::new();
        for seed in 0..self.polygons.len() {
            if seen[seed] {
                continue;
            }
            seen[seed] = true;
            let mut shell = vec![seed];
            let mut queue = VecDeque::from([seed]);
            while let Some(p) = queue.pop_front() {
                for &(q, _) in &adjacency[p] {
                    if !seen[q] {
                        seen[q] = true;
                        shell.push(q);
                        queue.push_back(q);
                    }
                }
            }
            shells.push(shell);
        }
        shells
    }

    /// Make every shell's winding agree across shared edges, then turn each
    /// shell outward so its signed volume is positive. Planes and vertex
    /// normals are recomputed. Returns the number of polygons flipped.
    pub fn make_normals_consistent(&mut self) -> usize {
        let adjacency = self.manifold_adjacency();
        let mut flip = vec![false; self.polygons.len()];
        let mut seen = vec![false; self.polygons.len()];

        for seed in 0..self.polygons.len() {
            if seen[seed] {
                continue;
            }
            seen[seed] = true;
            let mut shell = vec![seed];
            let mut queue = VecDeque::from([seed]);

            while let Some(p) = queue.pop_front() {
                for &(q, edge) in &adjacency[p] {
                    if seen[q] {
                        continue;
                    }
                    // Direction p walks the shared edge once its own flip is applied
                    let p_forward = self.polygons[p].has_directed_edge(edge.0, edge.1);
                    let p_walks_forward = p_forward != flip[p];
                    // q must walk it the other way
                    let q_forward = self.polygons[q].has_directed_edge(edge.0, edge.1);
                    flip[q] = q_forward == p_walks_forward;
                    seen[q] = true;
                    shell.push(q);
                    queue.push_back(q);
                }
            }

            let volume: crate::float_types::Real = shell
                .iter()
                .map(|&p| {
                    let term = self.polygon_volume_term(&self.polygons[p].indices);
                    if flip[p] { -term } else { term }
                })
                .sum();
            if volume < 0.0 {
                for &p in &shell {
                    flip[p] = !flip[p];
                }
            }
        }

        let mut flipped = 0;
        for (polygon, f) in self.polygons.iter_mut().zip(&flip) {
            if *f {
                polygon.flip();
                flipped += 1;
            }
        }
        self.renormalize();
        flipped
    }

    /// For each polygon, its neighbours across edges shared by exactly two polygons.
    fn manifold_adjacency(&self) -> Vec<Vec<(usize, Edge)>> {
        let mut owners: HashMap<Edge, Vec<usize>> = HashMap::new();
        for (p, polygon) in self.polygons.iter().enumerate() {
            for (a, b) in polygon.edges() {
                owners.entry(Edge::new(a, b)).or_default().push(p);
            }
        }
        let mut adjacency = vec![Vec::new(); self.polygons.len()];
        for (edge, polys) in owners {
            if let &[p, q] = polys.as_slice() {
                if p != q {
                    adjacency[p].push((q, edge));
                    adjacency[q].push((p, edge));
                }
            }
        }
        adjacency
    }
}
