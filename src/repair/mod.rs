//! Closing the open boundaries a cut leaves behind.
//!
//! [`ManifoldRepairEngine::repair`] runs a fixed sequence: drop loose
//! geometry, mark non-manifold edges, fill holes along directed boundary
//! walks, fall back to tracing and capping whatever is left, then make the
//! winding consistent and outward.

use crate::float_types::{Real, tolerance};
use crate::mesh::triangulate::triangulate_loop;
use crate::mesh::{Edge, Mesh};
use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use std::fmt::Debug;

pub mod loops;

pub use loops::{EdgeMarks, TraceIssue, TraceResult, mark_non_manifold, trace_loops};

/// What a repair pass found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Loose polygons and vertices removed up front
    pub removed_loose: usize,
    /// Non-manifold edges before any filling
    pub initial_open_edges: usize,
    /// Holes closed by the generic fill
    pub filled_loops: usize,
    /// Loops closed by tracing and capping
    pub capped_loops: usize,
    /// Traced loops the kernel refused to cap
    pub failed_caps: usize,
    /// Non-manifold edges left at the end
    pub residual_open_edges: usize,
    pub trace_issues: Vec<TraceIssue>,
    /// Polygons whose winding was reversed by the final orientation pass
    pub flipped_polygons: usize,
}

impl RepairReport {
    pub const fn is_watertight(&self) -> bool {
        self.residual_open_edges == 0
    }
}

/// Outcome of capping traced loops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapOutcome {
    pub capped: usize,
    pub failed: usize,
    pub issues: Vec<TraceIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifoldRepairEngine {
    /// Run the generic hole fill before loop capping
    pub fill_holes: bool,
}

impl Default for ManifoldRepairEngine {
    fn default() -> Self {
        Self { fill_holes: true }
    }
}

impl ManifoldRepairEngine {
    pub const fn new() -> Self {
        Self { fill_holes: true }
    }

    pub const fn with_fill_holes(mut self, fill_holes: bool) -> Self {
        self.fill_holes = fill_holes;
        self
    }

    /// Close the open boundaries of `mesh` as far as possible.
    pub fn repair<S: Clone + Send + Sync + Debug>(&self, mesh: &mut Mesh<S>) -> RepairReport {
        let mut report = RepairReport {
            removed_loose: mesh.remove_loose(),
            ..RepairReport::default()
        };

        let marked = mark_non_manifold(mesh);
        report.initial_open_edges = marked.len();

        if !marked.is_empty() {
            let mut remaining = marked;
            if self.fill_holes {
                report.filled_loops = fill_holes(mesh);
                remaining = mark_non_manifold(mesh);
            }

            if !remaining.is_empty() {
                let outcome = cap_loops(mesh, &remaining);
                report.capped_loops = outcome.capped;
                report.failed_caps = outcome.failed;
                report.trace_issues = outcome.issues;
                remaining = mark_non_manifold(mesh);
            }

            report.residual_open_edges = remaining.len();
            log::debug!(
                "repair: {} open edges, {} filled, {} capped, {} failed, {} left",
                report.initial_open_edges,
                report.filled_loops,
                report.capped_loops,
                report.failed_caps,
                report.residual_open_edges
            );
        }

        report.flipped_polygons = mesh.make_normals_consistent();
        report
    }
}

/// Fill every hole whose boundary half-edges chain into a closed walk.
///
/// A boundary edge `a -> b` of a polygon means the hole runs `b -> a`, so
/// walking those reversed half-edges yields each hole already wound to match
/// its surroundings. Planar holes become a single polygon; others are
/// ear-clipped. Returns the number of holes filled.
pub fn fill_holes<S: Clone + Send + Sync + Debug>(mesh: &mut Mesh<S>) -> usize {
    let counts = mesh.edge_face_counts();
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut half_edges: Vec<(usize, usize)> = Vec::new();
    for polygon in &mesh.polygons {
        for (a, b) in polygon.edges() {
            if counts.get(&Edge::new(a, b)) == Some(&1) {
                outgoing.entry(b).or_default().push(a);
                half_edges.push((b, a));
            }
        }
    }
    half_edges.sort_unstable();

    let mut used: HashSet<(usize, usize)> = HashSet::new();
    let mut holes: Vec<Vec<usize>> = Vec::new();

    for &(start, first) in &half_edges {
        if used.contains(&(start, first)) {
            continue;
        }
        let mut walk = vec![start];
        let mut taken = vec![(start, first)];
        let mut current = first;
        let closed = loop {
            if current == start {
                break true;
            }
            if walk.contains(&current) {
                break false;
            }
            walk.push(current);
            let next = outgoing.get(&current).and_then(|targets| {
                targets
                    .iter()
                    .copied()
                    .find(|&t| !used.contains(&(current, t)) && !taken.contains(&(current, t)))
            });
            match next {
                Some(t) => {
                    taken.push((current, t));
                    current = t;
                },
                None => break false,
            }
        };
        if closed && walk.len() >= 3 {
            used.extend(taken);
            holes.push(walk);
        }
    }

    let mut filled = 0;
    for hole in holes {
        if fill_one(mesh, &hole) {
            filled += 1;
        }
    }
    filled
}

fn fill_one<S: Clone + Send + Sync + Debug>(mesh: &mut Mesh<S>, hole: &[usize]) -> bool {
    let points: Vec<Point3<Real>> = hole.iter().map(|&i| mesh.vertices[i].pos).collect();
    if is_planar(&points) {
        return mesh.add_polygon(hole, None).is_ok();
    }

    let Some(triangles) = triangulate_loop(&points) else {
        return false;
    };
    let mut added = Vec::with_capacity(triangles.len());
    for [a, b, c] in triangles {
        match mesh.add_polygon(&[hole[a], hole[b], hole[c]], None) {
            Ok(index) => added.push(index),
            Err(err) => {
                log::debug!("hole fill: triangle rejected ({err}), leaving hole for capping");
                // Roll back so the hole stays a clean loop
                for index in added.into_iter().rev() {
                    mesh.polygons.remove(index);
                }
                return false;
            },
        }
    }
    true
}

fn is_planar(points: &[Point3<Real>]) -> bool {
    let plane = crate::mesh::plane::Plane::from_loop(points.iter());
    let eps = tolerance() * 10.0;
    points.iter().all(|p| plane.signed_distance(p).abs() <= eps)
}

/// Trace loops through the marked edges and cap each one with a polygon.
///
/// Each cap is oriented to walk its first edge opposite to the polygon that
/// already owns that edge. Loops the kernel rejects are logged and left open.
pub fn cap_loops<S: Clone + Send + Sync + Debug>(
    mesh: &mut Mesh<S>,
    marked: &EdgeMarks,
) -> CapOutcome {
    let traced = trace_loops(marked);
    let mut outcome = CapOutcome {
        issues: traced.issues,
        ..CapOutcome::default()
    };

    for mut ring in traced.loops {
        let (a, b) = (ring[0], ring[1]);
        if mesh.polygons.iter().any(|p| p.has_directed_edge(a, b)) {
            ring.reverse();
        }
        match mesh.add_polygon(&ring, None) {
            Ok(_) => outcome.capped += 1,
            Err(err) => {
                log::debug!("cap of {}-vertex loop rejected: {err}", ring.len());
                outcome.failed += 1;
            },
        }
    }
    outcome
}

/// Cap every open boundary loop of `mesh`. Returns the outcome of capping.
pub fn seal_open_boundaries<S: Clone + Send + Sync + Debug>(mesh: &mut Mesh<S>) -> CapOutcome {
    let marked = mark_non_manifold(mesh);
    if marked.is_empty() {
        return CapOutcome::default();
    }
    cap_loops(mesh, &marked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn open_cube() -> Mesh<()> {
        let mut cube = Mesh::cuboid(Point3::origin(), Vector3::repeat(2.0), None);
        cube.polygons.pop();
        cube
    }

    #[test]
    fn closed_mesh_needs_no_work() {
        let mut cube = Mesh::<()>::cuboid(Point3::origin(), Vector3::repeat(1.0), None);
        let report = ManifoldRepairEngine::default().repair(&mut cube);
        assert_eq!(report.initial_open_edges, 0);
        assert!(report.is_watertight());
        assert_eq!(report.flipped_polygons, 0);
    }

    #[test]
    fn fill_closes_a_missing_face() {
        let mut cube = open_cube();
        let report = ManifoldRepairEngine::default().repair(&mut cube);
        assert_eq!(report.initial_open_edges, 4);
        assert_eq!(report.filled_loops, 1);
        assert_eq!(report.capped_loops, 0);
        assert!(report.is_watertight());
        assert!(cube.analyze_manifold().is_manifold);
        assert!((cube.signed_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn capping_alone_closes_a_missing_face() {
        let mut cube = open_cube();
        let report = ManifoldRepairEngine::new()
            .with_fill_holes(false)
            .repair(&mut cube);
        assert_eq!(report.filled_loops, 0);
        assert_eq!(report.capped_loops, 1);
        assert!(report.is_watertight());
        assert!((cube.signed_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn cap_closes_what_fill_cannot_walk() {
        // One side wound inward breaks the directed walk around the hole
        let mut cube = open_cube();
        cube.polygons[0].flip();
        assert_eq!(fill_holes(&mut cube.clone()), 0);

        let report = ManifoldRepairEngine::default().repair(&mut cube);
        assert_eq!(report.initial_open_edges, 4);
        assert_eq!(report.filled_loops, 0);
        assert_eq!(report.capped_loops, 1);
        assert_eq!(report.failed_caps, 0);
        assert!(report.is_watertight());
        assert!(report.flipped_polygons >= 1);
        assert!(cube.analyze_manifold().consistent_orientation);
        assert!((cube.signed_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn non_planar_hole_is_ear_clipped() {
        // Sphere without its north cap fan, with the rim zig-zagged out of plane
        let mut sphere = Mesh::<()>::sphere(1.0, 8, 4, None);
        sphere.polygons.drain(0..8);
        sphere.remove_loose();
        let boundary: Vec<usize> = {
            let mut v: Vec<usize> = mark_non_manifold(&sphere)
                .iter()
                .flat_map(|e| [e.0, e.1])
                .collect();
            v.sort_unstable();
            v.dedup();
            v
        };
        for (k, &i) in boundary.iter().enumerate() {
            if k % 2 == 0 {
                sphere.vertices[i].pos.z += 0.05;
            }
        }
        sphere.renormalize();

        let report = ManifoldRepairEngine::default().repair(&mut sphere);
        assert_eq!(report.filled_loops, 1);
        assert!(report.is_watertight());
        assert!(sphere.signed_volume() > 0.0);
    }

    #[test]
    fn separate_shells_get_separate_fills() {
        let mut mesh = open_cube();
        let other = {
            let mut c = Mesh::<()>::cuboid(Point3::new(5.0, 0.0, 0.0), Vector3::repeat(2.0), None);
            c.polygons.pop();
            c
        };
        let offset = mesh.vertices.len();
        mesh.vertices.extend(other.vertices);
        for mut p in other.polygons {
            for i in p.indices.iter_mut() {
                *i += offset;
            }
            mesh.polygons.push(p);
        }
        let report = ManifoldRepairEngine::default().repair(&mut mesh);
        assert_eq!(report.filled_loops, 2);
        assert!(report.is_watertight());
        assert_eq!(mesh.analyze_manifold().connected_components, 2);
    }

    #[test]
    fn seal_restores_deleted_face() {
        let mut cube = open_cube();
        let outcome = seal_open_boundaries(&mut cube);
        assert_eq!(outcome.capped, 1);
        assert!(cube.is_closed());
        assert!(cube.analyze_manifold().consistent_orientation);
    }
}
