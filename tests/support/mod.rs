//! Test support library
//! Provides helper functions, model builders and stand-in solvers for tests.
#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use octacut::{
    boolean::{BooleanSolver, BspSolver},
    cutter::SourceModel,
    errors::BooleanError,
    float_types::Real,
    mesh::{Mesh, vertex::Vertex},
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Component-wise [`approx_eq`] for points.
pub fn approx_point(a: &Point3<Real>, b: &Point3<Real>, eps: Real) -> bool {
    (a - b).iter().all(|d| d.abs() < eps)
}

/// A unit cube named `Cube`, centred at the origin.
pub fn unit_cube() -> SourceModel<()> {
    SourceModel::new(
        "Cube",
        Mesh::cuboid(Point3::origin(), Vector3::repeat(1.0), None),
    )
}

/// A UV sphere of radius 1 named `Sphere`.
pub fn unit_sphere() -> SourceModel<()> {
    SourceModel::new("Sphere", Mesh::sphere(1.0, 24, 12, None))
}

/// Treats the model as if it filled its bounding box: the result is the
/// cutting volume itself whenever the two boxes overlap.
pub struct NaiveSolver;

impl BooleanSolver<()> for NaiveSolver {
    fn intersect(&self, mesh: &Mesh<()>, volume: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
        let a = mesh.bounding_box();
        let b = volume.bounding_box();
        let overlaps = (0..3).all(|i| a.mins[i] < b.maxs[i] && b.mins[i] < a.maxs[i]);
        if overlaps {
            Ok(volume.clone())
        } else {
            Ok(Mesh::new())
        }
    }
}

/// Always produces an empty result.
pub struct EmptySolver;

impl BooleanSolver<()> for EmptySolver {
    fn intersect(&self, _: &Mesh<()>, _: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
        Ok(Mesh::new())
    }
}

/// Delegates to [`BspSolver`] but fails every volume on the negative X side.
pub struct FailingSolver {
    inner: BspSolver,
}

impl FailingSolver {
    pub const fn left_side() -> Self {
        Self {
            inner: BspSolver::new(),
        }
    }
}

impl BooleanSolver<()> for FailingSolver {
    fn intersect(&self, mesh: &Mesh<()>, volume: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
        if volume.bounding_box().center().x < 0.0 {
            return Err(BooleanError::SolverError("left side refused".into()));
        }
        self.inner.intersect(mesh, volume)
    }
}

/// A cube with an extra triangle hanging off its top front edge.
///
/// The fin leaves one edge shared by three faces and two edges owned by one,
/// and its only closing loop is the fin itself, so no repair can close it.
pub fn finned_cube(center: Point3<Real>, size: Real) -> Mesh<()> {
    let mut mesh = Mesh::cuboid(center, Vector3::repeat(size), None);
    // Vertices 4 and 5 are the -Y/+Z corners
    let tip = center + Vector3::new(0.0, -size, size);
    mesh.vertices.push(Vertex::new(tip, Vector3::zeros()));
    mesh.add_polygon(&[4, 5, 8], None).expect("fin is a valid face");
    mesh
}

/// Returns a [`finned_cube`] filling the middle of every cutting volume.
pub struct FinnedSolver;

impl BooleanSolver<()> for FinnedSolver {
    fn intersect(&self, _: &Mesh<()>, volume: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
        let bounds = volume.bounding_box();
        let size = (bounds.maxs - bounds.mins).min() * 0.5;
        Ok(finned_cube(bounds.center(), size))
    }
}
