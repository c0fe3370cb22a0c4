//! Boolean intersection of the model with one cutting volume.
//!
//! The solver sits behind [`BooleanSolver`] so the pipeline can run against
//! any backend; [`BspSolver`] is the built-in one.

use crate::errors::{BooleanError, ExtractError};
use crate::float_types::tolerance;
use crate::mesh::polygon::Polygon;
use crate::mesh::{Mesh, bsp};
use crate::repair::{ManifoldRepairEngine, RepairReport, seal_open_boundaries};
use std::fmt::Debug;

/// A solid intersection backend.
pub trait BooleanSolver<S: Clone + Send + Sync + Debug>: Send + Sync {
    /// The solid `mesh ∩ volume`. Neither operand is modified.
    fn intersect(&self, mesh: &Mesh<S>, volume: &Mesh<S>) -> Result<Mesh<S>, BooleanError>;
}

/// Intersection by BSP-tree clipping.
///
/// Operands are classified against each other's planes within the crate
/// tolerance, so results are approximate near coincident faces. With
/// `hole_tolerant` set, open boundary loops of either operand are capped
/// before the trees are built, which lets an operand with a small gap or a
/// deliberately removed face still act as a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BspSolver {
    pub hole_tolerant: bool,
}

impl Default for BspSolver {
    fn default() -> Self {
        Self {
            hole_tolerant: true,
        }
    }
}

impl BspSolver {
    pub const fn new() -> Self {
        Self {
            hole_tolerant: true,
        }
    }

    pub const fn with_hole_tolerant(mut self, hole_tolerant: bool) -> Self {
        self.hole_tolerant = hole_tolerant;
        self
    }

    fn prepare<S: Clone + Send + Sync + Debug>(
        &self,
        mesh: &Mesh<S>,
        role: &str,
    ) -> Result<Vec<Polygon<S>>, BooleanError> {
        if mesh.polygons.is_empty() {
            return Err(BooleanError::DegenerateInput(format!("{role} has no polygons")));
        }
        if mesh
            .vertices
            .iter()
            .any(|v| v.pos.iter().any(|c| !c.is_finite()))
        {
            return Err(BooleanError::DegenerateInput(format!(
                "{role} has non-finite coordinates"
            )));
        }
        let bb = mesh.bounding_box();
        let extents = bb.maxs - bb.mins;
        if extents.iter().any(|&e| e <= tolerance()) {
            return Err(BooleanError::DegenerateInput(format!(
                "{role} is flat (extents {:?})",
                [extents.x, extents.y, extents.z]
            )));
        }

        if self.hole_tolerant && !mesh.is_closed() {
            let mut sealed = mesh.clone();
            let outcome = seal_open_boundaries(&mut sealed);
            log::debug!(
                "{role}: sealed {} open loops before intersecting ({} refused)",
                outcome.capped,
                outcome.failed
            );
            return Ok(sealed.to_polygons());
        }
        Ok(mesh.to_polygons())
    }
}

impl<S: Clone + Send + Sync + Debug> BooleanSolver<S> for BspSolver {
    fn intersect(&self, mesh: &Mesh<S>, volume: &Mesh<S>) -> Result<Mesh<S>, BooleanError> {
        let a = self.prepare(mesh, "mesh")?;
        let b = self.prepare(volume, "cutting volume")?;

        let soup = bsp::intersect(&a, &b);
        Ok(Mesh::from_polygons(&soup, mesh.metadata.clone()))
    }
}

/// One extracted octant before naming and recentring.
#[derive(Debug, Clone)]
pub struct Extraction<S: Clone + Send + Sync + Debug> {
    pub mesh: Mesh<S>,
    pub repair: RepairReport,
}

/// Intersect a copy of `source` with `volume` and repair the result.
///
/// Fails with [`ExtractError::Boolean`] when the solver fails or hands back
/// non-finite coordinates, and with [`ExtractError::EmptyResult`] when the
/// intersection has no vertices.
pub fn extract<S: Clone + Send + Sync + Debug>(
    source: &Mesh<S>,
    volume: &Mesh<S>,
    solver: &dyn BooleanSolver<S>,
    repair: &ManifoldRepairEngine,
) -> Result<Extraction<S>, ExtractError> {
    let duplicate = source.clone();
    let mut mesh = solver.intersect(&duplicate, volume)?;
    if mesh.vertices.is_empty() {
        return Err(ExtractError::EmptyResult);
    }
    if mesh
        .vertices
        .iter()
        .any(|v| v.pos.iter().any(|c| !c.is_finite()))
    {
        return Err(BooleanError::SolverError(
            "intersection produced non-finite coordinates".into(),
        )
        .into());
    }
    let report = repair.repair(&mut mesh);
    Ok(Extraction {
        mesh,
        repair: report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::Real;
    use nalgebra::{Point3, Vector3};

    fn cube(center: Point3<Real>, size: Real) -> Mesh<()> {
        Mesh::cuboid(center, Vector3::repeat(size), None)
    }

    #[test]
    fn empty_operand_is_degenerate() {
        let err = BspSolver::new()
            .intersect(&Mesh::<()>::new(), &cube(Point3::origin(), 1.0))
            .unwrap_err();
        assert!(matches!(err, BooleanError::DegenerateInput(_)));
    }

    #[test]
    fn flat_operand_is_degenerate() {
        let flat = Mesh::<()>::cuboid(Point3::origin(), Vector3::new(1.0, 1.0, 0.0), None);
        let err = BspSolver::new()
            .intersect(&cube(Point3::origin(), 1.0), &flat)
            .unwrap_err();
        assert!(matches!(err, BooleanError::DegenerateInput(_)));
    }

    #[test]
    fn non_finite_operand_is_degenerate() {
        let mut bad = cube(Point3::origin(), 1.0);
        bad.vertices[0].pos.x = Real::NAN;
        let err = BspSolver::new()
            .intersect(&bad, &cube(Point3::origin(), 1.0))
            .unwrap_err();
        assert!(matches!(err, BooleanError::DegenerateInput(_)));
    }

    #[test]
    fn intersection_is_closed_and_sized() {
        let a = cube(Point3::origin(), 2.0);
        let b = cube(Point3::new(1.0, 1.0, 1.0), 2.0);
        let result = BspSolver::new().intersect(&a, &b).expect("solver succeeds");
        assert!(result.is_closed());
        assert!((result.signed_volume() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hole_tolerant_reseals_open_volume() {
        let a = cube(Point3::origin(), 2.0);
        let mut open = cube(Point3::new(0.25, 0.0, 0.0), 1.0);
        open.polygons.pop();

        let tolerant = BspSolver::new().intersect(&a, &open).expect("solver succeeds");
        assert!((tolerant.signed_volume() - 1.0).abs() < 1e-6);
        assert!(tolerant.is_closed());
    }

    #[test]
    fn extract_reports_empty_result() {
        let a = cube(Point3::origin(), 1.0);
        let far = cube(Point3::new(10.0, 0.0, 0.0), 1.0);
        let err = extract(&a, &far, &BspSolver::new(), &ManifoldRepairEngine::default())
            .unwrap_err();
        assert_eq!(err, ExtractError::EmptyResult);
    }

    struct Overflows;

    impl BooleanSolver<()> for Overflows {
        fn intersect(&self, mesh: &Mesh<()>, _: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
            let mut out = mesh.clone();
            out.vertices[3].pos.y = Real::INFINITY;
            Ok(out)
        }
    }

    #[test]
    fn extract_rejects_non_finite_solver_output() {
        let a = cube(Point3::origin(), 1.0);
        let err = extract(&a, &a, &Overflows, &ManifoldRepairEngine::default()).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Boolean(BooleanError::SolverError(_))
        ));
    }

    #[test]
    fn extract_leaves_source_untouched() {
        let a = cube(Point3::origin(), 2.0);
        let before = a.clone();
        let b = cube(Point3::new(1.0, 0.25, 0.25), 2.0);
        let out = extract(&a, &b, &BspSolver::new(), &ManifoldRepairEngine::default())
            .expect("extraction succeeds");
        assert!(out.repair.is_watertight());
        assert!((out.mesh.signed_volume() - 1.75 * 1.75).abs() < 1e-6);
        assert_eq!(a.vertices, before.vertices);
        assert_eq!(a.polygons.len(), before.polygons.len());
    }
}
