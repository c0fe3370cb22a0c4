//! Driving the eight octant pipelines and collecting their parts.
//!
//! ```rust
//! # use octacut::config::CutConfig;
//! # use octacut::cutter::{SourceModel, cut};
//! # use octacut::mesh::Mesh;
//! # use nalgebra::{Point3, Vector3};
//! let cube = Mesh::<()>::cuboid(Point3::origin(), Vector3::repeat(1.0), None);
//! let outcome = cut(&SourceModel::new("Cube", cube), &CutConfig::default()).unwrap();
//! assert_eq!(outcome.parts.len(), 8);
//! assert_eq!(outcome.parts[0].name, "Cube_right_front_top");
//! ```

use crate::boolean::{BooleanSolver, BspSolver, extract};
use crate::config::CutConfig;
use crate::connector::add_connectors;
use crate::diagnostics::Diagnostics;
use crate::errors::{CutError, ExtractError};
use crate::float_types::Real;
use crate::mesh::Mesh;
use crate::octant::{CuttingVolume, OctantDescriptor, Partition, partition};
use crate::repair::{ManifoldRepairEngine, RepairReport};
use nalgebra::{Matrix4, Point3};
use std::fmt::Debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The object being cut: a named mesh plus the transform still pending on it.
#[derive(Debug, Clone)]
pub struct SourceModel<S: Clone + Send + Sync + Debug> {
    pub name: String,
    pub mesh: Mesh<S>,
    /// Object-to-world transform, baked into the vertices before cutting
    pub transform: Matrix4<Real>,
}

impl<S: Clone + Send + Sync + Debug> SourceModel<S> {
    pub fn new(name: impl Into<String>, mesh: Mesh<S>) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Matrix4::identity(),
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<Real>) -> Self {
        self.transform = transform;
        self
    }
}

/// One finished octant.
#[derive(Debug, Clone)]
pub struct Part<S: Clone + Send + Sync + Debug> {
    /// `<source>_<octant>`
    pub name: String,
    pub octant: OctantDescriptor,
    /// Geometry recentred on its own bounds
    pub mesh: Mesh<S>,
    /// World-space position of the mesh origin
    pub origin: Point3<Real>,
    pub repair: RepairReport,
}

#[derive(Debug, Clone)]
pub struct CutOutcome<S: Clone + Send + Sync + Debug> {
    /// Parts in octant order, at most eight
    pub parts: Vec<Part<S>>,
    pub diagnostics: Diagnostics,
    /// Names to select afterwards: the parts, or the source alone if none succeeded
    pub selection: Vec<String>,
    /// Placement of the cutting volumes that were used
    pub partition: Partition,
}

/// Cuts source models into octants with a fixed configuration and backend.
pub struct Cutter<S: Clone + Send + Sync + Debug> {
    config: CutConfig,
    solver: Box<dyn BooleanSolver<S>>,
    repair: ManifoldRepairEngine,
}

impl<S: Clone + Send + Sync + Debug + 'static> Cutter<S> {
    /// A cutter backed by [`BspSolver`].
    pub fn new(config: CutConfig) -> Self {
        Self {
            config,
            solver: Box::new(BspSolver::new()),
            repair: ManifoldRepairEngine::new(),
        }
    }
}

impl<S: Clone + Send + Sync + Debug> Cutter<S> {
    pub fn with_solver(mut self, solver: impl BooleanSolver<S> + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn with_repair(mut self, repair: ManifoldRepairEngine) -> Self {
        self.repair = repair;
        self
    }

    /// Cut `source` into up to eight parts.
    ///
    /// Only the preconditions fail the call: an empty mesh or a singular
    /// transform. Anything that goes wrong inside one octant is reported in
    /// [`CutOutcome::diagnostics`] and that octant is left out.
    pub fn cut(&self, source: &SourceModel<S>) -> Result<CutOutcome<S>, CutError> {
        let world = source
            .mesh
            .transform(&source.transform)
            .ok_or_else(|| CutError::NonInvertibleTransform {
                name: source.name.clone(),
            })?;
        if world.polygons.is_empty() {
            return Err(CutError::EmptyMesh {
                name: source.name.clone(),
            });
        }

        let partition = partition(&world.bounding_box(), self.config.scale_factor());
        log::debug!(
            "{}: bounds centre {:?}, half size {:?}",
            source.name,
            partition.center,
            partition.half_size
        );

        #[cfg(feature = "parallel")]
        let results: Vec<(Option<Part<S>>, Diagnostics)> = partition
            .volumes
            .par_iter()
            .map(|volume| self.cut_octant(&source.name, &world, volume))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<(Option<Part<S>>, Diagnostics)> = partition
            .volumes
            .iter()
            .map(|volume| self.cut_octant(&source.name, &world, volume))
            .collect();

        let mut diagnostics = Diagnostics::new();
        let mut parts = Vec::with_capacity(8);
        for (part, mut notes) in results {
            diagnostics.append(&mut notes);
            parts.extend(part);
        }

        let selection = if parts.is_empty() {
            diagnostics.error(
                Some(source.name.as_str()),
                "cutting produced no usable geometry; the original object is unchanged",
            );
            vec![source.name.clone()]
        } else {
            diagnostics.info(None, format!("Model cut into {} manifold parts", parts.len()));
            parts.iter().map(|p| p.name.clone()).collect()
        };

        Ok(CutOutcome {
            parts,
            diagnostics,
            selection,
            partition,
        })
    }

    /// One octant's pipeline. Never fails; problems become diagnostics.
    fn cut_octant(
        &self,
        source_name: &str,
        world: &Mesh<S>,
        volume: &CuttingVolume,
    ) -> (Option<Part<S>>, Diagnostics) {
        let name = format!("{source_name}_{}", volume.octant.name());
        let mut notes = Diagnostics::new();

        let mut cutter_mesh = volume.to_mesh::<S>();
        add_connectors(
            &mut cutter_mesh,
            volume,
            &self.config.connector,
            self.config.normal_tolerance,
        );

        let extraction = match extract(world, &cutter_mesh, self.solver.as_ref(), &self.repair) {
            Ok(extraction) => extraction,
            Err(ExtractError::EmptyResult) => {
                notes.warning(
                    Some(name.as_str()),
                    "boolean intersection produced no geometry, skipped",
                );
                return (None, notes);
            },
            Err(ExtractError::Boolean(err)) => {
                notes.warning(Some(name.as_str()), format!("boolean failed: {err}"));
                return (None, notes);
            },
        };

        let mut mesh = extraction.mesh;
        let report = extraction.repair;
        if !report.is_watertight() {
            notes.warning(
                Some(name.as_str()),
                format!(
                    "{} non-manifold edges remain after repair",
                    report.residual_open_edges
                ),
            );
        }

        let origin = mesh.recenter_to_bounds();
        (
            Some(Part {
                name,
                octant: volume.octant,
                mesh,
                origin,
                repair: report,
            }),
            notes,
        )
    }
}

/// Cut `source` with the default backend.
pub fn cut<S: Clone + Send + Sync + Debug + 'static>(
    source: &SourceModel<S>,
    config: &CutConfig,
) -> Result<CutOutcome<S>, CutError> {
    Cutter::new(*config).cut(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::errors::BooleanError;
    use nalgebra::Vector3;

    struct Refuses;

    impl BooleanSolver<()> for Refuses {
        fn intersect(&self, _: &Mesh<()>, _: &Mesh<()>) -> Result<Mesh<()>, BooleanError> {
            Err(BooleanError::SolverError("refused".into()))
        }
    }

    fn cube_model() -> SourceModel<()> {
        SourceModel::new(
            "Cube",
            Mesh::cuboid(Point3::origin(), Vector3::repeat(1.0), None),
        )
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let err = cut(&SourceModel::new("Empty", Mesh::<()>::new()), &CutConfig::default())
            .unwrap_err();
        assert_eq!(err, CutError::EmptyMesh { name: "Empty".into() });
    }

    #[test]
    fn singular_transform_is_rejected() {
        let model = cube_model().with_transform(Matrix4::new_nonuniform_scaling(&Vector3::new(
            1.0, 0.0, 1.0,
        )));
        assert!(matches!(
            cut(&model, &CutConfig::default()),
            Err(CutError::NonInvertibleTransform { .. })
        ));
    }

    #[test]
    fn failing_solver_selects_the_source() {
        let outcome = Cutter::new(CutConfig::default())
            .with_solver(Refuses)
            .cut(&cube_model())
            .expect("preconditions hold");
        assert!(outcome.parts.is_empty());
        assert_eq!(outcome.selection, vec!["Cube".to_string()]);
        assert_eq!(outcome.diagnostics.count(Severity::Warning), 8);
        assert!(outcome.diagnostics.has_errors());
    }

    #[test]
    fn transform_is_baked_before_partitioning() {
        let model = cube_model().with_transform(Matrix4::new_translation(&Vector3::new(
            5.0, 0.0, 0.0,
        )));
        let outcome = cut(&model, &CutConfig::default()).expect("cut succeeds");
        assert!((outcome.partition.center.x - 5.0).abs() < 1e-9);
        // Source mesh itself is still at the origin
        assert!(model.mesh.bounding_box().center().coords.norm() < 1e-9);
    }
}
