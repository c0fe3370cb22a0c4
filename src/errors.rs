//! Error types for every layer of the cutting pipeline

use crate::float_types::Real;

/// Operation-level failures. These abort a cut before any geometry is created.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CutError {
    /// (EmptyMesh) The source object carries no usable polygons
    #[error("(EmptyMesh) Please select a mesh object: '{name}' has no polygons")]
    EmptyMesh { name: String },
    /// (ScaleFactorOutOfRange) The cutting-volume inflation must lie in `[1.0, 2.0]`
    #[error("(ScaleFactorOutOfRange) Scale factor {0} is outside [1.0, 2.0]")]
    ScaleFactorOutOfRange(Real),
    /// (NonInvertibleTransform) The pending object transform cannot be applied
    #[error("(NonInvertibleTransform) The transform of '{name}' is not invertible")]
    NonInvertibleTransform { name: String },
}

/// Failures raised by a [`BooleanSolver`](crate::boolean::BooleanSolver).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BooleanError {
    /// One of the operands cannot be intersected (empty, flat, non-finite)
    #[error("degenerate boolean input: {0}")]
    DegenerateInput(String),
    /// The solver failed internally
    #[error("boolean solver error: {0}")]
    SolverError(String),
}

/// Per-octant extraction failures. The orchestrator skips the octant and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Boolean(#[from] BooleanError),
    /// The intersection produced no vertices
    #[error("boolean intersection produced no geometry")]
    EmptyResult,
}

/// Rejections from the mesh kernel when creating a polygon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("a polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("vertex {0} appears more than once in the polygon")]
    DuplicateVertex(usize),
    #[error("vertex index {index} is out of range (vertices.len = {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("a polygon spanning these vertices already exists")]
    FaceExists,
    #[error("polygon has zero area")]
    Degenerate,
}
