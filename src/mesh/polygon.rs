//! Free-standing convex polygons, the unit of work inside the BSP solver

use crate::mesh::plane::Plane;
use crate::mesh::vertex::Vertex;
use std::fmt::Debug;

/// A polygon that owns its vertices, with a cached supporting plane.
///
/// Unlike [`IndexedPolygon`](crate::mesh::IndexedPolygon) these carry no
/// connectivity, which is what lets the BSP splitter cut them freely.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Polygon<S> {
    /// Create a polygon, deriving its plane from the vertex winding.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Self {
        let plane = Plane::from_vertices(&vertices);
        Polygon {
            vertices,
            plane,
            metadata,
        }
    }

    /// Create a polygon that shares a known plane (used for split fragments).
    pub const fn with_plane(vertices: Vec<Vertex>, plane: Plane, metadata: Option<S>) -> Self {
        Polygon {
            vertices,
            plane,
            metadata,
        }
    }

    /// Reverse winding order, vertex normals and the plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

}
