//! Face-level editing operations used to sculpt connectors onto cutting volumes.
//!
//! Every operation keeps the indices of the faces it is given stable: new
//! polygons are appended, so a selection made once stays valid through an
//! inset, extrude and scale sequence.

use crate::errors::MeshError;
use crate::float_types::Real;
use crate::mesh::vertex::Vertex;
use crate::mesh::{IndexedPolygon, Mesh};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Create a polygon over existing vertices, returning its index.
    ///
    /// Rejects loops that are too short, repeat a vertex, reference missing
    /// vertices, duplicate an existing face or enclose no area. Non-planar
    /// loops are accepted and get a best-fit plane.
    pub fn add_polygon(
        &mut self,
        indices: &[usize],
        metadata: Option<S>,
    ) -> Result<usize, MeshError> {
        if indices.len() < 3 {
            return Err(MeshError::TooFewVertices(indices.len()));
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(MeshError::IndexOutOfRange {
                index,
                len: self.vertices.len(),
            });
        }

        let mut key = indices.to_vec();
        key.sort_unstable();
        if let Some(w) = key.windows(2).find(|w| w[0] == w[1]) {
            return Err(MeshError::DuplicateVertex(w[0]));
        }

        let exists = self.polygons.iter().any(|p| {
            if p.indices.len() != key.len() {
                return false;
            }
            let mut other = p.indices.clone();
            other.sort_unstable();
            other == key
        });
        if exists {
            return Err(MeshError::FaceExists);
        }

        let origin = self.vertices[indices[0]].pos;
        let twice_area = (1..indices.len() - 1)
            .fold(Vector3::zeros(), |acc: Vector3<Real>, i| {
                let a = self.vertices[indices[i]].pos - origin;
                let b = self.vertices[indices[i + 1]].pos - origin;
                acc + a.cross(&b)
            })
            .norm();
        if twice_area <= Real::EPSILON {
            return Err(MeshError::Degenerate);
        }

        let plane = self.plane_through(indices);
        self.polygons
            .push(IndexedPolygon::new(indices.to_vec(), plane, metadata));
        Ok(self.polygons.len() - 1)
    }

    /// Indices of faces whose normal matches `direction` within `tolerance`,
    /// i.e. `|n · d - 1| < tolerance` for unit `d`.
    pub fn select_faces_by_normal(&self, direction: &Vector3<Real>, tolerance: Real) -> Vec<usize> {
        let dir = direction.normalize();
        self.polygons
            .iter()
            .enumerate()
            .filter(|(_, p)| (p.plane.normal.dot(&dir) - 1.0).abs() < tolerance)
            .map(|(i, _)| i)
            .collect()
    }

    /// Shrink each face towards its centroid by the per-axis `scale`,
    /// bridging the old and new outline with a ring of quads.
    pub fn inset_faces(&mut self, faces: &[usize], scale: Vector3<Real>) {
        for &face in faces {
            let center = self.polygon_centroid(&self.polygons[face]);
            let outer = self.polygons[face].indices.clone();
            let inner = self.push_loop(&outer, |p| center + (p - center).component_mul(&scale));
            self.bridge_loops(&outer, &inner);
            self.polygons[face].indices = inner;
        }
        self.renormalize();
    }

    /// Move each face by `offset`, closing the gap with side quads.
    /// Faces are extruded individually, never as a connected region.
    pub fn extrude_faces(&mut self, faces: &[usize], offset: Vector3<Real>) {
        for &face in faces {
            let base = self.polygons[face].indices.clone();
            let moved = self.push_loop(&base, |p| p + offset);
            self.bridge_loops(&base, &moved);
            self.polygons[face].indices = moved;
        }
        self.renormalize();
    }

    /// Scale the vertices of each face about the face centroid.
    /// Vertices shared with neighbouring faces move with it.
    pub fn scale_faces(&mut self, faces: &[usize], scale: Vector3<Real>) {
        for &face in faces {
            let center = self.polygon_centroid(&self.polygons[face]);
            for &i in &self.polygons[face].indices {
                let pos = self.vertices[i].pos;
                self.vertices[i].pos = center + (pos - center).component_mul(&scale);
            }
        }
        self.renormalize();
    }

    /// Delete faces, then any vertex left unreferenced.
    pub fn delete_faces(&mut self, faces: &[usize]) {
        let mut doomed = vec![false; self.polygons.len()];
        for &face in faces {
            if face < doomed.len() {
                doomed[face] = true;
            }
        }
        let mut index = 0;
        self.polygons.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });
        self.remove_loose();
        self.compute_vertex_normals();
    }

    fn push_loop(
        &mut self,
        source: &[usize],
        place: impl Fn(Point3<Real>) -> Point3<Real>,
    ) -> Vec<usize> {
        source
            .iter()
            .map(|&i| {
                let v = self.vertices[i];
                self.vertices.push(Vertex::new(place(v.pos), v.normal));
                self.vertices.len() - 1
            })
            .collect()
    }

    /// Quads `[a_k, a_k+1, b_k+1, b_k]` between two loops of equal length.
    fn bridge_loops(&mut self, a: &[usize], b: &[usize]) {
        let n = a.len();
        for k in 0..n {
            let quad = vec![a[k], a[(k + 1) % n], b[(k + 1) % n], b[k]];
            let plane = self.plane_through(&quad);
            self.polygons.push(IndexedPolygon::new(quad, plane, None));
        }
    }
}
