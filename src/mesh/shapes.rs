//! Primitive solids: axis-aligned boxes (cutting volumes) and UV spheres.

use crate::float_types::{PI, Real, TAU};
use crate::mesh::vertex::Vertex;
use crate::mesh::{IndexedPolygon, Mesh};
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Axis-aligned box with full extents `size`, centred on `center`.
    ///
    /// Vertex `i` sits on the positive side of X, Y, Z when bit 0, 1, 2 of
    /// `i` is set. Faces are quads wound counter-clockwise seen from outside.
    pub fn cuboid(center: Point3<Real>, size: Vector3<Real>, metadata: Option<S>) -> Mesh<S> {
        let half = size * 0.5;
        let vertices: Vec<Vertex> = (0..8)
            .map(|i| {
                let sign = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
                let offset = Vector3::new(sign(1) * half.x, sign(2) * half.y, sign(4) * half.z);
                Vertex::new(center + offset, Vector3::zeros())
            })
            .collect();

        let faces: [[usize; 4]; 6] = [
            [0, 4, 6, 2], // -X
            [1, 3, 7, 5], // +X
            [0, 1, 5, 4], // -Y
            [2, 6, 7, 3], // +Y
            [0, 2, 3, 1], // -Z
            [4, 5, 7, 6], // +Z
        ];

        let mut mesh = Mesh {
            vertices,
            polygons: Vec::with_capacity(6),
            metadata,
        };
        for face in faces {
            let plane = mesh.plane_through(&face);
            mesh.polygons
                .push(IndexedPolygon::new(face.to_vec(), plane, None));
        }
        mesh.compute_vertex_normals();
        mesh
    }

    /// UV sphere centred at the origin.
    ///
    /// `segments` is the number of longitudinal slices (at least 3) and
    /// `stacks` the number of latitudinal bands (at least 2). The poles are
    /// single vertices joined by triangle fans; all other faces are planar quads.
    pub fn sphere(radius: Real, segments: usize, stacks: usize, metadata: Option<S>) -> Mesh<S> {
        let segments = segments.max(3);
        let stacks = stacks.max(2);

        let mut vertices = Vec::with_capacity(segments * (stacks - 1) + 2);
        vertices.push(Vertex::new(Point3::new(0.0, 0.0, radius), Vector3::z()));
        for k in 1..stacks {
            let theta = PI * k as Real / stacks as Real;
            for j in 0..segments {
                let phi = TAU * j as Real / segments as Real;
                let dir = Vector3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                vertices.push(Vertex::new(Point3::from(dir * radius), dir));
            }
        }
        let south = vertices.len();
        vertices.push(Vertex::new(Point3::new(0.0, 0.0, -radius), -Vector3::z()));

        let ring = |k: usize, j: usize| 1 + (k - 1) * segments + (j % segments);

        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(segments * stacks);
        for j in 0..segments {
            faces.push(vec![0, ring(1, j), ring(1, j + 1)]);
        }
        for k in 1..stacks - 1 {
            for j in 0..segments {
                faces.push(vec![ring(k, j), ring(k + 1, j), ring(k + 1, j + 1), ring(k, j + 1)]);
            }
        }
        for j in 0..segments {
            faces.push(vec![south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
        }

        let mut mesh = Mesh {
            vertices,
            polygons: Vec::with_capacity(faces.len()),
            metadata,
        };
        for face in faces {
            let plane = mesh.plane_through(&face);
            mesh.polygons.push(IndexedPolygon::new(face, plane, None));
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_faces_point_outward() {
        let cube =
            Mesh::<()>::cuboid(Point3::new(1.0, 2.0, 3.0), Vector3::new(2.0, 4.0, 6.0), None);
        assert!((cube.signed_volume() - 48.0).abs() < 1e-9);
        for polygon in &cube.polygons {
            let outward = cube.polygon_centroid(polygon) - Point3::new(1.0, 2.0, 3.0);
            assert!(polygon.plane.normal.dot(&outward) > 0.0);
        }
    }

    #[test]
    fn sphere_is_closed_and_outward() {
        let sphere = Mesh::<()>::sphere(1.0, 16, 8, None);
        assert_eq!(sphere.vertices.len(), 16 * 7 + 2);
        assert!(sphere.edge_face_counts().values().all(|&c| c == 2));
        let volume = sphere.signed_volume();
        // Inscribed polyhedron: a bit under 4/3 pi
        assert!(volume > 3.5 && volume < 4.0 * PI / 3.0);
    }
}
