//! `Mesh` struct: shared vertex storage plus indexed polygon faces.
//!
//! This is the geometry kernel every stage of the cutting pipeline works on.
//! Connectivity is implicit in shared vertex indices, so edges are derived on
//! demand from polygon boundaries.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerance};
use crate::mesh::plane::Plane;
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use hashbrown::HashMap;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use std::fmt::Debug;

pub mod bsp;
pub mod edit;
pub mod manifold;
pub mod plane;
pub mod polygon;
pub mod shapes;
pub mod triangulate;
pub mod vertex;
pub mod weld;

/// An undirected edge, stored with the smaller vertex index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(pub usize, pub usize);

impl Edge {
    /// Canonical edge between `a` and `b`, regardless of direction.
    pub const fn new(a: usize, b: usize) -> Self {
        if a < b { Edge(a, b) } else { Edge(b, a) }
    }

    pub const fn contains(&self, vertex: usize) -> bool {
        self.0 == vertex || self.1 == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint at all.
    pub const fn other(&self, vertex: usize) -> Option<usize> {
        if self.0 == vertex {
            Some(self.1)
        } else if self.1 == vertex {
            Some(self.0)
        } else {
            None
        }
    }
}

/// A polygon face, defined by indices into the vertex array of its mesh.
/// - `S` is the generic metadata type, stored as `Option<S>`.
#[derive(Debug, Clone)]
pub struct IndexedPolygon<S: Clone> {
    /// Indices into the vertex array, counter-clockwise seen from outside
    pub indices: Vec<usize>,

    /// The plane on which this polygon lies
    pub plane: Plane,

    /// Generic metadata associated with the polygon
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> IndexedPolygon<S> {
    pub const fn new(indices: Vec<usize>, plane: Plane, metadata: Option<S>) -> Self {
        IndexedPolygon {
            indices,
            plane,
            metadata,
        }
    }

    /// Reverses winding order and flips the plane normal
    pub fn flip(&mut self) {
        self.indices.reverse();
        self.plane.flip();
    }

    /// Directed boundary edges `(from, to)` following the winding.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.indices.len();
        (0..n).map(move |i| (self.indices[i], self.indices[(i + 1) % n]))
    }

    /// Whether the polygon walks `from -> to` along one of its edges.
    pub fn has_directed_edge(&self, from: usize, to: usize) -> bool {
        self.edges().any(|(a, b)| a == from && b == to)
    }
}

/// An indexed polygon mesh with optional whole-mesh metadata.
#[derive(Debug, Clone)]
pub struct Mesh<S: Clone + Send + Sync + Debug> {
    pub vertices: Vec<Vertex>,
    pub polygons: Vec<IndexedPolygon<S>>,
    pub metadata: Option<S>,
}

impl<S: Clone + Send + Sync + Debug> Default for Mesh<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Returns a new empty mesh
    pub const fn new() -> Self {
        Mesh {
            vertices: Vec::new(),
            polygons: Vec::new(),
            metadata: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Positions of a polygon's vertices in winding order.
    pub fn polygon_points(&self, polygon: &IndexedPolygon<S>) -> Vec<Point3<Real>> {
        polygon
            .indices
            .iter()
            .map(|&i| self.vertices[i].pos)
            .collect()
    }

    /// Arithmetic mean of a polygon's vertex positions.
    pub fn polygon_centroid(&self, polygon: &IndexedPolygon<S>) -> Point3<Real> {
        let sum = polygon
            .indices
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.vertices[i].pos.coords);
        Point3::from(sum / polygon.indices.len().max(1) as Real)
    }

    /// Newell plane through the given vertex loop.
    pub fn plane_through(&self, indices: &[usize]) -> Plane {
        let points: Vec<Point3<Real>> = indices.iter().map(|&i| self.vertices[i].pos).collect();
        Plane::from_loop(points.iter())
    }

    /// Returns a [`parry3d::bounding_volume::Aabb`] enclosing all vertices.
    /// An empty mesh yields a degenerate box at the origin.
    pub fn bounding_box(&self) -> Aabb {
        if self.vertices.is_empty() {
            return Aabb::new(Point3::origin(), Point3::origin());
        }
        let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
        let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
        for v in &self.vertices {
            mins = mins.inf(&v.pos);
            maxs = maxs.sup(&v.pos);
        }
        Aabb::new(mins, maxs)
    }

    /// Number of polygons using each undirected edge.
    pub fn edge_face_counts(&self) -> HashMap<Edge, usize> {
        let mut counts: HashMap<Edge, usize> = HashMap::new();
        for polygon in &self.polygons {
            for (a, b) in polygon.edges() {
                *counts.entry(Edge::new(a, b)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// All distinct edges, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edge_face_counts().into_keys().collect();
        edges.sort_unstable();
        edges
    }

    /// Remove dangling geometry: polygons with fewer than three distinct
    /// in-range vertices, exact duplicate polygons and unreferenced vertices.
    /// Returns the number of elements removed.
    pub fn remove_loose(&mut self) -> usize {
        let before = self.polygons.len() + self.vertices.len();
        let vertex_count = self.vertices.len();

        let mut seen: hashbrown::HashSet<Vec<usize>> = hashbrown::HashSet::new();
        self.polygons.retain_mut(|polygon| {
            polygon.indices.dedup();
            while polygon.indices.len() > 1
                && polygon.indices.first() == polygon.indices.last()
            {
                polygon.indices.pop();
            }
            if polygon.indices.len() < 3 || polygon.indices.iter().any(|&i| i >= vertex_count) {
                return false;
            }
            let mut key = polygon.indices.clone();
            key.sort_unstable();
            if key.windows(2).any(|w| w[0] == w[1]) {
                return false;
            }
            seen.insert(key)
        });

        let mut remap = vec![usize::MAX; vertex_count];
        let mut kept = Vec::with_capacity(vertex_count);
        for polygon in &self.polygons {
            for &i in &polygon.indices {
                if remap[i] == usize::MAX {
                    remap[i] = kept.len();
                    kept.push(self.vertices[i]);
                }
            }
        }
        for polygon in &mut self.polygons {
            for i in polygon.indices.iter_mut() {
                *i = remap[*i];
            }
        }
        self.vertices = kept;

        before - (self.polygons.len() + self.vertices.len())
    }

    /// Recompute every polygon plane from its vertices, then the vertex normals.
    pub fn renormalize(&mut self) {
        let planes: Vec<Plane> = self
            .polygons
            .iter()
            .map(|p| self.plane_through(&p.indices))
            .collect();
        for (polygon, plane) in self.polygons.iter_mut().zip(planes) {
            polygon.plane = plane;
        }
        self.compute_vertex_normals();
    }

    /// Vertex normals as the area-weighted average of adjacent face normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut accum = vec![Vector3::<Real>::zeros(); self.vertices.len()];
        for polygon in &self.polygons {
            let weighted = polygon.plane.normal() * self.polygon_area(polygon);
            for &i in &polygon.indices {
                accum[i] += weighted;
            }
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(accum) {
            let norm = normal.norm();
            vertex.normal = if norm > Real::EPSILON {
                normal / norm
            } else {
                Vector3::z()
            };
        }
    }

    /// Area of a (possibly non-convex) planar polygon.
    pub fn polygon_area(&self, polygon: &IndexedPolygon<S>) -> Real {
        let n = polygon.indices.len();
        if n < 3 {
            return 0.0;
        }
        let origin = self.vertices[polygon.indices[0]].pos;
        let mut twice = Vector3::zeros();
        for i in 1..n - 1 {
            let a = self.vertices[polygon.indices[i]].pos - origin;
            let b = self.vertices[polygon.indices[i + 1]].pos - origin;
            twice += a.cross(&b);
        }
        twice.norm() * 0.5
    }

    /// Signed enclosed volume by the divergence theorem; positive when the
    /// faces of a closed mesh point outward.
    pub fn signed_volume(&self) -> Real {
        self.polygons
            .iter()
            .map(|polygon| self.polygon_volume_term(&polygon.indices))
            .sum::<Real>()
            / 6.0
    }

    /// Six times the signed volume of the cone from the origin over a polygon.
    pub(crate) fn polygon_volume_term(&self, indices: &[usize]) -> Real {
        let o = self.vertices[indices[0]].pos.coords;
        (1..indices.len().saturating_sub(1))
            .map(|i| {
                let a = self.vertices[indices[i]].pos.coords;
                let b = self.vertices[indices[i + 1]].pos.coords;
                o.dot(&a.cross(&b))
            })
            .sum()
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vector3<Real>) {
        for v in &mut self.vertices {
            v.pos += offset;
        }
        for polygon in &mut self.polygons {
            polygon.plane.w += polygon.plane.normal.dot(&offset);
        }
    }

    /// Apply an affine transform, baking it into vertex positions.
    ///
    /// Normals use the inverse transpose, and mirroring transforms reverse the
    /// winding so faces keep pointing outward. Returns `None` for a singular matrix.
    pub fn transform(&self, mat: &Matrix4<Real>) -> Option<Mesh<S>> {
        let linear: Matrix3<Real> = mat.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear.try_inverse()?.transpose();
        let mirrored = linear.determinant() < 0.0;

        let mut mesh = self.clone();
        for v in &mut mesh.vertices {
            v.pos = mat.transform_point(&v.pos);
            let n = normal_matrix * v.normal;
            v.normal = if n.norm() > Real::EPSILON { n.normalize() } else { n };
        }
        if mirrored {
            for polygon in &mut mesh.polygons {
                polygon.indices.reverse();
            }
        }
        mesh.renormalize();
        Some(mesh)
    }

    /// Move the mesh so its bounding-box centre sits at the origin.
    /// Returns the centre it was moved from.
    pub fn recenter_to_bounds(&mut self) -> Point3<Real> {
        let center = self.bounding_box().center();
        self.translate(-center.coords);
        center
    }

    /// Polygon soup copy of this mesh for the BSP solver.
    ///
    /// Non-convex faces are ear-clipped first, since BSP splitting assumes
    /// convex polygons.
    pub fn to_polygons(&self) -> Vec<Polygon<S>> {
        let mut out = Vec::with_capacity(self.polygons.len());
        for polygon in &self.polygons {
            let vertices: Vec<Vertex> = polygon
                .indices
                .iter()
                .map(|&i| Vertex::new(self.vertices[i].pos, polygon.plane.normal))
                .collect();

            if is_convex(&vertices, &polygon.plane.normal) {
                out.push(Polygon::with_plane(
                    vertices,
                    polygon.plane.clone(),
                    polygon.metadata.clone(),
                ));
                continue;
            }

            let points: Vec<Point3<Real>> = vertices.iter().map(|v| v.pos).collect();
            match triangulate::triangulate_loop(&points) {
                Some(triangles) => {
                    for [a, b, c] in triangles {
                        out.push(Polygon::with_plane(
                            vec![vertices[a], vertices[b], vertices[c]],
                            polygon.plane.clone(),
                            polygon.metadata.clone(),
                        ));
                    }
                },
                None => out.push(Polygon::with_plane(
                    vertices,
                    polygon.plane.clone(),
                    polygon.metadata.clone(),
                )),
            }
        }
        out
    }
}

/// Every turn of the loop bends the same way as `normal`.
fn is_convex(vertices: &[Vertex], normal: &Vector3<Real>) -> bool {
    let n = vertices.len();
    if n <= 3 {
        return true;
    }
    let eps = tolerance();
    (0..n).all(|i| {
        let a = vertices[i].pos;
        let b = vertices[(i + 1) % n].pos;
        let c = vertices[(i + 2) % n].pos;
        (b - a).cross(&(c - b)).dot(normal) >= -eps
    })
}
