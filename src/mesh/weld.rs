//! Turning a polygon soup back into a connected indexed mesh.

use crate::float_types::{Real, tolerance};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use crate::mesh::{Edge, IndexedPolygon, Mesh};
use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use std::fmt::Debug;

/// Upper bound on T-junction passes; each pass only inserts, so a handful suffices
const MAX_T_JUNCTION_PASSES: usize = 8;

/// Spatial hash of vertex positions; points within the weld distance share an index.
struct WeldGrid {
    cell: Real,
    buckets: HashMap<(i64, i64, i64), Vec<usize>>,
    vertices: Vec<Vertex>,
}

impl WeldGrid {
    fn new(cell: Real) -> Self {
        Self {
            cell,
            buckets: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn key(&self, p: &Point3<Real>) -> (i64, i64, i64) {
        (
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        )
    }

    fn insert(&mut self, vertex: &Vertex) -> usize {
        let (kx, ky, kz) = self.key(&vertex.pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy, kz + dz)) {
                        for &i in bucket {
                            if (self.vertices[i].pos - vertex.pos).norm() <= self.cell {
                                return i;
                            }
                        }
                    }
                }
            }
        }
        let index = self.vertices.len();
        self.vertices.push(*vertex);
        self.buckets.entry((kx, ky, kz)).or_default().push(index);
        index
    }
}

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Weld a polygon soup into an indexed mesh.
    ///
    /// Points closer than the crate tolerance are merged, polygons that
    /// collapse below three distinct vertices are dropped, and T-junctions
    /// (a vertex of one polygon lying inside an edge of its neighbour) are
    /// resolved by inserting that vertex into the longer edge.
    pub fn from_polygons(polygons: &[Polygon<S>], metadata: Option<S>) -> Mesh<S> {
        let mut grid = WeldGrid::new(tolerance());
        let mut faces = Vec::with_capacity(polygons.len());

        for polygon in polygons {
            let mut indices: Vec<usize> = polygon.vertices.iter().map(|v| grid.insert(v)).collect();
            indices.dedup();
            while indices.len() > 1 && indices.first() == indices.last() {
                indices.pop();
            }
            let distinct: HashSet<usize> = indices.iter().copied().collect();
            if distinct.len() < 3 || distinct.len() != indices.len() {
                continue;
            }
            faces.push(IndexedPolygon::new(
                indices,
                polygon.plane.clone(),
                polygon.metadata.clone(),
            ));
        }

        let mut mesh = Mesh {
            vertices: grid.vertices,
            polygons: faces,
            metadata,
        };
        mesh.fix_t_junctions();
        mesh.remove_loose();
        mesh.compute_vertex_normals();
        mesh
    }

    /// Split open edges at boundary vertices lying on them.
    /// Returns the number of vertices inserted.
    pub fn fix_t_junctions(&mut self) -> usize {
        let eps = tolerance();
        let mut inserted = 0;

        for _ in 0..MAX_T_JUNCTION_PASSES {
            let open: HashSet<Edge> = self
                .edge_face_counts()
                .into_iter()
                .filter(|&(_, count)| count == 1)
                .map(|(edge, _)| edge)
                .collect();
            if open.is_empty() {
                break;
            }
            let mut candidates: Vec<usize> = open.iter().flat_map(|e| [e.0, e.1]).collect();
            candidates.sort_unstable();
            candidates.dedup();

            let mut pass_inserted = 0;
            for p in 0..self.polygons.len() {
                let old = &self.polygons[p].indices;
                let n = old.len();
                let mut rebuilt = Vec::with_capacity(n);
                for k in 0..n {
                    let (a, b) = (old[k], old[(k + 1) % n]);
                    rebuilt.push(a);
                    if !open.contains(&Edge::new(a, b)) {
                        continue;
                    }
                    let pa = self.vertices[a].pos;
                    let ab = self.vertices[b].pos - pa;
                    let len2 = ab.norm_squared();
                    if len2 <= eps * eps {
                        continue;
                    }
                    let mut on_edge: Vec<(Real, usize)> = candidates
                        .iter()
                        .filter(|&&v| v != a && v != b && !old.contains(&v))
                        .filter_map(|&v| {
                            let ap = self.vertices[v].pos - pa;
                            let t = ap.dot(&ab) / len2;
                            let off = (ap - ab * t).norm();
                            let margin = eps / len2.sqrt();
                            (t > margin && t < 1.0 - margin && off <= eps).then_some((t, v))
                        })
                        .collect();
                    on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
                    pass_inserted += on_edge.len();
                    rebuilt.extend(on_edge.into_iter().map(|(_, v)| v));
                }
                self.polygons[p].indices = rebuilt;
            }

            inserted += pass_inserted;
            if pass_inserted == 0 {
                break;
            }
        }
        inserted
    }
}
