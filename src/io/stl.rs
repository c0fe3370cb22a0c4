//! Binary/ASCII STL import and binary STL export through `stl_io`.

use crate::float_types::Real;
use crate::io::IoError;
use crate::mesh::Mesh;
use crate::mesh::polygon::Polygon;
use crate::mesh::triangulate::triangulate_loop;
use crate::mesh::vertex::Vertex;
use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use std::io::Cursor;

impl<S: Clone + Send + Sync + Debug> Mesh<S> {
    /// Read STL data (binary or ASCII) into a welded indexed mesh.
    ///
    /// Facets are merged on coincident corners, so a well-formed closed STL
    /// comes back as a closed mesh. Zero-area facets are dropped.
    pub fn from_stl(stl_data: &[u8], metadata: Option<S>) -> Result<Mesh<S>, IoError> {
        let mut cursor = Cursor::new(stl_data);
        let stl_reader = stl_io::create_stl_reader(&mut cursor)?;

        let mut polygons = Vec::new();
        for tri_result in stl_reader {
            let tri = tri_result?;
            let normal = Vector3::new(
                tri.normal[0] as Real,
                tri.normal[1] as Real,
                tri.normal[2] as Real,
            );
            if tri.vertices.iter().any(|v| (0..3).any(|k| !v[k].is_finite())) {
                return Err(IoError::MalformedInput(
                    "facet with non-finite coordinates".into(),
                ));
            }
            let vertices: Vec<Vertex> = tri
                .vertices
                .iter()
                .map(|v| Vertex::new(Point3::new(v[0] as Real, v[1] as Real, v[2] as Real), normal))
                .collect();
            polygons.push(Polygon::new(vertices, None));
        }

        if polygons.is_empty() {
            return Err(IoError::MalformedInput("STL contains no facets".into()));
        }
        Ok(Mesh::from_polygons(&polygons, metadata))
    }

    /// Export as binary STL.
    ///
    /// Faces are ear-clipped into triangles; a face that cannot be clipped
    /// falls back to a fan from its first corner.
    ///
    /// ```rust
    /// # use octacut::mesh::Mesh;
    /// # use nalgebra::{Point3, Vector3};
    /// let cube = Mesh::<()>::cuboid(Point3::origin(), Vector3::repeat(1.0), None);
    /// let bytes = cube.to_stl_binary("cube").unwrap();
    /// // 80-byte header, facet count, 50 bytes per facet
    /// assert_eq!(bytes.len(), 84 + 12 * 50);
    /// ```
    pub fn to_stl_binary(&self, _name: &str) -> Result<Vec<u8>, IoError> {
        use stl_io::{Normal, Triangle, Vertex as StlVertex, write_stl};

        let mut triangles = Vec::<Triangle>::new();
        for polygon in &self.polygons {
            let points = self.polygon_points(polygon);
            let corners = triangulate_loop(&points).unwrap_or_else(|| {
                (1..points.len().saturating_sub(1))
                    .map(|i| [0, i, i + 1])
                    .collect()
            });

            let n = polygon.plane.normal;
            #[allow(clippy::unnecessary_cast)]
            for [a, b, c] in corners {
                triangles.push(Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [a, b, c].map(|i| {
                        let p = points[i];
                        StlVertex::new([p.x as f32, p.y as f32, p.z as f32])
                    }),
                });
            }
        }

        let mut cursor = Cursor::new(Vec::new());
        write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }
}
