//! Oriented planes, point/polygon classification and polygon splitting

use crate::float_types::{Real, tolerance};
use crate::mesh::polygon::Polygon;
use crate::mesh::vertex::Vertex;
use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, Vector3};
use std::fmt::Debug;

// Plane classification constants
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane in Hessian normal form: every point `p` on it satisfies `normal · p = w`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Unit normal vector of the plane
    pub normal: Vector3<Real>,
    /// Distance from origin along normal
    pub w: Real,
}

impl Plane {
    /// Create a new plane from a normal vector and offset
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        Plane {
            normal: normal.normalize(),
            w,
        }
    }

    /// Best-fit plane through an ordered loop of points using Newell's method.
    ///
    /// The normal agrees with the winding of the loop, so concave and
    /// slightly non-planar loops still get a sensible orientation.
    pub fn from_loop<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<Real>>,
        I::IntoIter: Clone,
    {
        let iter = points.into_iter();
        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        let mut count = 0usize;

        for (curr, next) in iter.clone().zip(iter.clone().cycle().skip(1)) {
            normal.x += (curr.y - next.y) * (curr.z + next.z);
            normal.y += (curr.z - next.z) * (curr.x + next.x);
            normal.z += (curr.x - next.x) * (curr.y + next.y);
            centroid += curr.coords;
            count += 1;
        }

        if count < 3 || normal.norm_squared() < Real::EPSILON * Real::EPSILON {
            return Plane {
                normal: Vector3::z(),
                w: 0.0,
            };
        }

        let normal = normal.normalize();
        let centroid = centroid / count as Real;
        Plane {
            normal,
            w: normal.dot(&centroid),
        }
    }

    /// Create a plane from polygon vertices
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let points: Vec<Point3<Real>> = vertices.iter().map(|v| v.pos).collect();
        Self::from_loop(points.iter())
    }

    /// Get the plane normal
    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    /// Get the offset (distance from origin)
    pub const fn offset(&self) -> Real {
        self.w
    }

    /// Flip the plane (reverse normal and distance)
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Signed distance from the plane, positive on the normal side
    #[inline]
    pub fn signed_distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classify a point relative to the plane within the crate tolerance.
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let distance = self.signed_distance(point);
        let eps = tolerance();
        if distance > eps {
            FRONT
        } else if distance < -eps {
            BACK
        } else {
            COPLANAR
        }
    }

    /// Classify a polygon with respect to the plane.
    /// Returns a bitmask of COPLANAR, FRONT, and BACK.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Splits a polygon by this plane, returning four buckets:
    /// `(coplanar_front, coplanar_back, front, back)`.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon<S: Clone + Send + Sync + Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> (
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
        Vec<Polygon<S>>,
    ) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let normal = self.normal();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        // Dispatch the easy cases
        match polygon_type {
            COPLANAR => {
                if normal.dot(&polygon.plane.normal()) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),

            // True spanning – do the split
            _ => {
                let mut split_front = Vec::<Vertex>::new();
                let mut split_back = Vec::<Vertex>::new();
                let n = polygon.vertices.len();

                for i in 0..n {
                    // j is the vertex following i, wrapping around to the first vertex
                    let j = (i + 1) % n;
                    let type_i = types[i];
                    let type_j = types[j];
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(*vertex_i);
                    }
                    if type_i != FRONT {
                        split_back.push(*vertex_i);
                    }

                    // The edge crosses the plane: both halves get the crossing point
                    if (type_i | type_j) == SPANNING {
                        let denom = normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > Real::EPSILON {
                            let t = (self.offset() - normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new);
                            split_back.push(vertex_new);
                        }
                    }
                }

                // Keep the parent plane; recomputing it from the fragments drifts
                if split_front.len() >= 3 {
                    front.push(Polygon::with_plane(
                        split_front,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
                if split_back.len() >= 3 {
                    back.push(Polygon::with_plane(
                        split_back,
                        polygon.plane.clone(),
                        polygon.metadata.clone(),
                    ));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }

    /// Returns (T, T_inv), where:
    /// - `T` maps a point on this plane into XY plane (z=0) with the plane's normal going to +Z
    /// - `T_inv` is the inverse transform, mapping back
    pub fn to_xy_transform(&self) -> (Matrix4<Real>, Matrix4<Real>) {
        let n = self.normal();
        let n_len = n.norm();
        if n_len < Real::EPSILON {
            // Degenerate plane, return identity
            return (Matrix4::identity(), Matrix4::identity());
        }

        let norm_dir = n / n_len;

        // Rotate plane.normal -> +Z
        let rot = Rotation3::rotation_between(&norm_dir, &Vector3::z())
            .unwrap_or_else(|| {
                // Antiparallel to +Z: half-turn about X
                Rotation3::from_axis_angle(&Vector3::x_axis(), crate::float_types::PI)
            });
        let iso_rot = Isometry3::from_parts(Translation3::identity(), rot.into());

        // Shift so the plane's reference point lands at z=0
        let p0_3d = norm_dir * (self.offset() / n_len);
        let p0_rot = iso_rot.transform_point(&Point3::from(p0_3d));
        let iso_trans = Translation3::new(0.0, 0.0, -p0_rot.z);

        let transform_to_xy = iso_trans.to_homogeneous() * iso_rot.to_homogeneous();
        let transform_from_xy = transform_to_xy
            .try_inverse()
            .unwrap_or_else(Matrix4::identity);

        (transform_to_xy, transform_from_xy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(z: Real) -> Polygon<()> {
        Polygon::new(
            vec![
                Vertex::new(Point3::new(-1.0, -1.0, z), Vector3::z()),
                Vertex::new(Point3::new(1.0, -1.0, z), Vector3::z()),
                Vertex::new(Point3::new(1.0, 1.0, z), Vector3::z()),
                Vertex::new(Point3::new(-1.0, 1.0, z), Vector3::z()),
            ],
            None,
        )
    }

    #[test]
    fn newell_normal_follows_winding() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let plane = Plane::from_loop(pts.iter());
        assert!((plane.normal - Vector3::z()).norm() < 1e-6);

        let reversed: Vec<_> = pts.iter().rev().copied().collect();
        let plane = Plane::from_loop(reversed.iter());
        assert!((plane.normal + Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn split_spanning_square() {
        let plane = Plane::from_normal(Vector3::x(), 0.0);
        let (cf, cb, front, back) = plane.split_polygon(&square(0.0));
        assert!(cf.is_empty() && cb.is_empty());
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 1);
        assert!(front[0].vertices.iter().all(|v| v.pos.x >= -1e-9));
        assert!(back[0].vertices.iter().all(|v| v.pos.x <= 1e-9));
    }

    #[test]
    fn coplanar_polygons_sorted_by_facing() {
        let up = Plane::from_normal(Vector3::z(), 0.0);
        let (cf, cb, _, _) = up.split_polygon(&square(0.0));
        assert_eq!((cf.len(), cb.len()), (1, 0));

        let mut down = up.clone();
        down.flip();
        let (cf, cb, _, _) = down.split_polygon(&square(0.0));
        assert_eq!((cf.len(), cb.len()), (0, 1));
    }

    #[test]
    fn xy_transform_flattens_plane() {
        let plane = Plane::from_normal(Vector3::new(1.0, 1.0, 0.0), 2.0);
        let (to_xy, from_xy) = plane.to_xy_transform();
        let on_plane = Point3::from(plane.normal * 2.0) + Vector3::new(0.0, 0.0, 3.0);
        let flat = to_xy.transform_point(&on_plane);
        assert!(flat.z.abs() < 1e-6);
        let back = from_xy.transform_point(&flat);
        assert!((back - on_plane).norm() < 1e-6);
    }

    #[test]
    fn xy_transform_handles_downward_normal() {
        let plane = Plane::from_normal(-Vector3::z(), 1.0);
        let (to_xy, _) = plane.to_xy_transform();
        let flat = to_xy.transform_point(&Point3::new(0.3, 0.2, -1.0));
        assert!(flat.z.abs() < 1e-6);
    }
}
