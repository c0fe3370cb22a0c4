//! Ear-clipping triangulation of 3D vertex loops via `geo`'s earcut.

use crate::float_types::Real;
use crate::mesh::plane::Plane;
use geo::{Coord, LineString, Polygon as GeoPolygon, TriangulateEarcut};
use nalgebra::Point3;

/// Triangulate a closed loop of points, returning index triples into `points`.
///
/// The loop is rotated into the XY plane of its Newell plane before ear
/// clipping, and every triangle is wound the same way as the loop. Returns
/// `None` unless exactly `n - 2` triangles come back, which is how a
/// self-intersecting or degenerate loop shows up.
pub fn triangulate_loop(points: &[Point3<Real>]) -> Option<Vec<[usize; 3]>> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    if n == 3 {
        return Some(vec![[0, 1, 2]]);
    }

    let plane = Plane::from_loop(points.iter());
    let (to_xy, _) = plane.to_xy_transform();
    let coords: Vec<Coord<Real>> = points
        .iter()
        .map(|p| {
            let flat = to_xy.transform_point(p);
            Coord {
                x: flat.x,
                y: flat.y,
            }
        })
        .collect();

    let triangulation = GeoPolygon::new(LineString::new(coords), Vec::new()).earcut_triangles_raw();
    let triangles: Vec<[usize; 3]> = triangulation
        .triangle_indices
        .chunks_exact(3)
        .map(|tri| {
            let mut t = [tri[0] % n, tri[1] % n, tri[2] % n];
            let normal = (points[t[1]] - points[t[0]]).cross(&(points[t[2]] - points[t[0]]));
            if normal.dot(&plane.normal) < 0.0 {
                t.swap(1, 2);
            }
            t
        })
        .collect();

    if triangles.len() != n - 2 {
        return None;
    }
    Some(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_gives_two_triangles_with_loop_winding() {
        let pts = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        let tris = triangulate_loop(&pts).expect("square triangulates");
        assert_eq!(tris.len(), 2);
        for [a, b, c] in tris {
            let n = (pts[b] - pts[a]).cross(&(pts[c] - pts[a]));
            // Loop is clockwise seen from +z
            assert!(n.z < 0.0);
        }
    }

    #[test]
    fn concave_loop_in_tilted_plane() {
        let flat = [
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ];
        let pts: Vec<Point3<Real>> = flat
            .iter()
            .map(|&(u, v)| Point3::new(u, v * 0.6, v * 0.8))
            .collect();
        let tris = triangulate_loop(&pts).expect("U shape triangulates");
        assert_eq!(tris.len(), pts.len() - 2);
    }

    #[test]
    fn too_short_loop_is_rejected() {
        assert!(triangulate_loop(&[Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).is_none());
    }
}
