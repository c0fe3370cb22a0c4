//! Struct and functions for working with `Vertex`s from which meshes are composed.

use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// A vertex of a polygon, holding position and normal.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Vertex {
    pub pos: Point3<Real>,
    pub normal: Vector3<Real>,
}

impl Vertex {
    /// Create a new [`Vertex`].
    ///
    /// * `pos`    – the position in model space
    /// * `normal` – (optionally non‑unit) normal; it will be **copied verbatim**
    ///
    /// Non-finite components are replaced by `0.0`.
    #[inline]
    pub fn new(mut pos: Point3<Real>, mut normal: Vector3<Real>) -> Self {
        // Sanitise position
        for c in pos.coords.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        // Sanitise normal
        for c in normal.iter_mut() {
            if !c.is_finite() {
                *c = 0.0;
            }
        }

        Vertex { pos, normal }
    }

    /// Flip vertex normal in place.
    ///
    /// # Example
    /// ```rust
    /// # use nalgebra::{Point3, Vector3};
    /// # use octacut::mesh::vertex::Vertex;
    /// let mut v = Vertex::new(Point3::new(1.0, 2.0, 3.0), Vector3::x());
    /// v.flip();
    /// assert_eq!(v.pos, Point3::new(1.0, 2.0, 3.0), "position remains the same");
    /// assert_eq!(v.normal, -Vector3::x(), "the normal is negated");
    /// ```
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linear interpolation between `self` and `other` at parameter `t`.
    ///
    /// Used by the BSP splitter to create the vertex where an edge crosses a plane.
    pub fn interpolate(&self, other: &Vertex, t: Real) -> Vertex {
        let new_pos = self.pos + (other.pos - self.pos) * t;
        let new_normal = self.normal + (other.normal - self.normal) * t;
        Vertex::new(new_pos, new_normal)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_components_are_sanitised() {
        let v = Vertex::new(
            Point3::new(Real::NAN, 1.0, Real::INFINITY),
            Vector3::new(0.0, Real::NEG_INFINITY, 1.0),
        );
        assert_eq!(v.pos, Point3::new(0.0, 1.0, 0.0));
        assert_eq!(v.normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn interpolate_midpoint() {
        let a = Vertex::new(Point3::origin(), Vector3::x());
        let b = Vertex::new(Point3::new(2.0, 4.0, -2.0), Vector3::x());
        let m = a.interpolate(&b, 0.5);
        assert_eq!(m.pos, Point3::new(1.0, 2.0, -1.0));
    }
}
