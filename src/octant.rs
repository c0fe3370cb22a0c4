//! Octant bookkeeping and the placement of the eight cutting volumes.

use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::mesh::Mesh;
use nalgebra::{Point3, Vector3};
use std::fmt::{self, Debug};

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vector3<Real> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// The two other axes, in cyclic order.
    pub const fn cross_axes(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::Z, Axis::X],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// One of the eight sign combinations of the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OctantDescriptor {
    /// Position in [`OCTANTS`]
    pub index: usize,
    /// `+1` or `-1` per axis
    pub signs: [i8; 3],
}

/// All octants in processing order.
pub const OCTANTS: [OctantDescriptor; 8] = [
    OctantDescriptor::new(0, [1, 1, 1]),
    OctantDescriptor::new(1, [1, 1, -1]),
    OctantDescriptor::new(2, [1, -1, 1]),
    OctantDescriptor::new(3, [1, -1, -1]),
    OctantDescriptor::new(4, [-1, 1, 1]),
    OctantDescriptor::new(5, [-1, 1, -1]),
    OctantDescriptor::new(6, [-1, -1, 1]),
    OctantDescriptor::new(7, [-1, -1, -1]),
];

impl OctantDescriptor {
    pub const fn new(index: usize, signs: [i8; 3]) -> Self {
        Self { index, signs }
    }

    pub fn sign(&self, axis: Axis) -> Real {
        Real::from(self.signs[axis.index()])
    }

    pub fn sign_vector(&self) -> Vector3<Real> {
        Vector3::new(self.sign(Axis::X), self.sign(Axis::Y), self.sign(Axis::Z))
    }

    pub const fn is_left(&self) -> bool {
        self.signs[0] < 0
    }

    pub const fn is_back(&self) -> bool {
        self.signs[1] < 0
    }

    pub const fn is_top(&self) -> bool {
        self.signs[2] > 0
    }

    /// Human readable name such as `left_back_bottom`.
    pub const fn name(&self) -> &'static str {
        match (self.is_left(), self.is_back(), self.is_top()) {
            (false, false, true) => "right_front_top",
            (false, false, false) => "right_front_bottom",
            (false, true, true) => "right_back_top",
            (false, true, false) => "right_back_bottom",
            (true, false, true) => "left_front_top",
            (true, false, false) => "left_front_bottom",
            (true, true, true) => "left_back_top",
            (true, true, false) => "left_back_bottom",
        }
    }
}

impl fmt::Display for OctantDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Placement of one octant's cutting box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CuttingVolume {
    pub octant: OctantDescriptor,
    pub center: Point3<Real>,
    /// Full extents of the box, equal to the inflated half size of the model
    pub size: Vector3<Real>,
}

impl CuttingVolume {
    /// The plain box mesh, before any connector is added.
    pub fn to_mesh<S: Clone + Send + Sync + Debug>(&self) -> Mesh<S> {
        Mesh::cuboid(self.center, self.size, None)
    }

    /// Position of the cut plane on `axis`, the face shared with the
    /// neighbouring octant.
    pub fn cut_plane(&self, axis: Axis) -> Real {
        let i = axis.index();
        self.center[i] - self.octant.sign(axis) * self.size[i] * 0.5
    }
}

/// The eight cutting volumes of a model and the box they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub center: Point3<Real>,
    /// Tight extents of the model
    pub size: Vector3<Real>,
    /// `size / 2 * scale_factor`
    pub half_size: Vector3<Real>,
    pub volumes: [CuttingVolume; 8],
}

/// Derive the cutting volumes from the model bounds.
///
/// Each volume is centred at `center + sign * half_size / 2` with full
/// extents `half_size`, so the eight boxes meet on the three mid-planes and
/// reach past the model by the scale inflation.
pub fn partition(bounds: &Aabb, scale_factor: Real) -> Partition {
    let center = bounds.center();
    let size = bounds.maxs - bounds.mins;
    let half_size = size * 0.5 * scale_factor;

    let volumes = OCTANTS.map(|octant| CuttingVolume {
        octant,
        center: center + octant.sign_vector().component_mul(&half_size) * 0.5,
        size: half_size,
    });

    Partition {
        center,
        size,
        half_size,
        volumes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_flags() {
        assert_eq!(OCTANTS[0].name(), "right_front_top");
        assert_eq!(OCTANTS[7].name(), "left_back_bottom");
        assert!(OCTANTS[7].is_left() && OCTANTS[7].is_back() && !OCTANTS[7].is_top());

        let mut names: Vec<_> = OCTANTS.iter().map(|o| o.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn unit_cube_partition() {
        let bounds = Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
        let p = partition(&bounds, 1.1);
        assert!((p.half_size - Vector3::repeat(0.55)).norm() < 1e-12);
        for volume in &p.volumes {
            let expected = volume.octant.sign_vector() * 0.275;
            assert!((volume.center.coords - expected).norm() < 1e-12);
            assert!((volume.size - Vector3::repeat(0.55)).norm() < 1e-12);
            for axis in Axis::ALL {
                assert!(volume.cut_plane(axis).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn partition_is_deterministic() {
        let bounds = Aabb::new(Point3::new(1.0, -2.0, 0.0), Point3::new(4.0, 3.0, 0.5));
        assert_eq!(partition(&bounds, 1.3), partition(&bounds, 1.3));
    }
}
