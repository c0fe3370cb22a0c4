//! Peg and socket synthesis on the cut faces of a cutting volume.
//!
//! Each volume touches its three neighbours through one cut face per axis.
//! On an axis where the octant sign is positive the cut face grows a tapered
//! peg out into the neighbour; where it is negative the face receives a
//! slightly larger tapered socket carved into the volume. Across every pair
//! of adjacent octants one side therefore carries the peg and the other the
//! matching socket.

use crate::config::ConnectorSpec;
use crate::float_types::Real;
use crate::mesh::Mesh;
use crate::octant::{Axis, CuttingVolume};
use nalgebra::Vector3;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Peg,
    Socket,
}

/// Absolute dimensions of one connector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorProfile {
    pub kind: ConnectorKind,
    /// Axis of the cut face the connector sits on
    pub axis: Axis,
    /// Footprint on the cut face along `axis.cross_axes()`
    pub base: [Real; 2],
    /// Cross-section at the far end
    pub tip: [Real; 2],
    /// Extent along the cut normal
    pub depth: Real,
}

impl ConnectorProfile {
    /// Dimensions for a connector on a volume with full extents `extents`.
    pub fn new(
        spec: &ConnectorSpec,
        kind: ConnectorKind,
        axis: Axis,
        extents: &Vector3<Real>,
    ) -> Self {
        let clearance = match kind {
            ConnectorKind::Peg => 1.0,
            ConnectorKind::Socket => spec.clearance_scale,
        };
        let footprint = footprint_scale(spec, axis) * clearance;
        let [u, v] = axis.cross_axes();
        let base = [extents[u.index()] * footprint, extents[v.index()] * footprint];
        ConnectorProfile {
            kind,
            axis,
            base,
            tip: [base[0] * spec.taper_scale, base[1] * spec.taper_scale],
            depth: extents[axis.index()] * spec.connector_z_depth * clearance,
        }
    }
}

/// Footprint of a connector relative to the face it sits on.
fn footprint_scale(spec: &ConnectorSpec, axis: Axis) -> Real {
    match axis {
        Axis::Z => spec.base_xy_scale,
        Axis::X | Axis::Y => spec.connector_xy_scale,
    }
}

/// `value` on the two cross axes of `axis` and 1 along it.
fn cross_scale(axis: Axis, value: Real) -> Vector3<Real> {
    let mut scale = Vector3::repeat(value);
    scale[axis.index()] = 1.0;
    scale
}

/// Build the peg or socket for every axis of `volume` onto `mesh`, its box.
///
/// The cut face on each axis is found by its normal, `-sign * axis`, within
/// `normal_tolerance`. An axis with no matching face is skipped. Returns the
/// profiles of the connectors actually built.
pub fn add_connectors<S: Clone + Send + Sync + Debug>(
    mesh: &mut Mesh<S>,
    volume: &CuttingVolume,
    spec: &ConnectorSpec,
    normal_tolerance: Real,
) -> Vec<ConnectorProfile> {
    let mut built = Vec::with_capacity(3);

    for axis in Axis::ALL {
        let sign = volume.octant.sign(axis);
        let cut_normal = axis.unit() * -sign;

        // Several faces may share the normal once connectors exist; the box face is the largest
        let Some(face) = mesh
            .select_faces_by_normal(&cut_normal, normal_tolerance)
            .into_iter()
            .max_by(|&a, &b| {
                mesh.polygon_area(&mesh.polygons[a])
                    .total_cmp(&mesh.polygon_area(&mesh.polygons[b]))
            })
        else {
            log::debug!("{}: no cut face on the {} axis", volume.octant, axis);
            continue;
        };

        let kind = if sign > 0.0 {
            ConnectorKind::Peg
        } else {
            ConnectorKind::Socket
        };
        let profile = ConnectorProfile::new(spec, kind, axis, &volume.size);
        let clearance = match kind {
            ConnectorKind::Peg => 1.0,
            ConnectorKind::Socket => spec.clearance_scale,
        };

        let faces = [face];
        mesh.inset_faces(&faces, cross_scale(axis, footprint_scale(spec, axis) * clearance));
        match kind {
            ConnectorKind::Peg => mesh.extrude_faces(&faces, cut_normal * profile.depth),
            ConnectorKind::Socket => mesh.extrude_faces(&faces, -cut_normal * profile.depth),
        }
        mesh.scale_faces(&faces, cross_scale(axis, spec.taper_scale));
        if kind == ConnectorKind::Socket {
            // Open-ended recess; the boolean stage seals it again
            mesh.delete_faces(&faces);
        }

        log::debug!(
            "{}: {:?} on {} axis, base {:?}, depth {}",
            volume.octant,
            kind,
            axis,
            profile.base,
            profile.depth
        );
        built.push(profile);
    }

    built
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::parry3d::bounding_volume::Aabb;
    use crate::octant::{OCTANTS, partition};
    use nalgebra::Point3;

    fn unit_partition() -> crate::octant::Partition {
        let bounds = Aabb::new(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5));
        partition(&bounds, 1.1)
    }

    #[test]
    fn socket_is_clearance_times_peg() {
        let spec = ConnectorSpec::default();
        let extents = Vector3::new(0.55, 0.7, 0.9);
        for axis in Axis::ALL {
            let peg = ConnectorProfile::new(&spec, ConnectorKind::Peg, axis, &extents);
            let socket = ConnectorProfile::new(&spec, ConnectorKind::Socket, axis, &extents);
            for k in 0..2 {
                assert!((socket.base[k] / peg.base[k] - 1.05).abs() < 1e-12);
                assert!((socket.tip[k] / peg.tip[k] - 1.05).abs() < 1e-12);
            }
            assert!((socket.depth / peg.depth - 1.05).abs() < 1e-12);
        }
    }

    #[test]
    fn footprint_depends_on_axis() {
        let spec = ConnectorSpec::default();
        let extents = Vector3::repeat(0.6);
        let top = ConnectorProfile::new(&spec, ConnectorKind::Peg, Axis::Z, &extents);
        let side = ConnectorProfile::new(&spec, ConnectorKind::Peg, Axis::X, &extents);
        assert!((top.base[0] - 0.2).abs() < 1e-12);
        assert!((side.base[0] - 0.1).abs() < 1e-12);
        assert!((top.depth - 0.03).abs() < 1e-12);
        assert!((top.tip[1] - 0.18).abs() < 1e-12);
    }

    #[test]
    fn positive_octant_grows_three_pegs() {
        let p = unit_partition();
        let volume = &p.volumes[0];
        let mut mesh = volume.to_mesh::<()>();
        let spec = ConnectorSpec::default();
        let built = add_connectors(&mut mesh, volume, &spec, 1e-4);

        assert_eq!(built.len(), 3);
        assert!(built.iter().all(|c| c.kind == ConnectorKind::Peg));
        assert!(mesh.is_closed());

        // Pegs reach past the cut planes at the origin by their depth
        let bb = mesh.bounding_box();
        for axis in Axis::ALL {
            let depth = built.iter().find(|c| c.axis == axis).map(|c| c.depth).unwrap_or(0.0);
            assert!((bb.mins[axis.index()] + depth).abs() < 1e-9);
        }
        let box_volume = 0.55 * 0.55 * 0.55;
        assert!(mesh.signed_volume() > box_volume);
    }

    #[test]
    fn negative_octant_carves_open_sockets() {
        let p = unit_partition();
        let volume = &p.volumes[7];
        assert_eq!(volume.octant, OCTANTS[7]);
        let mut mesh = volume.to_mesh::<()>();
        let built = add_connectors(&mut mesh, volume, &ConnectorSpec::default(), 1e-4);

        assert_eq!(built.len(), 3);
        assert!(built.iter().all(|c| c.kind == ConnectorKind::Socket));
        // Nothing sticks out of the box
        let bb = mesh.bounding_box();
        assert!(bb.maxs.iter().all(|c| c.abs() < 1e-9));
        // Each deleted socket floor leaves a four-edge hole
        let open = mesh.edge_face_counts().values().filter(|&&c| c == 1).count();
        assert_eq!(open, 12);
    }

    #[test]
    fn peg_matches_socket_of_neighbour() {
        let p = unit_partition();
        let spec = ConnectorSpec::default();
        // Octants 0 (+,+,+) and 4 (-,+,+) meet on the X mid-plane
        let mut peg_side = p.volumes[0].to_mesh::<()>();
        let mut socket_side = p.volumes[4].to_mesh::<()>();
        let pegs = add_connectors(&mut peg_side, &p.volumes[0], &spec, 1e-4);
        let sockets = add_connectors(&mut socket_side, &p.volumes[4], &spec, 1e-4);

        let peg = pegs.iter().find(|c| c.axis == Axis::X).copied();
        let socket = sockets.iter().find(|c| c.axis == Axis::X).copied();
        let (Some(peg), Some(socket)) = (peg, socket) else {
            panic!("both sides should carry an X connector");
        };
        assert_eq!(peg.kind, ConnectorKind::Peg);
        assert_eq!(socket.kind, ConnectorKind::Socket);
        assert!(socket.depth > peg.depth);
        assert!((socket.base[0] / peg.base[0] - spec.clearance_scale).abs() < 1e-12);

        // Peg tip and socket floor both sit on the X side of the shared mid-plane
        assert!((peg_side.bounding_box().mins.x + peg.depth).abs() < 1e-9);
        let floor = socket_side
            .vertices
            .iter()
            .filter(|v| (v.pos.x + socket.depth).abs() < 1e-9)
            .count();
        assert_eq!(floor, 4);
    }
}
