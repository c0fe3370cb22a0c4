//! [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree node structure and operations
//!
//! Trees are walked with explicit stacks so that deep, unbalanced trees built
//! from finely tessellated input cannot exhaust the thread stack.

use crate::float_types::{Real, tolerance};
use crate::mesh::plane::{BACK, COPLANAR, FRONT, Plane};
use crate::mesh::polygon::Polygon;
use std::fmt::Debug;

/// A [BSP](https://en.wikipedia.org/wiki/Binary_space_partitioning) tree node, containing polygons plus optional front/back subtrees
#[derive(Debug, Clone)]
pub struct Node<S: Clone> {
    /// Splitting plane for this node *or* **None** for a leaf that
    /// only stores polygons.
    pub plane: Option<Plane>,

    /// Polygons in *front* half‑spaces.
    pub front: Option<Box<Node<S>>>,

    /// Polygons in *back* half‑spaces.
    pub back: Option<Box<Node<S>>>,

    /// Polygons that lie on `plane` (after the node has been built).
    pub polygons: Vec<Polygon<S>>,
}

/// Trait for picking the splitting plane of a node
pub trait SplittingPlaneStrategy<S: Clone> {
    /// Pick the best splitting plane from a non-empty set of polygons
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane;
}

/// Scores a sample of candidate planes by how many polygons they span and
/// how evenly they divide the rest.
#[derive(Debug, Clone, Copy)]
pub struct BalancedSplittingStrategy {
    pub span_weight: Real,
    pub balance_weight: Real,
    pub sample_size: usize,
}

impl Default for BalancedSplittingStrategy {
    fn default() -> Self {
        Self {
            span_weight: 8.0,
            balance_weight: 1.0,
            sample_size: 20,
        }
    }
}

impl<S: Clone + Send + Sync + Debug> SplittingPlaneStrategy<S> for BalancedSplittingStrategy {
    fn pick_best_splitting_plane(&self, polygons: &[Polygon<S>]) -> Plane {
        let mut best_plane = polygons[0].plane.clone();
        let mut best_score = Real::MAX;

        for candidate in polygons.iter().take(self.sample_size) {
            let plane = &candidate.plane;
            let (num_front, num_back, num_spanning) = polygons
                .iter()
                .map(|poly| match plane.classify_polygon(poly) {
                    COPLANAR => (0, 0, 0),
                    FRONT => (1, 0, 0),
                    BACK => (0, 1, 0),
                    _ => (0, 0, 1),
                })
                .fold((0i64, 0i64, 0i64), |acc, x| {
                    (acc.0 + x.0, acc.1 + x.1, acc.2 + x.2)
                });

            let score = self.span_weight * num_spanning as Real
                + self.balance_weight * ((num_front - num_back) as Real).abs();

            if score < best_score {
                best_score = score;
                best_plane = plane.clone();
            }
        }

        best_plane
    }
}

/// Two planes describing the same oriented surface within tolerance.
fn same_plane(a: &Plane, b: &Plane) -> bool {
    let eps = tolerance();
    (a.normal - b.normal).norm() < eps && (a.w - b.w).abs() < eps
}

impl<S: Clone + Send + Sync + Debug> Default for Node<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone + Send + Sync + Debug> Node<S> {
    /// Create a new empty BSP node
    pub const fn new() -> Self {
        Self {
            plane: None,
            front: None,
            back: None,
            polygons: Vec::new(),
        }
    }

    /// Creates a new BSP node from polygons
    pub fn from_polygons(polygons: &[Polygon<S>]) -> Self {
        let mut node = Self::new();
        if !polygons.is_empty() {
            node.build(polygons);
        }
        node
    }

    /// Invert all polygons in the BSP tree, turning solid into empty space.
    pub fn invert(&mut self) {
        let mut stack = vec![self];

        while let Some(current) = stack.pop() {
            current.polygons.iter_mut().for_each(|p| p.flip());
            if let Some(ref mut plane) = current.plane {
                plane.flip();
            }

            std::mem::swap(&mut current.front, &mut current.back);

            if let Some(ref mut front) = current.front {
                stack.push(front.as_mut());
            }
            if let Some(ref mut back) = current.back {
                stack.push(back.as_mut());
            }
        }
    }

    /// Remove every part of `polygons` that lies inside the solid this tree describes.
    ///
    /// Coplanar fragments follow their facing: same-facing fragments are treated
    /// as front, opposite-facing as back.
    pub fn clip_polygons(&self, polygons: &[Polygon<S>]) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack: Vec<(&Node<S>, Vec<Polygon<S>>)> = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            let Some(plane) = node.plane.as_ref() else {
                result.extend(polys);
                continue;
            };

            let mut front_polys = Vec::with_capacity(polys.len());
            let mut back_polys = Vec::with_capacity(polys.len());

            for polygon in &polys {
                let (coplanar_front, coplanar_back, front_parts, back_parts) =
                    plane.split_polygon(polygon);
                front_polys.extend(coplanar_front);
                front_polys.extend(front_parts);
                back_polys.extend(coplanar_back);
                back_polys.extend(back_parts);
            }

            match &node.front {
                Some(front) => stack.push((front.as_ref(), front_polys)),
                None => result.extend(front_polys),
            }

            // Without a back subtree the back half-space is solid: drop them
            if let Some(back) = &node.back {
                stack.push((back.as_ref(), back_polys));
            }
        }

        result
    }

    /// Remove all polygons in this BSP tree that are inside the other BSP tree
    pub fn clip_to(&mut self, other: &Node<S>) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            node.polygons = other.clip_polygons(&node.polygons);
            if let Some(ref mut front) = node.front {
                stack.push(front.as_mut());
            }
            if let Some(ref mut back) = node.back {
                stack.push(back.as_mut());
            }
        }
    }

    /// Return all polygons in this BSP tree
    pub fn all_polygons(&self) -> Vec<Polygon<S>> {
        let mut result = Vec::new();
        let mut stack = vec![self];

        while let Some(current) = stack.pop() {
            result.extend_from_slice(&current.polygons);

            stack.extend(
                [&current.front, &current.back]
                    .iter()
                    .filter_map(|child| child.as_ref().map(|boxed| boxed.as_ref())),
            );
        }
        result
    }

    /// Build (or extend) the tree from `polygons` with the default strategy.
    pub fn build(&mut self, polygons: &[Polygon<S>]) {
        self.build_with(polygons, &BalancedSplittingStrategy::default());
    }

    /// Build (or extend) the tree from `polygons`, choosing new splitting
    /// planes with `strategy`.
    pub fn build_with<SP: SplittingPlaneStrategy<S>>(
        &mut self,
        polygons: &[Polygon<S>],
        strategy: &SP,
    ) {
        let mut stack: Vec<(&mut Node<S>, Vec<Polygon<S>>)> = vec![(self, polygons.to_vec())];

        while let Some((node, polys)) = stack.pop() {
            if polys.is_empty() {
                continue;
            }

            let plane = node
                .plane
                .get_or_insert_with(|| strategy.pick_best_splitting_plane(&polys))
                .clone();

            let mut front = Vec::with_capacity(polys.len() / 2);
            let mut back = Vec::with_capacity(polys.len() / 2);

            for polygon in &polys {
                // A polygon always lands on its own plane, even when it is
                // slightly non-planar, or the recursion would never end
                if same_plane(&polygon.plane, &plane) {
                    node.polygons.push(polygon.clone());
                    continue;
                }
                let (coplanar_front, coplanar_back, front_parts, back_parts) =
                    plane.split_polygon(polygon);
                node.polygons.extend(coplanar_front);
                node.polygons.extend(coplanar_back);
                front.extend(front_parts);
                back.extend(back_parts);
            }

            if !front.is_empty() {
                let child = node.front.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((child.as_mut(), front));
            }
            if !back.is_empty() {
                let child = node.back.get_or_insert_with(|| Box::new(Node::new()));
                stack.push((child.as_mut(), back));
            }
        }
    }
}

/// Solid intersection `a ∩ b` of two closed polygon sets.
pub fn intersect<S: Clone + Send + Sync + Debug>(
    a: &[Polygon<S>],
    b: &[Polygon<S>],
) -> Vec<Polygon<S>> {
    let mut a = Node::from_polygons(a);
    let mut b = Node::from_polygons(b);

    a.invert();
    b.clip_to(&a);
    b.invert();
    a.clip_to(&b);
    b.clip_to(&a);
    a.build(&b.all_polygons());
    a.invert();
    a.all_polygons()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use nalgebra::{Point3, Vector3};

    fn cube_polys(center: Point3<Real>, size: Real) -> Vec<Polygon<()>> {
        Mesh::<()>::cuboid(center, Vector3::repeat(size), None).to_polygons()
    }

    fn soup_volume(polys: &[Polygon<()>]) -> Real {
        // Divergence theorem over a fan of each polygon
        polys
            .iter()
            .map(|p| {
                let o = p.vertices[0].pos.coords;
                (1..p.vertices.len() - 1)
                    .map(|i| {
                        o.dot(&p.vertices[i].pos.coords.cross(&p.vertices[i + 1].pos.coords))
                    })
                    .sum::<Real>()
            })
            .sum::<Real>()
            / 6.0
    }

    #[test]
    fn invert_twice_restores_orientation() {
        let polys = cube_polys(Point3::origin(), 2.0);
        let mut node = Node::from_polygons(&polys);
        let before = soup_volume(&node.all_polygons());
        node.invert();
        assert!((soup_volume(&node.all_polygons()) + before).abs() < 1e-9);
        node.invert();
        assert!((soup_volume(&node.all_polygons()) - before).abs() < 1e-9);
    }

    #[test]
    fn clip_polygons_drops_inside_fragments() {
        let tree = Node::from_polygons(&cube_polys(Point3::origin(), 2.0));
        let inside = cube_polys(Point3::origin(), 1.0);
        assert!(tree.clip_polygons(&inside).is_empty());

        let outside = cube_polys(Point3::new(5.0, 0.0, 0.0), 1.0);
        assert_eq!(tree.clip_polygons(&outside).len(), outside.len());
    }

    #[test]
    fn overlapping_cubes_intersect_to_box() {
        let a = cube_polys(Point3::origin(), 2.0);
        let b = cube_polys(Point3::new(1.0, 1.0, 1.0), 2.0);
        let result = intersect(&a, &b);
        // Overlap is the unit cube [0,1]^3
        assert!((soup_volume(&result) - 1.0).abs() < 1e-6);
        for p in &result {
            for v in &p.vertices {
                assert!(v.pos.iter().all(|c| *c > -1e-6 && *c < 1.0 + 1e-6));
            }
        }
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let a = cube_polys(Point3::origin(), 1.0);
        let b = cube_polys(Point3::new(3.0, 0.0, 0.0), 1.0);
        assert!(intersect(&a, &b).is_empty());
    }
}
