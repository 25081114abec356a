//! Minimum-spacing queries for sampled points
//!
//! With the `spatial-index` feature (default) accepted points live in a
//! kiddo KD-tree; without it a linear scan gives the same answers.

use glam::Vec2;

#[cfg(feature = "spatial-index")]
use kiddo::{KdTree, SquaredEuclidean};

/// Incrementally built set of XZ points with a minimum spacing
///
/// Used during path node sampling to reject candidates that crowd an
/// already accepted node.
///
/// # Performance
///
/// - Insert: O(log n) with the KD-tree, O(1) without
/// - Query: O(log n) with the KD-tree, O(n) without
///
/// # Example
///
/// ```
/// use procedural_island::SpacingIndex;
/// use glam::Vec2;
///
/// let mut index = SpacingIndex::new(2.0);
/// assert!(index.try_insert(Vec2::new(0.0, 0.0)));
/// assert!(!index.try_insert(Vec2::new(1.0, 1.0)));
/// assert!(index.try_insert(Vec2::new(3.0, 0.0)));
/// assert_eq!(index.len(), 2);
/// ```
#[derive(Clone)]
pub struct SpacingIndex {
    min_distance: f32,
    points: Vec<Vec2>,
    #[cfg(feature = "spatial-index")]
    tree: KdTree<f32, 2>,
}

impl SpacingIndex {
    /// Index rejecting points closer than `min_distance` (0 accepts all)
    pub fn new(min_distance: f32) -> Self {
        Self {
            min_distance: min_distance.max(0.0),
            points: Vec::new(),
            #[cfg(feature = "spatial-index")]
            tree: KdTree::new(),
        }
    }

    #[inline]
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Distance to the closest accepted point, if any
    pub fn nearest_distance(&self, p: Vec2) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }

        #[cfg(feature = "spatial-index")]
        {
            let nearest = self.tree.nearest_one::<SquaredEuclidean>(&[p.x, p.y]);
            Some(nearest.distance.sqrt())
        }

        #[cfg(not(feature = "spatial-index"))]
        {
            self.points.iter().map(|q| q.distance(p)).reduce(f32::min)
        }
    }

    /// Whether `p` keeps the minimum spacing to every accepted point
    pub fn is_clear(&self, p: Vec2) -> bool {
        self.min_distance <= 0.0 || self.nearest_distance(p).map_or(true, |d| d >= self.min_distance)
    }

    /// Accept `p` if it is clear; returns whether it was inserted
    pub fn try_insert(&mut self, p: Vec2) -> bool {
        if !self.is_clear(p) {
            return false;
        }
        #[cfg(feature = "spatial-index")]
        self.tree.add(&[p.x, p.y], self.points.len() as u64);
        self.points.push(p);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_rejects_close_points() {
        let mut index = SpacingIndex::new(1.5);
        assert!(index.try_insert(Vec2::ZERO));
        assert!(!index.try_insert(Vec2::new(1.0, 0.0)));
        assert!(index.try_insert(Vec2::new(1.5, 0.0)));
        assert!(!index.is_clear(Vec2::new(0.75, 0.1)));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_nearest_distance() {
        let mut index = SpacingIndex::new(0.0);
        assert_eq!(index.nearest_distance(Vec2::ZERO), None);
        for p in [Vec2::new(3.0, 4.0), Vec2::new(-10.0, 0.0), Vec2::new(0.0, 20.0)] {
            index.try_insert(p);
        }
        assert!((index.nearest_distance(Vec2::ZERO).unwrap() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_spacing_accepts_duplicates() {
        let mut index = SpacingIndex::new(0.0);
        assert!(index.try_insert(Vec2::ONE));
        assert!(index.try_insert(Vec2::ONE));
        assert_eq!(index.len(), 2);
    }
}
