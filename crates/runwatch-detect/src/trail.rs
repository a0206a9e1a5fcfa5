//! Recent centroid positions for trail overlays.

use std::collections::VecDeque;

use runwatch_models::Point2;

/// Bounded FIFO of centroid positions, oldest first.
///
/// Rendering only; detection never reads it.
#[derive(Debug, Clone)]
pub struct PathHistory {
    points: VecDeque<Point2>,
    capacity: usize,
}

impl PathHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: Point2) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point2> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&Point2> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_fifo() {
        let mut trail = PathHistory::new(15);
        for i in 0..20 {
            trail.push(Point2::new(i as f64 / 20.0, 0.5));
        }
        assert_eq!(trail.len(), 15);
        assert_eq!(trail.iter().next().unwrap().x, 5.0 / 20.0);
        assert_eq!(trail.latest().unwrap().x, 19.0 / 20.0);
    }
}
