//! Moving average over the most recent cent deviations, used to steady the
//! needle display. The window is allocated once; pushing never reallocates.

use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct CentSmoother {
    window: VecDeque<f64>,
    capacity: usize,
}

impl CentSmoother {
    /// Default number of samples averaged.
    pub const DEFAULT_WINDOW: usize = 5;

    /// Creates a smoother averaging up to `capacity` values (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Adds a value, evicting the oldest once the window is full.
    pub fn push(&mut self, cents: f64) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(cents);
    }

    /// Mean of the buffered values, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CentSmoother {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_mean() {
        assert_eq!(CentSmoother::default().mean(), None);
    }

    #[test]
    fn test_mean_of_partial_window() {
        let mut smoother = CentSmoother::new(5);
        smoother.push(10.0);
        smoother.push(20.0);
        assert_eq!(smoother.mean(), Some(15.0));
    }

    #[test]
    fn test_oldest_value_evicted() {
        let mut smoother = CentSmoother::new(3);
        for cents in [100.0, 1.0, 2.0, 3.0] {
            smoother.push(cents);
        }
        assert_eq!(smoother.len(), 3);
        assert_eq!(smoother.mean(), Some(2.0));
    }

    #[test]
    fn test_clear() {
        let mut smoother = CentSmoother::new(3);
        smoother.push(4.0);
        smoother.clear();
        assert!(smoother.is_empty());
        assert_eq!(smoother.mean(), None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut smoother = CentSmoother::new(0);
        assert_eq!(smoother.capacity(), 1);
        smoother.push(1.0);
        smoother.push(7.0);
        assert_eq!(smoother.mean(), Some(7.0));
    }
}
