use serde::Deserialize;

/// A uniformly binned axis over `[min, max)`.
///
/// Bin `i` is represented by the value `min + i * width`. Distance axes start at zero, so
/// a distance `d` lands in bin `round(d / width)` and bin `i` is centred on `i * width`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Axis {
    pub min: f64,
    pub max: f64,
    pub bins: usize,
}

impl Axis {
    pub fn new(min: f64, max: f64, bins: usize) -> Self {
        Self { min, max, bins }
    }

    /// Distance axis starting at zero with the given bin width, covering at least `max_distance`.
    pub fn distance(bin_width: f64, max_distance: f64) -> Self {
        let bins = (max_distance / bin_width).ceil() as usize + 1;
        Self {
            min: 0.0,
            max: bins as f64 * bin_width,
            bins,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        if self.bins == 0 {
            return 0.0;
        }
        (self.max - self.min) / self.bins as f64
    }

    #[inline]
    pub fn value(&self, index: usize) -> f64 {
        self.min + index as f64 * self.width()
    }

    pub fn values(&self) -> Vec<f64> {
        (0..self.bins).map(|i| self.value(i)).collect()
    }

    /// The first `bins` bins of this axis.
    pub fn truncated(&self, bins: usize) -> Self {
        let bins = bins.min(self.bins);
        Self {
            min: self.min,
            max: self.min + bins as f64 * self.width(),
            bins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_axis_starts_at_zero_with_requested_width() {
        let axis = Axis::distance(0.25, 10.0);
        assert_eq!(axis.min, 0.0);
        assert_eq!(axis.bins, 41);
        assert!((axis.width() - 0.25).abs() < 1e-12);
        assert!((axis.value(8) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn values_cover_every_bin() {
        let axis = Axis::new(0.0, 1.0, 4);
        assert_eq!(axis.values(), vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn truncated_keeps_width() {
        let axis = Axis::distance(0.5, 100.0).truncated(10);
        assert_eq!(axis.bins, 10);
        assert!((axis.width() - 0.5).abs() < 1e-12);
        assert_eq!(Axis::new(0.0, 1.0, 4).truncated(100).bins, 4);
    }

    #[test]
    fn zero_bin_axis_has_zero_width() {
        assert_eq!(Axis::new(0.0, 1.0, 0).width(), 0.0);
    }
}
