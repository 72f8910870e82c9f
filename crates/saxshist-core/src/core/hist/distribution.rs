use super::compact::Evaluated;
use super::error::HistError;

/// Destination of evaluated atom pairs.
///
/// `ff_a` and `ff_b` are the form-factor indices of the two points; distributions without a
/// form-factor axis ignore them.
pub trait PairSink {
    fn record(&mut self, ff_a: u8, ff_b: u8, pair: &Evaluated) -> Result<(), HistError>;
}

fn check_len(expected: usize, found: usize) -> Result<(), HistError> {
    if expected != found {
        return Err(HistError::Size { expected, found });
    }
    Ok(())
}

fn add_slices(target: &mut [f64], other: &[f64]) {
    target.iter_mut().zip(other).for_each(|(t, o)| *t += o);
}

fn sub_slices(target: &mut [f64], other: &[f64]) {
    target.iter_mut().zip(other).for_each(|(t, o)| *t -= o);
}

/// Unweighted distance distribution: one accumulated weight per distance bin.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution1D {
    counts: Vec<f64>,
}

impl Distribution1D {
    pub fn new(bins: usize) -> Self {
        Self {
            counts: vec![0.0; bins],
        }
    }

    pub fn from_counts(counts: Vec<f64>) -> Self {
        Self { counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn into_counts(self) -> Vec<f64> {
        self.counts
    }

    #[inline]
    pub fn add(&mut self, bin: usize, value: f64) -> Result<(), HistError> {
        let len = self.counts.len();
        let slot = self
            .counts
            .get_mut(bin)
            .ok_or(HistError::Bounds { bin, len })?;
        *slot += value;
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Index of the last bin holding a non-zero value.
    pub fn last_nonzero(&self) -> Option<usize> {
        self.counts.iter().rposition(|&c| c != 0.0)
    }

    pub fn accumulate(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.len(), other.len())?;
        add_slices(&mut self.counts, &other.counts);
        Ok(())
    }

    pub fn subtract(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.len(), other.len())?;
        sub_slices(&mut self.counts, &other.counts);
        Ok(())
    }
}

impl PairSink for Distribution1D {
    #[inline]
    fn record(&mut self, _: u8, _: u8, pair: &Evaluated) -> Result<(), HistError> {
        self.add(pair.bin, pair.weight as f64)
    }
}

/// Distance distribution that also tracks where inside each bin the pairs actually fell.
///
/// Besides the accumulated weight, every bin keeps the number of pairs and the sum of their
/// exact distances, from which the mean distance of the bin is recovered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightedDistribution1D {
    content: Vec<f64>,
    tally: Vec<u64>,
    distance_sum: Vec<f64>,
}

impl WeightedDistribution1D {
    pub fn new(bins: usize) -> Self {
        Self {
            content: vec![0.0; bins],
            tally: vec![0; bins],
            distance_sum: vec![0.0; bins],
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn content(&self) -> &[f64] {
        &self.content
    }

    pub fn tally(&self) -> &[u64] {
        &self.tally
    }

    pub fn distance_sum(&self) -> &[f64] {
        &self.distance_sum
    }

    #[inline]
    pub fn add(&mut self, bin: usize, value: f64, distance: f64) -> Result<(), HistError> {
        let len = self.content.len();
        if bin >= len {
            return Err(HistError::Bounds { bin, len });
        }
        self.content[bin] += value;
        self.tally[bin] += 1;
        self.distance_sum[bin] += distance;
        Ok(())
    }

    /// Mean distance of the pairs in `bin`, or the nominal bin centre when the bin is empty.
    pub fn mean_distance(&self, bin: usize, width: f64) -> f64 {
        match self.tally.get(bin) {
            Some(&n) if n > 0 => self.distance_sum[bin] / n as f64,
            _ => bin as f64 * width,
        }
    }

    pub fn weighted_axis(&self, width: f64) -> Vec<f64> {
        (0..self.len()).map(|bin| self.mean_distance(bin, width)).collect()
    }

    pub fn to_counts(&self) -> Distribution1D {
        Distribution1D::from_counts(self.content.clone())
    }

    pub fn accumulate(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.len(), other.len())?;
        add_slices(&mut self.content, &other.content);
        add_slices(&mut self.distance_sum, &other.distance_sum);
        self.tally
            .iter_mut()
            .zip(&other.tally)
            .for_each(|(t, o)| *t += o);
        Ok(())
    }

    pub fn subtract(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.len(), other.len())?;
        sub_slices(&mut self.content, &other.content);
        sub_slices(&mut self.distance_sum, &other.distance_sum);
        self.tally
            .iter_mut()
            .zip(&other.tally)
            .for_each(|(t, o)| *t = t.saturating_sub(*o));
        Ok(())
    }
}

impl PairSink for WeightedDistribution1D {
    #[inline]
    fn record(&mut self, _: u8, _: u8, pair: &Evaluated) -> Result<(), HistError> {
        self.add(pair.bin, pair.weight as f64, pair.distance as f64)
    }
}

/// Distance distribution resolved by the form factor of one side of the pair.
///
/// Used for atom-water and atom-excluded-volume terms, where the other side has a fixed
/// form factor. Indexed as `[ff][bin]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution2D {
    rows: usize,
    bins: usize,
    data: Vec<f64>,
}

impl Distribution2D {
    pub fn new(rows: usize, bins: usize) -> Self {
        Self {
            rows,
            bins,
            data: vec![0.0; rows * bins],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn add(&mut self, row: usize, bin: usize, value: f64) -> Result<(), HistError> {
        if row >= self.rows {
            return Err(HistError::Bounds {
                bin: row,
                len: self.rows,
            });
        }
        if bin >= self.bins {
            return Err(HistError::Bounds {
                bin,
                len: self.bins,
            });
        }
        self.data[row * self.bins + bin] += value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.bins..(row + 1) * self.bins]
    }

    /// Sums over the form-factor axis.
    pub fn collapse(&self) -> Distribution1D {
        let mut counts = vec![0.0; self.bins];
        for row in self.data.chunks_exact(self.bins.max(1)) {
            add_slices(&mut counts, row);
        }
        Distribution1D::from_counts(counts)
    }

    pub fn accumulate(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.data.len(), other.data.len())?;
        add_slices(&mut self.data, &other.data);
        Ok(())
    }

    pub fn subtract(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.data.len(), other.data.len())?;
        sub_slices(&mut self.data, &other.data);
        Ok(())
    }
}

impl PairSink for Distribution2D {
    #[inline]
    fn record(&mut self, ff_a: u8, _: u8, pair: &Evaluated) -> Result<(), HistError> {
        self.add(ff_a as usize, pair.bin, pair.weight as f64)
    }
}

/// Distance distribution resolved by the form factors of both sides of the pair.
///
/// Indexed as `[ff_a][ff_b][bin]`. Pairs are recorded in the order they are evaluated, so
/// `[a][b]` and `[b][a]` together hold the contribution of an unordered class pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Distribution3D {
    classes: usize,
    bins: usize,
    data: Vec<f64>,
}

impl Distribution3D {
    pub fn new(classes: usize, bins: usize) -> Self {
        Self {
            classes,
            bins,
            data: vec![0.0; classes * classes * bins],
        }
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn add(&mut self, ff_a: usize, ff_b: usize, bin: usize, value: f64) -> Result<(), HistError> {
        for ff in [ff_a, ff_b] {
            if ff >= self.classes {
                return Err(HistError::Bounds {
                    bin: ff,
                    len: self.classes,
                });
            }
        }
        if bin >= self.bins {
            return Err(HistError::Bounds {
                bin,
                len: self.bins,
            });
        }
        self.data[(ff_a * self.classes + ff_b) * self.bins + bin] += value;
        Ok(())
    }

    pub fn slice(&self, ff_a: usize, ff_b: usize) -> &[f64] {
        let start = (ff_a * self.classes + ff_b) * self.bins;
        &self.data[start..start + self.bins]
    }

    /// Sums over both form-factor axes.
    pub fn collapse(&self) -> Distribution1D {
        let mut counts = vec![0.0; self.bins];
        for slice in self.data.chunks_exact(self.bins.max(1)) {
            add_slices(&mut counts, slice);
        }
        Distribution1D::from_counts(counts)
    }

    pub fn accumulate(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.data.len(), other.data.len())?;
        add_slices(&mut self.data, &other.data);
        Ok(())
    }

    pub fn subtract(&mut self, other: &Self) -> Result<(), HistError> {
        check_len(self.data.len(), other.data.len())?;
        sub_slices(&mut self.data, &other.data);
        Ok(())
    }
}

impl PairSink for Distribution3D {
    #[inline]
    fn record(&mut self, ff_a: u8, ff_b: u8, pair: &Evaluated) -> Result<(), HistError> {
        self.add(ff_a as usize, ff_b as usize, pair.bin, pair.weight as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(bin: usize, weight: f32, distance: f32) -> Evaluated {
        Evaluated {
            bin,
            weight,
            distance,
        }
    }

    #[test]
    fn add_out_of_range_bin_is_a_bounds_error() {
        let mut dist = Distribution1D::new(4);
        assert_eq!(
            dist.add(4, 1.0),
            Err(HistError::Bounds { bin: 4, len: 4 })
        );
        assert_eq!(dist.total(), 0.0);
    }

    #[test]
    fn accumulate_then_subtract_restores_original() {
        let mut master = Distribution1D::from_counts(vec![1.0, 2.0, 3.0]);
        let partial = Distribution1D::from_counts(vec![0.5, 0.0, 4.0]);
        master.accumulate(&partial).unwrap();
        assert_eq!(master.counts(), &[1.5, 2.0, 7.0]);
        master.subtract(&partial).unwrap();
        assert_eq!(master.counts(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn mismatched_lengths_are_a_size_error() {
        let mut a = Distribution1D::new(3);
        let b = Distribution1D::new(4);
        assert_eq!(
            a.accumulate(&b),
            Err(HistError::Size {
                expected: 3,
                found: 4
            })
        );
    }

    #[test]
    fn last_nonzero_finds_trailing_content() {
        let dist = Distribution1D::from_counts(vec![0.0, 1.0, 0.0, 2.0, 0.0]);
        assert_eq!(dist.last_nonzero(), Some(3));
        assert_eq!(Distribution1D::new(3).last_nonzero(), None);
    }

    #[test]
    fn weighted_distribution_tracks_mean_distance() {
        let mut dist = WeightedDistribution1D::new(4);
        dist.record(0, 0, &pair(2, 1.0, 0.9)).unwrap();
        dist.record(0, 0, &pair(2, 3.0, 1.1)).unwrap();
        assert_eq!(dist.content()[2], 4.0);
        assert_eq!(dist.tally()[2], 2);
        assert!((dist.mean_distance(2, 0.5) - 1.0).abs() < 1e-6);
        assert_eq!(dist.mean_distance(3, 0.5), 1.5);
    }

    #[test]
    fn weighted_subtract_removes_tally_and_distance() {
        let mut master = WeightedDistribution1D::new(2);
        let mut partial = WeightedDistribution1D::new(2);
        partial.add(1, 2.0, 0.75).unwrap();
        master.accumulate(&partial).unwrap();
        master.subtract(&partial).unwrap();
        assert_eq!(master.tally(), &[0, 0]);
        assert_eq!(master.content(), &[0.0, 0.0]);
        assert_eq!(master.weighted_axis(0.5), vec![0.0, 0.5]);
    }

    #[test]
    fn distribution2d_collapses_over_form_factor_axis() {
        let mut dist = Distribution2D::new(3, 2);
        dist.record(0, 5, &pair(1, 1.0, 0.0)).unwrap();
        dist.record(2, 5, &pair(1, 2.0, 0.0)).unwrap();
        dist.record(2, 5, &pair(0, 1.0, 0.0)).unwrap();
        assert_eq!(dist.row(2), &[1.0, 2.0]);
        assert_eq!(dist.collapse().counts(), &[1.0, 3.0]);
        assert!(dist.add(3, 0, 1.0).is_err());
    }

    #[test]
    fn distribution3d_keeps_class_pairs_apart() {
        let mut dist = Distribution3D::new(2, 3);
        dist.record(0, 1, &pair(2, 1.0, 0.0)).unwrap();
        dist.record(1, 0, &pair(2, 1.0, 0.0)).unwrap();
        dist.record(1, 1, &pair(0, 5.0, 0.0)).unwrap();
        assert_eq!(dist.slice(0, 1), &[0.0, 0.0, 1.0]);
        assert_eq!(dist.slice(1, 0), &[0.0, 0.0, 1.0]);
        assert_eq!(dist.collapse().counts(), &[5.0, 0.0, 2.0]);
        assert!(dist.add(0, 0, 3, 1.0).is_err());
    }
}
