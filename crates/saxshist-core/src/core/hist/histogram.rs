use super::axis::Axis;
use super::error::{ExportError, HistError};
use super::profile::{ScatteringProfile, write_rows};
use crate::core::table::sinc::SincTable;
use serde::Serialize;
use std::path::Path;

/// Histograms are never trimmed below this many bins.
pub const MIN_BINS: usize = 10;

/// Number of bins to keep so that every non-zero bin survives, bounded below by [`MIN_BINS`].
pub(crate) fn effective_bins(last_nonzero: Option<usize>, len: usize) -> usize {
    last_nonzero
        .map_or(0, |last| last + 1)
        .max(MIN_BINS)
        .min(len)
}

#[derive(Serialize)]
struct HistogramRow {
    distance: f64,
    count: f64,
}

/// A plain distance histogram: one count per distance bin plus the distance each bin stands for.
///
/// For unweighted histograms the distances are the nominal bin centres; weighted histograms
/// carry the mean distance of the pairs that fell into each bin.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceHistogram {
    d_axis: Axis,
    counts: Vec<f64>,
    distances: Vec<f64>,
}

impl DistanceHistogram {
    pub fn new(d_axis: Axis, counts: Vec<f64>) -> Result<Self, HistError> {
        let distances = d_axis.values();
        Self::with_distances(d_axis, counts, distances)
    }

    pub fn with_distances(
        d_axis: Axis,
        counts: Vec<f64>,
        distances: Vec<f64>,
    ) -> Result<Self, HistError> {
        for found in [counts.len(), distances.len()] {
            if found != d_axis.bins {
                return Err(HistError::Size {
                    expected: d_axis.bins,
                    found,
                });
            }
        }
        Ok(Self {
            d_axis,
            counts,
            distances,
        })
    }

    pub fn d_axis(&self) -> &Axis {
        &self.d_axis
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Drops trailing empty bins, keeping at least [`MIN_BINS`].
    pub fn trimmed(&self) -> Self {
        let last = self.counts.iter().rposition(|&c| c != 0.0);
        let bins = effective_bins(last, self.counts.len());
        Self {
            d_axis: self.d_axis.truncated(bins),
            counts: self.counts[..bins].to_vec(),
            distances: self.distances[..bins].to_vec(),
        }
    }

    /// Debye transform on `q_axis`, tabulating sinc over this histogram's distances.
    pub fn debye_transform(&self, q_axis: &Axis) -> ScatteringProfile {
        let q = q_axis.values();
        let table = SincTable::new(&q, &self.distances);
        let intensity = (0..q.len())
            .map(|qi| dot(&self.counts, table.row(qi)))
            .collect();
        ScatteringProfile::new(q, intensity)
    }

    /// Debye transform with a precomputed table whose d entries match this histogram's bins.
    pub fn debye_transform_with(
        &self,
        q_values: &[f64],
        table: &SincTable,
    ) -> Result<ScatteringProfile, HistError> {
        if table.q_len() != q_values.len() {
            return Err(HistError::Size {
                expected: q_values.len(),
                found: table.q_len(),
            });
        }
        if table.d_len() < self.counts.len() {
            return Err(HistError::Size {
                expected: self.counts.len(),
                found: table.d_len(),
            });
        }
        let intensity = (0..q_values.len())
            .map(|qi| dot(&self.counts, table.row(qi)))
            .collect();
        Ok(ScatteringProfile::new(q_values.to_vec(), intensity))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        write_rows(
            path,
            self.distances
                .iter()
                .zip(&self.counts)
                .map(|(&distance, &count)| HistogramRow { distance, count }),
        )
    }
}

/// Inner product over the shorter of the two slices.
#[inline]
pub(crate) fn dot(counts: &[f64], sinc_row: &[f64]) -> f64 {
    counts.iter().zip(sinc_row).map(|(c, s)| c * s).sum()
}
