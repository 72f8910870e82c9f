use super::compact::{CompactCoordinates, KernelWidth, scan_cross, scan_self};
use super::distribution::{Distribution1D, Distribution2D, Distribution3D, WeightedDistribution1D};
use super::error::HistError;
use crate::core::form_factor::FormFactorType;

/// Layout of a partial accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartialShape {
    Counts,
    Weighted,
    PerFormFactor,
    PerFormFactorPair,
}

/// The distance-bin contribution of one body, one body pair, or one solvent term.
///
/// Partials are the unit the histogram engine caches and swaps: a master accumulator of the
/// same shape absorbs a fresh partial and sheds the stale one it replaces.
#[derive(Debug, Clone, PartialEq)]
pub enum Partial {
    Counts(Distribution1D),
    Weighted(WeightedDistribution1D),
    PerFormFactor(Distribution2D),
    PerFormFactorPair(Distribution3D),
}

impl Partial {
    pub fn new(shape: PartialShape, bins: usize) -> Self {
        match shape {
            PartialShape::Counts => Partial::Counts(Distribution1D::new(bins)),
            PartialShape::Weighted => Partial::Weighted(WeightedDistribution1D::new(bins)),
            PartialShape::PerFormFactor => {
                Partial::PerFormFactor(Distribution2D::new(FormFactorType::COUNT, bins))
            }
            PartialShape::PerFormFactorPair => {
                Partial::PerFormFactorPair(Distribution3D::new(FormFactorType::COUNT, bins))
            }
        }
    }

    pub fn shape(&self) -> PartialShape {
        match self {
            Partial::Counts(_) => PartialShape::Counts,
            Partial::Weighted(_) => PartialShape::Weighted,
            Partial::PerFormFactor(_) => PartialShape::PerFormFactor,
            Partial::PerFormFactorPair(_) => PartialShape::PerFormFactorPair,
        }
    }

    /// Accumulates all pairs within `data`.
    pub fn scan_self(
        &mut self,
        data: &CompactCoordinates,
        inv_width: f32,
        width: KernelWidth,
    ) -> Result<(), HistError> {
        match self {
            Partial::Counts(d) => scan_self(data, inv_width, width, d),
            Partial::Weighted(d) => scan_self(data, inv_width, width, d),
            Partial::PerFormFactor(d) => scan_self(data, inv_width, width, d),
            Partial::PerFormFactorPair(d) => scan_self(data, inv_width, width, d),
        }
    }

    /// Accumulates all pairs between `first` and `second`.
    pub fn scan_cross(
        &mut self,
        first: &CompactCoordinates,
        second: &CompactCoordinates,
        inv_width: f32,
        width: KernelWidth,
    ) -> Result<(), HistError> {
        match self {
            Partial::Counts(d) => scan_cross(first, second, inv_width, width, d),
            Partial::Weighted(d) => scan_cross(first, second, inv_width, width, d),
            Partial::PerFormFactor(d) => scan_cross(first, second, inv_width, width, d),
            Partial::PerFormFactorPair(d) => scan_cross(first, second, inv_width, width, d),
        }
    }

    pub fn accumulate(&mut self, other: &Partial) -> Result<(), HistError> {
        match (self, other) {
            (Partial::Counts(a), Partial::Counts(b)) => a.accumulate(b),
            (Partial::Weighted(a), Partial::Weighted(b)) => a.accumulate(b),
            (Partial::PerFormFactor(a), Partial::PerFormFactor(b)) => a.accumulate(b),
            (Partial::PerFormFactorPair(a), Partial::PerFormFactorPair(b)) => a.accumulate(b),
            _ => Err(HistError::InvalidOperation(
                "cannot combine partials of different shapes",
            )),
        }
    }

    pub fn subtract(&mut self, other: &Partial) -> Result<(), HistError> {
        match (self, other) {
            (Partial::Counts(a), Partial::Counts(b)) => a.subtract(b),
            (Partial::Weighted(a), Partial::Weighted(b)) => a.subtract(b),
            (Partial::PerFormFactor(a), Partial::PerFormFactor(b)) => a.subtract(b),
            (Partial::PerFormFactorPair(a), Partial::PerFormFactorPair(b)) => a.subtract(b),
            _ => Err(HistError::InvalidOperation(
                "cannot combine partials of different shapes",
            )),
        }
    }

    /// Sums away any form-factor axes.
    pub fn collapse(&self) -> Distribution1D {
        match self {
            Partial::Counts(d) => d.clone(),
            Partial::Weighted(d) => d.to_counts(),
            Partial::PerFormFactor(d) => d.collapse(),
            Partial::PerFormFactorPair(d) => d.collapse(),
        }
    }

    pub fn total(&self) -> f64 {
        self.collapse().total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;

    fn line(n: usize, offset: f64) -> CompactCoordinates {
        CompactCoordinates::from_atoms(
            (0..n).map(|i| Atom::new(Point3::new(offset + i as f64, 0.0, 0.0), 1.0)),
        )
    }

    #[test]
    fn every_shape_collapses_to_the_same_counts() {
        let a = line(5, 0.0);
        let b = line(3, 10.0);
        let shapes = [
            PartialShape::Counts,
            PartialShape::Weighted,
            PartialShape::PerFormFactor,
            PartialShape::PerFormFactorPair,
        ];
        let results: Vec<Distribution1D> = shapes
            .iter()
            .map(|&shape| {
                let mut partial = Partial::new(shape, 64);
                partial.scan_self(&a, 4.0, KernelWidth::Octo).unwrap();
                partial.scan_cross(&a, &b, 4.0, KernelWidth::Octo).unwrap();
                assert_eq!(partial.shape(), shape);
                partial.collapse()
            })
            .collect();
        for result in &results[1..] {
            assert_eq!(result, &results[0]);
        }
        assert_eq!(results[0].total(), (10 + 15) as f64);
    }

    #[test]
    fn combining_different_shapes_is_rejected() {
        let mut counts = Partial::new(PartialShape::Counts, 4);
        let weighted = Partial::new(PartialShape::Weighted, 4);
        assert!(counts.accumulate(&weighted).is_err());
        assert!(counts.subtract(&weighted).is_err());
    }
}
