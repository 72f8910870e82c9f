use super::atom::Water;
use nalgebra::{Point3, Vector3};

/// The solvent shell of a molecule.
///
/// A hydration layer is never edited in place; it is regenerated and swapped in as a whole,
/// which is what lets the histogram engine track it with a single dirty flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationLayer {
    waters: Vec<Water>,
}

impl HydrationLayer {
    pub fn new(waters: Vec<Water>) -> Self {
        Self { waters }
    }

    pub fn waters(&self) -> &[Water] {
        &self.waters
    }

    pub fn len(&self) -> usize {
        self.waters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Water> {
        self.waters.iter()
    }

    /// A copy of the layer shifted by `shift`.
    pub fn translated(&self, shift: &Vector3<f64>) -> Self {
        Self::new(
            self.waters
                .iter()
                .map(|w| Water::with_weight(w.position + shift, w.weight))
                .collect(),
        )
    }
}

/// Point cloud approximating the solvent displaced by the molecule.
///
/// Points are the centres of grid cells that belong to the molecular envelope. Cells on
/// the envelope boundary are kept separately so they can be weighted differently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExcludedVolume {
    pub interior: Vec<Point3<f64>>,
    pub surface: Vec<Point3<f64>>,
    pub interior_weight: f64,
    pub surface_weight: f64,
}

impl ExcludedVolume {
    pub fn len(&self) -> usize {
        self.interior.len() + self.surface.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interior.is_empty() && self.surface.is_empty()
    }

    /// Iterates over every point with its weight, interior points first.
    pub fn points(&self) -> impl Iterator<Item = (Point3<f64>, f64)> + '_ {
        self.interior
            .iter()
            .map(|p| (*p, self.interior_weight))
            .chain(self.surface.iter().map(|p| (*p, self.surface_weight)))
    }

    pub fn translated(&self, shift: &Vector3<f64>) -> Self {
        Self {
            interior: self.interior.iter().map(|p| p + shift).collect(),
            surface: self.surface.iter().map(|p| p + shift).collect(),
            ..*self
        }
    }
}
