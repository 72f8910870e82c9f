use crate::core::form_factor::FormFactorType;
use nalgebra::Point3;

/// A weighted point scatterer belonging to exactly one rigid body.
///
/// The weight is the product of charge and occupancy. The form-factor class is optional:
/// it is only required by the form-factor resolved histograms and by the van der Waals
/// radius model of the voxel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// Position in Angstroms, expressed in the coordinate frame of the owning body.
    pub position: Point3<f64>,
    /// Scattering weight.
    pub weight: f64,
    /// Scattering class, if known.
    pub form_factor: Option<FormFactorType>,
}

impl Atom {
    pub fn new(position: Point3<f64>, weight: f64) -> Self {
        Self {
            position,
            weight,
            form_factor: None,
        }
    }

    pub fn with_form_factor(position: Point3<f64>, weight: f64, form_factor: FormFactorType) -> Self {
        Self {
            position,
            weight,
            form_factor: Some(form_factor),
        }
    }

    /// Creates an atom whose class is resolved from its element symbol.
    ///
    /// Unknown symbols leave the class unset.
    pub fn from_element(position: Point3<f64>, weight: f64, symbol: &str) -> Self {
        Self {
            position,
            weight,
            form_factor: FormFactorType::from_symbol(symbol),
        }
    }
}

/// A solvent pseudo-atom of the hydration layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Water {
    pub position: Point3<f64>,
    pub weight: f64,
}

impl Water {
    pub const DEFAULT_WEIGHT: f64 = 1.0;

    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            weight: Self::DEFAULT_WEIGHT,
        }
    }

    pub fn with_weight(position: Point3<f64>, weight: f64) -> Self {
        Self { position, weight }
    }
}
