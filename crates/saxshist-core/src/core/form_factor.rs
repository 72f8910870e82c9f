use phf::phf_map;
use serde::Deserialize;
use std::f64::consts::PI;

/// Average atomic radius used to shape the excluded-volume form factor, in Angstroms.
pub const AVERAGE_ATOMIC_RADIUS: f64 = 1.62;

/// Scattering classes an atom can be assigned to.
///
/// The class decides both the Gaussian form factor used in form-factor resolved
/// histograms and the van der Waals radius used when an atom is placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactorType {
    Hydrogen,
    Carbon,
    Nitrogen,
    Oxygen,
    Sulfur,
    Other,
}

static ELEMENT_CLASSES: phf::Map<&'static str, FormFactorType> = phf_map! {
    "H" => FormFactorType::Hydrogen,
    "D" => FormFactorType::Hydrogen,
    "C" => FormFactorType::Carbon,
    "N" => FormFactorType::Nitrogen,
    "O" => FormFactorType::Oxygen,
    "S" => FormFactorType::Sulfur,
    "P" => FormFactorType::Other,
    "SE" => FormFactorType::Other,
    "FE" => FormFactorType::Other,
    "ZN" => FormFactorType::Other,
    "MG" => FormFactorType::Other,
    "CA" => FormFactorType::Other,
    "NA" => FormFactorType::Other,
    "K" => FormFactorType::Other,
    "CL" => FormFactorType::Other,
    "MN" => FormFactorType::Other,
    "CU" => FormFactorType::Other,
    "AR" => FormFactorType::Other,
};

impl FormFactorType {
    /// Number of atomic classes; the length of every form-factor axis.
    pub const COUNT: usize = 6;

    pub const ALL: [FormFactorType; Self::COUNT] = [
        FormFactorType::Hydrogen,
        FormFactorType::Carbon,
        FormFactorType::Nitrogen,
        FormFactorType::Oxygen,
        FormFactorType::Sulfur,
        FormFactorType::Other,
    ];

    /// Resolves an element symbol (case-insensitive) to its scattering class.
    ///
    /// Returns `None` for symbols that are not in the element table.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        ELEMENT_CLASSES
            .get(symbol.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Van der Waals radius in Angstroms.
    pub fn van_der_waals_radius(self) -> f64 {
        match self {
            FormFactorType::Hydrogen => 1.20,
            FormFactorType::Carbon => 1.70,
            FormFactorType::Nitrogen => 1.55,
            FormFactorType::Oxygen => 1.52,
            FormFactorType::Sulfur => 1.80,
            FormFactorType::Other => 1.88,
        }
    }

    pub fn form_factor(self) -> FormFactor {
        match self {
            FormFactorType::Hydrogen => FormFactor::from_s_coefficients(
                [0.489918, 0.262003, 0.196767, 0.049879, 0.0],
                [20.6593, 7.74039, 49.5519, 2.20159, 0.0],
                0.001305,
            ),
            FormFactorType::Carbon => FormFactor::from_s_coefficients(
                [2.657506, 1.078079, 1.490909, -4.241070, 0.713791],
                [14.780758, 0.776775, 42.086843, -0.000294, 0.239535],
                4.297983,
            ),
            FormFactorType::Nitrogen => FormFactor::from_s_coefficients(
                [11.893780, 3.277479, 1.858092, 0.858927, 0.912985],
                [0.000158, 10.232723, 30.344690, 0.656065, 0.217287],
                -11.804902,
            ),
            FormFactorType::Oxygen => FormFactor::from_s_coefficients(
                [2.960427, 2.508818, 0.637853, 0.722838, 1.142756],
                [14.182259, 5.936858, 0.112726, 34.958481, 0.390240],
                0.027014,
            ),
            FormFactorType::Sulfur => FormFactor::from_s_coefficients(
                [6.362157, 5.154568, 1.473732, 1.635073, 1.209372],
                [1.514347, 22.092528, 0.061373, 55.445176, 0.646925],
                0.154722,
            ),
            FormFactorType::Other => FormFactor::from_s_coefficients(
                [7.188004, 6.638454, 0.454180, 1.929593, 1.523654],
                [0.956221, 15.339877, 15.339862, 39.043824, 0.062409],
                0.265954,
            ),
        }
    }
}

/// A five-Gaussian atomic form factor, normalized so that `f(0) = 1`.
///
/// Tabulated coefficients are given in `s = q / 4π`; the constructor converts the
/// exponents to `q` so that `evaluate` can be called with the momentum transfer directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormFactor {
    a: [f64; 5],
    b: [f64; 5],
    c: f64,
    f0: f64,
}

impl FormFactor {
    pub fn from_s_coefficients(a: [f64; 5], b: [f64; 5], c: f64) -> Self {
        let scale = 1.0 / (16.0 * PI * PI);
        Self::from_q_coefficients(a, b.map(|v| v * scale), c)
    }

    pub fn from_q_coefficients(a: [f64; 5], b: [f64; 5], c: f64) -> Self {
        let f0 = a.iter().sum::<f64>() + c;
        Self { a, b, c, f0 }
    }

    /// Form factor of a water molecule, approximated by its oxygen.
    pub fn water() -> Self {
        FormFactorType::Oxygen.form_factor()
    }

    /// Gaussian sphere of the average atomic radius, used for excluded-volume points.
    pub fn excluded_volume() -> Self {
        let b = AVERAGE_ATOMIC_RADIUS * AVERAGE_ATOMIC_RADIUS / 2.0;
        Self::from_q_coefficients([1.0, 0.0, 0.0, 0.0, 0.0], [b, 0.0, 0.0, 0.0, 0.0], 0.0)
    }

    /// Normalized form factor at momentum transfer `q`.
    pub fn evaluate(&self, q: f64) -> f64 {
        let q2 = q * q;
        let sum: f64 = self
            .a
            .iter()
            .zip(self.b.iter())
            .map(|(a, b)| a * (-b * q2).exp())
            .sum();
        (sum + self.c) / self.f0
    }
}

/// Form factors of every atomic class, plus water and excluded volume, tabulated on a q axis.
#[derive(Debug, Clone)]
pub struct FormFactorTable {
    q_len: usize,
    atoms: Vec<f64>,
    water: Vec<f64>,
    excluded_volume: Vec<f64>,
}

impl FormFactorTable {
    pub fn new(q_values: &[f64]) -> Self {
        let q_len = q_values.len();
        let mut atoms = Vec::with_capacity(FormFactorType::COUNT * q_len);
        for ff in FormFactorType::ALL {
            let form_factor = ff.form_factor();
            atoms.extend(q_values.iter().map(|&q| form_factor.evaluate(q)));
        }
        let water_ff = FormFactor::water();
        let exv_ff = FormFactor::excluded_volume();

        Self {
            q_len,
            atoms,
            water: q_values.iter().map(|&q| water_ff.evaluate(q)).collect(),
            excluded_volume: q_values.iter().map(|&q| exv_ff.evaluate(q)).collect(),
        }
    }

    #[inline]
    pub fn atom(&self, ff: usize, q_index: usize) -> f64 {
        self.atoms[ff * self.q_len + q_index]
    }

    #[inline]
    pub fn water(&self, q_index: usize) -> f64 {
        self.water[q_index]
    }

    #[inline]
    pub fn excluded_volume(&self, q_index: usize) -> f64 {
        self.excluded_volume[q_index]
    }
}
