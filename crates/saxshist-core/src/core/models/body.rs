use super::atom::Atom;
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// A rigid, independently transformable group of atoms.
///
/// Atoms are stored in the body's local frame. The rigid `transform` is applied when the
/// body is evaluated, so moving a body never touches its atoms. Every symmetry transform
/// adds one more copy of the atom set, located at `transform * symmetry * local`.
///
/// Mutating methods are crate-private: all edits go through [`Molecule`] so that the
/// corresponding change flag is always raised.
///
/// [`Molecule`]: super::molecule::Molecule
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    atoms: Vec<Atom>,
    transform: Isometry3<f64>,
    symmetries: Vec<Isometry3<f64>>,
}

impl Default for Body {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Body {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self {
            atoms,
            transform: Isometry3::identity(),
            symmetries: Vec::new(),
        }
    }

    /// The atoms in the local frame of the body.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn transform(&self) -> &Isometry3<f64> {
        &self.transform
    }

    pub fn symmetries(&self) -> &[Isometry3<f64>] {
        &self.symmetries
    }

    /// Number of copies of the atom set, the original included.
    pub fn copies(&self) -> usize {
        1 + self.symmetries.len()
    }

    /// Total number of atoms over all copies.
    pub fn len(&self) -> usize {
        self.atoms.len() * self.copies()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Atoms of the original copy in world coordinates.
    pub fn absolute_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.atoms_under(self.transform)
    }

    /// Atoms of every symmetry copy in world coordinates, the original copy excluded.
    pub fn symmetry_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.symmetries
            .iter()
            .flat_map(move |symmetry| self.atoms_under(self.transform * symmetry))
    }

    /// Atoms of all copies in world coordinates, the original copy first.
    pub fn all_absolute_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.absolute_atoms().chain(self.symmetry_atoms())
    }

    /// Weighted centre of the original copy in world coordinates.
    ///
    /// Falls back to the unweighted centroid when the weights sum to zero, and to the
    /// transform's translation for an empty body.
    pub fn center_of_mass(&self) -> Point3<f64> {
        if self.atoms.is_empty() {
            return Point3::from(self.transform.translation.vector);
        }
        let total_weight: f64 = self.atoms.iter().map(|a| a.weight).sum();
        let local = if total_weight.abs() > f64::EPSILON {
            self.atoms
                .iter()
                .fold(Vector3::zeros(), |acc, a| acc + a.position.coords * a.weight)
                / total_weight
        } else {
            self.atoms
                .iter()
                .fold(Vector3::zeros(), |acc, a| acc + a.position.coords)
                / self.atoms.len() as f64
        };
        self.transform * Point3::from(local)
    }

    fn atoms_under(&self, transform: Isometry3<f64>) -> impl Iterator<Item = Atom> + '_ {
        self.atoms.iter().map(move |atom| Atom {
            position: transform * atom.position,
            ..*atom
        })
    }

    pub(crate) fn translate(&mut self, shift: &Vector3<f64>) {
        self.transform.append_translation_mut(&Translation3::from(*shift));
    }

    /// Rotates the body about its current centre of mass.
    pub(crate) fn rotate(&mut self, rotation: &UnitQuaternion<f64>) {
        let pivot = self.center_of_mass();
        self.transform.append_rotation_wrt_point_mut(rotation, &pivot);
    }

    pub(crate) fn set_transform(&mut self, transform: Isometry3<f64>) {
        self.transform = transform;
    }

    pub(crate) fn add_symmetry(&mut self, symmetry: Isometry3<f64>) {
        self.symmetries.push(symmetry);
    }

    pub(crate) fn add_atoms(&mut self, atoms: impl IntoIterator<Item = Atom>) {
        self.atoms.extend(atoms);
    }

    pub(crate) fn retain_atoms<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Atom) -> bool,
    {
        let before = self.atoms.len();
        self.atoms.retain(keep);
        before - self.atoms.len()
    }

    pub(crate) fn replace_atoms(&mut self, atoms: Vec<Atom>) {
        self.atoms = atoms;
    }

    pub(crate) fn scale_weights(&mut self, factor: f64) {
        for atom in &mut self.atoms {
            atom.weight *= factor;
        }
    }
}
