use super::atom::Atom;
use super::body::Body;
use super::hydration::{ExcludedVolume, HydrationLayer};
use super::ids::BodyId;
use super::state::StateManager;
use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};
use slotmap::SlotMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MoleculeError {
    #[error("Body not found: {0:?}")]
    BodyNotFound(BodyId),
}

/// A structure partitioned into rigid bodies, plus its hydration layer.
///
/// Bodies live in an arena and are addressed by [`BodyId`], which stays valid for the life of
/// the body and is used by the histogram engine as a cache key. Every mutation raises the
/// matching change flag in the embedded [`StateManager`]:
///
/// - rigid motion and symmetry edits raise the *external* flag of the body;
/// - atom edits raise the *internal* flag of the body;
/// - swapping the hydration layer raises the global hydration flag.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// Primary storage for bodies.
    bodies: SlotMap<BodyId, Body>,
    /// Insertion order; iteration over bodies always follows it.
    order: Vec<BodyId>,
    hydration: HydrationLayer,
    excluded_volume: Option<ExcludedVolume>,
    state: StateManager,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a molecule from a list of bodies, keeping their order.
    pub fn from_bodies(bodies: impl IntoIterator<Item = Body>) -> Self {
        let mut molecule = Self::new();
        for body in bodies {
            molecule.add_body(body);
        }
        molecule
    }

    /// Adds a body and returns its stable id. The new body starts dirty.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        let id = self.bodies.insert(body);
        self.order.push(id);
        self.state.register(id);
        id
    }

    /// Removes a body. Cached histogram partials involving it are dropped on the next calculation.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body, MoleculeError> {
        let body = self
            .bodies
            .remove(id)
            .ok_or(MoleculeError::BodyNotFound(id))?;
        self.order.retain(|&other| other != id);
        self.state.unregister(id);
        Ok(body)
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Body ids in insertion order.
    pub fn body_ids(&self) -> &[BodyId] {
        &self.order
    }

    /// Iterates over `(BodyId, &Body)` pairs in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.order
            .iter()
            .filter_map(move |&id| self.bodies.get(id).map(|body| (id, body)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of atoms over all bodies and all symmetry copies.
    pub fn atom_count(&self) -> usize {
        self.bodies().map(|(_, body)| body.len()).sum()
    }

    /// Every atom of every body copy in world coordinates, tagged with its body.
    pub fn absolute_atoms(&self) -> impl Iterator<Item = (BodyId, Atom)> + '_ {
        self.bodies()
            .flat_map(|(id, body)| body.all_absolute_atoms().map(move |atom| (id, atom)))
    }

    /// Weighted centre of every atom of every body copy, or `None` for an empty molecule.
    ///
    /// Falls back to the unweighted centroid when the weights sum to zero.
    pub fn center_of_mass(&self) -> Option<Point3<f64>> {
        let (count, weight, weighted, plain) = self.absolute_atoms().fold(
            (0usize, 0.0, Vector3::zeros(), Vector3::zeros()),
            |(n, w, wc, c), (_, atom)| {
                (
                    n + 1,
                    w + atom.weight,
                    wc + atom.position.coords * atom.weight,
                    c + atom.position.coords,
                )
            },
        );
        if count == 0 {
            return None;
        }
        let center = if weight.abs() > f64::EPSILON {
            weighted / weight
        } else {
            plain / count as f64
        };
        Some(Point3::from(center))
    }

    pub fn hydration(&self) -> &HydrationLayer {
        &self.hydration
    }

    pub fn excluded_volume(&self) -> Option<&ExcludedVolume> {
        self.excluded_volume.as_ref()
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    pub fn translate(&mut self, id: BodyId, shift: &Vector3<f64>) -> Result<(), MoleculeError> {
        self.body_mut(id)?.translate(shift);
        self.state.externally_modified(id);
        Ok(())
    }

    /// Rotates a body about its centre of mass.
    pub fn rotate(&mut self, id: BodyId, rotation: &UnitQuaternion<f64>) -> Result<(), MoleculeError> {
        self.body_mut(id)?.rotate(rotation);
        self.state.externally_modified(id);
        Ok(())
    }

    pub fn set_transform(&mut self, id: BodyId, transform: Isometry3<f64>) -> Result<(), MoleculeError> {
        self.body_mut(id)?.set_transform(transform);
        self.state.externally_modified(id);
        Ok(())
    }

    pub fn add_symmetry(&mut self, id: BodyId, symmetry: Isometry3<f64>) -> Result<(), MoleculeError> {
        self.body_mut(id)?.add_symmetry(symmetry);
        self.state.externally_modified(id);
        Ok(())
    }

    pub fn add_atoms(
        &mut self,
        id: BodyId,
        atoms: impl IntoIterator<Item = Atom>,
    ) -> Result<(), MoleculeError> {
        self.body_mut(id)?.add_atoms(atoms);
        self.state.internally_modified(id);
        Ok(())
    }

    /// Keeps only the atoms matching `keep` and returns how many were removed.
    ///
    /// The internal flag is raised only if something was actually removed.
    pub fn retain_atoms<F>(&mut self, id: BodyId, keep: F) -> Result<usize, MoleculeError>
    where
        F: FnMut(&Atom) -> bool,
    {
        let removed = self.body_mut(id)?.retain_atoms(keep);
        if removed > 0 {
            self.state.internally_modified(id);
        }
        Ok(removed)
    }

    pub fn replace_atoms(&mut self, id: BodyId, atoms: Vec<Atom>) -> Result<(), MoleculeError> {
        self.body_mut(id)?.replace_atoms(atoms);
        self.state.internally_modified(id);
        Ok(())
    }

    /// Moves the whole molecule, hydration and excluded volume included.
    ///
    /// Every body is marked externally modified. The solvent flags are raised only for
    /// layers that actually hold points.
    pub fn translate_all(&mut self, shift: &Vector3<f64>) {
        for id in &self.order {
            if let Some(body) = self.bodies.get_mut(*id) {
                body.translate(shift);
            }
        }
        self.state.externally_modified_all();
        if !self.hydration.is_empty() {
            let moved = self.hydration.translated(shift);
            self.set_hydration(moved);
        }
        if let Some(moved) = self.excluded_volume.as_ref().map(|exv| exv.translated(shift)) {
            self.set_excluded_volume(Some(moved));
        }
    }

    /// Moves the molecule so that its centre of mass sits at the origin.
    pub fn center(&mut self) {
        if let Some(center) = self.center_of_mass() {
            self.translate_all(&-center.coords);
        }
    }

    /// Multiplies the weight of every atom by `factor`, marking every body internally modified.
    pub fn scale_weights(&mut self, factor: f64) {
        for body in self.bodies.values_mut() {
            body.scale_weights(factor);
        }
        self.state.internally_modified_all();
    }

    /// Swaps in a regenerated hydration layer.
    pub fn set_hydration(&mut self, hydration: HydrationLayer) {
        self.hydration = hydration;
        self.state.modified_hydration_layer();
    }

    pub fn clear_hydration(&mut self) {
        self.set_hydration(HydrationLayer::default());
    }

    pub fn set_excluded_volume(&mut self, excluded_volume: Option<ExcludedVolume>) {
        self.excluded_volume = excluded_volume;
        self.state.modified_excluded_volume();
    }

    /// Marks everything dirty so the next histogram calculation starts from scratch.
    pub fn reset_state(&mut self) {
        self.state.reset();
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, MoleculeError> {
        self.bodies
            .get_mut(id)
            .ok_or(MoleculeError::BodyNotFound(id))
    }
}
