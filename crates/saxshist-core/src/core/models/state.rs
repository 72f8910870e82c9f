use super::ids::BodyId;
use slotmap::SecondaryMap;

/// Change flags of a single body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFlags {
    /// Set by any rigid-motion or symmetry edit.
    pub external: bool,
    /// Set when the body's own atom set changes.
    pub internal: bool,
}

impl BodyFlags {
    pub const DIRTY: Self = Self {
        external: true,
        internal: true,
    };
    pub const CLEAN: Self = Self {
        external: false,
        internal: false,
    };

    pub fn is_dirty(&self) -> bool {
        self.external || self.internal
    }
}

/// Tagged dirty bit set for every body plus the global hydration flags.
///
/// Flags are raised by [`Molecule`] whenever it mutates a body or swaps the hydration layer,
/// and consumed by the partial histogram manager, which clears them once a calculation has
/// been combined successfully. Everything starts dirty so the first calculation is complete.
///
/// [`Molecule`]: super::molecule::Molecule
#[derive(Debug, Clone)]
pub struct StateManager {
    bodies: SecondaryMap<BodyId, BodyFlags>,
    hydration: bool,
    excluded_volume: bool,
}

impl Default for StateManager {
    fn default() -> Self {
        Self {
            bodies: SecondaryMap::new(),
            hydration: true,
            excluded_volume: true,
        }
    }
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, id: BodyId) {
        self.bodies.insert(id, BodyFlags::DIRTY);
    }

    pub(crate) fn unregister(&mut self, id: BodyId) {
        self.bodies.remove(id);
    }

    pub fn flags(&self, id: BodyId) -> Option<BodyFlags> {
        self.bodies.get(id).copied()
    }

    /// Whether the body moved since the last calculation. Unknown bodies count as modified.
    pub fn is_externally_modified(&self, id: BodyId) -> bool {
        self.bodies.get(id).is_none_or(|f| f.external)
    }

    /// Whether the body's atom set changed since the last calculation. Unknown bodies count as modified.
    pub fn is_internally_modified(&self, id: BodyId) -> bool {
        self.bodies.get(id).is_none_or(|f| f.internal)
    }

    pub fn is_modified_hydration(&self) -> bool {
        self.hydration
    }

    pub fn is_modified_excluded_volume(&self) -> bool {
        self.excluded_volume
    }

    pub fn externally_modified_bodies(&self) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, f)| f.external)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn internally_modified_bodies(&self) -> Vec<BodyId> {
        self.bodies
            .iter()
            .filter(|(_, f)| f.internal)
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn externally_modified(&mut self, id: BodyId) {
        if let Some(flags) = self.bodies.get_mut(id) {
            flags.external = true;
        }
    }

    pub(crate) fn internally_modified(&mut self, id: BodyId) {
        if let Some(flags) = self.bodies.get_mut(id) {
            flags.internal = true;
        }
    }

    pub(crate) fn modified_hydration_layer(&mut self) {
        self.hydration = true;
    }

    pub(crate) fn modified_excluded_volume(&mut self) {
        self.excluded_volume = true;
    }

    pub(crate) fn externally_modified_all(&mut self) {
        for (_, flags) in self.bodies.iter_mut() {
            flags.external = true;
        }
    }

    pub(crate) fn internally_modified_all(&mut self) {
        for (_, flags) in self.bodies.iter_mut() {
            flags.internal = true;
        }
    }

    /// Marks every body and both global layers clean.
    pub(crate) fn reset_to_false(&mut self) {
        for (_, flags) in self.bodies.iter_mut() {
            *flags = BodyFlags::CLEAN;
        }
        self.hydration = false;
        self.excluded_volume = false;
    }

    /// Forces everything dirty so the next calculation is a full recompute.
    pub(crate) fn reset(&mut self) {
        for (_, flags) in self.bodies.iter_mut() {
            *flags = BodyFlags::DIRTY;
        }
        self.hydration = true;
        self.excluded_volume = true;
    }
}
