//! # Core Models Module
//!
//! This module contains the data structures that describe the scattering object: atoms,
//! rigid bodies, the molecule arena that owns them, the hydration layer, the excluded
//! volume point cloud and the change-tracking flags consulted by the histogram engine.
//!
//! ## Key Components
//!
//! - [`atom`] - Weighted point scatterers and solvent pseudo-atoms
//! - [`body`] - Rigid groups of atoms with a transform and optional symmetry copies
//! - [`molecule`] - Arena of bodies plus the hydration layer; every mutation raises a change flag
//! - [`hydration`] - The wholesale-replaced solvent layer and the excluded volume cloud
//! - [`state`] - Per-body dirty flags and the global hydration flags
//! - [`ids`] - Stable arena keys used as cache identities
//!
//! ## Usage
//!
//! ```ignore
//! use saxshist::core::models::{atom::Atom, body::Body, molecule::Molecule};
//!
//! let mut molecule = Molecule::new();
//! let id = molecule.add_body(Body::new(vec![Atom::new(Point3::origin(), 1.0)]));
//! molecule.translate(id, &Vector3::new(1.0, 0.0, 0.0))?;
//! assert!(molecule.state().is_externally_modified(id));
//! ```

pub mod atom;
pub mod body;
pub mod hydration;
pub mod ids;
pub mod molecule;
pub mod state;
