//! Dense voxel grid over the molecule.
//!
//! The grid records, cell by cell, where atoms, solvent and the expanded molecular volume
//! sit. It is the shared workspace of the hydration strategies and the source of the
//! excluded-volume point cloud.

pub mod error;
pub mod grid;
pub mod state;
