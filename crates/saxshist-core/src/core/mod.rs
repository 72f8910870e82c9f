//! # Core Module
//!
//! This module provides the stateless building blocks of the scattering engine: the
//! molecular data model, the binned distributions and their distance kernels, the voxel
//! grid used for hydration and excluded volume, and the precomputed lookup tables.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, rigid bodies, hydration layers, change flags
//! - **Form Factors** ([`form_factor`]) - Gaussian atomic form factors and van der Waals radii
//! - **Histograms** ([`hist`]) - Distance axes, 1D/2D/3D distributions, kernels and the Debye transform
//! - **Voxel Grid** ([`grid`]) - Cell states, atom placement, volume expansion and excluded volume
//! - **Hydration** ([`hydrate`]) - Solvent placement and culling strategies operating on the grid
//! - **Lookup Tables** ([`table`]) - Precomputed sinc values indexed by (q, d)
//!
//! ## Key Capabilities
//!
//! - **Cache-friendly pair scanning** over flattened `f32` coordinate stores
//! - **Scalar and batched kernels** producing bit-identical bins
//! - **Weighted binning** tracking the mean distance inside every bin
//! - **Deterministic hydration** with first-accepted-wins collision resolution

pub mod form_factor;
pub mod grid;
pub mod hist;
pub mod hydrate;
pub mod models;
pub mod table;
