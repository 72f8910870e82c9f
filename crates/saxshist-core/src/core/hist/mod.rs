//! # Histogram Module
//!
//! Binned distance distributions and everything needed to fill them and to turn them into
//! a scattering profile.
//!
//! ## Architecture
//!
//! - **Axes** ([`axis`]) - Uniform binning of distances and momentum transfers
//! - **Distributions** ([`distribution`]) - 1D/2D/3D accumulators, unweighted and weighted
//! - **Partials** ([`partial`]) - The per-body and per-pair accumulator the engine caches
//! - **Kernels** ([`compact`]) - Flattened coordinate stores and the scalar/batched pair kernels
//! - **Histograms** ([`histogram`], [`composite`]) - Master histograms, scaling factors, Debye transform
//! - **Profiles** ([`profile`]) - The resulting I(q) curve and its CSV export
//!
//! ## Pair Convention
//!
//! Every distribution counts unordered pairs of distinct points. Self pairs (distance zero)
//! are never recorded, so `n` unit-weight points always sum to `n(n-1)/2`.

pub mod axis;
pub mod compact;
pub mod composite;
pub mod distribution;
pub mod error;
pub mod histogram;
pub mod partial;
pub mod profile;
