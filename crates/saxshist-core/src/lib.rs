//! # saxshist Core Library
//!
//! An incremental, multi-threaded engine that turns a rigid-body atomic model into a
//! small-angle scattering intensity curve I(q).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture to keep the numerics, the
//! incremental bookkeeping and the user-facing procedures apart.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Body`, `Atom`),
//!   binned distance distributions, the compact coordinate kernels, the voxel grid with its
//!   hydration and culling strategies, and the sinc lookup table.
//!
//! - **[`engine`]: The Logic Core.** The stateful `PartialHistogramManager` which keeps one
//!   cached partial distribution per body and per body pair, recomputes only what the change
//!   flags invalidate, and dispatches the work over a fixed-size thread pool.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures such as generating a hydration
//!   shell for a molecule or producing a scattering profile for given scaling factors.

pub mod core;
pub mod engine;
pub mod workflows;
