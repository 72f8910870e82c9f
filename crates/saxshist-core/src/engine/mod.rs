//! # Engine Module
//!
//! This module implements the stateful part of the library: the incremental distance
//! histogram engine that keeps a molecule's partial histograms up to date as its rigid
//! bodies move, change, or receive a new hydration shell.
//!
//! ## Overview
//!
//! A calculation reads the change flags recorded by the molecule, schedules one scan task per
//! invalidated partial histogram, runs the tasks on a fixed-size worker pool, and swaps the
//! fresh partials into the cached master sums in a single commit step. Nothing is committed
//! if any task fails.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Histogram and hydration parameters, builders and TOML loading
//! - **Partial Cache** (`cache`) - Cached partials and the per-class master sums
//! - **Manager** ([`manager`]) - Change detection, task scheduling and the commit step
//! - **Tasks** ([`tasks`]) - Independent pair-scanning units producing one partial each
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation
//!
//! ## Key Capabilities
//!
//! - **Incremental updates** that rescan only the partials a change invalidates
//! - **Parallel scanning** over a dedicated thread pool (feature `parallel`)
//! - **All-or-nothing commits** leaving cache and change flags intact on failure
//! - **Symmetry-aware bookkeeping** for bodies with replicated copies

pub(crate) mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod tasks;
