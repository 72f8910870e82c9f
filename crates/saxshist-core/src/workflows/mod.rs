//! # Workflows Module
//!
//! This module provides the high-level procedures built on top of the core data model and
//! the histogram engine.
//!
//! ## Overview
//!
//! Workflows are the entry points a fitting or modelling layer calls in its inner loop. Each
//! one validates its input, drives the lower layers in the right order, and only commits
//! changes to the molecule once every fallible step has succeeded.
//!
//! ## Architecture
//!
//! - **Hydration Workflow** ([`hydrate`]) - Grid construction, water placement, culling and
//!   optional excluded-volume generation
//! - **Scattering Workflow** ([`scatter`]) - Incremental histogram update, scaling factors and
//!   the Debye transform
//!
//! ## Key Capabilities
//!
//! - **Deterministic hydration** for a given structure and configuration
//! - **Cheap refits** where changing scaling factors never rescans atoms
//! - **Structured tracing spans** around every workflow

pub mod hydrate;
pub mod scatter;
