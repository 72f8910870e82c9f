//! Precomputed lookup tables used by the Debye transform.
//!
//! The transform evaluates `sin(qd)/(qd)` for every (q, d) bin combination on every call;
//! tabulating the values once per axis pair replaces those trigonometric calls with a
//! sequential row read.

pub mod sinc;
