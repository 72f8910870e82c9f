//! Computational units of the histogram engine.
//!
//! A task owns its output buffer and only reads shared coordinate snapshots, so any number
//! of tasks can run at once. Results are merged by the caller in task order.

pub mod pair_histogram;
