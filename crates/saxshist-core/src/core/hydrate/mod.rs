//! Hydration shell generation on the voxel grid.
//!
//! A [`placement::HydrationStrategy`] over-generates candidate waters around the atoms that
//! are on the grid, and a [`culling::CullingStrategy`] then trims the candidates to the
//! requested count. Both are closed enums selected by configuration.

pub mod culling;
pub mod directions;
pub mod placement;
