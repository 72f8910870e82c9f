use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Position {position:?} lies outside the grid")]
    Bounds { position: Point3<f64> },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid grid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("Grid of {cells} cells exceeds the limit of {limit} cells")]
    Size { cells: usize, limit: usize },
}
