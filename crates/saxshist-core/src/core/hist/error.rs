use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum HistError {
    #[error("Distance bin {bin} is outside of the histogram range (0..{len})")]
    Bounds { bin: usize, len: usize },

    #[error("Size mismatch: expected {expected} entries, found {found}")]
    Size { expected: usize, found: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV output error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
