//! Error type shared by the tensor and network modules

/// Errors raised by tensor arithmetic and network operations.
///
/// All of these are caller errors raised at the point of violation;
/// nothing is retried internally.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NnError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("invalid dimensions for matrix multiplication: {left:?} x {right:?}")]
    DimensionMismatch { left: [usize; 2], right: [usize; 2] },

    #[error("index {index:?} out of range for shape {shape:?}")]
    IndexOutOfRange { index: Vec<usize>, shape: Vec<usize> },

    #[error("{0}: backward called before forward")]
    MissingForwardPass(&'static str),

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, NnError>;
