use gpu_accel::GpuError;

pub type Result<T> = std::result::Result<T, FieldError>;

#[derive(thiserror::Error, Debug)]
pub enum FieldError {
    /// Malformed type descriptor or field declaration.
    #[error("Invalid construction: {0}")]
    Construction(String),

    /// A host value does not match the declared element type or dimensions.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Missing property: {0}")]
    MissingProperty(String),

    #[error("Size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of bounds for axis {axis} with size {size}")]
    Range {
        axis: usize,
        index: usize,
        size: usize,
    },

    #[error("Index rank mismatch: expecting {expected}, received {actual}")]
    IndexRank { expected: usize, actual: usize },

    #[error("Tree {0} has no device storage")]
    NotMaterialized(usize),

    #[error("Type error: {0}")]
    Type(String),

    #[error(transparent)]
    Device(#[from] GpuError),
}
