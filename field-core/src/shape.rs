use crate::error::{FieldError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    pub dims: Vec<usize>,
}

impl Shape {
    /// Every axis must be positive and there must be at least one axis.
    pub fn new(dims: Vec<usize>) -> Result<Self> {
        if dims.is_empty() {
            return Err(FieldError::Construction(
                "field needs at least one dimension".to_string(),
            ));
        }

        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(FieldError::Construction(format!(
                "dimension {} of {:?} is zero",
                axis, dims
            )));
        }

        return Ok(Self { dims });
    }

    pub fn total_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn check_indices(&self, indices: &[usize]) -> Result<()> {
        if indices.len() != self.dims.len() {
            return Err(FieldError::IndexRank {
                expected: self.dims.len(),
                actual: indices.len(),
            });
        }

        for (axis, (&index, &size)) in indices.iter().zip(&self.dims).enumerate() {
            if index >= size {
                return Err(FieldError::Range { axis, index, size });
            }
        }

        return Ok(());
    }

    /// Row-major flat index; the last axis varies fastest.
    pub fn flatten_index(&self, indices: &[usize]) -> Result<usize> {
        self.check_indices(indices)?;

        let mut flat_index = 0;
        let mut stride = 1;

        for i in (0..self.dims.len()).rev() {
            flat_index += indices[i] * stride;
            stride *= self.dims[i];
        }

        return Ok(flat_index);
    }
}
