//! Flat element sequences and their nested multi-dimensional views.

use crate::codec;
use crate::error::{FieldError, Result};
use crate::types::ElementType;
use crate::utils::group_by_n;
use crate::value::{NdArray, Value};

/// Splits parallel primitive arrays into per-element chunks and decodes each.
pub fn group_elements(
    int_array: &[i32],
    float_array: &[f32],
    element_type: &ElementType,
) -> Result<Vec<Value>> {
    let n = element_type.num_primitives();

    if int_array.len() != float_array.len() || int_array.len() % n != 0 {
        return Err(FieldError::Shape(format!(
            "{} int and {} float slots do not split into elements of {} slots",
            int_array.len(),
            float_array.len(),
            n
        )));
    }

    return int_array
        .chunks(n)
        .zip(float_array.chunks(n))
        .map(|(ints, floats)| codec::decode(ints, floats, element_type))
        .collect();
}

/// Folds `elements` into nested arrays matching `dims`, innermost axis first.
pub fn reshape<T>(elements: Vec<T>, dims: &[usize]) -> Result<NdArray<T>> {
    let expected: usize = dims.iter().product();

    if elements.len() != expected {
        return Err(FieldError::Shape(format!(
            "{} elements cannot fill dimensions {:?}",
            elements.len(),
            dims
        )));
    }

    if dims.is_empty() {
        return elements
            .into_iter()
            .next()
            .map(NdArray::Element)
            .ok_or_else(|| FieldError::Shape("no element for rank-0 shape".to_string()));
    }

    let mut result: Vec<NdArray<T>> = elements.into_iter().map(NdArray::Element).collect();

    for &dim in dims[1..].iter().rev() {
        result = group_by_n(result, dim)
            .into_iter()
            .map(NdArray::Array)
            .collect();
    }

    return Ok(NdArray::Array(result));
}

/// Inverse of [`reshape`]: checks that every level of `array` matches `dims`
/// and returns the elements in row-major order.
pub fn flatten<'a, T>(array: &'a NdArray<T>, dims: &[usize]) -> Result<Vec<&'a T>> {
    let mut out = Vec::with_capacity(dims.iter().product());

    flatten_into(array, dims, 0, &mut out)?;

    return Ok(out);
}

fn flatten_into<'a, T>(
    array: &'a NdArray<T>,
    dims: &[usize],
    depth: usize,
    out: &mut Vec<&'a T>,
) -> Result<()> {
    match (array, dims.get(depth)) {
        (NdArray::Element(element), None) => {
            out.push(element);
            Ok(())
        }
        (NdArray::Array(items), Some(&dim)) => {
            if items.len() != dim {
                return Err(FieldError::Shape(format!(
                    "axis {} has {} entries, expected {}",
                    depth,
                    items.len(),
                    dim
                )));
            }

            for item in items {
                flatten_into(item, dims, depth + 1, out)?;
            }

            Ok(())
        }
        (NdArray::Element(_), Some(_)) => Err(FieldError::Shape(format!(
            "expecting array at axis {}",
            depth
        ))),
        (NdArray::Array(_), None) => Err(FieldError::Shape(format!(
            "array nested deeper than {} axes",
            dims.len()
        ))),
    }
}
