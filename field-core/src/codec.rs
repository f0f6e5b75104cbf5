//! Conversion between host [`Value`]s and flat primitive slots.
//!
//! An encoded element is a pair of parallel arrays, one `i32` and one `f32`,
//! both as long as the element's layout. They are two views of the same
//! 32-bit words: float slots hold IEEE-754 bit patterns in the integer view,
//! and integer slots appear reinterpreted in the float view.

use std::collections::BTreeMap;

use crate::error::{FieldError, Result};
use crate::types::{ElementType, PrimitiveKind, TypeKind};
use crate::value::Value;

#[inline]
pub fn f32_to_bits(value: f32) -> i32 {
    bytemuck::cast(value)
}

#[inline]
pub fn bits_to_f32(bits: i32) -> f32 {
    bytemuck::cast(bits)
}

/// Converts a host number to a 32-bit integer word: truncated toward zero and
/// wrapped modulo 2^32, so unsigned masks keep their bit pattern. NaN and
/// infinities become 0.
pub fn number_to_i32(number: f64) -> i32 {
    if !number.is_finite() {
        return 0;
    }

    (number.trunc().rem_euclid(4_294_967_296.0) as u64 as u32) as i32
}

/// Stores one host number into a slot of `primitive` kind, returning the word.
pub fn number_to_word(number: f64, primitive: PrimitiveKind) -> i32 {
    match primitive {
        PrimitiveKind::I32 => number_to_i32(number),
        PrimitiveKind::F32 => f32_to_bits(number as f32),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedElement {
    pub int_array: Vec<i32>,
    pub float_array: Vec<f32>,
}

impl EncodedElement {
    fn zeroed(len: usize) -> Self {
        return Self {
            int_array: vec![0; len],
            float_array: vec![0.0; len],
        };
    }

    fn put(&mut self, slot: usize, number: f64, primitive: PrimitiveKind) {
        let word = number_to_word(number, primitive);

        self.int_array[slot] = word;
        self.float_array[slot] = bits_to_f32(word);
    }

    fn splice(&mut self, offset: usize, other: &EncodedElement) {
        let end = offset + other.int_array.len();

        self.int_array[offset..end].copy_from_slice(&other.int_array);
        self.float_array[offset..end].copy_from_slice(&other.float_array);
    }

    pub fn len(&self) -> usize {
        return self.int_array.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.int_array.is_empty();
    }

    /// The packed transport form written to the device.
    pub fn into_words(self) -> Vec<i32> {
        return self.int_array;
    }
}

/// Flattens a scalar, vector or matrix value to row-major numbers, checking
/// it against the declared shape.
pub fn tensor_to_numbers(value: &Value, ty: &ElementType) -> Result<Vec<f64>> {
    match (ty.kind(), value) {
        (TypeKind::Scalar(_), Value::Number(number)) => Ok(vec![*number]),
        (TypeKind::Vector { rows, .. }, Value::Vector(vector)) => {
            if vector.len() != *rows {
                return Err(FieldError::Shape(format!(
                    "vector of {} rows expected, got {}",
                    rows,
                    vector.len()
                )));
            }

            Ok(vector.clone())
        }
        (TypeKind::Matrix { rows, cols, .. }, Value::Matrix(matrix)) => {
            if matrix.len() != *rows || matrix.iter().any(|row| row.len() != *cols) {
                return Err(FieldError::Shape(format!(
                    "matrix of {}x{} expected",
                    rows, cols
                )));
            }

            Ok(matrix.iter().flatten().copied().collect())
        }
        (TypeKind::Struct(_), _) => Err(FieldError::Type("expecting tensor type".to_string())),
        (_, other) => Err(FieldError::Shape(format!(
            "{:?} cannot hold a {}",
            ty,
            other.kind_name()
        ))),
    }
}

pub fn encode(value: &Value, ty: &ElementType) -> Result<EncodedElement> {
    let mut encoded = EncodedElement::zeroed(ty.num_primitives());

    match ty.kind() {
        TypeKind::Struct(properties) => {
            let Value::Record(entries) = value else {
                return Err(FieldError::Shape(format!(
                    "struct type expects a record, got a {}",
                    value.kind_name()
                )));
            };

            let layout = ty.layout();

            for (property, (_, offset)) in properties.iter().zip(layout.property_offsets()) {
                let entry = entries
                    .get(&property.name)
                    .ok_or_else(|| FieldError::MissingProperty(property.name.clone()))?;
                let nested = encode(entry, &property.ty)?;

                encoded.splice(*offset, &nested);
            }
        }
        _ => {
            let primitive = ty.primitive_kind()?;

            for (slot, number) in tensor_to_numbers(value, ty)?.into_iter().enumerate() {
                encoded.put(slot, number, primitive);
            }
        }
    }

    return Ok(encoded);
}

/// Packed form of [`encode`]: the integer view, ready for `host_to_device`.
pub fn element_to_words(value: &Value, ty: &ElementType) -> Result<Vec<i32>> {
    return Ok(encode(value, ty)?.into_words());
}

fn select_numbers(primitive: PrimitiveKind, int_array: &[i32], float_array: &[f32]) -> Vec<f64> {
    match primitive {
        PrimitiveKind::I32 => int_array.iter().map(|&n| n as f64).collect(),
        PrimitiveKind::F32 => float_array.iter().map(|&n| n as f64).collect(),
    }
}

pub fn decode(int_array: &[i32], float_array: &[f32], ty: &ElementType) -> Result<Value> {
    let expected = ty.num_primitives();

    if int_array.len() != expected || float_array.len() != expected {
        return Err(FieldError::Shape(format!(
            "{:?} spans {} slots, got {} int and {} float",
            ty,
            expected,
            int_array.len(),
            float_array.len()
        )));
    }

    let value = match ty.kind() {
        TypeKind::Struct(properties) => {
            let mut entries = BTreeMap::new();

            for (property, (_, offset)) in properties.iter().zip(ty.layout().property_offsets()) {
                let range = *offset..*offset + property.ty.num_primitives();
                let nested = decode(
                    &int_array[range.clone()],
                    &float_array[range],
                    &property.ty,
                )?;

                entries.insert(property.name.clone(), nested);
            }

            Value::Record(entries)
        }
        TypeKind::Scalar(primitive) => {
            Value::Number(select_numbers(*primitive, int_array, float_array)[0])
        }
        TypeKind::Vector { primitive, .. } => {
            Value::Vector(select_numbers(*primitive, int_array, float_array))
        }
        TypeKind::Matrix {
            primitive, cols, ..
        } => Value::Matrix(
            select_numbers(*primitive, int_array, float_array)
                .chunks(*cols)
                .map(|row| row.to_vec())
                .collect(),
        ),
    };

    return Ok(value);
}

/// Decodes from packed words alone, deriving the float view by bitcast.
pub fn words_to_element(words: &[i32], ty: &ElementType) -> Result<Value> {
    let float_array: Vec<f32> = words.iter().map(|&w| bits_to_f32(w)).collect();

    return decode(words, &float_array, ty);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::PrimitiveKind::{F32, I32};

    fn particle_type() -> ElementType {
        ElementType::structure([
            ("pos", ElementType::vector(F32, 2).unwrap()),
            ("id", ElementType::scalar(I32)),
        ])
        .unwrap()
    }

    #[test]
    fn test_matrix_is_row_major() {
        let ty = ElementType::matrix(I32, 2, 2).unwrap();
        let encoded = encode(&Value::from([[1.0, 2.0], [3.0, 4.0]]), &ty).unwrap();

        assert_eq!(encoded.int_array, vec![1, 2, 3, 4]);

        let decoded = decode(&[1, 2, 3, 4], &[0.0; 4], &ty).unwrap();

        assert_eq!(decoded, Value::from([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[test]
    fn test_non_square_matrix_groups_by_columns() {
        let ty = ElementType::matrix(I32, 3, 2).unwrap();
        let decoded = words_to_element(&[1, 2, 3, 4, 5, 6], &ty).unwrap();

        assert_eq!(decoded, Value::from([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]));
    }

    #[test]
    fn test_float_is_bit_reinterpreted() {
        let ty = ElementType::scalar(F32);
        let encoded = encode(&Value::Number(1.5), &ty).unwrap();

        assert_eq!(encoded.int_array[0], 1.5f32.to_bits() as i32);
        assert_ne!(encoded.int_array[0], 1);

        let decoded = words_to_element(&encoded.int_array, &ty).unwrap();

        assert_eq!(decoded, Value::Number(1.5));
    }

    #[test]
    fn test_int_slot_truncates() {
        let ty = ElementType::vector(I32, 2).unwrap();
        let encoded = encode(&Value::from([2.9, -2.9]), &ty).unwrap();

        assert_eq!(encoded.int_array, vec![2, -2]);
    }

    #[test]
    fn test_int_slot_wraps_out_of_range() {
        let ty = ElementType::vector(I32, 3).unwrap();
        let value = Value::from([4294967295.0, 2147483648.0, -2147483649.0]);
        let encoded = encode(&value, &ty).unwrap();

        assert_eq!(encoded.int_array, vec![-1, i32::MIN, i32::MAX]);
    }

    #[test]
    fn test_int_slot_non_finite_is_zero() {
        assert_eq!(number_to_word(f64::NAN, I32), 0);
        assert_eq!(number_to_word(f64::INFINITY, I32), 0);
        assert_eq!(number_to_word(f64::NEG_INFINITY, I32), 0);
        assert_eq!(number_to_word(-0.5, I32), 0);
    }

    #[test]
    fn test_struct_round_trip() {
        let ty = particle_type();
        let value = Value::record([
            ("pos", Value::from([0.25, -3.5])),
            ("id", Value::from(42)),
        ]);
        let encoded = encode(&value, &ty).unwrap();

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.int_array[2], 42);
        assert_eq!(encoded.float_array[0], 0.25);

        let decoded = decode(&encoded.int_array, &encoded.float_array, &ty).unwrap();

        assert_eq!(decoded, value);
    }

    #[test]
    fn test_nested_struct_round_trip() {
        let inner = ElementType::structure([
            ("m", ElementType::matrix(F32, 2, 2).unwrap()),
            ("n", ElementType::scalar(I32)),
        ])
        .unwrap();
        let ty = ElementType::structure([
            ("inner", inner),
            ("v", ElementType::vector(I32, 3).unwrap()),
        ])
        .unwrap();
        let value = Value::record([
            (
                "inner",
                Value::record([
                    ("m", Value::from([[0.5, 1.0], [-0.125, 1e-3]])),
                    ("n", Value::from(-7)),
                ]),
            ),
            ("v", Value::from([1.0, 2.0, 3.0])),
        ]);
        let words = element_to_words(&value, &ty).unwrap();
        let decoded = words_to_element(&words, &ty).unwrap();

        // 1e-3 is not exactly representable; the round trip is exact at f32 precision.
        let Value::Record(entries) = &decoded else {
            panic!("expected record");
        };
        let Value::Matrix(m) = entries["inner"].get("m").unwrap() else {
            panic!("expected matrix");
        };

        assert_eq!(m[1][1], 1e-3f32 as f64);
        assert_eq!(entries["inner"].get("n"), Some(&Value::Number(-7.0)));
        assert_eq!(entries["v"], Value::from([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_missing_property() {
        let value = Value::record([("pos", Value::from([0.0, 0.0]))]);
        let result = encode(&value, &particle_type());

        assert!(matches!(result, Err(FieldError::MissingProperty(name)) if name == "id"));
    }

    #[test]
    fn test_shape_errors() {
        let vec3 = ElementType::vector(F32, 3).unwrap();
        let mat = ElementType::matrix(F32, 2, 2).unwrap();

        assert!(matches!(
            encode(&Value::from([1.0, 2.0]), &vec3),
            Err(FieldError::Shape(_))
        ));
        assert!(matches!(
            encode(&Value::Matrix(vec![vec![1.0, 2.0], vec![3.0]]), &mat),
            Err(FieldError::Shape(_))
        ));
        assert!(matches!(
            encode(&Value::Number(1.0), &vec3),
            Err(FieldError::Shape(_))
        ));
        assert!(matches!(
            encode(&Value::Number(1.0), &particle_type()),
            Err(FieldError::Shape(_))
        ));
        assert!(matches!(
            decode(&[1, 2], &[0.0, 0.0], &vec3),
            Err(FieldError::Shape(_))
        ));
    }

    #[test]
    fn test_parallel_views_alias_the_same_bits() {
        let ty = ElementType::structure([
            ("f", ElementType::scalar(F32)),
            ("i", ElementType::scalar(I32)),
        ])
        .unwrap();
        let encoded = encode(
            &Value::record([("f", Value::from(-0.75)), ("i", Value::from(9))]),
            &ty,
        )
        .unwrap();

        for (word, float) in encoded.int_array.iter().zip(&encoded.float_array) {
            assert_eq!(*word, f32_to_bits(*float));
        }
    }
}
