use std::collections::BTreeMap;

/// Host-side element value.
///
/// Numbers are carried as `f64`. Integer slots truncate toward zero and wrap
/// modulo 2^32 on encode; float slots round to the nearest `f32`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    pub fn record<I, S, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        return Value::Record(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Vector(_) => "vector",
            Value::Matrix(_) => "matrix",
            Value::Record(_) => "record",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(entries) => entries.get(key),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Number(number as f64)
    }
}

impl From<Vec<f64>> for Value {
    fn from(vector: Vec<f64>) -> Self {
        Value::Vector(vector)
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(vector: [f64; N]) -> Self {
        Value::Vector(vector.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for Value {
    fn from(matrix: Vec<Vec<f64>>) -> Self {
        Value::Matrix(matrix)
    }
}

impl<const R: usize, const C: usize> From<[[f64; C]; R]> for Value {
    fn from(matrix: [[f64; C]; R]) -> Self {
        Value::Matrix(matrix.iter().map(|row| row.to_vec()).collect())
    }
}

/// Nested multi-dimensional view of a field's elements, outermost axis first.
#[derive(Debug, Clone, PartialEq)]
pub enum NdArray<T> {
    Element(T),
    Array(Vec<NdArray<T>>),
}

impl<T> NdArray<T> {
    pub fn nested(items: Vec<NdArray<T>>) -> Self {
        return NdArray::Array(items);
    }

    pub fn as_element(&self) -> Option<&T> {
        match self {
            NdArray::Element(element) => Some(element),
            NdArray::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NdArray<T>]> {
        match self {
            NdArray::Element(_) => None,
            NdArray::Array(items) => Some(items),
        }
    }

    /// Follows `indices` one axis at a time.
    pub fn at(&self, indices: &[usize]) -> Option<&NdArray<T>> {
        let mut current = self;

        for &index in indices {
            current = current.as_array()?.get(index)?;
        }

        return Some(current);
    }
}

impl<T> From<Vec<T>> for NdArray<T> {
    fn from(elements: Vec<T>) -> Self {
        NdArray::Array(elements.into_iter().map(NdArray::Element).collect())
    }
}
