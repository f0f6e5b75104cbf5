//! Element type descriptors.
//!
//! An [`ElementType`] is a cheap, shareable handle. Clones share the same
//! node, so the resolved [`Layout`] is computed at most once per descriptor
//! and then read by every field that uses it.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{FieldError, Result};
use crate::layout::{self, Layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    I32,
    F32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Scalar,
    Vector,
    Matrix,
    Struct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: ElementType,
}

#[derive(Debug, PartialEq)]
pub enum TypeKind {
    Scalar(PrimitiveKind),
    Vector {
        primitive: PrimitiveKind,
        rows: usize,
    },
    Matrix {
        primitive: PrimitiveKind,
        rows: usize,
        cols: usize,
    },
    Struct(Vec<Property>),
}

struct TypeNode {
    kind: TypeKind,
    layout: OnceLock<Layout>,
}

#[derive(Clone)]
pub struct ElementType {
    node: Arc<TypeNode>,
}

impl ElementType {
    fn from_kind(kind: TypeKind) -> Self {
        return Self {
            node: Arc::new(TypeNode {
                kind,
                layout: OnceLock::new(),
            }),
        };
    }

    pub fn scalar(primitive: PrimitiveKind) -> Self {
        return Self::from_kind(TypeKind::Scalar(primitive));
    }

    pub fn vector(primitive: PrimitiveKind, rows: usize) -> Result<Self> {
        if rows == 0 {
            return Err(FieldError::Construction(
                "vector must have at least one row".to_string(),
            ));
        }

        return Ok(Self::from_kind(TypeKind::Vector { primitive, rows }));
    }

    pub fn matrix(primitive: PrimitiveKind, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(FieldError::Construction(format!(
                "matrix dimensions must be positive, got {}x{}",
                rows, cols
            )));
        }

        return Ok(Self::from_kind(TypeKind::Matrix {
            primitive,
            rows,
            cols,
        }));
    }

    /// Builds a struct type; property order is kept as given.
    pub fn structure<I, S>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ElementType)>,
        S: Into<String>,
    {
        let properties: Vec<Property> = properties
            .into_iter()
            .map(|(name, ty)| Property {
                name: name.into(),
                ty,
            })
            .collect();

        if properties.is_empty() {
            return Err(FieldError::Construction(
                "struct must declare at least one property".to_string(),
            ));
        }

        let mut seen = HashSet::new();

        for property in &properties {
            if !seen.insert(property.name.as_str()) {
                return Err(FieldError::Construction(format!(
                    "duplicate struct property '{}'",
                    property.name
                )));
            }
        }

        return Ok(Self::from_kind(TypeKind::Struct(properties)));
    }

    pub fn kind(&self) -> &TypeKind {
        return &self.node.kind;
    }

    pub fn category(&self) -> TypeCategory {
        match self.kind() {
            TypeKind::Scalar(_) => TypeCategory::Scalar,
            TypeKind::Vector { .. } => TypeCategory::Vector,
            TypeKind::Matrix { .. } => TypeCategory::Matrix,
            TypeKind::Struct(_) => TypeCategory::Struct,
        }
    }

    /// Scalars, vectors and matrices are tensor types.
    pub fn is_tensor(&self) -> bool {
        return self.category() != TypeCategory::Struct;
    }

    pub fn primitive_kind(&self) -> Result<PrimitiveKind> {
        match self.kind() {
            TypeKind::Scalar(primitive) => Ok(*primitive),
            TypeKind::Vector { primitive, .. } => Ok(*primitive),
            TypeKind::Matrix { primitive, .. } => Ok(*primitive),
            TypeKind::Struct(_) => Err(FieldError::Type(
                "struct types have no single primitive kind".to_string(),
            )),
        }
    }

    pub fn num_rows(&self) -> Option<usize> {
        match self.kind() {
            TypeKind::Scalar(_) => Some(1),
            TypeKind::Vector { rows, .. } | TypeKind::Matrix { rows, .. } => Some(*rows),
            TypeKind::Struct(_) => None,
        }
    }

    pub fn num_cols(&self) -> Option<usize> {
        match self.kind() {
            TypeKind::Scalar(_) | TypeKind::Vector { .. } => Some(1),
            TypeKind::Matrix { cols, .. } => Some(*cols),
            TypeKind::Struct(_) => None,
        }
    }

    pub fn properties(&self) -> &[Property] {
        match self.kind() {
            TypeKind::Struct(properties) => properties,
            _ => &[],
        }
    }

    pub fn property_type(&self, name: &str) -> Option<&ElementType> {
        return self
            .properties()
            .iter()
            .find(|property| property.name == name)
            .map(|property| &property.ty);
    }

    pub fn layout(&self) -> &Layout {
        return self.node.layout.get_or_init(|| layout::resolve(self));
    }

    pub fn num_primitives(&self) -> usize {
        return self.layout().len();
    }

    /// True when both handles share one descriptor node (and thus one layout cache).
    pub fn same_descriptor(&self, other: &ElementType) -> bool {
        return Arc::ptr_eq(&self.node, &other.node);
    }
}

impl PartialEq for ElementType {
    fn eq(&self, other: &Self) -> bool {
        return self.same_descriptor(other) || self.node.kind == other.node.kind;
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TypeKind::Scalar(primitive) => write!(formatter, "{:?}", primitive),
            TypeKind::Vector { primitive, rows } => {
                write!(formatter, "Vector<{:?}, {}>", primitive, rows)
            }
            TypeKind::Matrix {
                primitive,
                rows,
                cols,
            } => write!(formatter, "Matrix<{:?}, {}x{}>", primitive, rows, cols),
            TypeKind::Struct(properties) => {
                let mut debug = formatter.debug_struct("Struct");

                for property in properties {
                    debug.field(&property.name, &property.ty);
                }

                debug.finish()
            }
        }
    }
}
