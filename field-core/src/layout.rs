use gpu_accel::WORD_BYTES;

use crate::types::{ElementType, PrimitiveKind, TypeKind};

/// Flattened primitive slots of an element type, plus the starting slot of
/// each struct property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    primitives: Vec<PrimitiveKind>,
    property_offsets: Vec<(String, usize)>,
}

impl Layout {
    pub fn primitives(&self) -> &[PrimitiveKind] {
        return &self.primitives;
    }

    pub fn len(&self) -> usize {
        return self.primitives.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.primitives.is_empty();
    }

    pub fn size_bytes(&self) -> usize {
        return self.primitives.len() * WORD_BYTES;
    }

    pub fn property_offset(&self, name: &str) -> Option<usize> {
        return self
            .property_offsets
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, offset)| *offset);
    }

    /// Offsets in declared property order. Empty for tensor types.
    pub fn property_offsets(&self) -> &[(String, usize)] {
        return &self.property_offsets;
    }
}

/// Prefer [`ElementType::layout`], which caches the result on the descriptor.
pub fn resolve(ty: &ElementType) -> Layout {
    match ty.kind() {
        TypeKind::Scalar(primitive) => Layout {
            primitives: vec![*primitive],
            property_offsets: Vec::new(),
        },
        TypeKind::Vector { primitive, rows } => Layout {
            primitives: vec![*primitive; *rows],
            property_offsets: Vec::new(),
        },
        // row-major: all of row 0, then row 1, ...
        TypeKind::Matrix {
            primitive,
            rows,
            cols,
        } => Layout {
            primitives: vec![*primitive; rows * cols],
            property_offsets: Vec::new(),
        },
        TypeKind::Struct(properties) => {
            let mut primitives = Vec::new();
            let mut property_offsets = Vec::with_capacity(properties.len());

            for property in properties {
                property_offsets.push((property.name.clone(), primitives.len()));
                primitives.extend_from_slice(property.ty.layout().primitives());
            }

            Layout {
                primitives,
                property_offsets,
            }
        }
    }
}
