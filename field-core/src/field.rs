//! GPU-resident typed multidimensional arrays.
//!
//! Every transfer goes through the owning [`Program`], passed explicitly to
//! each call. Calls on one field are not serialized: a write must not overlap
//! any other in-flight access to the same bytes.

use gpu_accel::{DeviceTransfer, WORD_BYTES};
use tracing::{debug, error};

use crate::codec;
use crate::error::{FieldError, Result};
use crate::program::{Program, TreeIndex};
use crate::reshape;
use crate::shape::Shape;
use crate::types::{ElementType, PrimitiveKind};
use crate::value::{NdArray, Value};

/// One primitive slot of the element layout, as placed on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceNode {
    pub slot: usize,
    pub primitive: PrimitiveKind,
}

#[derive(Debug, Clone)]
pub struct Field {
    tree: TreeIndex,
    offset_bytes: usize,
    size_bytes: usize,
    shape: Shape,
    element_type: ElementType,
    place_nodes: Vec<PlaceNode>,
}

impl Field {
    pub(crate) fn new(
        tree: TreeIndex,
        offset_bytes: usize,
        size_bytes: usize,
        shape: Shape,
        element_type: ElementType,
    ) -> Self {
        let place_nodes = element_type
            .layout()
            .primitives()
            .iter()
            .enumerate()
            .map(|(slot, &primitive)| PlaceNode { slot, primitive })
            .collect();

        return Self {
            tree,
            offset_bytes,
            size_bytes,
            shape,
            element_type,
            place_nodes,
        };
    }

    pub fn tree(&self) -> TreeIndex {
        self.tree
    }

    /// Byte offset of this field inside its tree.
    pub fn offset_bytes(&self) -> usize {
        self.offset_bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.shape.dims
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    pub fn place_nodes(&self) -> &[PlaceNode] {
        &self.place_nodes
    }

    pub fn num_elements(&self) -> usize {
        self.shape.total_elements()
    }

    pub fn element_size_bytes(&self) -> usize {
        self.element_type.layout().size_bytes()
    }

    /// Field-relative byte range of the element at `indices`.
    pub fn element_byte_range(&self, indices: &[usize]) -> Result<(usize, usize)> {
        let index = self.shape.flatten_index(indices)?;
        let element_size_bytes = self.element_size_bytes();

        return Ok((index * element_size_bytes, element_size_bytes));
    }

    /// Whole field as flat numbers. Struct fields have no single primitive
    /// kind; for them this logs an error and returns an empty vector.
    pub async fn to_array_1d<R: DeviceTransfer>(&self, program: &Program<R>) -> Result<Vec<f64>> {
        let Ok(primitive) = self.element_type.primitive_kind() else {
            error!(
                element = ?self.element_type,
                "to_array_1d can only be used for scalar/vector/matrix fields"
            );
            return Ok(Vec::new());
        };

        let copy = program.device_to_host(self, None, None).await?;

        let numbers = match primitive {
            PrimitiveKind::I32 => copy.int_array.into_iter().map(f64::from).collect(),
            PrimitiveKind::F32 => copy.float_array.into_iter().map(f64::from).collect(),
        };

        return Ok(numbers);
    }

    pub async fn to_array<R: DeviceTransfer>(
        &self,
        program: &Program<R>,
    ) -> Result<NdArray<Value>> {
        program.materialize_current_tree().await?;

        let copy = program.device_to_host(self, None, None).await?;
        let elements =
            reshape::group_elements(&copy.int_array, &copy.float_array, &self.element_type)?;

        return reshape::reshape(elements, &self.shape.dims);
    }

    pub async fn get<R: DeviceTransfer>(
        &self,
        program: &Program<R>,
        indices: &[usize],
    ) -> Result<Value> {
        let (offset_bytes, length_bytes) = self.element_byte_range(indices)?;

        debug!(?indices, offset_bytes, length_bytes, "Field get");

        let copy = program
            .device_to_host(self, Some(offset_bytes), Some(length_bytes))
            .await?;

        return codec::decode(&copy.int_array, &copy.float_array, &self.element_type);
    }

    /// Overwrites the whole field from flat numbers; floats are stored by bit pattern.
    pub async fn from_array_1d<R: DeviceTransfer>(
        &self,
        program: &Program<R>,
        values: &[f64],
    ) -> Result<()> {
        let primitive = self.element_type.primitive_kind().map_err(|_| {
            FieldError::Type(
                "from_array_1d can only be used on fields of scalar/vector/matrix types"
                    .to_string(),
            )
        })?;

        if values.len() * WORD_BYTES != self.size_bytes {
            return Err(FieldError::SizeMismatch {
                expected: self.size_bytes,
                actual: values.len() * WORD_BYTES,
            });
        }

        let words: Vec<i32> = values
            .iter()
            .map(|&value| codec::number_to_word(value, primitive))
            .collect();

        return program.host_to_device(self, &words, None).await;
    }

    /// Overwrites the whole field from a nested array whose shape must match
    /// the field's dimensions at every level.
    pub async fn from_array<R: DeviceTransfer>(
        &self,
        program: &Program<R>,
        values: &NdArray<Value>,
    ) -> Result<()> {
        let elements = reshape::flatten(values, &self.shape.dims)?;
        let mut words = Vec::with_capacity(self.size_bytes / WORD_BYTES);

        for element in elements {
            words.extend(codec::element_to_words(element, &self.element_type)?);
        }

        return program.host_to_device(self, &words, None).await;
    }

    pub async fn set<R: DeviceTransfer>(
        &self,
        program: &Program<R>,
        indices: &[usize],
        value: &Value,
    ) -> Result<()> {
        let (offset_bytes, length_bytes) = self.element_byte_range(indices)?;
        let words = codec::element_to_words(value, &self.element_type)?;

        debug!(?indices, offset_bytes, length_bytes, "Field set");

        return program
            .host_to_device(self, &words, Some(offset_bytes))
            .await;
    }
}
