//! Owning context for fields: SNode tree layout, materialization and the
//! field-relative device transfer calls.

use std::sync::atomic::{AtomicU64, Ordering};

use gpu_accel::{DeviceTransfer, TransferCopy, TreeId, WORD_BYTES};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{FieldError, Result};
use crate::field::Field;
use crate::shape::Shape;
use crate::texture::{CanvasTexture, Texture, TextureId};
use crate::types::{ElementType, PrimitiveKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeIndex(pub usize);

#[derive(Debug, Default)]
struct SNodeTree {
    size_bytes: usize,
    num_fields: usize,
    // no fields may join once sealed
    sealed: bool,
    device: Option<TreeId>,
}

pub struct Program<R> {
    runtime: R,
    trees: Mutex<Vec<SNodeTree>>,
    materialize_lock: tokio::sync::Mutex<()>,
    texture_counter: AtomicU64,
}

impl<R: DeviceTransfer> Program<R> {
    pub fn new(runtime: R) -> Self {
        return Self {
            runtime,
            trees: Mutex::new(Vec::new()),
            materialize_lock: tokio::sync::Mutex::new(()),
            texture_counter: AtomicU64::new(0),
        };
    }

    pub fn runtime(&self) -> &R {
        return &self.runtime;
    }

    //
    // Field declaration
    //

    /// Places a new field at the end of the current tree, opening a new tree
    /// if the current one is already materialized.
    pub fn typed_field(&self, element_type: ElementType, dims: Vec<usize>) -> Result<Field> {
        let shape = Shape::new(dims)?;
        let size_bytes = shape.total_elements() * element_type.layout().size_bytes();
        let mut trees = self.trees.lock();

        if trees.last().map_or(true, |tree| tree.sealed) {
            trees.push(SNodeTree::default());
        }

        let index = trees.len() - 1;
        let tree = &mut trees[index];
        let offset_bytes = tree.size_bytes;

        tree.size_bytes += size_bytes;
        tree.num_fields += 1;

        debug!(
            tree = index,
            offset_bytes,
            size_bytes,
            dims = ?shape.dims,
            element = ?element_type,
            "Declared field"
        );

        return Ok(Field::new(
            TreeIndex(index),
            offset_bytes,
            size_bytes,
            shape,
            element_type,
        ));
    }

    pub fn field(&self, primitive: PrimitiveKind, dims: Vec<usize>) -> Result<Field> {
        return self.typed_field(ElementType::scalar(primitive), dims);
    }

    pub fn vector_field(
        &self,
        num_rows: usize,
        primitive: PrimitiveKind,
        dims: Vec<usize>,
    ) -> Result<Field> {
        return self.typed_field(ElementType::vector(primitive, num_rows)?, dims);
    }

    pub fn matrix_field(
        &self,
        num_rows: usize,
        num_cols: usize,
        primitive: PrimitiveKind,
        dims: Vec<usize>,
    ) -> Result<Field> {
        return self.typed_field(ElementType::matrix(primitive, num_rows, num_cols)?, dims);
    }

    pub fn struct_field<I, S>(&self, properties: I, dims: Vec<usize>) -> Result<Field>
    where
        I: IntoIterator<Item = (S, ElementType)>,
        S: Into<String>,
    {
        return self.typed_field(ElementType::structure(properties)?, dims);
    }

    //
    // Materialization
    //

    /// Allocates device storage for every pending tree. Safe to call any
    /// number of times; concurrent callers wait for the one in progress.
    pub async fn materialize_current_tree(&self) -> Result<()> {
        let _guard = self.materialize_lock.lock().await;

        let pending: Vec<(usize, usize, usize)> = {
            let mut trees = self.trees.lock();

            trees
                .iter_mut()
                .enumerate()
                .filter(|(_, tree)| tree.device.is_none() && tree.size_bytes > 0)
                .map(|(index, tree)| {
                    tree.sealed = true;
                    (index, tree.size_bytes, tree.num_fields)
                })
                .collect()
        };

        for (index, size_bytes, num_fields) in pending {
            let id = self.runtime.allocate_tree(size_bytes).await?;

            self.trees.lock()[index].device = Some(id);

            info!(
                tree = index,
                device_tree = id.0,
                size_bytes,
                num_fields,
                "Materialized tree"
            );
        }

        return Ok(());
    }

    pub fn is_materialized(&self, tree: TreeIndex) -> bool {
        return self.device_tree(tree).is_some();
    }

    pub fn tree_size_bytes(&self, tree: TreeIndex) -> Option<usize> {
        return self.trees.lock().get(tree.0).map(|t| t.size_bytes);
    }

    fn device_tree(&self, tree: TreeIndex) -> Option<TreeId> {
        return self.trees.lock().get(tree.0).and_then(|t| t.device);
    }

    async fn ensure_materialized(&self, tree: TreeIndex) -> Result<TreeId> {
        if let Some(id) = self.device_tree(tree) {
            return Ok(id);
        }

        self.materialize_current_tree().await?;

        return self
            .device_tree(tree)
            .ok_or(FieldError::NotMaterialized(tree.0));
    }

    //
    // Transfers
    //

    fn field_range(
        field: &Field,
        offset_bytes: Option<usize>,
        length_bytes: Option<usize>,
    ) -> Result<(usize, usize)> {
        let offset = offset_bytes.unwrap_or(0);
        let length = length_bytes.unwrap_or(field.size_bytes().saturating_sub(offset));

        if offset + length > field.size_bytes() {
            return Err(FieldError::SizeMismatch {
                expected: field.size_bytes(),
                actual: offset + length,
            });
        }

        return Ok((offset, length));
    }

    /// Reads `length_bytes` (default: the rest of the field) starting
    /// `offset_bytes` into the field.
    pub async fn device_to_host(
        &self,
        field: &Field,
        offset_bytes: Option<usize>,
        length_bytes: Option<usize>,
    ) -> Result<TransferCopy> {
        let (offset, length) = Self::field_range(field, offset_bytes, length_bytes)?;
        let tree = self.ensure_materialized(field.tree()).await?;
        let copy = self
            .runtime
            .device_to_host(tree, field.offset_bytes() + offset, length)
            .await?;

        return Ok(copy);
    }

    pub async fn host_to_device(
        &self,
        field: &Field,
        words: &[i32],
        offset_bytes: Option<usize>,
    ) -> Result<()> {
        let (offset, _) =
            Self::field_range(field, offset_bytes, Some(words.len() * WORD_BYTES))?;
        let tree = self.ensure_materialized(field.tree()).await?;

        self.runtime
            .host_to_device(tree, field.offset_bytes() + offset, words)
            .await?;

        return Ok(());
    }

    //
    // Textures
    //

    fn next_texture_id(&self) -> TextureId {
        return TextureId(self.texture_counter.fetch_add(1, Ordering::Relaxed));
    }

    pub fn texture(
        &self,
        primitive: PrimitiveKind,
        num_components: u32,
        dimensions: Vec<u32>,
    ) -> Result<Texture> {
        return Texture::new(self.next_texture_id(), primitive, num_components, dimensions);
    }

    pub fn canvas_texture(&self, format: wgpu::TextureFormat) -> CanvasTexture {
        return CanvasTexture::new(self.next_texture_id(), format);
    }
}
