//! Image resources. These sit beside fields rather than inside them: a
//! texture is a logical descriptor plus a device handle, nothing more.

use wgpu::{Extent3d, TextureDimension, TextureFormat, TextureUsages};

use crate::error::{FieldError, Result};
use crate::types::PrimitiveKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

pub trait TextureBase {
    fn format(&self) -> TextureFormat;

    fn can_render_target(&self) -> bool;

    fn handle(&self) -> TextureId;
}

#[derive(Debug, Clone)]
pub struct Texture {
    id: TextureId,
    primitive: PrimitiveKind,
    num_components: u32,
    dimensions: Vec<u32>,
}

impl Texture {
    pub(crate) fn new(
        id: TextureId,
        primitive: PrimitiveKind,
        num_components: u32,
        dimensions: Vec<u32>,
    ) -> Result<Self> {
        if dimensions.is_empty() || dimensions.len() > 3 {
            return Err(FieldError::Construction(format!(
                "texture dimensions must be >= 1 and <= 3, got {}",
                dimensions.len()
            )));
        }

        if dimensions.contains(&0) {
            return Err(FieldError::Construction(format!(
                "texture extent {:?} has a zero axis",
                dimensions
            )));
        }

        if !matches!(num_components, 1 | 2 | 4) {
            return Err(FieldError::Construction(format!(
                "texture components must be 1, 2, or 4, got {}",
                num_components
            )));
        }

        return Ok(Self {
            id,
            primitive,
            num_components,
            dimensions,
        });
    }

    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    pub fn num_components(&self) -> u32 {
        self.num_components
    }

    pub fn dimensions(&self) -> &[u32] {
        &self.dimensions
    }

    /// Allocation descriptor for `GpuModule::create_texture`.
    pub fn descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        let dimension = match self.dimensions.len() {
            1 => TextureDimension::D1,
            2 => TextureDimension::D2,
            _ => TextureDimension::D3,
        };

        let mut usage = TextureUsages::TEXTURE_BINDING
            | TextureUsages::STORAGE_BINDING
            | TextureUsages::COPY_SRC
            | TextureUsages::COPY_DST;

        if self.can_render_target() {
            usage |= TextureUsages::RENDER_ATTACHMENT;
        }

        return wgpu::TextureDescriptor {
            label: None,
            size: Extent3d {
                width: self.dimensions[0],
                height: self.dimensions.get(1).copied().unwrap_or(1),
                depth_or_array_layers: self.dimensions.get(2).copied().unwrap_or(1),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension,
            format: self.format(),
            usage,
            view_formats: &[],
        };
    }
}

impl TextureBase for Texture {
    fn format(&self) -> TextureFormat {
        match (self.primitive, self.num_components) {
            (PrimitiveKind::F32, 1) => TextureFormat::R32Float,
            (PrimitiveKind::F32, 2) => TextureFormat::Rg32Float,
            (PrimitiveKind::F32, _) => TextureFormat::Rgba32Float,
            (PrimitiveKind::I32, 1) => TextureFormat::R32Sint,
            (PrimitiveKind::I32, 2) => TextureFormat::Rg32Sint,
            (PrimitiveKind::I32, _) => TextureFormat::Rgba32Sint,
        }
    }

    fn can_render_target(&self) -> bool {
        self.primitive == PrimitiveKind::F32
    }

    fn handle(&self) -> TextureId {
        self.id
    }
}

/// Texture backed by a presentation surface; the surface picks the format.
#[derive(Debug, Clone)]
pub struct CanvasTexture {
    id: TextureId,
    format: TextureFormat,
}

impl CanvasTexture {
    pub(crate) fn new(id: TextureId, format: TextureFormat) -> Self {
        Self { id, format }
    }
}

impl TextureBase for CanvasTexture {
    fn format(&self) -> TextureFormat {
        self.format
    }

    fn can_render_target(&self) -> bool {
        true
    }

    fn handle(&self) -> TextureId {
        self.id
    }
}
