use dashmap::DashMap;
use tracing::info;
use wgpu::Buffer;

use super::config::RuntimeConfig;
use super::error::GpuError;
use super::gpu_module::GpuModule;
use super::transfer::{check_range, DeviceTransfer, TransferCopy, TreeId, WORD_BYTES};

struct TreeBuffer {
    buffer: Buffer,
    size_bytes: usize,
}

/// `DeviceTransfer` backed by one wgpu storage buffer per tree.
pub struct GpuRuntime {
    gpu: GpuModule,
    trees: DashMap<TreeId, TreeBuffer>,
    max_buffer_bytes: u64,
}

impl GpuRuntime {
    pub async fn new(config: &RuntimeConfig) -> Result<Self, GpuError> {
        let gpu = GpuModule::new(config).await?;
        let adapter_max = gpu.max_buffer_size();
        let max_buffer_bytes = config
            .max_buffer_bytes
            .map_or(adapter_max, |limit| limit.min(adapter_max));

        return Ok(Self {
            gpu,
            trees: DashMap::new(),
            max_buffer_bytes,
        });
    }

    pub fn gpu(&self) -> &GpuModule {
        return &self.gpu;
    }

    pub fn tree_count(&self) -> usize {
        return self.trees.len();
    }
}

impl DeviceTransfer for GpuRuntime {
    async fn allocate_tree(&self, size_bytes: usize) -> Result<TreeId, GpuError> {
        let padded = size_bytes.max(WORD_BYTES).next_multiple_of(WORD_BYTES);

        if padded as u64 > self.max_buffer_bytes {
            return Err(GpuError::MemoryExhaustion {
                requested: padded as u64,
                limit: self.max_buffer_bytes,
            });
        }

        let id = TreeId::next();
        let buffer = self
            .gpu
            .create_storage_buffer(padded as u64, &format!("SNode Tree {}", id.0));

        self.trees.insert(
            id,
            TreeBuffer {
                buffer,
                size_bytes: padded,
            },
        );

        info!(tree = id.0, size_bytes = padded, "Allocated tree buffer");

        return Ok(id);
    }

    async fn device_to_host(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        length_bytes: usize,
    ) -> Result<TransferCopy, GpuError> {
        let entry = self.trees.get(&tree).ok_or(GpuError::UnknownTree(tree))?;

        check_range(offset_bytes, length_bytes, entry.size_bytes)?;

        let buffer = entry.buffer.clone();

        drop(entry);

        return self
            .gpu
            .read_buffer(&buffer, offset_bytes as u64, length_bytes as u64)
            .await;
    }

    async fn host_to_device(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        words: &[i32],
    ) -> Result<(), GpuError> {
        let entry = self.trees.get(&tree).ok_or(GpuError::UnknownTree(tree))?;

        check_range(offset_bytes, words.len() * WORD_BYTES, entry.size_bytes)?;

        if !words.is_empty() {
            self.gpu
                .write_buffer(&entry.buffer, offset_bytes as u64, words);
        }

        return Ok(());
    }
}
