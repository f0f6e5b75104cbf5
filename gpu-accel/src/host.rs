use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use tracing::debug;

use super::config::RuntimeConfig;
use super::error::GpuError;
use super::transfer::{check_range, DeviceTransfer, TransferCopy, TreeId, WORD_BYTES};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferRange {
    pub tree: Option<TreeId>,
    pub offset_bytes: usize,
    pub length_bytes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransferStats {
    pub reads: usize,
    pub writes: usize,
    pub bytes_read: usize,
    pub bytes_written: usize,
    pub last_read: TransferRange,
    pub last_write: TransferRange,
}

#[derive(Debug, Default)]
struct RangeCell {
    tree: AtomicUsize, // tree id + 1, zero when unset
    offset: AtomicUsize,
    length: AtomicUsize,
}

impl RangeCell {
    fn store(&self, tree: TreeId, offset: usize, length: usize) {
        self.tree.store(tree.0 as usize + 1, Ordering::Relaxed);
        self.offset.store(offset, Ordering::Relaxed);
        self.length.store(length, Ordering::Relaxed);
    }

    fn load(&self) -> TransferRange {
        let tree = match self.tree.load(Ordering::Relaxed) {
            0 => None,
            raw => Some(TreeId(raw as u64 - 1)),
        };

        return TransferRange {
            tree,
            offset_bytes: self.offset.load(Ordering::Relaxed),
            length_bytes: self.length.load(Ordering::Relaxed),
        };
    }
}

/// `DeviceTransfer` over plain host memory. Applies the same range and
/// alignment rules as the wgpu runtime, so it stands in for a device in tests
/// and on machines without an adapter.
#[derive(Debug, Default)]
pub struct HostRuntime {
    trees: DashMap<TreeId, Vec<u8>>,
    max_buffer_bytes: Option<u64>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    bytes_read: AtomicUsize,
    bytes_written: AtomicUsize,
    last_read: RangeCell,
    last_write: RangeCell,
}

impl HostRuntime {
    pub fn new() -> Self {
        return Self::default();
    }

    pub fn with_config(config: &RuntimeConfig) -> Self {
        return Self {
            max_buffer_bytes: config.max_buffer_bytes,
            ..Self::default()
        };
    }

    pub fn tree_count(&self) -> usize {
        return self.trees.len();
    }

    pub fn tree_size(&self, tree: TreeId) -> Option<usize> {
        return self.trees.get(&tree).map(|bytes| bytes.len());
    }

    pub fn stats(&self) -> TransferStats {
        return TransferStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            last_read: self.last_read.load(),
            last_write: self.last_write.load(),
        };
    }
}

impl DeviceTransfer for HostRuntime {
    async fn allocate_tree(&self, size_bytes: usize) -> Result<TreeId, GpuError> {
        let padded = size_bytes.max(WORD_BYTES).next_multiple_of(WORD_BYTES);

        if let Some(limit) = self.max_buffer_bytes {
            if padded as u64 > limit {
                return Err(GpuError::MemoryExhaustion {
                    requested: padded as u64,
                    limit,
                });
            }
        }

        let id = TreeId::next();

        self.trees.insert(id, vec![0u8; padded]);

        debug!(tree = id.0, size_bytes = padded, "Allocated host tree");

        return Ok(id);
    }

    async fn device_to_host(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        length_bytes: usize,
    ) -> Result<TransferCopy, GpuError> {
        let bytes = self.trees.get(&tree).ok_or(GpuError::UnknownTree(tree))?;

        check_range(offset_bytes, length_bytes, bytes.len())?;

        let copy = TransferCopy::from_bytes(&bytes[offset_bytes..offset_bytes + length_bytes]);

        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(length_bytes, Ordering::Relaxed);
        self.last_read.store(tree, offset_bytes, length_bytes);

        return Ok(copy);
    }

    async fn host_to_device(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        words: &[i32],
    ) -> Result<(), GpuError> {
        let mut bytes = self
            .trees
            .get_mut(&tree)
            .ok_or(GpuError::UnknownTree(tree))?;
        let length_bytes = words.len() * WORD_BYTES;

        check_range(offset_bytes, length_bytes, bytes.len())?;

        bytes[offset_bytes..offset_bytes + length_bytes]
            .copy_from_slice(bytemuck::cast_slice(words));

        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(length_bytes, Ordering::Relaxed);
        self.last_write.store(tree, offset_bytes, length_bytes);

        return Ok(());
    }
}
