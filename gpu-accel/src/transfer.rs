use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::GpuError;

/// Width of one primitive slot on the device.
pub const WORD_BYTES: usize = 4;

static TREE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(pub u64);

impl TreeId {
    pub fn next() -> Self {
        return TreeId(TREE_COUNTER.fetch_add(1, Ordering::Relaxed));
    }
}

/// A device byte range read back to the host, viewed as i32 words and as
/// f32 words. Both views alias the same bits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferCopy {
    pub int_array: Vec<i32>,
    pub float_array: Vec<f32>,
}

impl TransferCopy {
    pub fn from_words(words: &[i32]) -> Self {
        let float_array = words.iter().map(|&w| bytemuck::cast::<i32, f32>(w)).collect();

        return Self {
            int_array: words.to_vec(),
            float_array,
        };
    }

    /// `bytes` must hold a whole number of words; a trailing partial word is dropped.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let whole = bytes.len() - bytes.len() % WORD_BYTES;
        let words: Vec<i32> = bytemuck::pod_collect_to_vec(&bytes[..whole]);

        return Self::from_words(&words);
    }

    pub fn len(&self) -> usize {
        self.int_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.int_array.is_empty()
    }
}

/// Checks a byte range against an allocation of `size` bytes.
pub fn check_range(offset: usize, length: usize, size: usize) -> Result<(), GpuError> {
    if offset % WORD_BYTES != 0 || length % WORD_BYTES != 0 {
        return Err(GpuError::Unaligned { offset, length });
    }

    match offset.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(GpuError::OutOfRange {
            offset,
            length,
            size,
        }),
    }
}

/// Host/device boundary. Implementations are driven from a single task;
/// callers must not overlap a write with any other access to the same bytes.
#[allow(async_fn_in_trait)]
pub trait DeviceTransfer {
    /// Allocates a zeroed region of at least `size_bytes`, rounded up to a whole word.
    async fn allocate_tree(&self, size_bytes: usize) -> Result<TreeId, GpuError>;

    async fn device_to_host(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        length_bytes: usize,
    ) -> Result<TransferCopy, GpuError>;

    async fn host_to_device(
        &self,
        tree: TreeId,
        offset_bytes: usize,
        words: &[i32],
    ) -> Result<(), GpuError>;
}
