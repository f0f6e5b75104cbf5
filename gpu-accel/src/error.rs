use crate::transfer::TreeId;

#[derive(thiserror::Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter: {0}")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),

    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("Failed to map staging buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("Device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("Staging buffer callback dropped before completion")]
    ChannelClosed,

    #[error("Unknown tree {0:?}")]
    UnknownTree(TreeId),

    #[error("Transfer out of range: offset {offset} + length {length} exceeds {size} bytes")]
    OutOfRange {
        offset: usize,
        length: usize,
        size: usize,
    },

    #[error("Transfer not aligned to 4 bytes: offset {offset}, length {length}")]
    Unaligned { offset: usize, length: usize },

    #[error("Memory exhaustion: requested {requested} bytes, limit {limit} bytes")]
    MemoryExhaustion { requested: u64, limit: u64 },
}
