pub mod config;
pub mod error;
pub mod gpu_module;
pub mod host;
pub mod runtime;
pub mod transfer;

pub use config::{Backend, RuntimeConfig};
pub use error::GpuError;
pub use gpu_module::GpuModule;
pub use host::{HostRuntime, TransferRange, TransferStats};
pub use runtime::GpuRuntime;
pub use transfer::{DeviceTransfer, TransferCopy, TreeId, WORD_BYTES};

pub use wgpu;

#[derive(Debug, Clone)]
pub struct GpuInfo {
    pub name: String,
    pub vendor: String,
    pub device_type: String,
    pub backend: String,
}
