pub use field_core::utils::{ndrange, range};
pub use field_core::{ElementType, FieldError, NdArray, PrimitiveKind, Program, TextureBase, Value};
pub use gpu_accel::{Backend, DeviceTransfer, GpuRuntime, HostRuntime, RuntimeConfig};
