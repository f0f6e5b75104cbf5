use tracing::{debug, info};
use wgpu::{Adapter, Buffer, Device, Queue};

use super::config::RuntimeConfig;
use super::error::GpuError;
use super::transfer::{TransferCopy, WORD_BYTES};
use super::GpuInfo;

pub struct GpuModule {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
    pub info: GpuInfo,
}

impl GpuModule {
    pub async fn new(config: &RuntimeConfig) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await?;

        let adapter_info = adapter.get_info();

        info!(
            name = adapter_info.name.as_str(),
            backend = ?adapter_info.backend,
            "Using adapter"
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Field Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let info = GpuInfo {
            name: adapter_info.name.clone(),
            vendor: format!("{:?}", adapter_info.vendor),
            device_type: format!("{:?}", adapter_info.device_type),
            backend: format!("{:?}", adapter_info.backend),
        };

        return Ok(Self {
            adapter,
            device,
            queue,
            info,
        });
    }

    pub fn max_buffer_size(&self) -> u64 {
        return self.device.limits().max_buffer_size;
    }

    pub fn create_storage_buffer(&self, size_bytes: u64, label: &str) -> Buffer {
        return self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_bytes,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_SRC
                | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }

    pub fn create_texture(&self, descriptor: &wgpu::TextureDescriptor) -> wgpu::Texture {
        return self.device.create_texture(descriptor);
    }

    /// Copies `length` bytes starting at `offset` through a staging buffer.
    pub async fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: u64,
        length: u64,
    ) -> Result<TransferCopy, GpuError> {
        if length == 0 {
            return Ok(TransferCopy::default());
        }

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging Buffer"),
            size: length,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });

        encoder.copy_buffer_to_buffer(buffer, offset, &staging_buffer, 0, length);

        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = flume::bounded(1);

        buffer_slice.map_async(wgpu::MapMode::Read, move |v| {
            let _ = sender.send(v);
        });

        self.device.poll(wgpu::PollType::Wait)?;

        receiver
            .recv_async()
            .await
            .map_err(|_| GpuError::ChannelClosed)??;

        let data = buffer_slice.get_mapped_range();
        let copy = TransferCopy::from_bytes(&data);

        drop(data);

        staging_buffer.unmap();

        debug!(offset, length, words = copy.len(), "Read device buffer");

        return Ok(copy);
    }

    pub fn write_buffer(&self, buffer: &Buffer, offset: u64, words: &[i32]) {
        self.queue
            .write_buffer(buffer, offset, bytemuck::cast_slice(words));
        self.queue.submit(std::iter::empty());

        debug!(
            offset,
            length = words.len() * WORD_BYTES,
            "Wrote device buffer"
        );
    }

    pub fn print_info(&self) {
        println!("GPU Info:");
        println!("  Name: {}", self.info.name);
        println!("  Vendor: {}", self.info.vendor);
        println!("  Type: {}", self.info.device_type);
        println!("  Backend: {}", self.info.backend);
    }
}
