use std::marker::PhantomData;

/// GPU buffer holding exactly one `Content`
///
/// Remembers the last bytes written so an unchanged value costs no upload.
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    last_written: Option<Vec<u8>>,
    content: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    fn short_type_name() -> &'static str {
        let name = std::any::type_name::<Content>();
        name.rsplit("::").next().unwrap_or(name)
    }

    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("Uniform: {}", Self::short_type_name())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            last_written: None,
            content: PhantomData,
        }
    }

    /// Queues a write unless `content` matches what was last written
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let bytes = bytemuck::bytes_of(&content);
        if self.last_written.as_deref() == Some(bytes) {
            return;
        }
        queue.write_buffer(&self.buffer, 0, bytes);
        self.last_written = Some(bytes.to_vec());
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    /// Frees the GPU allocation now instead of waiting for drop
    pub fn destroy(&self) {
        self.buffer.destroy();
    }
}
