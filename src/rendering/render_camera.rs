use crate::camera::{CameraUniform, OrbitCamera};

/// GPU-side mirror of the orbit camera.
pub struct RenderCamera {
    uniform: CameraUniform,
    pub uniform_buffer: wgpu::Buffer,
}

impl RenderCamera {
    pub fn new(device: &wgpu::Device, camera: &OrbitCamera) -> Self {
        let mut uniform = CameraUniform::default();
        uniform.update(camera);
        let uniform_buffer = uniform.create_buffer(device);

        Self {
            uniform,
            uniform_buffer,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, camera: &OrbitCamera) {
        self.uniform.update(camera);
        self.uniform.update_buffer(queue, &self.uniform_buffer);
    }
}
