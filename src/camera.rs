use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

const ORBIT_SENSITIVITY: f32 = 0.005;
const PAN_SENSITIVITY: f32 = 0.001;
const ZOOM_SENSITIVITY: f32 = 0.1;
const MIN_DISTANCE: f32 = 0.1;

/// Orbit camera: the eye revolves around a look-at target on a sphere,
/// panning moves eye and target together, zooming changes the radius.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl OrbitCamera {
    pub fn new(eye: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            eye,
            target,
            up: Vec3::Y,
            fov_y: 75.0_f32.to_radians(),
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Revolves the eye around the target, pixel deltas to spherical angles.
    /// The elevation is clamped just short of the poles.
    pub fn orbit(&mut self, delta: Vec2) {
        let offset = self.eye - self.target;
        let radius = offset.length();

        let mut theta = offset.z.atan2(offset.x);
        let mut phi = (offset.y / radius).acos();

        theta += delta.x * ORBIT_SENSITIVITY;
        phi += delta.y * ORBIT_SENSITIVITY;
        phi = phi.clamp(0.01, std::f32::consts::PI - 0.01);

        self.eye = self.target
            + Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            );
    }

    /// Moves eye and target together in the view plane. Distance-scaled so
    /// a pixel of drag covers about the same screen-space motion at any zoom.
    pub fn pan(&mut self, delta: Vec2) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward);

        let distance = (self.target - self.eye).length();
        let world_per_pixel = distance * PAN_SENSITIVITY;

        let motion = right * (-delta.x * world_per_pixel) + up * (delta.y * world_per_pixel);
        self.eye += motion;
        self.target += motion;
    }

    /// Moves the eye along the view direction, never through the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = (self.target - self.eye).normalize();
        let distance = (self.target - self.eye).length();

        let new_distance = (distance - delta * distance * ZOOM_SENSITIVITY).max(MIN_DISTANCE);
        self.eye = self.target - direction * new_distance;
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    inv_view_proj: Mat4,
    eye: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, camera: &OrbitCamera) {
        let view_proj = camera.view_projection_matrix();
        self.view_proj = view_proj;
        self.inv_view_proj = view_proj.inverse();
        self.eye = camera.eye.extend(1.0);
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 16.0 / 9.0)
    }

    #[test]
    fn orbit_preserves_radius() {
        let mut camera = camera();
        camera.orbit(Vec2::new(120.0, -45.0));

        assert_relative_eq!((camera.eye - camera.target).length(), 30.0, epsilon = 1e-4);
    }

    #[test]
    fn orbit_clamps_at_poles() {
        let mut camera = camera();
        camera.orbit(Vec2::new(0.0, 1e6));

        let offset = camera.eye - camera.target;
        let phi = (offset.y / offset.length()).acos();
        assert!(phi > 0.0 && phi < std::f32::consts::PI);
    }

    #[test]
    fn pan_moves_eye_and_target_together() {
        let mut camera = camera();
        let offset_before = camera.target - camera.eye;
        camera.pan(Vec2::new(50.0, -20.0));

        let offset_after = camera.target - camera.eye;
        assert_relative_eq!(
            (offset_after - offset_before).length(),
            0.0,
            epsilon = 1e-4
        );
        assert!(camera.target.length() > 0.0);
    }

    #[test]
    fn zoom_never_reaches_target() {
        let mut camera = camera();
        for _ in 0..100 {
            camera.zoom(10.0);
        }

        assert!((camera.eye - camera.target).length() >= MIN_DISTANCE - 1e-6);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = camera();
        let clip = camera.view_projection_matrix().project_point3(camera.target);

        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
    }
}
