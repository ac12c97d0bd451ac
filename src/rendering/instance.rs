use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::BufferUsages;

use crate::scene_graph::Scene;

/// Per-object data fed to the vertex stage: the world matrix and the
/// display color (default white, yellow while selected).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub color: Vec4,
}

impl Instance {
    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

pub struct Instances {
    instances: Vec<Instance>,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
        }
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn write_to_buffer(&self, queue: &wgpu::Queue, instance_buffer: &InstanceBuffer) {
        queue.write_buffer(
            instance_buffer.buffer(),
            0,
            bytemuck::cast_slice(&self.instances),
        );
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

/// Rebuilds every model's instance list from the current scene state.
pub fn gather_instances(scene: &mut Scene) {
    let mut staged = Vec::new();

    for (_, object) in scene.objects.iter() {
        if let Some(model_id) = object.model_id {
            staged.push((
                model_id,
                Instance {
                    model: *object.transform.get_world_matrix(),
                    color: Vec4::from_array(object.color),
                },
            ));
        }
    }

    for (_, model) in scene.models.iter_mut() {
        model.clear_instances();
    }

    for (model_id, instance) in staged {
        if let Some(model) = scene.models.get_mut(model_id) {
            model.add_instance(instance);
        }
    }
}

pub struct InstanceBuffer(wgpu::Buffer);

impl InstanceBuffer {
    const MAX_INSTANCES: u64 = 128;

    pub fn new(device: &wgpu::Device, name: impl Into<String>) -> Self {
        let name: String = name.into();

        let descriptor = Self::descriptor(&name);
        let buffer = device.create_buffer(&descriptor);

        Self(buffer)
    }

    fn descriptor(name: &str) -> wgpu::BufferDescriptor<'static> {
        // Damned lifetimes! Nothing a nice controlled memory leak can't fix.
        let label = format!("Instance buffer ({})", name);
        let label = label.into_boxed_str();
        let label = Box::leak(label);

        wgpu::BufferDescriptor {
            label: Some(label),
            size: std::mem::size_of::<Instance>() as u64 * Self::MAX_INSTANCES,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.0
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer().slice(..));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::scene_graph::{Object3D, SceneModel, HIGHLIGHT_COLOR};

    #[test]
    fn gather_collects_one_instance_per_object() {
        let mut scene = Scene::new();
        let model_id = scene.add_model(SceneModel::new(
            "shared".to_string(),
            Model {
                name: "shared".to_string(),
                primitives: Vec::new(),
            },
        ));

        scene.add_object(Object3D {
            model_id: Some(model_id),
            ..Default::default()
        });
        scene.add_object(Object3D {
            model_id: Some(model_id),
            color: HIGHLIGHT_COLOR,
            ..Default::default()
        });
        scene.update_transforms();

        gather_instances(&mut scene);

        let model = scene.get_model(model_id).unwrap();
        assert_eq!(model.instances().len(), 2);

        // A second gather replaces rather than accumulates.
        gather_instances(&mut scene);
        let model = scene.get_model(model_id).unwrap();
        assert_eq!(model.instances().len(), 2);
    }
}
