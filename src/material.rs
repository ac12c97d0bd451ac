use std::path::Path;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::texture::{CubeTexture, Texture};

/// Fixed location of the material's texture maps.
pub const MATERIAL_DIR: &str = "assets/materials/streaked-metal1";

const FALLBACK_WHITE: [u8; 4] = [255, 255, 255, 255];
// A flat tangent-space normal.
const FALLBACK_NORMAL: [u8; 4] = [128, 128, 255, 255];

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MaterialParams {
    pub metalness: f32,
    pub roughness: f32,
    _padding: [f32; 2],
}

/// The one physically-based material shared by every mesh in the model:
/// base color, ambient occlusion, normal and metalness maps, plus scalar
/// metalness/roughness. The environment cube map doubles as its
/// reflection source.
pub struct PbrMaterial {
    base_color: Texture,
    ambient_occlusion: Texture,
    normal: Texture,
    metalness: Texture,
    params_buffer: wgpu::Buffer,
}

impl PbrMaterial {
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let directory = Path::new(MATERIAL_DIR);

        let base_color = Texture::from_file_or_fallback(
            device,
            queue,
            &directory.join("streaked-metal1_base.png"),
            true,
            FALLBACK_WHITE,
            "Base color map",
        );
        let ambient_occlusion = Texture::from_file_or_fallback(
            device,
            queue,
            &directory.join("streaked-metal1_ao.png"),
            false,
            FALLBACK_WHITE,
            "Ambient occlusion map",
        );
        let normal = Texture::from_file_or_fallback(
            device,
            queue,
            &directory.join("streaked-metal1_normal.png"),
            false,
            FALLBACK_NORMAL,
            "Normal map",
        );
        let metalness = Texture::from_file_or_fallback(
            device,
            queue,
            &directory.join("streaked-metal1_metallic.png"),
            false,
            FALLBACK_WHITE,
            "Metalness map",
        );

        let params = MaterialParams {
            metalness: 0.2,
            roughness: 0.0,
            _padding: [0.0; 2],
        };

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material params buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Self {
            base_color,
            ambient_occlusion,
            normal,
            metalness,
            params_buffer,
        }
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
                texture_entry(5),
                wgpu::BindGroupLayoutEntry {
                    binding: 6,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 7,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        environment: &CubeTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("material_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.base_color.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&self.base_color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.ambient_occlusion.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&self.normal.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&self.metalness.view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(&environment.sampler),
                },
            ],
        })
    }
}
