use std::path::Path;

use winit::dpi::PhysicalSize;

pub struct Texture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Loads a 2D texture map from disk. A file that fails to load or
    /// decode is logged and replaced with a single-pixel fallback — the
    /// frame still renders, just without that map's contribution.
    pub fn from_file_or_fallback(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        srgb: bool,
        fallback: [u8; 4],
        label: &str,
    ) -> Self {
        match image::open(path) {
            Ok(image) => {
                let rgba = image.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self::from_rgba(device, queue, &rgba, width, height, srgb, label)
            }
            Err(error) => {
                log::warn!(
                    "Failed to load texture {} ({}), using fallback pixel",
                    path.display(),
                    error
                );
                Self::from_rgba(device, queue, &fallback, 1, 1, srgb, label)
            }
        }
    }

    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
        label: &str,
    ) -> Self {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }
}

/// Six-face environment cube map: +X, -X, +Y, -Y, +Z, -Z.
pub struct CubeTexture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl CubeTexture {
    pub const FACE_FILES: [&'static str; 6] = [
        "right.jpg",
        "left.jpg",
        "top.jpg",
        "bottom.jpg",
        "front.jpg",
        "back.jpg",
    ];

    /// Loads the six face images from a directory. Any face that fails to
    /// load, or a set with mismatched dimensions, degrades the whole map to
    /// a neutral gray environment.
    pub fn load_or_fallback(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        directory: &Path,
        label: &str,
    ) -> Self {
        match Self::load_faces(directory) {
            Ok((faces, width, height)) => {
                Self::from_faces(device, queue, &faces, width, height, label)
            }
            Err(error) => {
                log::warn!(
                    "Failed to load cube map from {} ({:#}), using fallback",
                    directory.display(),
                    error
                );
                let gray = [[96u8, 96, 96, 255]; 6].map(|face| face.to_vec());
                Self::from_faces(device, queue, &gray, 1, 1, label)
            }
        }
    }

    fn load_faces(directory: &Path) -> anyhow::Result<(Vec<Vec<u8>>, u32, u32)> {
        let mut faces = Vec::with_capacity(6);
        let mut dimensions = None;

        for file in Self::FACE_FILES {
            let path = directory.join(file);
            let image = image::open(&path)
                .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
            let rgba = image.to_rgba8();

            match dimensions {
                None => dimensions = Some(rgba.dimensions()),
                Some(expected) if expected != rgba.dimensions() => {
                    anyhow::bail!(
                        "{}: face size {:?} does not match {:?}",
                        path.display(),
                        rgba.dimensions(),
                        expected
                    );
                }
                Some(_) => {}
            }

            faces.push(rgba.into_raw());
        }

        let (width, height) = dimensions.unwrap();
        Ok((faces, width, height))
    }

    fn from_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Vec<u8>],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                face,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }
}

pub struct DepthTexture {
    view: wgpu::TextureView,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let view = Self::create_view(device, size, &label);

        DepthTexture { view, label }
    }

    fn create_view(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.view = Self::create_view(device, size, &self.label);
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
