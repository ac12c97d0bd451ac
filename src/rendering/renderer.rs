use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    material::PbrMaterial,
    rendering::{
        global_uniform::GlobalUniformState,
        imgui_renderer::ImguiOverlay,
        instance::gather_instances,
        passes::{
            background_pass::{BackgroundPass, BackgroundPassTextureViews},
            pass::Pass,
            pbr_pass::{PbrPass, PbrTextureViews},
        },
        render_camera::RenderCamera,
        render_common::RenderCommon,
        render_model::{render_model_instances, RenderModel},
    },
    shader_loader::ShaderLoader,
    texture::{CubeTexture, DepthTexture},
    viewer::{ViewerState, SKYBOX_DIR},
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,

    camera: RenderCamera,

    shader_loader: ShaderLoader,

    background_pass: BackgroundPass,
    pbr_pass: PbrPass,
    imgui_overlay: ImguiOverlay,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        viewer: &ViewerState,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to find a compatible adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let camera = RenderCamera::new(&device, &viewer.camera);

        let common = RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            camera.uniform_buffer.clone(),
            GlobalUniformState::new(size, 0.0, viewer.light.direction, viewer.light.intensity),
        );
        let common = Arc::new(common);

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let material = PbrMaterial::load(&device, &queue);
        let environment = CubeTexture::load_or_fallback(
            &device,
            &queue,
            Path::new(SKYBOX_DIR),
            "Environment map",
        );

        let mut cache_builder = crate::shader_loader::PipelineCacheBuilder::new();

        let background_pass =
            BackgroundPass::create(&device, common.clone(), &mut cache_builder, &environment)?;
        let pbr_pass = PbrPass::create(
            &device,
            common.clone(),
            &mut cache_builder,
            &material,
            &environment,
        )?;

        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)?;

        let texture_format = common.output_surface_config.read().unwrap().format;
        let imgui_overlay = ImguiOverlay::new(&device, &queue, texture_format, imgui_context);

        let render_models = Arena::new();

        Ok(Self {
            window: window.clone(),
            surface,
            device,
            queue,
            common,
            size,
            render_models,
            camera,
            depth_texture,
            shader_loader,

            background_pass,
            pbr_pass,
            imgui_overlay,
        })
    }

    /// Uploads GPU buffers for every scene model that doesn't have them yet.
    pub fn load_models(&mut self, viewer: &mut ViewerState) -> anyhow::Result<()> {
        for (_id, scene_model) in viewer.scene.models.iter_mut() {
            if scene_model.render_model.is_some() {
                continue;
            }

            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            let render_model_id = self.render_models.alloc(render_model);
            scene_model.render_model = Some(render_model_id);

            log::info!(
                "Loaded model {} with {} primitives",
                scene_model.name,
                scene_model.model.primitives.len()
            );
        }

        Ok(())
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let common = self.common.as_ref();
        let mut config = common.output_surface_config.write().unwrap();

        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            config.width = new_size.width;
            config.height = new_size.height;
            self.depth_texture.resize(&self.device, new_size);
            self.surface.configure(&self.device, &config);
        }
    }

    pub fn render(
        &mut self,
        viewer: &mut ViewerState,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        self.shader_loader
            .load_pending_shaders()
            .expect("Failed to load pending shaders");

        self.camera.update(&self.queue, &viewer.camera);
        self.common.global_uniform.update(
            &self.queue,
            GlobalUniformState::new(
                self.size,
                viewer.start_time.elapsed().as_secs_f32(),
                viewer.light.direction,
                viewer.light.intensity,
            ),
        );

        gather_instances(&mut viewer.scene);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let pipeline_cache = &self.shader_loader.cache;

        self.background_pass.render(
            &BackgroundPassTextureViews {
                color: view.clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                // One fullscreen triangle, vertices synthesized in the shader.
                render_pass.draw(0..3, 0..1);
            },
        );

        self.pbr_pass.render(
            &PbrTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            pipeline_cache,
            |render_pass| {
                for (_id, scene_model) in viewer.scene.models.iter() {
                    if !scene_model.instances().should_render() {
                        continue;
                    }

                    let Some(render_model_id) = scene_model.render_model else {
                        continue;
                    };
                    let Some(render_model) = self.render_models.get(render_model_id) else {
                        continue;
                    };

                    render_model_instances(
                        render_pass,
                        &self.queue,
                        render_model,
                        scene_model.instances(),
                    );
                }
            },
        );

        self.imgui_overlay.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        );

        let command_buffer = encoder.finish();

        self.queue.submit([command_buffer]);

        output.present();

        Ok(())
    }
}
