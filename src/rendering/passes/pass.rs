use wgpu::RenderPass;

use crate::shader_loader::PipelineCache;

/// A render pass whose pipelines live in the shared cache. Construction is
/// per-pass (each binds different resources); the encoding surface is
/// common.
pub(crate) trait Pass {
    type TextureViews;

    fn render<'a, F>(
        &self,
        texture_views: &Self::TextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a;
}
