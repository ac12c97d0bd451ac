use anyhow::Result;

mod asset_pipeline;
mod camera;
mod engine;
mod material;
mod model;
mod picking;
mod rendering;
mod scene_graph;
mod shader_loader;
mod texture;
mod viewer;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    pollster::block_on(window::run())?;

    Ok(())
}
