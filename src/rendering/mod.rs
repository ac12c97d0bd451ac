pub mod global_uniform;
pub mod imgui_renderer;
pub mod instance;
pub mod passes;
pub mod render_camera;
pub mod render_common;
pub mod render_model;
pub mod renderer;
