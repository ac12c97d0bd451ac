use crate::viewer::ViewerState;

/// Per-frame update: UI first (slider changes feed the scene), then
/// transform propagation so the frame renders what the widgets set.
pub fn update(state: &mut ViewerState, ui: &imgui::Ui) -> anyhow::Result<()> {
    state.draw_ui(ui);
    state.update();

    Ok(())
}
