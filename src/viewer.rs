use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;

use crate::camera::OrbitCamera;
use crate::picking;
use crate::scene_graph::{ObjectId, Scene, DEFAULT_COLOR, HIGHLIGHT_COLOR};

/// Fixed model file, loaded once at startup.
pub const MODEL_PATH: &str = "assets/base_model.gltf";

/// Fixed directory holding the six environment face images.
pub const SKYBOX_DIR: &str = "assets/skybox";

pub struct DirectionalLight {
    pub direction: Vec3,
    pub intensity: f32,
}

/// Contents of the metadata popup. At most one exists at a time; every
/// click tears the old one down before a new one may appear.
pub struct Inspection {
    pub subject: String,
    pub entries: Vec<(String, String)>,
}

/// Everything the viewer owns: camera, scene, light, selection state.
/// Event handlers receive this explicitly instead of reaching for globals.
pub struct ViewerState {
    pub camera: OrbitCamera,
    pub scene: Scene,
    pub light: DirectionalLight,
    pub start_time: Instant,
    pub inspection: Option<Inspection>,
    pub model_root: Option<ObjectId>,
    model_scale: f32,
}

impl ViewerState {
    /// Builds the viewer and attempts the model load. A failed load leaves
    /// the scene empty: the viewer still runs, clicks simply hit nothing.
    pub fn new() -> Self {
        let mut state = Self::from_scene(Scene::new());

        match load_model(&mut state.scene, MODEL_PATH) {
            Ok(root) => {
                state.model_root = Some(root);
                log::info!("Loaded model {}", MODEL_PATH);
            }
            Err(error) => {
                log::error!("Failed to load model {}: {:#}", MODEL_PATH, error);
            }
        }

        state
    }

    pub fn from_scene(scene: Scene) -> Self {
        let camera = OrbitCamera::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 16.0 / 9.0);

        Self {
            camera,
            scene,
            light: DirectionalLight {
                direction: Vec3::NEG_Y,
                intensity: 2.0,
            },
            start_time: Instant::now(),
            inspection: None,
            model_root: None,
            model_scale: 1.0,
        }
    }

    /// The pick-and-inspect transition, one click at a time.
    ///
    /// Teardown is unconditional: the old popup goes away and every object
    /// returns to the default color before any new highlight is applied.
    pub fn handle_click(&mut self, position: Vec2, viewport: PhysicalSize<u32>) {
        log::debug!("click at ({}, {})", position.x, position.y);

        self.scene.update_transforms();

        let ndc = picking::screen_to_ndc(position, viewport);
        let ray = picking::camera_ray(&self.camera, ndc);
        let hits = picking::intersect_scene(&self.scene, &ray);

        self.inspection = None;
        self.scene.reset_colors(DEFAULT_COLOR);

        let Some(hit) = hits.first() else {
            return;
        };

        self.scene.set_object_color(hit.object_id, HIGHLIGHT_COLOR);

        // No user strings anywhere up the tree means no popup.
        let Some(strings) = self.scene.user_strings_for(hit.object_id) else {
            return;
        };
        let entries = strings.entries().to_vec();
        let subject = self
            .scene
            .get_object(hit.object_id)
            .map(|object| object.name.clone())
            .unwrap_or_default();

        self.inspection = Some(Inspection { subject, entries });
    }

    /// Applies the slider value as a uniform scale on the model root. The
    /// value goes through unvalidated, zero included.
    pub fn set_model_scale(&mut self, scale: f32) {
        self.model_scale = scale;
        if let Some(root) = self.model_root {
            self.scene.set_object_scale(root, scale);
        }
    }

    pub fn model_scale(&self) -> f32 {
        self.model_scale
    }

    pub fn update(&mut self) {
        self.scene.update_transforms();
    }

    pub fn draw_ui(&mut self, ui: &imgui::Ui) {
        if self.model_root.is_some() {
            let mut scale = self.model_scale;
            let mut changed = false;

            ui.window("Model")
                .size([260.0, 70.0], imgui::Condition::FirstUseEver)
                .position([16.0, 16.0], imgui::Condition::FirstUseEver)
                .build(|| {
                    changed = ui.slider("Scale", 0.0, 10.0, &mut scale);
                });

            if changed {
                self.set_model_scale(scale);
            }
        }

        if let Some(inspection) = &self.inspection {
            ui.window("Inspector")
                .size([320.0, 180.0], imgui::Condition::FirstUseEver)
                .position([16.0, 110.0], imgui::Condition::FirstUseEver)
                .build(|| {
                    ui.text(&inspection.subject);
                    ui.separator();

                    ui.columns(2, "user_strings", true);
                    for (key, value) in &inspection.entries {
                        ui.text(key);
                        ui.next_column();
                        ui.text(value);
                        ui.next_column();
                    }
                    ui.columns(1, "user_strings_end", false);
                });
        }
    }
}

fn load_model(scene: &mut Scene, path: &str) -> anyhow::Result<ObjectId> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("Failed to import {}", path))?;

    let gltf_scene = document
        .scenes()
        .next()
        .with_context(|| format!("No scenes in {}", path))?;

    let root_name = Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("model")
        .to_string();

    scene.spawn_gltf_scene(root_name, &gltf_scene, &buffers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_meshes::unit_quad_model;
    use crate::scene_graph::{Object3D, SceneModel, Transform, UserStrings};

    const VIEWPORT: PhysicalSize<u32> = PhysicalSize::new(800, 800);
    /// Pixel position on the quad at the origin, as seen from the default
    /// camera at (0, 0, 30).
    const CENTER: Vec2 = Vec2::new(400.0, 400.0);
    const OFF_MESH: Vec2 = Vec2::new(10.0, 10.0);

    fn strings(pairs: &[(&str, &str)]) -> UserStrings {
        UserStrings::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn spawn_quad(
        state: &mut ViewerState,
        name: &str,
        translation: Vec3,
        user_strings: Option<UserStrings>,
    ) -> ObjectId {
        let model_id = state.scene.add_model(SceneModel::new(
            name.to_string(),
            unit_quad_model(name),
        ));
        state.scene.add_object(Object3D {
            name: name.to_string(),
            transform: Transform::from_translation(translation),
            model_id: Some(model_id),
            user_strings,
            ..Default::default()
        })
    }

    fn state_with_quad(user_strings: Option<UserStrings>) -> (ViewerState, ObjectId) {
        let mut state = ViewerState::from_scene(Scene::new());
        state.camera.set_aspect(1.0);
        let quad = spawn_quad(&mut state, "quad", Vec3::ZERO, user_strings);
        (state, quad)
    }

    #[test]
    fn click_on_empty_background_resets_everything() {
        let (mut state, quad) =
            state_with_quad(Some(strings(&[("Name", "Wall-01")])));

        state.handle_click(CENTER, VIEWPORT);
        assert!(state.inspection.is_some());

        state.handle_click(OFF_MESH, VIEWPORT);
        assert!(state.inspection.is_none());
        assert_eq!(state.scene.get_object(quad).unwrap().color, DEFAULT_COLOR);
    }

    #[test]
    fn click_highlights_nearest_and_shows_metadata() {
        let (mut state, quad) = state_with_quad(Some(strings(&[
            ("Name", "Wall-01"),
            ("Material", "Concrete"),
        ])));

        state.handle_click(CENTER, VIEWPORT);

        assert_eq!(state.scene.get_object(quad).unwrap().color, HIGHLIGHT_COLOR);

        let inspection = state.inspection.as_ref().unwrap();
        assert_eq!(
            inspection.entries,
            vec![
                ("Name".to_string(), "Wall-01".to_string()),
                ("Material".to_string(), "Concrete".to_string()),
            ]
        );
    }

    #[test]
    fn only_the_nearest_hit_is_highlighted() {
        let (mut state, far_quad) = state_with_quad(None);
        let near_quad = spawn_quad(&mut state, "near", Vec3::new(0.0, 0.0, 5.0), None);

        state.handle_click(CENTER, VIEWPORT);

        assert_eq!(
            state.scene.get_object(near_quad).unwrap().color,
            HIGHLIGHT_COLOR
        );
        assert_eq!(
            state.scene.get_object(far_quad).unwrap().color,
            DEFAULT_COLOR
        );
    }

    #[test]
    fn metadata_falls_back_to_parent() {
        let (mut state, quad) = state_with_quad(None);
        let parent = state.scene.add_object(Object3D {
            name: "carrier".to_string(),
            user_strings: Some(strings(&[("Name", "Wall-01")])),
            ..Default::default()
        });
        state.scene.set_object_parent(quad, Some(parent));

        state.handle_click(CENTER, VIEWPORT);

        let inspection = state.inspection.as_ref().unwrap();
        assert_eq!(inspection.entries[0].1, "Wall-01");
        assert!(!inspection.entries.is_empty());
    }

    #[test]
    fn hit_without_metadata_highlights_but_shows_no_popup() {
        let (mut state, quad) = state_with_quad(None);

        state.handle_click(CENTER, VIEWPORT);

        assert_eq!(state.scene.get_object(quad).unwrap().color, HIGHLIGHT_COLOR);
        assert!(state.inspection.is_none());
    }

    #[test]
    fn clicking_twice_is_idempotent() {
        let (mut state, quad) =
            state_with_quad(Some(strings(&[("Name", "Wall-01")])));

        state.handle_click(CENTER, VIEWPORT);
        let first_entries = state.inspection.as_ref().unwrap().entries.clone();

        state.handle_click(CENTER, VIEWPORT);
        let second_entries = state.inspection.as_ref().unwrap().entries.clone();

        assert_eq!(first_entries, second_entries);
        assert_eq!(state.scene.get_object(quad).unwrap().color, HIGHLIGHT_COLOR);
    }

    #[test]
    fn click_before_model_loads_hits_nothing() {
        let mut state = ViewerState::from_scene(Scene::new());

        state.handle_click(CENTER, VIEWPORT);

        assert!(state.inspection.is_none());
    }

    #[test]
    fn slider_value_scales_the_root_exactly() {
        let (mut state, quad) = state_with_quad(None);
        state.model_root = Some(quad);

        state.set_model_scale(2.0);
        state.update();

        assert_eq!(state.model_scale(), 2.0);

        let object = state.scene.get_object(quad).unwrap();
        assert_eq!(object.transform.scale(), 2.0);

        let world = *object.transform.get_world_matrix();
        let scaled = world.transform_vector3(Vec3::ONE);
        assert!((scaled - Vec3::splat(2.0)).length() < 1e-6);
    }
}
