use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat};
use id_arena::Arena;

use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::user_strings::UserStrings;

/// The loaded scene tree plus the shared geometry it references.
pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&SceneModel> {
        self.models.get(id)
    }

    /// Instantiates a loaded document under one synthetic root object, so a
    /// single transform controls the whole model (the scale slider target).
    pub fn spawn_gltf_scene(
        &mut self,
        root_name: impl Into<String>,
        scene: &gltf::Scene,
        buffers: Buffers,
    ) -> anyhow::Result<ObjectId> {
        let root = self.add_object(Object3D {
            name: root_name.into(),
            ..Default::default()
        });

        for node in scene.nodes() {
            self.spawn_gltf_node(&node, buffers, root)?;
        }

        Ok(root)
    }

    fn spawn_gltf_node(
        &mut self,
        node: &gltf::Node,
        buffers: Buffers,
        parent: ObjectId,
    ) -> anyhow::Result<ObjectId> {
        let mut object = Object3D::default();
        object.name = node.name().unwrap_or("Unnamed").to_string();

        let (translation, rotation, scale) = node.transform().decomposed();
        // Assume uniform scale for simplicity
        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            scale[0],
        );

        if let Some(extras) = node.extras() {
            object.user_strings = UserStrings::from_extras(extras);
        }

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", object.name));

                    let model = Model::from_gltf(mesh_name.clone(), mesh, buffers)?;
                    let model_id = self.add_model(SceneModel::new(mesh_name, model));
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            object.model_id = Some(model_id);
            // The source format is Z-up, the renderer is Y-up.
            object.transform.rotate(Quat::from_rotation_x(-FRAC_PI_2));
        }

        let object_id = self.add_object(object);
        self.set_object_parent(object_id, Some(parent));

        for child in node.children() {
            self.spawn_gltf_node(&child, buffers, object_id)?;
        }

        Ok(object_id)
    }

    /// User strings for a node, falling back to the nearest ancestor that
    /// carries any. Primitives exported under a carrier node keep their
    /// metadata one level up in the tree.
    pub fn user_strings_for(&self, object_id: ObjectId) -> Option<&UserStrings> {
        let mut current = Some(object_id);

        while let Some(id) = current {
            let object = self.objects.get(id)?;
            if let Some(strings) = &object.user_strings {
                return Some(strings);
            }
            current = object.parent_id;
        }

        None
    }

    pub fn reset_colors(&mut self, color: [f32; 4]) {
        for (_, object) in self.objects.iter_mut() {
            object.color = color;
        }
    }

    pub fn set_object_color(&mut self, object_id: ObjectId, color: [f32; 4]) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.color = color;
        }
    }

    /// Mesh-bearing objects with their geometry, for picking.
    pub fn mesh_objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D, &SceneModel)> {
        self.objects.iter().filter_map(|(id, object)| {
            let model = self.models.get(object.model_id?)?;
            Some((id, object, model))
        })
    }

    /// Updates all object transforms in hierarchical order.
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants.
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene_graph::object3d::{DEFAULT_COLOR, HIGHLIGHT_COLOR};
    use crate::scene_graph::transform::Transform;
    use glam::Vec3;

    fn empty_mesh_model(scene: &mut Scene, name: &str) -> SceneModelId {
        scene.add_model(SceneModel::new(
            name.to_string(),
            Model {
                name: name.to_string(),
                primitives: Vec::new(),
            },
        ))
    }

    fn strings(pairs: &[(&str, &str)]) -> UserStrings {
        UserStrings::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn user_strings_prefer_own_over_ancestor() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D {
            name: "parent".to_string(),
            user_strings: Some(strings(&[("Owner", "parent")])),
            ..Default::default()
        });
        let child = scene.add_object(Object3D {
            name: "child".to_string(),
            user_strings: Some(strings(&[("Owner", "child")])),
            ..Default::default()
        });
        scene.set_object_parent(child, Some(parent));

        let found = scene.user_strings_for(child).unwrap();
        assert_eq!(found.entries()[0].1, "child");
    }

    #[test]
    fn user_strings_fall_back_to_nearest_ancestor() {
        let mut scene = Scene::new();
        let grandparent = scene.add_object(Object3D {
            name: "grandparent".to_string(),
            user_strings: Some(strings(&[("Name", "Wall-01"), ("Material", "Concrete")])),
            ..Default::default()
        });
        let parent = scene.add_object(Object3D {
            name: "parent".to_string(),
            ..Default::default()
        });
        let leaf = scene.add_object(Object3D {
            name: "leaf".to_string(),
            ..Default::default()
        });
        scene.set_object_parent(parent, Some(grandparent));
        scene.set_object_parent(leaf, Some(parent));

        let found = scene.user_strings_for(leaf).unwrap();
        assert_eq!(
            found.entries(),
            &[
                ("Name".to_string(), "Wall-01".to_string()),
                ("Material".to_string(), "Concrete".to_string()),
            ]
        );
    }

    #[test]
    fn user_strings_absent_everywhere_is_none() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::default());
        let child = scene.add_object(Object3D::default());
        scene.set_object_parent(child, Some(parent));

        assert!(scene.user_strings_for(child).is_none());
    }

    #[test]
    fn reset_then_highlight_leaves_one_highlighted() {
        let mut scene = Scene::new();
        let model_id = empty_mesh_model(&mut scene, "quad");
        let a = scene.add_object(Object3D {
            model_id: Some(model_id),
            color: HIGHLIGHT_COLOR,
            ..Default::default()
        });
        let b = scene.add_object(Object3D {
            model_id: Some(model_id),
            ..Default::default()
        });

        scene.reset_colors(DEFAULT_COLOR);
        scene.set_object_color(b, HIGHLIGHT_COLOR);

        assert_eq!(scene.get_object(a).unwrap().color, DEFAULT_COLOR);
        assert_eq!(scene.get_object(b).unwrap().color, HIGHLIGHT_COLOR);

        let highlighted = scene
            .objects
            .iter()
            .filter(|(_, object)| object.color == HIGHLIGHT_COLOR)
            .count();
        assert_eq!(highlighted, 1);
    }

    #[test]
    fn scale_propagates_to_children() {
        let mut scene = Scene::new();
        let root = scene.add_object(Object3D::default());
        let child = scene.add_object(Object3D {
            transform: Transform::from_translation(Vec3::new(1.0, 0.0, 0.0)),
            ..Default::default()
        });
        scene.set_object_parent(child, Some(root));

        scene.set_object_scale(root, 2.0);
        scene.update_transforms();

        let world = *scene.get_object(child).unwrap().transform.get_world_matrix();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }
}
