use id_arena::Id;

use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;
use crate::scene_graph::user_strings::UserStrings;

pub type ObjectId = Id<Object3D>;

/// Color every mesh is reset to before a new selection is applied.
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Color of the currently selected mesh.
pub const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

/// One node of the loaded scene tree.
///
/// Mesh nodes reference shared geometry through `model_id`; `user_strings`
/// carries the metadata attached to this node in the source file, which may
/// live on a parent rather than on the mesh node itself.
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub user_strings: Option<UserStrings>,
    pub color: [f32; 4],
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            model_id: None,
            user_strings: None,
            color: DEFAULT_COLOR,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
