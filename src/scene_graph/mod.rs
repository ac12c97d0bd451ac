pub mod object3d;
pub mod scene;
pub mod scene_model;
pub mod transform;
pub mod user_strings;

pub use object3d::{Object3D, ObjectId, DEFAULT_COLOR, HIGHLIGHT_COLOR};
pub use scene::Scene;
pub use scene_model::{SceneModel, SceneModelId};
pub use transform::Transform;
pub use user_strings::UserStrings;
