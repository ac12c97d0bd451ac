use id_arena::Id;

use crate::{
    model::Model,
    rendering::{
        instance::{Instance, Instances},
        render_model::RenderModelId,
    },
};

pub type SceneModelId = Id<SceneModel>;

/// Shared mesh geometry plus the per-frame instance list of every node that
/// references it. The CPU-side `Model` stays resident for ray picking.
pub struct SceneModel {
    pub name: String,
    pub model: Model,
    pub render_model: Option<RenderModelId>,
    instances: Instances,
}

impl SceneModel {
    pub fn new(name: String, model: Model) -> Self {
        Self {
            name,
            model,
            render_model: None,
            instances: Instances::new(),
        }
    }

    pub fn instances(&self) -> &Instances {
        &self.instances
    }

    pub fn add_instance(&mut self, instance: Instance) {
        self.instances.add(instance);
    }

    pub fn clear_instances(&mut self) {
        self.instances.clear();
    }
}
