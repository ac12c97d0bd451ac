use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;

use crate::camera::OrbitCamera;
use crate::scene_graph::{ObjectId, Scene};

const EPSILON: f32 = 1e-5;

/// A ray in world space.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// An intersected mesh object. `distance` is the ray parameter of the
/// nearest triangle hit on that object.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub object_id: ObjectId,
    pub distance: f32,
}

/// Converts a client pixel position to normalized device coordinates in
/// [-1, 1] on both axes. Pixel Y grows downward, NDC Y grows upward.
pub fn screen_to_ndc(position: Vec2, viewport: PhysicalSize<u32>) -> Vec2 {
    Vec2::new(
        (position.x / viewport.width as f32) * 2.0 - 1.0,
        -(position.y / viewport.height as f32) * 2.0 + 1.0,
    )
}

/// Builds a ray from the camera through an NDC point by unprojecting the
/// near- and far-plane points (depth range 0..1).
pub fn camera_ray(camera: &OrbitCamera, ndc: Vec2) -> Ray {
    let inv_view_proj = camera.view_projection_matrix().inverse();

    let near = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
    let far = inv_view_proj.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));

    Ray {
        origin: near,
        direction: (far - near).normalize(),
    }
}

/// Möller–Trumbore ray/triangle intersection. Accepts both windings and
/// returns the ray parameter of hits in front of the origin.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to the triangle plane.
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON {
        Some(t)
    } else {
        None
    }
}

/// Intersects a ray against every mesh object in the scene, in world space.
/// Hits are ordered nearest first. World transforms must be up to date.
pub fn intersect_scene(scene: &Scene, ray: &Ray) -> Vec<Hit> {
    let mut hits = Vec::new();

    for (object_id, object, scene_model) in scene.mesh_objects() {
        let world = *object.transform.get_world_matrix();
        let mut nearest: Option<f32> = None;

        for primitive in &scene_model.model.primitives {
            for [a, b, c] in primitive.triangles() {
                let a = world.transform_point3(a);
                let b = world.transform_point3(b);
                let c = world.transform_point3(c);

                if let Some(t) = ray_triangle_intersect(ray, a, b, c) {
                    nearest = Some(nearest.map_or(t, |best: f32| best.min(t)));
                }
            }
        }

        if let Some(distance) = nearest {
            hits.push(Hit {
                object_id,
                distance,
            });
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_meshes::unit_quad_model;
    use crate::scene_graph::{Object3D, SceneModel, Transform};
    use approx::assert_relative_eq;

    fn spawn_quad(scene: &mut Scene, translation: Vec3) -> ObjectId {
        let model_id = scene.add_model(SceneModel::new(
            "quad".to_string(),
            unit_quad_model("quad"),
        ));
        scene.add_object(Object3D {
            name: "quad".to_string(),
            transform: Transform::from_translation(translation),
            model_id: Some(model_id),
            ..Default::default()
        })
    }

    #[test]
    fn ndc_center_and_corners() {
        let viewport = PhysicalSize::new(800, 600);

        let center = screen_to_ndc(Vec2::new(400.0, 300.0), viewport);
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);

        let top_left = screen_to_ndc(Vec2::new(0.0, 0.0), viewport);
        assert_relative_eq!(top_left.x, -1.0);
        assert_relative_eq!(top_left.y, 1.0);

        let bottom_right = screen_to_ndc(Vec2::new(800.0, 600.0), viewport);
        assert_relative_eq!(bottom_right.x, 1.0);
        assert_relative_eq!(bottom_right.y, -1.0);
    }

    #[test]
    fn triangle_hit_distance() {
        let ray = Ray {
            origin: Vec3::new(0.1, 0.1, 5.0),
            direction: Vec3::NEG_Z,
        };

        let t = ray_triangle_intersect(
            &ray,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();

        assert_relative_eq!(t, 5.0, epsilon = 1e-4);

        let hit_point = ray.point_at(t);
        assert_relative_eq!(hit_point.z, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn triangle_miss_and_behind() {
        let triangle = (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );

        let miss = Ray {
            origin: Vec3::new(5.0, 5.0, 5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(ray_triangle_intersect(&miss, triangle.0, triangle.1, triangle.2).is_none());

        let behind = Ray {
            origin: Vec3::new(0.0, 0.0, -5.0),
            direction: Vec3::NEG_Z,
        };
        assert!(ray_triangle_intersect(&behind, triangle.0, triangle.1, triangle.2).is_none());
    }

    #[test]
    fn backfaces_are_pickable() {
        // Same triangle, approached from the other side.
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, -5.0),
            direction: Vec3::Z,
        };

        let t = ray_triangle_intersect(
            &ray,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(t.is_some());
    }

    #[test]
    fn scene_hits_are_ordered_nearest_first() {
        let mut scene = Scene::new();
        let far_quad = spawn_quad(&mut scene, Vec3::new(0.0, 0.0, 0.0));
        let near_quad = spawn_quad(&mut scene, Vec3::new(0.0, 0.0, 10.0));
        scene.update_transforms();

        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 30.0),
            direction: Vec3::NEG_Z,
        };

        let hits = intersect_scene(&scene, &ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object_id, near_quad);
        assert_eq!(hits[1].object_id, far_quad);
        assert_relative_eq!(hits[0].distance, 20.0, epsilon = 1e-4);
        assert_relative_eq!(hits[1].distance, 30.0, epsilon = 1e-4);
    }

    #[test]
    fn empty_space_yields_no_hits() {
        let mut scene = Scene::new();
        spawn_quad(&mut scene, Vec3::ZERO);
        scene.update_transforms();

        let ray = Ray {
            origin: Vec3::new(10.0, 10.0, 30.0),
            direction: Vec3::NEG_Z,
        };

        assert!(intersect_scene(&scene, &ray).is_empty());
    }

    #[test]
    fn camera_ray_through_center_points_at_target() {
        let camera = OrbitCamera::new(Vec3::new(0.0, 0.0, 30.0), Vec3::ZERO, 1.0);
        let ray = camera_ray(&camera, Vec2::ZERO);

        assert_relative_eq!(ray.direction.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
    }
}
