use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use gltf::buffer;
use itertools::izip;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
    pub tangent: Vec3,
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl ModelPrimitive {
    pub fn vertex_by_triangle_index(&self, face: usize, vert: usize) -> &Vertex {
        &self.vertices[self.indices[face * 3 + vert] as usize]
    }

    pub fn vertex_by_triangle_index_mut(&mut self, face: usize, vert: usize) -> &mut Vertex {
        let index = self.indices[face * 3 + vert] as usize;
        &mut self.vertices[index]
    }

    /// Triangle corner positions in index order, for ray intersection.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|corners| {
            [
                self.vertices[corners[0] as usize].position,
                self.vertices[corners[1] as usize].position,
                self.vertices[corners[2] as usize].position,
            ]
        })
    }
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                anyhow::bail!("Unsupported primitive mode: {:?}", primitive.mode());
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .with_context(|| format!("Primitive without positions: {}", model.name))?;
            let normals = reader
                .read_normals()
                .with_context(|| format!("Primitive without normals: {}", model.name))?;
            let tex_coords = reader
                .read_tex_coords(0)
                .with_context(|| format!("Primitive without texture coordinates: {}", model.name))?
                .into_f32();

            let mut vertices = izip!(positions, normals, tex_coords)
                .map(|(position, normal, tex_coords)| Vertex {
                    position: Vec3::from(position),
                    normal: Vec3::from(normal),
                    tex_coords: Vec2::from(tex_coords),
                    tangent: Vec3::ZERO,
                })
                .collect::<Vec<Vertex>>();

            let tangents = reader.read_tangents();
            let has_tangents = tangents.is_some();
            if let Some(tangents) = tangents {
                for (vertex, tangent) in vertices.iter_mut().zip(tangents) {
                    vertex.tangent = Vec4::from(tangent).xyz();
                }
            }

            let indices = reader
                .read_indices()
                .with_context(|| format!("Primitive without indices: {}", model.name))?
                .into_u32()
                .collect::<Vec<u32>>();

            let mut primitive = ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            };

            if !has_tangents {
                primitive
                    .generate_tangents()
                    .with_context(|| format!("Tangent generation failed: {}", model.name))?;
            }

            model.primitives.push(primitive);
        }

        if model.primitives.is_empty() {
            anyhow::bail!("Mesh without primitives: {}", model.name);
        }

        Ok(model)
    }
}

#[cfg(test)]
pub(crate) mod test_meshes {
    use super::*;

    pub fn primitive_from_positions(positions: &[[f32; 3]], indices: &[u32]) -> ModelPrimitive {
        ModelPrimitive {
            index: 0,
            vertices: positions
                .iter()
                .map(|&position| Vertex {
                    position: Vec3::from(position),
                    normal: Vec3::Z,
                    tex_coords: Vec2::ZERO,
                    tangent: Vec3::X,
                })
                .collect(),
            indices: indices.to_vec(),
        }
    }

    /// Unit quad in the XY plane, centered on the origin.
    pub fn unit_quad_model(name: &str) -> Model {
        Model {
            name: name.to_string(),
            primitives: vec![primitive_from_positions(
                &[
                    [-0.5, -0.5, 0.0],
                    [0.5, -0.5, 0.0],
                    [-0.5, 0.5, 0.0],
                    [0.5, 0.5, 0.0],
                ],
                &[0, 1, 2, 2, 1, 3],
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_meshes::primitive_from_positions;
    use super::*;

    #[test]
    fn triangles_follow_index_order() {
        let primitive = primitive_from_positions(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            &[0, 1, 2, 2, 1, 3],
        );

        let triangles: Vec<_> = primitive.triangles().collect();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[0][1], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(triangles[1][2], Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn vertex_by_triangle_index_resolves_through_indices() {
        let primitive = primitive_from_positions(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[2, 1, 0],
        );

        let vertex = primitive.vertex_by_triangle_index(0, 0);
        assert_eq!(vertex.position, Vec3::new(0.0, 1.0, 0.0));
    }
}
