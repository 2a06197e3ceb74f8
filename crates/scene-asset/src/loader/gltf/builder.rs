use std::collections::HashSet;

use glam::{Mat4, Quat, Vec3};
use gltf::{
    accessor::{DataType, Dimensions},
    mesh::Mode,
    scene::Transform,
    Semantic,
};

use super::{
    accessor::{declared_bounds, read_f32, read_u32},
    GltfDocumentLoader,
};
use crate::{
    bounds::BoundingBox,
    error::{ImportError, ImportWarning},
    loader::{
        chunk_and_clamp_vec3_to_vec4_f32, chunk_and_clamp_vec4_f32, chunk_mat4, chunk_vec2,
        chunk_vec3, chunk_vec4,
    },
    mesh::Mesh,
    model::Model,
    node::{DecomposedTransform, MatrixNodeTransform, Node, NodeId, NodeTransform},
    primitive::{Primitive, Vertex},
    skin::Skin,
};

/// Packed vertex and index buffers, allocated up front from the sizing pass
/// and filled at an advancing cursor.
pub(super) struct Geometry {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    vertex_cursor: usize,
    index_cursor: usize,
}

impl Geometry {
    fn with_size(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: vec![Vertex::default(); vertex_count],
            indices: vec![0; index_count],
            vertex_cursor: 0,
            index_cursor: 0,
        }
    }

    /// Drop the space reserved for primitives that were skipped.
    pub(super) fn finish(mut self) -> (Vec<Vertex>, Vec<u32>) {
        self.vertices.truncate(self.vertex_cursor);
        self.indices.truncate(self.index_cursor);
        (self.vertices, self.indices)
    }
}

fn count_node(node: gltf::Node, visited: &mut HashSet<usize>, counts: &mut (usize, usize)) {
    if !visited.insert(node.index()) {
        return;
    }
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(positions) = primitive.get(&Semantic::Positions) {
                counts.0 += positions.count();
            }
            if let Some(indices) = primitive.indices() {
                counts.1 += indices.count();
            }
        }
    }
    for child in node.children() {
        count_node(child, visited, counts);
    }
}

/// Sizing pass: vertex and index counts of every primitive reachable from
/// the roots of `scene`.
pub(super) fn count_scene(scene: &gltf::Scene) -> (usize, usize) {
    let mut visited = HashSet::new();
    let mut counts = (0, 0);
    for node in scene.nodes() {
        count_node(node, &mut visited, &mut counts);
    }
    counts
}

fn load_transform(transform: Transform) -> NodeTransform {
    match transform {
        Transform::Matrix { matrix } => {
            NodeTransform::Matrix(MatrixNodeTransform(Mat4::from_cols_array_2d(&matrix)))
        }
        Transform::Decomposed {
            translation,
            rotation,
            scale,
        } => NodeTransform::Decomposed(DecomposedTransform {
            translation: Vec3::from_array(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from_array(scale),
        }),
    }
}

struct DecodedPrimitive {
    vertices: Vec<Vertex>,
    indices: Option<Vec<u32>>,
}

struct BuildState {
    nodes: Vec<Node>,
    visited: HashSet<usize>,
    geometry: Geometry,
}

impl GltfDocumentLoader<'_> {
    /// Read every attribute of a primitive into vertices, and its indices.
    /// Nothing is written to the shared geometry, so a failure here only
    /// costs this primitive.
    fn decode_primitive(
        &self,
        primitive: &gltf::Primitive,
        positions: &gltf::Accessor,
        joints: Option<gltf::Accessor>,
        indices: Option<gltf::Accessor>,
    ) -> Result<DecodedPrimitive, ImportError> {
        let read_vec3 = |semantic: Semantic| {
            primitive
                .get(&semantic)
                .map(|accessor| read_f32(self.data, &accessor))
                .transpose()
                .map(|data| data.map(|data| chunk_vec3(&data)))
        };
        let read_vec2 = |semantic: Semantic| {
            primitive
                .get(&semantic)
                .map(|accessor| read_f32(self.data, &accessor))
                .transpose()
                .map(|data| data.map(|data| chunk_vec2(&data)))
        };

        let position_data = chunk_vec3(&read_f32(self.data, positions)?);
        let normals = read_vec3(Semantic::Normals)?;
        let uv0 = read_vec2(Semantic::TexCoords(0))?;
        let uv1 = read_vec2(Semantic::TexCoords(1))?;
        let colors = primitive
            .get(&Semantic::Colors(0))
            .map(|accessor| {
                let data = read_f32(self.data, &accessor)?;
                Ok::<_, ImportError>(match accessor.dimensions() {
                    Dimensions::Vec3 => chunk_and_clamp_vec3_to_vec4_f32(&data),
                    _ => chunk_and_clamp_vec4_f32(&data),
                })
            })
            .transpose()?;
        let joints = joints
            .map(|accessor| read_u32(self.data, &accessor))
            .transpose()?
            .map(|data| chunk_vec4(&data));
        let weights = primitive
            .get(&Semantic::Weights(0))
            .map(|accessor| read_f32(self.data, &accessor))
            .transpose()?
            .map(|data| chunk_vec4(&data));

        let vertex_count = position_data.len();
        let index_data = match indices {
            Some(accessor) => {
                let data = read_u32(self.data, &accessor)?;
                if let Some(index) = data
                    .iter()
                    .find(|index| **index as usize >= vertex_count)
                {
                    return Err(ImportError::IndexOutOfRange {
                        accessor: accessor.index(),
                        index: *index,
                        vertex_count,
                    });
                }
                Some(data)
            }
            None => None,
        };

        let vertices = position_data
            .iter()
            .enumerate()
            .map(|(index, position)| {
                let mut vertex = Vertex {
                    position: *position,
                    ..Default::default()
                };
                if let Some(normal) = normals.as_ref().and_then(|data| data.get(index)) {
                    vertex.normal = Vec3::from_array(*normal).normalize_or_zero().to_array();
                }
                if let Some(uv) = uv0.as_ref().and_then(|data| data.get(index)) {
                    vertex.uv0 = *uv;
                }
                if let Some(uv) = uv1.as_ref().and_then(|data| data.get(index)) {
                    vertex.uv1 = *uv;
                }
                if let Some(color) = colors.as_ref().and_then(|data| data.get(index)) {
                    vertex.color = *color;
                }
                if let Some(joint) = joints.as_ref().and_then(|data| data.get(index)) {
                    vertex.joint0 = *joint;
                }
                if let Some(weight) = weights.as_ref().and_then(|data| data.get(index)) {
                    vertex.weight0 = *weight;
                }
                // A vertex without any influence follows joint 0
                if vertex.weight0.iter().all(|weight| *weight == 0.0) {
                    vertex.weight0 = [1.0, 0.0, 0.0, 0.0];
                }
                vertex
            })
            .collect();

        Ok(DecodedPrimitive {
            vertices,
            indices: index_data,
        })
    }

    fn load_primitive(
        &mut self,
        node_index: usize,
        mesh_index: usize,
        primitive: gltf::Primitive,
        geometry: &mut Geometry,
    ) -> Result<Option<Primitive>, ImportError> {
        let primitive_index = primitive.index();
        let positions = primitive
            .get(&Semantic::Positions)
            .ok_or(ImportError::MissingAttribute {
                node: node_index,
                mesh: mesh_index,
                primitive: primitive_index,
                semantic: "POSITION",
            })?;

        if primitive.mode() != Mode::Triangles {
            self.report.warn(ImportWarning::UnsupportedPrimitiveMode {
                mesh: mesh_index,
                primitive: primitive_index,
            });
        }

        let joints = primitive.get(&Semantic::Joints(0));
        if let Some(joints) = &joints {
            if !matches!(joints.data_type(), DataType::U8 | DataType::U16) {
                self.report.warn(ImportWarning::UnsupportedJointType {
                    mesh: mesh_index,
                    primitive: primitive_index,
                    data_type: format!("{:?}", joints.data_type()),
                });
                return Ok(None);
            }
        }
        let indices = primitive.indices();
        if let Some(indices) = &indices {
            if !matches!(
                indices.data_type(),
                DataType::U8 | DataType::U16 | DataType::U32
            ) {
                self.report.warn(ImportWarning::UnsupportedIndexType {
                    mesh: mesh_index,
                    primitive: primitive_index,
                    data_type: format!("{:?}", indices.data_type()),
                });
                return Ok(None);
            }
        }

        let decoded = match self.decode_primitive(&primitive, &positions, joints, indices) {
            Ok(decoded) => decoded,
            Err(error) => {
                self.report.warn(ImportWarning::PrimitiveUnreadable {
                    mesh: mesh_index,
                    primitive: primitive_index,
                    reason: error.to_string(),
                });
                return Ok(None);
            }
        };
        let DecodedPrimitive {
            vertices,
            indices: index_data,
        } = decoded;

        let first_vertex = geometry.vertex_cursor;
        let vertex_count = vertices.len();
        let vertex_end = first_vertex + vertex_count;
        if geometry.vertices.len() < vertex_end {
            geometry.vertices.resize(vertex_end, Vertex::default());
        }
        geometry.vertices[first_vertex..vertex_end].copy_from_slice(&vertices);
        geometry.vertex_cursor = vertex_end;

        let first_index = geometry.index_cursor;
        let index_count = index_data.as_ref().map_or(0, Vec::len);
        if let Some(index_data) = index_data {
            let index_end = first_index + index_count;
            if geometry.indices.len() < index_end {
                geometry.indices.resize(index_end, 0);
            }
            // Indices were checked against `vertex_count`, so the sum stays
            // within the packed buffer.
            for (slot, index) in geometry.indices[first_index..index_end]
                .iter_mut()
                .zip(index_data)
            {
                *slot = index + first_vertex as u32;
            }
            geometry.index_cursor = index_end;
        }

        let bounding_box = declared_bounds(&positions).unwrap_or_else(|| {
            vertices.iter().fold(BoundingBox::INVALID, |acc, vertex| {
                let point = Vec3::from_array(vertex.position);
                acc.merge(&BoundingBox::new(point, point))
            })
        });

        Ok(Some(Primitive {
            first_index: first_index as u32,
            index_count: index_count as u32,
            first_vertex: first_vertex as u32,
            vertex_count: vertex_count as u32,
            material: primitive.material().index(),
            bounding_box,
        }))
    }

    fn build_node(
        &mut self,
        node: gltf::Node,
        parent: Option<NodeId>,
        state: &mut BuildState,
    ) -> Result<Option<NodeId>, ImportError> {
        // A node can only have one parent, skip anything that would form a
        // cycle or share a subtree.
        if !state.visited.insert(node.index()) {
            return Ok(None);
        }

        let id = NodeId(state.nodes.len());
        let mut asset = Node::new(
            node.index(),
            node.name().map(str::to_string),
            load_transform(node.transform()),
        );
        asset.parent = parent;
        asset.skin = node.skin().map(|skin| skin.index());
        state.nodes.push(asset);

        if let Some(mesh) = node.mesh() {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                if let Some(primitive) =
                    self.load_primitive(node.index(), mesh.index(), primitive, &mut state.geometry)?
                {
                    primitives.push(primitive);
                }
            }
            state.nodes[id.0].mesh = Some(Mesh::new(
                mesh.index(),
                mesh.name().map(str::to_string),
                primitives,
            ));
        }

        for child in node.children() {
            if let Some(child) = self.build_node(child, Some(id), state)? {
                state.nodes[id.0].children.push(child);
            }
        }
        Ok(Some(id))
    }

    /// Build pass: create the node arena and fill the geometry buffers.
    pub(super) fn build_scene(
        &mut self,
        scene: &gltf::Scene,
        vertex_count: usize,
        index_count: usize,
    ) -> Result<(Vec<Node>, Vec<NodeId>, Geometry), ImportError> {
        let mut state = BuildState {
            nodes: Vec::new(),
            visited: HashSet::new(),
            geometry: Geometry::with_size(vertex_count, index_count),
        };
        let mut roots = Vec::new();
        for node in scene.nodes() {
            if let Some(root) = self.build_node(node, None, &mut state)? {
                roots.push(root);
            }
        }
        Ok((state.nodes, roots, state.geometry))
    }

    /// Load the skins of the document against the built graph. Joints that
    /// are not part of the graph are reported and left out.
    pub(super) fn load_skins(&mut self, model: &Model) -> Result<Vec<Skin>, ImportError> {
        let document = self.document;
        let mut skins = Vec::new();
        for skin in document.skins() {
            let inverse_bind_data = skin
                .inverse_bind_matrices()
                .map(|accessor| read_f32(self.data, &accessor))
                .transpose()?
                .map(|data| chunk_mat4(&data))
                .unwrap_or_default();

            let mut joints = Vec::new();
            let mut inverse_bind_matrices = Vec::new();
            for (index, joint) in skin.joints().enumerate() {
                match model.node_from_index(joint.index()) {
                    Some(id) => {
                        joints.push(id);
                        inverse_bind_matrices.push(
                            inverse_bind_data
                                .get(index)
                                .copied()
                                .unwrap_or(Mat4::IDENTITY),
                        );
                    }
                    None => self.report.warn(ImportWarning::MissingJoint {
                        skin: skin.index(),
                        node: joint.index(),
                    }),
                }
            }

            skins.push(Skin {
                index: skin.index(),
                name: skin.name().map(str::to_string),
                skeleton_root: skin
                    .skeleton()
                    .and_then(|node| model.node_from_index(node.index())),
                joints,
                inverse_bind_matrices,
            });
        }
        Ok(skins)
    }
}

#[cfg(test)]
mod test {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::{
        handle::HandleSource,
        loader::{gltf::load_gltf_from_slice, ImportParams},
        test_util::{self, GltfBuilder},
    };

    fn skinned(builder: &mut GltfBuilder) -> (usize, usize, usize) {
        let primitive = builder.triangle_primitive([0.0, 0.0, 0.0]);
        let mesh = builder.mesh(vec![primitive]);
        let tip = builder.node(serde_json::json!({ "translation": [0.0, 1.0, 0.0] }));
        let base = builder.node(serde_json::json!({
            "translation": [0.0, 1.0, 0.0],
            "children": [tip],
        }));
        let outside = builder.node(serde_json::json!({}));
        let inverse_bind = builder.mat4_accessor(&[Mat4::IDENTITY; 3]);
        builder.skin(serde_json::json!({
            "joints": [base, tip, outside],
            "inverseBindMatrices": inverse_bind,
            "skeleton": base,
        }));
        let body = builder.node(serde_json::json!({ "mesh": mesh, "skin": 0 }));
        builder.scene(&[body, base]);
        (base, tip, outside)
    }

    #[test]
    fn test_sizing_matches_cube() {
        let builder = test_util::cube();
        let bytes = builder.to_json_bytes();
        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        let scene = gltf.document.scenes().next().unwrap();
        assert_eq!(count_scene(&scene), (24, 36));
    }

    #[test]
    fn test_unreadable_primitive_is_skipped() {
        let mut builder = GltfBuilder::new();
        let positions = builder.vec3_accessor(
            &[[5.0, 0.0, 0.0], [6.0, 0.0, 0.0], [5.0, 1.0, 0.0]],
            true,
        );
        let normals = builder.sparse_vec3_accessor(3, [0.0, 0.0, 1.0]);
        let broken = serde_json::json!({
            "attributes": { "POSITION": positions, "NORMAL": normals },
        });
        let good = builder.triangle_primitive([0.0, 0.0, 0.0]);
        let mesh = builder.mesh(vec![broken, good]);
        let node = builder.node(serde_json::json!({ "mesh": mesh }));
        builder.scene(&[node]);

        let model = load_gltf_from_slice(
            &builder.to_json_bytes(),
            &ImportParams::default(),
            &mut HandleSource::fresh(),
        )
        .unwrap();
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.index_count(), 3);
        assert_eq!(model.indices, vec![0, 1, 2]);
        assert_eq!(model.vertices[1].position, [1.0, 0.0, 0.0]);

        let mesh = model.nodes[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.primitives.len(), 1);
        assert_eq!(mesh.primitives[0].first_vertex, 0);
        assert!(matches!(
            model.report.warnings.as_slice(),
            [ImportWarning::PrimitiveUnreadable {
                mesh: 0,
                primitive: 0,
                ..
            }]
        ));
    }

    #[test]
    fn test_out_of_range_index_skips_primitive() {
        let mut builder = GltfBuilder::new();
        let positions = builder.vec3_accessor(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            true,
        );
        let indices = builder.index_accessor(&[0, 1, u16::MAX]);
        let broken = serde_json::json!({
            "attributes": { "POSITION": positions },
            "indices": indices,
        });
        let good = builder.triangle_primitive([0.0, 0.0, 2.0]);
        let mesh = builder.mesh(vec![broken, good]);
        let node = builder.node(serde_json::json!({ "mesh": mesh }));
        builder.scene(&[node]);

        let model = load_gltf_from_slice(
            &builder.to_json_bytes(),
            &ImportParams::default(),
            &mut HandleSource::fresh(),
        )
        .unwrap();
        assert_eq!(model.indices, vec![0, 1, 2]);
        let [ImportWarning::PrimitiveUnreadable { reason, .. }] = model.report.warnings.as_slice()
        else {
            panic!("unexpected warnings {:?}", model.report.warnings);
        };
        assert!(reason.contains("vertex 65535"));
    }

    #[test]
    fn test_u16_joints_are_read() {
        let mut builder = GltfBuilder::new();
        let positions = builder.vec3_accessor(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            true,
        );
        let joints = builder.u16_vec4_accessor(&[[0, 1, 0, 0], [1, 0, 0, 0], [300, 0, 0, 0]]);
        let weights = builder.vec4_accessor(&[
            [0.5, 0.5, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ]);
        let mesh = builder.mesh(vec![serde_json::json!({
            "attributes": { "POSITION": positions, "JOINTS_0": joints, "WEIGHTS_0": weights },
        })]);
        let node = builder.node(serde_json::json!({ "mesh": mesh }));
        builder.scene(&[node]);

        let model = load_gltf_from_slice(
            &builder.to_json_bytes(),
            &ImportParams::default(),
            &mut HandleSource::fresh(),
        )
        .unwrap();
        assert!(model.report.warnings.is_empty());
        assert_eq!(model.vertices[0].joint0, [0, 1, 0, 0]);
        assert_eq!(model.vertices[2].joint0, [300, 0, 0, 0]);
        assert_eq!(model.vertices[0].weight0, [0.5, 0.5, 0.0, 0.0]);
        assert_eq!(model.vertices[2].weight0, [1.0, 0.0, 0.0, 0.0]);
        // Non-indexed
        assert_eq!(model.nodes[0].mesh.as_ref().unwrap().primitives[0].index_count, 0);
    }

    #[test]
    fn test_skin_joint_matrices() {
        let mut builder = GltfBuilder::new();
        let (base, _, outside) = skinned(&mut builder);
        let model = load_gltf_from_slice(
            &builder.to_json_bytes(),
            &ImportParams::default(),
            &mut HandleSource::fresh(),
        )
        .unwrap();

        assert_eq!(model.skins.len(), 1);
        let skin = &model.skins[0];
        assert_eq!(skin.joints.len(), 2);
        assert_eq!(skin.skeleton_root, model.node_from_index(base));
        assert_eq!(
            model.report.warnings,
            vec![ImportWarning::MissingJoint {
                skin: 0,
                node: outside
            }]
        );

        let body = model.roots[0];
        assert_eq!(model.nodes[body.0].skin, Some(0));
        let pose = &model.nodes[body.0].mesh.as_ref().unwrap().pose;
        assert_eq!(pose.joint_matrices.len(), 2);
        assert_eq!(
            pose.joint_matrices[0],
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
        );
        assert_eq!(
            pose.joint_matrices[1],
            Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0))
        );
    }

    #[test]
    fn test_joint_matrices_are_capped() {
        let mut builder = GltfBuilder::new();
        skinned(&mut builder);
        let params = ImportParams {
            max_joints: 1,
            ..Default::default()
        };
        let model =
            load_gltf_from_slice(&builder.to_json_bytes(), &params, &mut HandleSource::fresh())
                .unwrap();
        let body = model.roots[0];
        let pose = &model.nodes[body.0].mesh.as_ref().unwrap().pose;
        assert_eq!(pose.joint_matrices.len(), 1);
    }

    #[test]
    fn test_moving_a_joint_invalidates_descendants() {
        let mut builder = GltfBuilder::new();
        let (base, tip, _) = skinned(&mut builder);
        let mut model = load_gltf_from_slice(
            &builder.to_json_bytes(),
            &ImportParams::default(),
            &mut HandleSource::fresh(),
        )
        .unwrap();
        let base = model.node_from_index(base).unwrap();
        let tip = model.node_from_index(tip).unwrap();

        model.set_node_transform(
            base,
            NodeTransform::Decomposed(DecomposedTransform {
                translation: Vec3::new(3.0, 0.0, 0.0),
                ..Default::default()
            }),
        );
        assert_eq!(
            model.world_matrix(tip).w_axis.truncate(),
            Vec3::new(3.0, 1.0, 0.0)
        );
    }
}
