use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use log::warn;

use crate::{
    animation::{Animation, ChannelPath},
    bounds::BoundingBox,
    error::ImportWarning,
    handle::Handle,
    material::Material,
    mesh::MeshPose,
    node::{Node, NodeId, NodeTransform},
    primitive::Vertex,
    skin::Skin,
    texture::Texture2D,
};

/// What happened during an import besides the produced model.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub warnings: Vec<ImportWarning>,
    pub extensions_used: Vec<String>,
    pub unsupported_extensions: Vec<String>,
    pub transcoder_initialized: bool,
}

impl ImportReport {
    pub(crate) fn warn(&mut self, warning: ImportWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// A decoded scene graph with its packed geometry.
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. World
/// matrices are cached per node and recomputed lazily: changing a node's
/// transform only marks that node dirty, its descendants notice on their
/// next query.
#[derive(Debug, Clone)]
pub struct Model {
    pub handle: Handle,
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
    /// Every node, in creation order.
    pub linear_nodes: Vec<NodeId>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
    pub textures: Vec<Arc<Texture2D>>,
    /// Indexed by [`crate::primitive::Primitive::material`].
    pub materials: Vec<Arc<Material>>,
    pub default_material: Arc<Material>,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub dimensions: BoundingBox,
    pub report: ImportReport,
    pub max_joints: usize,
    pub shortest_path_rotation: bool,
}

impl Model {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Find the node created from document node `index`, searching the
    /// hierarchy depth first.
    pub fn node_from_index(&self, index: usize) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.index == index {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.linear_nodes
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].name.as_deref() == Some(name))
    }

    pub fn animation_by_name(&self, name: &str) -> Option<usize> {
        self.animations
            .iter()
            .position(|animation| animation.name == name)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Material of a primitive, the default material when it has none.
    pub fn material(&self, index: Option<usize>) -> &Arc<Material> {
        index
            .and_then(|index| self.materials.get(index))
            .unwrap_or(&self.default_material)
    }

    /// World matrix of a node, reusing cached matrices along the path to
    /// the root where they are still valid.
    ///
    /// Panics if `id` does not belong to this model.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let node = &self.nodes[id.0];
        let (parent_world, parent_revision) = match node.parent {
            Some(parent) => (self.world_matrix(parent), self.nodes[parent.0].revision()),
            None => (Mat4::IDENTITY, 0),
        };
        if let Some(world) = node.cached_world(parent_revision) {
            return world;
        }
        let world = parent_world * node.local_matrix();
        node.store_world(world, parent_revision);
        world
    }

    pub fn set_node_transform(&mut self, id: NodeId, transform: NodeTransform) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.set_transform(transform);
        }
    }

    /// Recompute the pose of the mesh attached to `id`: its world matrix and,
    /// when skinned, the joint matrices.
    pub fn update_node(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        if node.mesh.is_none() {
            return;
        }
        let matrix = self.world_matrix(id);
        let joint_matrices = match node.skin.and_then(|skin| self.skins.get(skin)) {
            Some(skin) => {
                let inverse = matrix.inverse();
                skin.joints
                    .iter()
                    .take(self.max_joints)
                    .enumerate()
                    .map(|(joint, id)| {
                        inverse * self.world_matrix(*id) * skin.inverse_bind_matrix(joint)
                    })
                    .collect()
            }
            None => Vec::new(),
        };
        if let Some(mesh) = self.nodes[id.0].mesh.as_mut() {
            mesh.pose = MeshPose {
                matrix,
                joint_matrices,
            };
        }
    }

    pub fn update_all(&mut self) {
        for index in 0..self.linear_nodes.len() {
            self.update_node(self.linear_nodes[index]);
        }
    }

    fn compute_node_bounds(&mut self, id: NodeId) -> BoundingBox {
        let world = self.world_matrix(id);
        let children = self.nodes[id.0].children.clone();
        let node = &mut self.nodes[id.0];
        node.aabb = node
            .mesh
            .as_ref()
            .map(|mesh| mesh.bounding_box.transformed(&world))
            .unwrap_or(BoundingBox::INVALID);

        let mut bvh = node.aabb;
        for child in children {
            bvh.merge_in_place(&self.compute_node_bounds(child));
        }
        self.nodes[id.0].bvh = bvh;
        bvh
    }

    /// Recompute the world space boxes of every node, bottom up, and the
    /// model's overall dimensions.
    pub fn compute_bounds(&mut self) {
        let mut dimensions = BoundingBox::INVALID;
        for index in 0..self.roots.len() {
            dimensions.merge_in_place(&self.compute_node_bounds(self.roots[index]));
        }
        self.dimensions = dimensions;
    }

    /// Apply animation `index` at `time` seconds.
    ///
    /// Returns whether any channel had keyframes around `time`. When one did,
    /// every node's pose and the bounding volumes are brought up to date.
    pub fn update_animation(&mut self, index: usize, time: f32) -> bool {
        let Model {
            animations,
            nodes,
            shortest_path_rotation,
            ..
        } = self;
        let Some(animation) = animations.get(index) else {
            warn!("No animation with index {}", index);
            return false;
        };

        let mut updated = false;
        for channel in &animation.channels {
            let Some(sampler) = animation.samplers.get(channel.sampler) else {
                continue;
            };
            let rotation = channel.path == ChannelPath::Rotation;
            let Some(value) = sampler.sample(time, rotation, *shortest_path_rotation) else {
                continue;
            };
            let Some(node) = nodes.get_mut(channel.node.0) else {
                continue;
            };
            node.update_decomposed(|transform| match channel.path {
                ChannelPath::Translation => transform.translation = value.truncate(),
                ChannelPath::Rotation => transform.rotation = Quat::from_vec4(value),
                ChannelPath::Scale => transform.scale = value.truncate(),
            });
            updated = true;
        }

        if updated {
            self.update_all();
            self.compute_bounds();
        }
        updated
    }
}
