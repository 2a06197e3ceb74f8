use std::{
    cell::Cell,
    fmt::{self, Display, Formatter},
};

use glam::{Mat4, Quat, Vec3};

use crate::{bounds::BoundingBox, mesh::Mesh};

/// Index of a node inside a model's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixNodeTransform(pub Mat4);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    Matrix(MatrixNodeTransform),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl From<DecomposedTransform> for Mat4 {
    fn from(value: DecomposedTransform) -> Self {
        Mat4::from_translation(value.translation)
            * Mat4::from_quat(value.rotation)
            * Mat4::from_scale(value.scale)
    }
}

impl From<NodeTransform> for Mat4 {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => matrix.0,
            NodeTransform::Decomposed(decomposed) => decomposed.into(),
        }
    }
}

impl From<NodeTransform> for DecomposedTransform {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.0.to_scale_rotation_translation();
                DecomposedTransform {
                    translation,
                    rotation,
                    scale,
                }
            }
            NodeTransform::Decomposed(decomposed) => decomposed,
        }
    }
}

/// Cached world matrix of a node.
///
/// A clean state remembers the revision of the parent's world matrix it was
/// derived from; once the parent moves on to a newer revision the cache is
/// stale even though the node itself was never touched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MatrixState {
    #[default]
    Dirty,
    Clean { world: Mat4, parent_revision: u64 },
}

#[derive(Debug, Clone)]
pub struct Node {
    /// Index of the node in the source document.
    pub index: usize,
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mesh: Option<Mesh>,
    /// Index into [`crate::model::Model::skins`].
    pub skin: Option<usize>,
    /// World space box of this node's own mesh.
    pub aabb: BoundingBox,
    /// World space box of this node and all its descendants.
    pub bvh: BoundingBox,
    transform: NodeTransform,
    matrix: Cell<MatrixState>,
    revision: Cell<u64>,
}

impl Node {
    pub fn new(index: usize, name: Option<String>, transform: NodeTransform) -> Self {
        Self {
            index,
            name,
            parent: None,
            children: Vec::new(),
            mesh: None,
            skin: None,
            aabb: BoundingBox::INVALID,
            bvh: BoundingBox::INVALID,
            transform,
            matrix: Cell::new(MatrixState::Dirty),
            revision: Cell::new(0),
        }
    }

    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.transform.into()
    }

    pub fn matrix_state(&self) -> MatrixState {
        self.matrix.get()
    }

    pub fn set_transform(&mut self, transform: NodeTransform) {
        self.transform = transform;
        self.matrix.set(MatrixState::Dirty);
    }

    /// Apply `func` to the decomposed form of the transform. A matrix
    /// transform is decomposed first.
    pub fn update_decomposed(&mut self, func: impl FnOnce(&mut DecomposedTransform)) {
        let mut decomposed: DecomposedTransform = self.transform.into();
        func(&mut decomposed);
        self.set_transform(NodeTransform::Decomposed(decomposed));
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Cached world matrix, if still derived from `parent_revision`.
    pub(crate) fn cached_world(&self, parent_revision: u64) -> Option<Mat4> {
        match self.matrix.get() {
            MatrixState::Clean {
                world,
                parent_revision: seen,
            } if seen == parent_revision => Some(world),
            _ => None,
        }
    }

    pub(crate) fn store_world(&self, world: Mat4, parent_revision: u64) {
        self.matrix.set(MatrixState::Clean {
            world,
            parent_revision,
        });
        self.revision.set(self.revision.get() + 1);
    }
}
