use glam::Mat4;

use crate::{bounds::BoundingBox, primitive::Primitive};

/// Pose of a mesh computed by the last node update: the owning node's world
/// matrix and, for skinned meshes, one matrix per joint.
#[derive(Debug, Clone, Default)]
pub struct MeshPose {
    pub matrix: Mat4,
    pub joint_matrices: Vec<Mat4>,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    /// Index of the mesh in the source document.
    pub index: usize,
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub bounding_box: BoundingBox,
    pub pose: MeshPose,
}

impl Mesh {
    pub fn new(index: usize, name: Option<String>, primitives: Vec<Primitive>) -> Self {
        let bounding_box = primitives
            .iter()
            .fold(BoundingBox::INVALID, |acc, primitive| {
                acc.merge(&primitive.bounding_box)
            });
        Self {
            index,
            name,
            primitives,
            bounding_box,
            pose: MeshPose::default(),
        }
    }
}
