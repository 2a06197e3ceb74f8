use glam::Mat4;

use crate::node::NodeId;

/// Joint set of a skinned mesh. Joints reference nodes of the owning model.
#[derive(Debug, Clone)]
pub struct Skin {
    pub index: usize,
    pub name: Option<String>,
    pub skeleton_root: Option<NodeId>,
    pub joints: Vec<NodeId>,
    /// Parallel to `joints`.
    pub inverse_bind_matrices: Vec<Mat4>,
}

impl Skin {
    pub fn inverse_bind_matrix(&self, joint: usize) -> Mat4 {
        self.inverse_bind_matrices
            .get(joint)
            .copied()
            .unwrap_or(Mat4::IDENTITY)
    }
}
