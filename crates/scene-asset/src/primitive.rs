use bytemuck::{Pod, Zeroable};

use crate::bounds::BoundingBox;

/// One vertex of the packed vertex buffer of a model.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv0: [f32; 2],
    pub uv1: [f32; 2],
    pub joint0: [u32; 4],
    pub weight0: [f32; 4],
    pub color: [f32; 4],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv0: [0.0; 2],
            uv1: [0.0; 2],
            joint0: [0; 4],
            weight0: [1.0, 0.0, 0.0, 0.0],
            color: [1.0; 4],
        }
    }
}

/// Range of a model's packed buffers drawn with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub first_index: u32,
    /// Zero for non-indexed primitives.
    pub index_count: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
    /// Index into the model's materials, `None` for the default material.
    pub material: Option<usize>,
    pub bounding_box: BoundingBox,
}

impl Primitive {
    pub fn is_indexed(&self) -> bool {
        self.index_count > 0
    }
}
