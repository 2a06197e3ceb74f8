use std::path::PathBuf;

use glam::Mat4;

/// glTF 2.0 importer built on the `gltf` crate.
pub mod gltf;

/// KTX2 container headers.
pub mod ktx2;

pub(crate) mod texture;

#[inline]
fn pad_color_vec3_to_vec4(color: [f32; 3]) -> [f32; 4] {
    [color[0], color[1], color[2], 1.0]
}

#[inline]
fn chunk_vec2<T: Copy>(data: &[T]) -> Vec<[T; 2]> {
    data.chunks_exact(2).map(|item| [item[0], item[1]]).collect()
}

#[inline]
fn chunk_vec3<T: Copy>(data: &[T]) -> Vec<[T; 3]> {
    data.chunks_exact(3)
        .map(|item| [item[0], item[1], item[2]])
        .collect()
}

#[inline]
fn chunk_vec4<T: Copy>(data: &[T]) -> Vec<[T; 4]> {
    data.chunks_exact(4)
        .map(|item| [item[0], item[1], item[2], item[3]])
        .collect()
}

#[inline]
fn chunk_and_clamp_vec3_to_vec4_f32(data: &[f32]) -> Vec<[f32; 4]> {
    chunk_vec3(data)
        .into_iter()
        .map(|array| pad_color_vec3_to_vec4(array.map(|num| num.clamp(0.0, 1.0))))
        .collect()
}

#[inline]
fn chunk_and_clamp_vec4_f32(data: &[f32]) -> Vec<[f32; 4]> {
    chunk_vec4(data)
        .into_iter()
        .map(|array| array.map(|num| num.clamp(0.0, 1.0)))
        .collect()
}

#[inline]
fn chunk_mat4(data: &[f32]) -> Vec<Mat4> {
    data.chunks_exact(16).map(Mat4::from_cols_slice).collect()
}

#[derive(Debug, Clone)]
pub struct ImportParams {
    /// Root directory that registered asset paths are relative to.
    pub asset_root: PathBuf,
    /// Import `KHR_materials_unlit` materials as metallic-roughness.
    pub disable_unlit: bool,
    /// Joint matrices computed per skinned mesh at most.
    pub max_joints: usize,
    /// Flip the sign of the second rotation keyframe when the pair lies in
    /// opposite hemispheres, so rotations always take the shortest arc.
    pub shortest_path_rotation: bool,
    /// Scene of the document to build. Uses the default scene, or the first
    /// one, when unset.
    pub scene: Option<usize>,
}

impl Default for ImportParams {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            disable_unlit: false,
            max_joints: 128,
            shortest_path_rotation: false,
            scene: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_colors_are_clamped_and_padded() {
        let colors = chunk_and_clamp_vec3_to_vec4_f32(&[2.0, -1.0, 0.5]);
        assert_eq!(colors, vec![[1.0, 0.0, 0.5, 1.0]]);
        let colors = chunk_and_clamp_vec4_f32(&[0.25, 1.5, 0.0, -0.5]);
        assert_eq!(colors, vec![[0.25, 1.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_chunk_mat4_is_column_major() {
        let data: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let matrices = chunk_mat4(&data);
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0].w_axis.x, 12.0);
    }
}
