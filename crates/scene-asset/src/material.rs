use crate::{
    handle::Handle,
    texture::{NormalTextureInfo, OcclusionTextureInfo, TextureInfo},
};

/// Define lighting parameters for the material.
#[derive(Debug, Clone)]
pub enum MaterialData {
    /// The standard lighting model for GLTF.
    Pbr {
        base_color_factor: [f32; 4],
        base_color_texture: Option<TextureInfo>,
        metallic_factor: f32,
        roughness_factor: f32,
        metallic_roughness_texture: Option<TextureInfo>,
    },
    /// KHR_materials_pbrSpecularGlossiness.
    SpecularGlossiness {
        diffuse_factor: [f32; 4],
        diffuse_texture: Option<TextureInfo>,
        specular_factor: [f32; 3],
        glossiness_factor: f32,
        specular_glossiness_texture: Option<TextureInfo>,
    },
    /// KHR_materials_unlit. The simplest lighting model.
    Unlit {
        base_color_factor: [f32; 4],
        base_color_texture: Option<TextureInfo>,
    },
}

impl Default for MaterialData {
    fn default() -> Self {
        MaterialData::Pbr {
            base_color_factor: [1.0; 4],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MaterialAlphaMode {
    #[default]
    Opaque,
    // Alpha cutoff
    Mask(f32),
    Blend,
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    pub handle: Handle,
    pub name: String,
    pub data: MaterialData,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: [f32; 3],
    /// KHR_materials_emissive_strength, 1.0 when absent.
    pub emissive_strength: f32,
    pub alpha_mode: MaterialAlphaMode,
    pub double_sided: bool,
}

impl Material {
    pub fn default_with_handle(handle: Handle) -> Self {
        Self {
            handle,
            name: String::from("default"),
            emissive_strength: 1.0,
            ..Default::default()
        }
    }

    /// Handles of every texture this material samples, in slot order.
    pub fn texture_handles(&self) -> Vec<Handle> {
        let mut handles = Vec::new();
        match &self.data {
            MaterialData::Pbr {
                base_color_texture,
                metallic_roughness_texture,
                ..
            } => {
                handles.extend(base_color_texture.iter().map(TextureInfo::handle));
                handles.extend(metallic_roughness_texture.iter().map(TextureInfo::handle));
            }
            MaterialData::SpecularGlossiness {
                diffuse_texture,
                specular_glossiness_texture,
                ..
            } => {
                handles.extend(diffuse_texture.iter().map(TextureInfo::handle));
                handles.extend(specular_glossiness_texture.iter().map(TextureInfo::handle));
            }
            MaterialData::Unlit {
                base_color_texture, ..
            } => {
                handles.extend(base_color_texture.iter().map(TextureInfo::handle));
            }
        }
        handles.extend(self.normal_texture.iter().map(|info| info.texture.handle));
        handles.extend(self.occlusion_texture.iter().map(|info| info.texture.handle));
        handles.extend(self.emissive_texture.iter().map(TextureInfo::handle));
        handles
    }
}
