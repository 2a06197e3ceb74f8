use std::sync::Arc;

use crate::{handle::Handle, loader::ktx2::Ktx2Header};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Ru8,
    Rgu8,
    Rgbu8,
    Rgbau8,
    Ru16,
    Rgu16,
    Rgbu16,
    Rgbau16,
}

/// Texel payload of a texture.
#[derive(Debug, Clone)]
pub enum TextureData {
    /// A decoded conventional image, tightly packed rows.
    Pixels { format: TextureFormat, bytes: Vec<u8> },
    /// An untouched KTX2 container, handed to a KTX2 aware texture
    /// constructor on the GPU side.
    Ktx2 { header: Ktx2Header, bytes: Vec<u8> },
}

impl TextureData {
    pub fn is_ktx2(&self) -> bool {
        matches!(self, TextureData::Ktx2 { .. })
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            TextureData::Pixels { bytes, .. } | TextureData::Ktx2 { bytes, .. } => bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture2D {
    pub handle: Handle,
    pub name: String,
    pub size: (u32, u32),
    pub data: TextureData,
    pub sampler: SamplerAsset,
}

#[derive(Debug, Clone)]
pub struct TextureCubeMap {
    pub handle: Handle,
    pub name: String,
    /// Edge length of one face.
    pub size: u32,
    pub mip_levels: u32,
    pub header: Ktx2Header,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMagFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMinFilter {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureMipmapFilter {
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextureWrappingMode {
    ClampToEdge,
    MirroredRepeat,
    #[default]
    Repeat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerAsset {
    pub mag_filter: TextureMagFilter,
    pub min_filter: TextureMinFilter,
    pub mipmap_filter: TextureMipmapFilter,
    pub wrap_x: TextureWrappingMode,
    pub wrap_y: TextureWrappingMode,
}

/// Texture reference of a material slot.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub texture: Arc<Texture2D>,
    pub tex_coord: usize,
}

impl TextureInfo {
    pub fn handle(&self) -> Handle {
        self.texture.handle
    }
}

#[derive(Debug, Clone)]
pub struct NormalTextureInfo {
    pub texture: Arc<Texture2D>,
    pub tex_coord: usize,
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub struct OcclusionTextureInfo {
    pub texture: Arc<Texture2D>,
    pub tex_coord: usize,
    pub strength: f32,
}
