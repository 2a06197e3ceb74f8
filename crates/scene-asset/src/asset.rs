use std::sync::Arc;

use crate::{
    handle::Handle,
    material::Material,
    metadata::AssetType,
    model::Model,
    prefab::Prefab,
    scene::SceneAsset,
    texture::{Texture2D, TextureCubeMap},
};

/// A resident asset. Payloads are shared, cloning an `Asset` never copies
/// texel or vertex data.
#[derive(Debug, Clone)]
pub enum Asset {
    Texture2D(Arc<Texture2D>),
    TextureCubeMap(Arc<TextureCubeMap>),
    Material(Arc<Material>),
    Model(Arc<Model>),
    Prefab(Arc<Prefab>),
    Scene(Arc<SceneAsset>),
}

macro_rules! typed_accessor {
    ($name:ident, $variant:ident, $type:ty) => {
        pub fn $name(&self) -> Option<&Arc<$type>> {
            match self {
                Asset::$variant(asset) => Some(asset),
                _ => None,
            }
        }
    };
}

impl Asset {
    pub fn handle(&self) -> Handle {
        match self {
            Asset::Texture2D(asset) => asset.handle,
            Asset::TextureCubeMap(asset) => asset.handle,
            Asset::Material(asset) => asset.handle,
            Asset::Model(asset) => asset.handle,
            Asset::Prefab(asset) => asset.handle,
            Asset::Scene(asset) => asset.handle,
        }
    }

    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Texture2D(_) => AssetType::Texture2D,
            Asset::TextureCubeMap(_) => AssetType::TextureCubeMap,
            Asset::Material(_) => AssetType::Material,
            Asset::Model(_) => AssetType::Model,
            Asset::Prefab(_) => AssetType::Prefab,
            Asset::Scene(_) => AssetType::Scene,
        }
    }

    /// Whether both refer to the very same instance.
    pub fn ptr_eq(&self, other: &Asset) -> bool {
        match (self, other) {
            (Asset::Texture2D(a), Asset::Texture2D(b)) => Arc::ptr_eq(a, b),
            (Asset::TextureCubeMap(a), Asset::TextureCubeMap(b)) => Arc::ptr_eq(a, b),
            (Asset::Material(a), Asset::Material(b)) => Arc::ptr_eq(a, b),
            (Asset::Model(a), Asset::Model(b)) => Arc::ptr_eq(a, b),
            (Asset::Prefab(a), Asset::Prefab(b)) => Arc::ptr_eq(a, b),
            (Asset::Scene(a), Asset::Scene(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    typed_accessor!(as_texture_2d, Texture2D, Texture2D);
    typed_accessor!(as_texture_cube_map, TextureCubeMap, TextureCubeMap);
    typed_accessor!(as_material, Material, Material);
    typed_accessor!(as_model, Model, Model);
    typed_accessor!(as_prefab, Prefab, Prefab);
    typed_accessor!(as_scene, Scene, SceneAsset);
}

impl From<Texture2D> for Asset {
    fn from(value: Texture2D) -> Self {
        Asset::Texture2D(Arc::new(value))
    }
}

impl From<TextureCubeMap> for Asset {
    fn from(value: TextureCubeMap) -> Self {
        Asset::TextureCubeMap(Arc::new(value))
    }
}

impl From<Model> for Asset {
    fn from(value: Model) -> Self {
        Asset::Model(Arc::new(value))
    }
}

impl From<Prefab> for Asset {
    fn from(value: Prefab) -> Self {
        Asset::Prefab(Arc::new(value))
    }
}

impl From<SceneAsset> for Asset {
    fn from(value: SceneAsset) -> Self {
        Asset::Scene(Arc::new(value))
    }
}
