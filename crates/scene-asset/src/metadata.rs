use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use crate::handle::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetType {
    #[default]
    None,
    Texture2D,
    TextureCubeMap,
    Material,
    Model,
    Prefab,
    Scene,
}

impl Display for AssetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::None => write!(f, "None"),
            AssetType::Texture2D => write!(f, "Texture2D"),
            AssetType::TextureCubeMap => write!(f, "TextureCubeMap"),
            AssetType::Material => write!(f, "Material"),
            AssetType::Model => write!(f, "Model"),
            AssetType::Prefab => write!(f, "Prefab"),
            AssetType::Scene => write!(f, "Scene"),
        }
    }
}

/// Catalog record of one asset.
///
/// The default value is the "None" metadata handed out for unknown handles;
/// check [`AssetMetadata::is_valid`] before using a looked up record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetMetadata {
    pub asset_type: AssetType,
    /// Source file, relative to the asset root.
    pub path: PathBuf,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<Handle>,
}

impl AssetMetadata {
    pub fn new(asset_type: AssetType, path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            asset_type,
            path: path.into(),
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: Handle) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.asset_type != AssetType::None
    }

    pub fn is_sub_asset(&self) -> bool {
        self.parent.is_some()
    }
}
