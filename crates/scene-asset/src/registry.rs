//! Catalog of known assets.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    error::PersistError,
    handle::Handle,
    metadata::{AssetMetadata, AssetType},
};

/// Ordered map from handle to metadata. Knows which assets exist and where
/// they come from, never holds asset data.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    entries: BTreeMap<Handle, AssetMetadata>,
    none: AssetMetadata,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry of `handle`. Returns the replaced metadata.
    pub fn insert(&mut self, handle: Handle, metadata: AssetMetadata) -> Option<AssetMetadata> {
        match self.entries.entry(handle) {
            Entry::Occupied(mut entry) => {
                debug!("Overwrite registry entry {}", handle);
                Some(entry.insert(metadata))
            }
            Entry::Vacant(entry) => {
                entry.insert(metadata);
                None
            }
        }
    }

    /// Metadata of `handle`, or the "None" metadata when unknown.
    pub fn get_metadata(&self, handle: Handle) -> &AssetMetadata {
        self.entries.get(&handle).unwrap_or(&self.none)
    }

    pub fn get(&self, handle: Handle) -> Option<&AssetMetadata> {
        self.entries.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn remove(&mut self, handle: Handle) -> Option<AssetMetadata> {
        self.entries.remove(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &AssetMetadata)> {
        self.entries.iter().map(|(handle, metadata)| (*handle, metadata))
    }

    /// Registered sub-assets of `parent`, in handle order.
    pub fn children_of(&self, parent: Handle) -> impl Iterator<Item = (Handle, &AssetMetadata)> {
        self.iter()
            .filter(move |(_, metadata)| metadata.parent == Some(parent))
    }

    /// Registered children of `parent` keyed the way a re-import names its
    /// sub-assets.
    pub fn child_names(&self, parent: Handle) -> Vec<(AssetType, String, Handle)> {
        self.children_of(parent)
            .map(|(handle, metadata)| (metadata.asset_type, metadata.name.clone(), handle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage boundary of the registry. The project layer decides the format.
pub trait RegistryPersistence {
    fn save(&self, registry: &AssetRegistry) -> Result<(), PersistError>;
    fn load(&self) -> Result<AssetRegistry, PersistError>;
}

/// Registry stored as a pretty printed JSON array.
#[cfg(feature = "serde")]
#[derive(Debug, Clone)]
pub struct JsonRegistryFile {
    path: PathBuf,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct JsonEntry {
    handle: Handle,
    #[serde(flatten)]
    metadata: AssetMetadata,
}

#[cfg(feature = "serde")]
impl JsonRegistryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(feature = "serde")]
impl RegistryPersistence for JsonRegistryFile {
    fn save(&self, registry: &AssetRegistry) -> Result<(), PersistError> {
        let entries: Vec<JsonEntry> = registry
            .iter()
            .map(|(handle, metadata)| JsonEntry {
                handle,
                metadata: metadata.clone(),
            })
            .collect();
        let data = serde_json::to_vec_pretty(&entries)?;
        std::fs::write(&self.path, data)?;
        debug!("Saved {} registry entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<AssetRegistry, PersistError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(AssetRegistry::new())
            }
            Err(error) => return Err(error.into()),
        };
        let entries: Vec<JsonEntry> = serde_json::from_slice(&data)?;
        let mut registry = AssetRegistry::new();
        for entry in entries {
            registry.insert(entry.handle, entry.metadata);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn texture(name: &str) -> AssetMetadata {
        AssetMetadata::new(AssetType::Texture2D, "a.gltf", name)
    }

    #[test]
    fn test_unknown_handle_is_none_metadata() {
        let registry = AssetRegistry::new();
        let metadata = registry.get_metadata(Handle::from_raw(3));
        assert!(!metadata.is_valid());
        assert_eq!(metadata.asset_type, AssetType::None);
        assert!(registry.get(Handle::from_raw(3)).is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut registry = AssetRegistry::new();
        let handle = Handle::from_raw(1);
        assert!(registry.insert(handle, texture("a")).is_none());
        assert_eq!(registry.insert(handle, texture("b")), Some(texture("a")));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_metadata(handle).name, "b");
        assert_eq!(registry.remove(handle), Some(texture("b")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_children_of() {
        let mut registry = AssetRegistry::new();
        let parent = Handle::from_raw(10);
        registry.insert(parent, AssetMetadata::new(AssetType::Prefab, "a.gltf", "a"));
        registry.insert(Handle::from_raw(12), texture("b").with_parent(parent));
        registry.insert(Handle::from_raw(11), texture("a").with_parent(parent));
        registry.insert(Handle::from_raw(13), texture("c"));

        let children: Vec<Handle> = registry.children_of(parent).map(|(handle, _)| handle).collect();
        assert_eq!(children, vec![Handle::from_raw(11), Handle::from_raw(12)]);
        assert_eq!(
            registry.child_names(parent)[0],
            (AssetType::Texture2D, "a".to_string(), Handle::from_raw(11))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let file = JsonRegistryFile::new(directory.path().join("registry.json"));
        assert!(file.load().unwrap().is_empty());

        let mut registry = AssetRegistry::new();
        let parent = Handle::from_raw(0xabc);
        registry.insert(parent, AssetMetadata::new(AssetType::Prefab, "models/a.glb", "a"));
        registry.insert(Handle::from_raw(5), texture("albedo").with_parent(parent));
        file.save(&registry).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get_metadata(parent), registry.get_metadata(parent));
        assert_eq!(
            loaded.get_metadata(Handle::from_raw(5)).parent,
            Some(parent)
        );
    }
}
