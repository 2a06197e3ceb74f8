use std::{path::PathBuf, sync::Arc};

use log::{error, info, warn};

use crate::{
    asset::Asset,
    cache::AssetCache,
    dispatch::{ImportContext, ImporterDispatch},
    error::{ImportError, PersistError},
    handle::Handle,
    loader::ImportParams,
    material::Material,
    metadata::{AssetMetadata, AssetType},
    model::Model,
    prefab::{stale_children, Prefab},
    registry::{AssetRegistry, RegistryPersistence},
    scene::SceneAsset,
    source::{AssetSource, DirectorySource},
    texture::{Texture2D, TextureCubeMap},
};

/// Owns the registry and the cache of one project and routes imports
/// between them.
///
/// An asset is imported at most once per handle: later requests return the
/// resident instance until it is evicted.
pub struct AssetManager {
    params: ImportParams,
    registry: AssetRegistry,
    cache: AssetCache,
    source: Box<dyn AssetSource>,
    persistence: Option<Box<dyn RegistryPersistence>>,
}

macro_rules! typed_getter {
    ($name:ident, $accessor:ident, $type:ty) => {
        pub fn $name(&self, handle: Handle) -> Option<Arc<$type>> {
            self.cache.get(handle)?.$accessor().cloned()
        }
    };
}

impl AssetManager {
    /// Manager reading files below `params.asset_root`.
    pub fn new(params: ImportParams) -> Self {
        let source = DirectorySource::new(params.asset_root.clone());
        Self::with_source(params, source)
    }

    pub fn with_source(params: ImportParams, source: impl AssetSource + 'static) -> Self {
        Self {
            params,
            registry: AssetRegistry::new(),
            cache: AssetCache::new(),
            source: Box::new(source),
            persistence: None,
        }
    }

    /// Save the registry through `persistence` after every change made by an
    /// import.
    pub fn with_persistence(mut self, persistence: impl RegistryPersistence + 'static) -> Self {
        self.persistence = Some(Box::new(persistence));
        self
    }

    /// Merge the persisted registry into the current one. Returns the number
    /// of loaded entries.
    pub fn load_registry(&mut self) -> Result<usize, PersistError> {
        let Some(persistence) = &self.persistence else {
            return Ok(0);
        };
        let loaded = persistence.load()?;
        let count = loaded.len();
        for (handle, metadata) in loaded.iter() {
            self.registry.insert(handle, metadata.clone());
        }
        info!("Loaded {} registry entries", count);
        Ok(count)
    }

    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(error) = persistence.save(&self.registry) {
            error!("Failed to persist the asset registry: {}", error);
        }
    }

    pub fn params(&self) -> &ImportParams {
        &self.params
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Make `handle` resident, importing it when needed.
    pub fn import(&mut self, handle: Handle) -> Result<Asset, ImportError> {
        if handle.is_none() {
            return Err(ImportError::InvalidHandle);
        }
        if let Some(asset) = self.cache.get(handle) {
            return Ok(asset.clone());
        }
        let metadata = self
            .registry
            .get(handle)
            .cloned()
            .ok_or(ImportError::RegistryMiss(handle))?;
        let asset = self.import_uncached(handle, &metadata)?;
        if asset.asset_type() == AssetType::Prefab {
            self.persist();
        }
        Ok(asset)
    }

    /// Import `handle` as described by `metadata`, then register it. A
    /// resident asset is returned as is.
    pub fn import_with_metadata(
        &mut self,
        handle: Handle,
        metadata: AssetMetadata,
    ) -> Result<Asset, ImportError> {
        if handle.is_none() {
            return Err(ImportError::InvalidHandle);
        }
        if let Some(asset) = self.cache.get(handle) {
            return Ok(asset.clone());
        }
        let asset = self.import_uncached(handle, &metadata)?;
        self.registry.insert(handle, metadata);
        self.persist();
        Ok(asset)
    }

    /// Import a glTF file as a new prefab.
    pub fn import_prefab(&mut self, path: impl Into<PathBuf>) -> Result<Arc<Prefab>, ImportError> {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let handle = Handle::new();
        let asset =
            self.import_with_metadata(handle, AssetMetadata::new(AssetType::Prefab, path, name))?;
        asset
            .as_prefab()
            .cloned()
            .ok_or_else(|| ImportError::Unsupported(format!("{} is not a prefab", handle)))
    }

    fn import_uncached(
        &mut self,
        handle: Handle,
        metadata: &AssetMetadata,
    ) -> Result<Asset, ImportError> {
        if let Some(parent) = metadata.parent {
            return self.import_sub_asset(handle, parent);
        }

        let asset = {
            let context = ImportContext {
                params: &self.params,
                registry: &self.registry,
                source: self.source.as_ref(),
            };
            ImporterDispatch::import(handle, metadata, &context)?
        };
        if let Asset::Prefab(prefab) = &asset {
            self.store_sub_assets(prefab);
        }
        self.cache.insert(handle, asset.clone());
        Ok(asset)
    }

    /// Sub-assets are produced by importing their parent.
    fn import_sub_asset(&mut self, handle: Handle, parent: Handle) -> Result<Asset, ImportError> {
        self.import(parent)?;
        self.cache
            .get(handle)
            .cloned()
            .ok_or(ImportError::SubAssetUnavailable { handle, parent })
    }

    fn store_sub_assets(&mut self, prefab: &Prefab) {
        for handle in stale_children(&self.registry, prefab) {
            warn!("Drop sub-asset {} no longer produced by {}", handle, prefab.handle);
            self.registry.remove(handle);
            self.cache.evict(handle);
        }
        for (handle, metadata) in prefab.sub_asset_metadata() {
            self.registry.insert(handle, metadata);
        }
        for (handle, asset) in prefab.sub_assets() {
            self.cache.insert(handle, asset);
        }
    }

    /// Add or replace a registry entry without importing anything.
    pub fn register(&mut self, handle: Handle, metadata: AssetMetadata) {
        self.registry.insert(handle, metadata);
        self.persist();
    }

    pub fn get_metadata(&self, handle: Handle) -> &AssetMetadata {
        self.registry.get_metadata(handle)
    }

    pub fn is_handle_valid(&self, handle: Handle) -> bool {
        !handle.is_none() && self.registry.contains(handle)
    }

    pub fn is_resident(&self, handle: Handle) -> bool {
        self.cache.contains(handle)
    }

    pub fn get_asset(&self, handle: Handle) -> Option<&Asset> {
        self.cache.get(handle)
    }

    typed_getter!(texture_2d, as_texture_2d, Texture2D);
    typed_getter!(texture_cube_map, as_texture_cube_map, TextureCubeMap);
    typed_getter!(material, as_material, Material);
    typed_getter!(model, as_model, Model);
    typed_getter!(prefab, as_prefab, Prefab);
    typed_getter!(scene, as_scene, SceneAsset);

    /// Make `asset` resident without registering it.
    pub fn insert_transient(&mut self, handle: Handle, asset: Asset) {
        self.cache.insert(handle, asset);
    }

    pub fn evict(&mut self, handle: Handle) -> Option<Asset> {
        self.cache.evict(handle)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn resident_count(&self) -> usize {
        self.cache.len()
    }
}
