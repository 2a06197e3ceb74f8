use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use log::info;

use crate::{
    asset::Asset,
    error::ImportError,
    handle::{Handle, HandleSource},
    loader::{gltf::load_gltf_from_source, ImportParams},
    material::Material,
    metadata::{AssetMetadata, AssetType},
    model::Model,
    registry::AssetRegistry,
    source::AssetSource,
    texture::Texture2D,
};

/// An imported file as a placeable unit: the model plus the textures and
/// materials it brought along, each under its own handle.
#[derive(Debug, Clone)]
pub struct Prefab {
    pub handle: Handle,
    pub name: String,
    /// Source file, relative to the asset root.
    pub path: PathBuf,
    pub model: Arc<Model>,
    pub textures: BTreeMap<Handle, Arc<Texture2D>>,
    pub materials: BTreeMap<Handle, Arc<Material>>,
}

impl Prefab {
    pub fn metadata(&self) -> AssetMetadata {
        AssetMetadata::new(AssetType::Prefab, self.path.clone(), self.name.clone())
    }

    /// Registry records of every sub-asset: textures first, then materials.
    pub fn sub_asset_metadata(&self) -> Vec<(Handle, AssetMetadata)> {
        let textures = self.textures.iter().map(|(handle, texture)| {
            (
                *handle,
                AssetMetadata::new(AssetType::Texture2D, self.path.clone(), texture.name.clone())
                    .with_parent(self.handle),
            )
        });
        let materials = self.materials.iter().map(|(handle, material)| {
            (
                *handle,
                AssetMetadata::new(AssetType::Material, self.path.clone(), material.name.clone())
                    .with_parent(self.handle),
            )
        });
        textures.chain(materials).collect()
    }

    /// Sub-assets ready to be made resident.
    pub fn sub_assets(&self) -> impl Iterator<Item = (Handle, Asset)> + '_ {
        let textures = self
            .textures
            .iter()
            .map(|(handle, texture)| (*handle, Asset::Texture2D(texture.clone())));
        let materials = self
            .materials
            .iter()
            .map(|(handle, material)| (*handle, Asset::Material(material.clone())));
        textures.chain(materials)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.textures.contains_key(&handle) || self.materials.contains_key(&handle)
    }
}

/// Turns a glTF file into a [`Prefab`].
pub struct PrefabAssembler<'a> {
    source: &'a dyn AssetSource,
    params: &'a ImportParams,
}

impl<'a> PrefabAssembler<'a> {
    pub fn new(source: &'a dyn AssetSource, params: &'a ImportParams) -> Self {
        Self { source, params }
    }

    fn build(
        &self,
        handle: Handle,
        path: &Path,
        handles: &mut HandleSource,
    ) -> Result<Prefab, ImportError> {
        let mut model = load_gltf_from_source(self.source, path, self.params, handles)?;
        model.handle = handle;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .or_else(|| model.name.clone())
            .unwrap_or_else(|| handle.to_string());

        let textures = model
            .textures
            .iter()
            .map(|texture| (texture.handle, texture.clone()))
            .collect();
        let materials = model
            .materials
            .iter()
            .map(|material| (material.handle, material.clone()))
            .collect();

        let prefab = Prefab {
            handle,
            name,
            path: path.to_path_buf(),
            model: Arc::new(model),
            textures,
            materials,
        };
        info!(
            "Assembled prefab {} ({}) with {} textures and {} materials",
            prefab.name,
            handle,
            prefab.textures.len(),
            prefab.materials.len()
        );
        Ok(prefab)
    }

    /// Import `path` as a brand new prefab and register it together with its
    /// sub-assets. Every call produces new handles.
    pub fn assemble(
        &self,
        path: impl AsRef<Path>,
        registry: &mut AssetRegistry,
    ) -> Result<Prefab, ImportError> {
        let prefab = self.build(Handle::new(), path.as_ref(), &mut HandleSource::fresh())?;
        registry.insert(prefab.handle, prefab.metadata());
        for (handle, metadata) in prefab.sub_asset_metadata() {
            registry.insert(handle, metadata);
        }
        Ok(prefab)
    }

    /// Import `path` as the prefab `handle`. Sub-assets already registered
    /// under `handle` keep their handles when their type and name match.
    /// Nothing is registered.
    pub fn assemble_with_handle(
        &self,
        handle: Handle,
        path: impl AsRef<Path>,
        registry: &AssetRegistry,
    ) -> Result<Prefab, ImportError> {
        let mut handles = HandleSource::reusing(registry.child_names(handle));
        self.build(handle, path.as_ref(), &mut handles)
    }
}

/// Children registered under `prefab` that the prefab no longer produces.
pub(crate) fn stale_children(registry: &AssetRegistry, prefab: &Prefab) -> Vec<Handle> {
    let current: HashSet<Handle> = prefab
        .textures
        .keys()
        .chain(prefab.materials.keys())
        .copied()
        .collect();
    registry
        .children_of(prefab.handle)
        .map(|(handle, _)| handle)
        .filter(|handle| !current.contains(handle))
        .collect()
}
