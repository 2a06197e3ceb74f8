//! Maps asset types to the importer that produces them.

use std::path::Path;

use log::debug;

use crate::{
    asset::Asset,
    error::{ImageSource, ImportError},
    handle::{Handle, HandleSource},
    loader::{
        gltf::load_gltf_from_source,
        texture::{load_cube_map, load_texture, ImageKind},
        ImportParams,
    },
    metadata::{AssetMetadata, AssetType},
    prefab::PrefabAssembler,
    registry::AssetRegistry,
    source::AssetSource,
    texture::SamplerAsset,
};

/// Everything an importer may look at. Importers never see the cache.
pub struct ImportContext<'a> {
    pub params: &'a ImportParams,
    /// Read-only view, used to keep sub-asset handles stable on reload.
    pub registry: &'a AssetRegistry,
    pub source: &'a dyn AssetSource,
}

pub type ImportFn = fn(Handle, &AssetMetadata, &ImportContext) -> Result<Asset, ImportError>;

fn read_file(source: &dyn AssetSource, path: &Path) -> Result<Vec<u8>, ImportError> {
    source
        .read(path)
        .map_err(|error| ImportError::Io(path.to_path_buf(), error))?
        .ok_or_else(|| ImportError::ResourceNotFound(path.display().to_string()))
}

fn import_texture_2d(
    handle: Handle,
    metadata: &AssetMetadata,
    context: &ImportContext,
) -> Result<Asset, ImportError> {
    let data = read_file(context.source, &metadata.path)?;
    let kind = ImageKind::classify(Some(metadata.path.as_path()), None, &data);
    let texture = load_texture(
        handle,
        metadata.name.clone(),
        &ImageSource::File(metadata.path.clone()),
        data,
        kind,
        None,
        SamplerAsset::default(),
    )?;
    Ok(texture.into())
}

fn import_texture_cube_map(
    handle: Handle,
    metadata: &AssetMetadata,
    context: &ImportContext,
) -> Result<Asset, ImportError> {
    let data = read_file(context.source, &metadata.path)?;
    let cube_map = load_cube_map(
        handle,
        metadata.name.clone(),
        &ImageSource::File(metadata.path.clone()),
        data,
    )?;
    Ok(cube_map.into())
}

fn import_model(
    handle: Handle,
    metadata: &AssetMetadata,
    context: &ImportContext,
) -> Result<Asset, ImportError> {
    let mut handles = HandleSource::reusing(context.registry.child_names(handle));
    let mut model =
        load_gltf_from_source(context.source, &metadata.path, context.params, &mut handles)?;
    model.handle = handle;
    Ok(model.into())
}

fn import_prefab(
    handle: Handle,
    metadata: &AssetMetadata,
    context: &ImportContext,
) -> Result<Asset, ImportError> {
    let prefab = PrefabAssembler::new(context.source, context.params).assemble_with_handle(
        handle,
        &metadata.path,
        context.registry,
    )?;
    Ok(prefab.into())
}

const IMPORTERS: &[(AssetType, ImportFn)] = &[
    (AssetType::Texture2D, import_texture_2d as ImportFn),
    (AssetType::TextureCubeMap, import_texture_cube_map as ImportFn),
    (AssetType::Model, import_model as ImportFn),
    (AssetType::Prefab, import_prefab as ImportFn),
];

pub struct ImporterDispatch;

impl ImporterDispatch {
    pub fn importer_for(asset_type: AssetType) -> Option<ImportFn> {
        IMPORTERS
            .iter()
            .find(|(registered, _)| *registered == asset_type)
            .map(|(_, importer)| *importer)
    }

    /// Produce the asset described by `metadata`. Does not register or cache
    /// anything.
    pub fn import(
        handle: Handle,
        metadata: &AssetMetadata,
        context: &ImportContext,
    ) -> Result<Asset, ImportError> {
        let importer = Self::importer_for(metadata.asset_type)
            .ok_or(ImportError::NoImporterForType(metadata.asset_type))?;
        debug!(
            "Import {} {} from {}",
            metadata.asset_type,
            handle,
            metadata.path.display()
        );
        importer(handle, metadata, context)
    }
}
