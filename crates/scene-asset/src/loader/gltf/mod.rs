use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Arc,
};

use gltf::{
    json::Value,
    material::AlphaMode,
    texture::{self, MagFilter, MinFilter, WrappingMode},
    Document, Gltf,
};
use log::{debug, info};
use scheme::Scheme;

use crate::{
    error::{ImageSource, ImportError, ImportWarning},
    handle::{Handle, HandleSource},
    loader::{
        ktx2::BasisTranscoder,
        texture::{self as texture_loader, ImageKind},
        ImportParams,
    },
    material::{Material, MaterialAlphaMode, MaterialData},
    metadata::AssetType,
    model::{ImportReport, Model},
    node::NodeId,
    source::{AssetSource, DirectorySource, MemorySource},
    texture::{
        NormalTextureInfo, OcclusionTextureInfo, SamplerAsset, Texture2D, TextureInfo,
        TextureMagFilter, TextureMinFilter, TextureMipmapFilter, TextureWrappingMode,
    },
};

mod accessor;
mod animation;
mod builder;
pub mod scheme;

pub const KHR_TEXTURE_BASISU: &str = "KHR_texture_basisu";

/// Extensions that are understood. Anything else in `extensionsUsed` is
/// reported and ignored.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    KHR_TEXTURE_BASISU,
    "KHR_materials_pbrSpecularGlossiness",
    "KHR_materials_unlit",
    "KHR_materials_emissive_strength",
];

/// Resolved binary buffers of a document, each padded to 4 bytes.
#[derive(Debug, Default)]
pub(crate) struct GltfData {
    pub(crate) buffers: Vec<Vec<u8>>,
}

struct GltfDocumentLoader<'a> {
    document: &'a Document,
    data: &'a GltfData,
    params: &'a ImportParams,
    source: &'a dyn AssetSource,
    base: &'a Path,
    handles: &'a mut HandleSource,
    report: ImportReport,
    transcoder: Option<BasisTranscoder>,
    texture_cache: HashMap<usize, Arc<Texture2D>>,
    textures: Vec<Arc<Texture2D>>,
    used_names: HashSet<(AssetType, String)>,
}

impl<'a> GltfDocumentLoader<'a> {
    fn new(
        document: &'a Document,
        data: &'a GltfData,
        params: &'a ImportParams,
        source: &'a dyn AssetSource,
        base: &'a Path,
        handles: &'a mut HandleSource,
    ) -> Self {
        Self {
            document,
            data,
            params,
            source,
            base,
            handles,
            report: ImportReport::default(),
            transcoder: None,
            texture_cache: HashMap::new(),
            textures: Vec::new(),
            used_names: HashSet::new(),
        }
    }

    fn check_extensions(&mut self) {
        for extension in self.document.extensions_used() {
            self.report.extensions_used.push(extension.to_string());
            if !SUPPORTED_EXTENSIONS.contains(&extension) {
                self.report
                    .unsupported_extensions
                    .push(extension.to_string());
                self.report
                    .warn(ImportWarning::UnsupportedExtension(extension.to_string()));
            }
        }

        if self
            .report
            .extensions_used
            .iter()
            .any(|extension| extension == KHR_TEXTURE_BASISU)
        {
            self.transcoder = Some(BasisTranscoder::initialize());
            self.report.transcoder_initialized = true;
        }
    }

    /// Name unique among the assets of one type in this document, stable
    /// across imports of the same file.
    fn unique_name(&mut self, asset_type: AssetType, name: String) -> String {
        let mut candidate = name.clone();
        let mut suffix = 1;
        while !self.used_names.insert((asset_type, candidate.clone())) {
            candidate = format!("{}.{}", name, suffix);
            suffix += 1;
        }
        candidate
    }

    fn load_texture_sampler(sampler: texture::Sampler) -> SamplerAsset {
        let (min_filter, mipmap_filter) = sampler
            .min_filter()
            .map(|filter| match filter {
                MinFilter::Nearest => (TextureMinFilter::Nearest, TextureMipmapFilter::default()),
                MinFilter::Linear => (TextureMinFilter::Linear, TextureMipmapFilter::default()),
                MinFilter::NearestMipmapNearest => {
                    (TextureMinFilter::Nearest, TextureMipmapFilter::Nearest)
                }
                MinFilter::LinearMipmapNearest => {
                    (TextureMinFilter::Linear, TextureMipmapFilter::Nearest)
                }
                MinFilter::NearestMipmapLinear => {
                    (TextureMinFilter::Nearest, TextureMipmapFilter::Linear)
                }
                MinFilter::LinearMipmapLinear => {
                    (TextureMinFilter::Linear, TextureMipmapFilter::Linear)
                }
            })
            .unwrap_or_default();

        fn wrapping_mode(mode: WrappingMode) -> TextureWrappingMode {
            match mode {
                WrappingMode::ClampToEdge => TextureWrappingMode::ClampToEdge,
                WrappingMode::MirroredRepeat => TextureWrappingMode::MirroredRepeat,
                WrappingMode::Repeat => TextureWrappingMode::Repeat,
            }
        }

        SamplerAsset {
            mag_filter: sampler
                .mag_filter()
                .map(|filter| match filter {
                    MagFilter::Nearest => TextureMagFilter::Nearest,
                    MagFilter::Linear => TextureMagFilter::Linear,
                })
                .unwrap_or_default(),
            min_filter,
            mipmap_filter,
            wrap_x: wrapping_mode(sampler.wrap_s()),
            wrap_y: wrapping_mode(sampler.wrap_t()),
        }
    }

    /// Image of a texture, preferring the `KHR_texture_basisu` source.
    fn texture_image(&self, texture: &gltf::Texture<'a>) -> gltf::Image<'a> {
        texture
            .extension_value(KHR_TEXTURE_BASISU)
            .and_then(|basisu| basisu.get("source"))
            .and_then(Value::as_u64)
            .and_then(|index| self.document.images().nth(index as usize))
            .unwrap_or_else(|| texture.source())
    }

    /// Encoded bytes of an image with its MIME type, where the bytes came
    /// from, and the URI path if any.
    fn image_data(
        &self,
        image: &gltf::Image,
    ) -> Result<(Vec<u8>, Option<String>, ImageSource, Option<PathBuf>), ImportError> {
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let buffer_index = view.buffer().index();
                let start = view.offset();
                let end = start + view.length();
                let data = self
                    .data
                    .buffers
                    .get(buffer_index)
                    .and_then(|buffer| buffer.get(start..end))
                    .ok_or_else(|| {
                        ImportError::ResourceNotFound(format!("buffer view #{}", view.index()))
                    })?;
                Ok((
                    data.to_vec(),
                    Some(mime_type.to_string()),
                    ImageSource::Buffer(view.index()),
                    None,
                ))
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                let scheme = Scheme::try_from(uri)?;
                let Some((load_mime, data)) = scheme
                    .load(self.source, self.base)
                    .map_err(|error| ImportError::Io(PathBuf::from(uri), error))?
                else {
                    return Err(ImportError::ResourceNotFound(uri.to_string()));
                };
                Ok((
                    data,
                    mime_type.or(load_mime).map(str::to_string),
                    ImageSource::Uri(uri.to_string()),
                    scheme.path().map(Path::to_path_buf),
                ))
            }
        }
    }

    fn texture_name(&self, texture: &gltf::Texture, image: &gltf::Image) -> String {
        if let Some(name) = texture.name().or(image.name()) {
            return name.to_string();
        }
        if let gltf::image::Source::Uri { uri, .. } = image.source() {
            if let Some(stem) = Path::new(uri).file_stem().and_then(|stem| stem.to_str()) {
                if !uri.starts_with("data:") {
                    return stem.to_string();
                }
            }
        }
        format!("texture{}", texture.index())
    }

    fn load_texture(&mut self, texture: &gltf::Texture<'a>) -> Result<Texture2D, ImportError> {
        let image = self.texture_image(texture);
        let (data, mime, source, path) = self.image_data(&image)?;
        let kind = ImageKind::classify(path.as_deref(), mime.as_deref(), &data);
        if kind == ImageKind::Ktx2 && self.transcoder.is_none() {
            debug!("KTX2 image {} without {}", source, KHR_TEXTURE_BASISU);
        }

        let name = self.texture_name(texture, &image);
        let name = self.unique_name(AssetType::Texture2D, name);
        let handle = self.handles.next(AssetType::Texture2D, &name);
        let sampler = Self::load_texture_sampler(texture.sampler());
        texture_loader::load_texture(handle, name, &source, data, kind, mime.as_deref(), sampler)
    }

    /// Load every texture of the document. A texture that fails to load is
    /// reported and left out; materials referencing it lose that slot.
    fn load_textures(&mut self) {
        let document = self.document;
        for texture in document.textures() {
            match self.load_texture(&texture) {
                Ok(asset) => {
                    let asset = Arc::new(asset);
                    self.texture_cache.insert(texture.index(), asset.clone());
                    self.textures.push(asset);
                }
                Err(error) => self.report.warn(ImportWarning::TextureUnavailable {
                    texture: texture.index(),
                    reason: error.to_string(),
                }),
            }
        }
    }

    fn cached_texture(&self, texture: &gltf::Texture) -> Option<Arc<Texture2D>> {
        self.texture_cache.get(&texture.index()).cloned()
    }

    fn load_texture_info(&self, info: texture::Info) -> Option<TextureInfo> {
        Some(TextureInfo {
            texture: self.cached_texture(&info.texture())?,
            tex_coord: info.tex_coord() as usize,
        })
    }

    fn load_material(&mut self, material: gltf::Material) -> Material {
        let alpha_mode = match material.alpha_mode() {
            AlphaMode::Opaque => MaterialAlphaMode::Opaque,
            AlphaMode::Mask => MaterialAlphaMode::Mask(material.alpha_cutoff().unwrap_or(0.5)),
            AlphaMode::Blend => MaterialAlphaMode::Blend,
        };

        let pbr = material.pbr_metallic_roughness();
        let data = if let Some(specular) = material.pbr_specular_glossiness() {
            MaterialData::SpecularGlossiness {
                diffuse_factor: specular.diffuse_factor(),
                diffuse_texture: specular
                    .diffuse_texture()
                    .and_then(|info| self.load_texture_info(info)),
                specular_factor: specular.specular_factor(),
                glossiness_factor: specular.glossiness_factor(),
                specular_glossiness_texture: specular
                    .specular_glossiness_texture()
                    .and_then(|info| self.load_texture_info(info)),
            }
        } else if material.unlit() && !self.params.disable_unlit {
            MaterialData::Unlit {
                base_color_factor: pbr.base_color_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .and_then(|info| self.load_texture_info(info)),
            }
        } else {
            MaterialData::Pbr {
                base_color_factor: pbr.base_color_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .and_then(|info| self.load_texture_info(info)),
                metallic_factor: pbr.metallic_factor(),
                roughness_factor: pbr.roughness_factor(),
                metallic_roughness_texture: pbr
                    .metallic_roughness_texture()
                    .and_then(|info| self.load_texture_info(info)),
            }
        };

        let normal_texture = material.normal_texture().and_then(|info| {
            Some(NormalTextureInfo {
                texture: self.cached_texture(&info.texture())?,
                tex_coord: info.tex_coord() as usize,
                scale: info.scale(),
            })
        });
        let occlusion_texture = material.occlusion_texture().and_then(|info| {
            Some(OcclusionTextureInfo {
                texture: self.cached_texture(&info.texture())?,
                tex_coord: info.tex_coord() as usize,
                strength: info.strength(),
            })
        });
        let emissive_texture = material
            .emissive_texture()
            .and_then(|info| self.load_texture_info(info));

        let name = material
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("material{}", material.index().unwrap_or_default()));
        let name = self.unique_name(AssetType::Material, name);
        let handle = self.handles.next(AssetType::Material, &name);

        Material {
            handle,
            name,
            data,
            normal_texture,
            occlusion_texture,
            emissive_texture,
            emissive_factor: material.emissive_factor(),
            emissive_strength: material.emissive_strength().unwrap_or(1.0),
            alpha_mode,
            double_sided: material.double_sided(),
        }
    }

    fn load(mut self) -> Result<Model, ImportError> {
        let document = self.document;
        self.check_extensions();
        self.load_textures();
        let materials: Vec<Arc<Material>> = document
            .materials()
            .map(|material| Arc::new(self.load_material(material)))
            .collect();

        let scene = match self.params.scene {
            Some(index) => document.scenes().nth(index),
            None => document
                .default_scene()
                .or_else(|| document.scenes().next()),
        }
        .ok_or(ImportError::NoScene)?;

        let (vertex_count, index_count) = builder::count_scene(&scene);
        let (nodes, roots, geometry) = self.build_scene(&scene, vertex_count, index_count)?;
        let (vertices, indices) = geometry.finish();
        debug!(
            "Scene sized to {} vertices, {} indices; {} vertices, {} indices written",
            vertex_count,
            index_count,
            vertices.len(),
            indices.len()
        );

        let linear_nodes = (0..nodes.len()).map(NodeId).collect();
        let mut model = Model {
            handle: Handle::NONE,
            name: scene.name().map(str::to_string),
            nodes,
            roots,
            linear_nodes,
            skins: Vec::new(),
            animations: Vec::new(),
            textures: Vec::new(),
            materials,
            default_material: Arc::new(Material::default_with_handle(Handle::NONE)),
            vertices,
            indices,
            dimensions: Default::default(),
            report: ImportReport::default(),
            max_joints: self.params.max_joints,
            shortest_path_rotation: self.params.shortest_path_rotation,
        };
        model.skins = self.load_skins(&model)?;
        model.animations = self.load_animations(&model)?;
        model.textures = std::mem::take(&mut self.textures);
        model.report = std::mem::take(&mut self.report);

        model.update_all();
        model.compute_bounds();

        info!(
            "Imported {} nodes, {} vertices, {} indices, {} skins, {} animations",
            model.nodes.len(),
            model.vertices.len(),
            model.indices.len(),
            model.skins.len(),
            model.animations.len()
        );
        Ok(model)
    }
}

fn load_buffers(
    gltf: &Gltf,
    source: &dyn AssetSource,
    base: &Path,
) -> Result<GltfData, ImportError> {
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| ImportError::ResourceNotFound("GLB binary chunk".to_string()))?,
            gltf::buffer::Source::Uri(uri) => {
                let scheme = Scheme::try_from(uri)?;

                // If MIME is specified, check the MIME
                if let Scheme::Data(mime, _) = &scheme {
                    match mime {
                        Some(mime)
                            if mime.eq_ignore_ascii_case("application/octet-stream")
                                || mime.eq_ignore_ascii_case("application/gltf-buffer") => {}
                        Some(mime) => {
                            return Err(ImportError::BadBufferMime(
                                uri.to_string(),
                                Some(mime.to_string()),
                            ))
                        }
                        None => return Err(ImportError::BadBufferMime(uri.to_string(), None)),
                    }
                }

                let Some((_mime, data)) = scheme
                    .load(source, base)
                    .map_err(|error| ImportError::Io(PathBuf::from(uri), error))?
                else {
                    return Err(ImportError::ResourceNotFound(uri.to_string()));
                };
                data
            }
        };

        // Pad the data to 4 bytes with zeroes
        while data.len() % 4 != 0 {
            data.push(0);
        }
        buffers.push(data);
    }
    Ok(GltfData { buffers })
}

fn load_gltf(
    bytes: &[u8],
    source: &dyn AssetSource,
    base: &Path,
    params: &ImportParams,
    handles: &mut HandleSource,
) -> Result<Model, ImportError> {
    let gltf = Gltf::from_slice(bytes)?;
    let data = load_buffers(&gltf, source, base)?;
    GltfDocumentLoader::new(&gltf.document, &data, params, source, base, handles).load()
}

/// Import a `.gltf` or `.glb` file of `source`. External buffers and images
/// are resolved relative to the file.
pub fn load_gltf_from_source(
    source: &dyn AssetSource,
    path: &Path,
    params: &ImportParams,
    handles: &mut HandleSource,
) -> Result<Model, ImportError> {
    let bytes = source
        .read(path)
        .map_err(|error| ImportError::Io(path.to_path_buf(), error))?
        .ok_or_else(|| ImportError::ResourceNotFound(path.display().to_string()))?;
    let base = path.parent().unwrap_or(Path::new(""));
    let mut model = load_gltf(&bytes, source, base, params, handles)?;
    if model.name.is_none() {
        model.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }
    Ok(model)
}

/// Import a `.gltf` or `.glb` file from the file system.
pub fn load_gltf_file(
    path: impl AsRef<Path>,
    params: &ImportParams,
    handles: &mut HandleSource,
) -> Result<Model, ImportError> {
    let path = path.as_ref();
    let directory = path.parent().unwrap_or(Path::new(""));
    let file_name = path
        .file_name()
        .ok_or_else(|| ImportError::ResourceNotFound(path.display().to_string()))?;
    let source = DirectorySource::new(directory);
    load_gltf_from_source(&source, Path::new(file_name), params, handles)
}

/// Import a self-contained document: a GLB, or glTF JSON whose buffers and
/// images are all data URIs.
pub fn load_gltf_from_slice(
    bytes: &[u8],
    params: &ImportParams,
    handles: &mut HandleSource,
) -> Result<Model, ImportError> {
    load_gltf(bytes, &MemorySource::new(), Path::new(""), params, handles)
}
