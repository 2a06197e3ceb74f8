use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
};

use image::ImageError;

use crate::{handle::Handle, loader::gltf::scheme::SchemeError, metadata::AssetType};

/// Where an image payload came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Buffer(usize),
    Uri(String),
    File(PathBuf),
}

impl Display for ImageSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Buffer(index) => write!(f, "buffer view #{}", index),
            ImageSource::Uri(uri) => Display::fmt(uri, f),
            ImageSource::File(path) => Display::fmt(&path.display(), f),
        }
    }
}

/// Coarse classification of import failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is malformed, the whole import is aborted.
    MalformedInput,
    /// The input uses something this importer cannot handle.
    UnsupportedFeature,
    NoImporterForType,
    /// The handle is not in the registry.
    RegistryMiss,
    /// The handle is registered but could not be made resident.
    CacheMiss,
    Io,
}

#[derive(Debug)]
pub enum ImportError {
    Io(PathBuf, io::Error),
    Gltf(gltf::Error),
    InvalidScheme(SchemeError),
    ResourceNotFound(String),
    BadBufferMime(String, Option<String>),
    BufferOutOfBounds {
        accessor: usize,
        end: usize,
        length: usize,
    },
    IndexOutOfRange {
        accessor: usize,
        index: u32,
        vertex_count: usize,
    },
    BadImage(ImageSource, ImageError),
    BadImageMime(ImageSource, String),
    BadKtx2(ImageSource, binrw::Error),
    MissingAttribute {
        node: usize,
        mesh: usize,
        primitive: usize,
        semantic: &'static str,
    },
    NoScene,
    NoImporterForType(AssetType),
    RegistryMiss(Handle),
    InvalidHandle,
    SubAssetUnavailable {
        handle: Handle,
        parent: Handle,
    },
    Unsupported(String),
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::Io(_, _) | ImportError::ResourceNotFound(_) => ErrorKind::Io,
            ImportError::Gltf(_)
            | ImportError::InvalidScheme(_)
            | ImportError::BadBufferMime(_, _)
            | ImportError::BufferOutOfBounds { .. }
            | ImportError::IndexOutOfRange { .. }
            | ImportError::BadImage(_, _)
            | ImportError::BadImageMime(_, _)
            | ImportError::BadKtx2(_, _)
            | ImportError::MissingAttribute { .. }
            | ImportError::NoScene => ErrorKind::MalformedInput,
            ImportError::Unsupported(_) => ErrorKind::UnsupportedFeature,
            ImportError::NoImporterForType(_) => ErrorKind::NoImporterForType,
            ImportError::RegistryMiss(_) | ImportError::InvalidHandle => ErrorKind::RegistryMiss,
            ImportError::SubAssetUnavailable { .. } => ErrorKind::CacheMiss,
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(path, error) => write!(f, "{}: {}", path.display(), error),
            ImportError::Gltf(error) => Display::fmt(error, f),
            ImportError::InvalidScheme(error) => Display::fmt(error, f),
            ImportError::ResourceNotFound(name) => write!(f, "Resource {} not found", name),
            ImportError::BadBufferMime(name, mime) => {
                if let Some(mime) = mime {
                    write!(f, "Bad MIME {} for buffer {}", mime, name)
                } else {
                    write!(f, "No MIME for buffer {}", name)
                }
            }
            ImportError::BufferOutOfBounds {
                accessor,
                end,
                length,
            } => write!(
                f,
                "Accessor #{} reads up to byte {} of a {} byte buffer",
                accessor, end, length
            ),
            ImportError::IndexOutOfRange {
                accessor,
                index,
                vertex_count,
            } => write!(
                f,
                "Accessor #{} refers to vertex {} of a {} vertex primitive",
                accessor, index, vertex_count
            ),
            ImportError::BadImage(source, error) => write!(f, "Bad image {}: {}", source, error),
            ImportError::BadImageMime(source, mime) => {
                write!(f, "Bad MIME {} for image {}", mime, source)
            }
            ImportError::BadKtx2(source, error) => {
                write!(f, "Bad KTX2 texture {}: {}", source, error)
            }
            ImportError::MissingAttribute {
                node,
                mesh,
                primitive,
                semantic,
            } => write!(
                f,
                "Primitive #{} of mesh #{} (node #{}) has no {} attribute",
                primitive, mesh, node, semantic
            ),
            ImportError::NoScene => write!(f, "File contains no scene"),
            ImportError::NoImporterForType(asset_type) => {
                write!(f, "No importer for asset type {}", asset_type)
            }
            ImportError::RegistryMiss(handle) => write!(f, "Handle {} is not registered", handle),
            ImportError::InvalidHandle => write!(f, "Invalid handle"),
            ImportError::SubAssetUnavailable { handle, parent } => write!(
                f,
                "Sub-asset {} did not become resident after importing parent {}",
                handle, parent
            ),
            ImportError::Unsupported(what) => write!(f, "Unsupported: {}", what),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Io(_, error) => Some(error),
            ImportError::Gltf(error) => Some(error),
            ImportError::InvalidScheme(error) => Some(error),
            ImportError::BadImage(_, error) => Some(error),
            ImportError::BadKtx2(_, error) => Some(error),
            _ => None,
        }
    }
}

impl From<gltf::Error> for ImportError {
    fn from(value: gltf::Error) -> Self {
        Self::Gltf(value)
    }
}

impl From<SchemeError> for ImportError {
    fn from(value: SchemeError) -> Self {
        Self::InvalidScheme(value)
    }
}

/// Non-fatal problem found while decoding. The import carries on with a
/// degraded primitive, texture or channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    UnsupportedExtension(String),
    UnsupportedIndexType {
        mesh: usize,
        primitive: usize,
        data_type: String,
    },
    UnsupportedJointType {
        mesh: usize,
        primitive: usize,
        data_type: String,
    },
    UnsupportedPrimitiveMode {
        mesh: usize,
        primitive: usize,
    },
    PrimitiveUnreadable {
        mesh: usize,
        primitive: usize,
        reason: String,
    },
    TextureUnavailable {
        texture: usize,
        reason: String,
    },
    UnsupportedChannelPath {
        animation: usize,
        channel: usize,
    },
    MissingAnimationTarget {
        animation: usize,
        channel: usize,
        node: usize,
    },
    MissingJoint {
        skin: usize,
        node: usize,
    },
}

impl Display for ImportWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::UnsupportedExtension(name) => write!(
                f,
                "Unsupported extension {}, the model may render incorrectly",
                name
            ),
            ImportWarning::UnsupportedIndexType {
                mesh,
                primitive,
                data_type,
            } => write!(
                f,
                "Index component type {} not supported, primitive #{} of mesh #{} skipped",
                data_type, primitive, mesh
            ),
            ImportWarning::UnsupportedJointType {
                mesh,
                primitive,
                data_type,
            } => write!(
                f,
                "Joint component type {} not supported, primitive #{} of mesh #{} skipped",
                data_type, primitive, mesh
            ),
            ImportWarning::UnsupportedPrimitiveMode { mesh, primitive } => write!(
                f,
                "Primitive #{} of mesh #{} is not a triangle list, it may render incorrectly",
                primitive, mesh
            ),
            ImportWarning::PrimitiveUnreadable {
                mesh,
                primitive,
                reason,
            } => write!(
                f,
                "Primitive #{} of mesh #{} could not be decoded, skipped: {}",
                primitive, mesh, reason
            ),
            ImportWarning::TextureUnavailable { texture, reason } => {
                write!(f, "Texture #{} could not be loaded: {}", texture, reason)
            }
            ImportWarning::UnsupportedChannelPath { animation, channel } => write!(
                f,
                "Channel #{} of animation #{} animates morph weights, skipped",
                channel, animation
            ),
            ImportWarning::MissingAnimationTarget {
                animation,
                channel,
                node,
            } => write!(
                f,
                "Channel #{} of animation #{} targets node #{} outside of the scene, skipped",
                channel, animation, node
            ),
            ImportWarning::MissingJoint { skin, node } => {
                write!(f, "Joint node #{} of skin #{} is outside of the scene", node, skin)
            }
        }
    }
}

#[derive(Debug)]
pub enum PersistError {
    Io(io::Error),
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(error) => Display::fmt(error, f),
            #[cfg(feature = "serde")]
            PersistError::Json(error) => Display::fmt(error, f),
        }
    }
}

impl Error for PersistError {}

impl From<io::Error> for PersistError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for PersistError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
