use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::source::AssetSource;

#[derive(Debug)]
pub enum SchemeError {
    Unsupported(String),
    BadDataUri,
}

impl Display for SchemeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SchemeError::Unsupported(uri) => write!(f, "Unsupported scheme in {}", uri),
            SchemeError::BadDataUri => write!(f, "Bad data URI"),
        }
    }
}

impl Error for SchemeError {}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Scheme<'a> {
    // Data uri with optional mime type
    Data(Option<&'a str>, Vec<u8>),
    // Path relative to the referencing document
    Relative(PathBuf),
    // Path relative to the root of the source
    Absolute(PathBuf),
}

fn strip_prefix_ignore_case<'a>(uri: &'a str, prefix: &str) -> Option<&'a str> {
    let head = uri.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &uri[prefix.len()..])
}

/// Decode `%XX` escapes of a URI path. Malformed escapes are kept verbatim.
fn percent_decode(path: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(path.as_bytes())).into_owned()
}

impl<'a> TryFrom<&'a str> for Scheme<'a> {
    type Error = SchemeError;

    fn try_from(uri: &'a str) -> Result<Self, Self::Error> {
        if let Some(content) = strip_prefix_ignore_case(uri, "data:") {
            // Data URI: rfc2397
            let Some((param, value)) = content.split_once(',') else {
                return Err(SchemeError::BadDataUri);
            };
            if let Some((mime, encoding)) = param.split_once(';') {
                if encoding.eq_ignore_ascii_case("base64") {
                    let data = STANDARD
                        .decode(value)
                        .map_err(|_| SchemeError::BadDataUri)?;
                    let mime = (!mime.is_empty()).then_some(mime);
                    Ok(Scheme::Data(mime, data))
                } else {
                    Err(SchemeError::BadDataUri)
                }
            } else {
                // In standard the mime should be text/plain;charset=US-ASCII,
                // but in GLTF it doesn't make sense, so pass None here
                // to guess actual content from the data.
                Ok(Scheme::Data(None, Vec::from(value.as_bytes())))
            }
        } else if let Some(path) = strip_prefix_ignore_case(uri, "file://") {
            Ok(Scheme::Absolute(PathBuf::from(percent_decode(path))))
        } else if let Some(path) = strip_prefix_ignore_case(uri, "file:") {
            Ok(Scheme::Absolute(PathBuf::from(percent_decode(path))))
        } else if uri.contains(':') {
            Err(SchemeError::Unsupported(uri.to_string()))
        } else {
            Ok(Scheme::Relative(PathBuf::from(percent_decode(uri))))
        }
    }
}

pub(crate) type SchemeData<'a> = (Option<&'a str>, Vec<u8>);

impl<'a> Scheme<'a> {
    /// Fetch the referenced bytes. `base` is the directory of the document
    /// that holds the URI.
    pub(crate) fn load(
        &self,
        source: &dyn AssetSource,
        base: &Path,
    ) -> io::Result<Option<SchemeData<'a>>> {
        match self {
            Scheme::Data(mime, data) => Ok(Some((*mime, data.clone()))),
            Scheme::Relative(path) => Ok(source.read(&base.join(path))?.map(|data| (None, data))),
            Scheme::Absolute(path) => {
                let path = path.strip_prefix("/").unwrap_or(path);
                Ok(source.read(path)?.map(|data| (None, data)))
            }
        }
    }

    /// Path component of the URI, used to classify images by extension.
    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Scheme::Data(_, _) => None,
            Scheme::Relative(path) | Scheme::Absolute(path) => Some(path),
        }
    }
}
