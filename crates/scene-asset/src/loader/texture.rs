use std::{io::Cursor, path::Path};

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::{
    error::{ImageSource, ImportError},
    handle::Handle,
    loader::ktx2::{is_ktx2, Ktx2Header},
    texture::{SamplerAsset, Texture2D, TextureCubeMap, TextureData, TextureFormat},
};

pub(crate) const KTX2_MIME: &str = "image/ktx2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ImageKind {
    /// Handed on untouched to a KTX2 aware texture constructor.
    Ktx2,
    /// Decoded with the `image` crate.
    Conventional,
}

impl ImageKind {
    /// Classify by file extension or MIME type, falling back to the magic
    /// bytes of the payload.
    pub(crate) fn classify(path: Option<&Path>, mime: Option<&str>, data: &[u8]) -> Self {
        let ktx2_extension = path
            .and_then(Path::extension)
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("ktx2"));
        let ktx2_mime = mime.is_some_and(|mime| mime.eq_ignore_ascii_case(KTX2_MIME));
        if ktx2_extension || ktx2_mime || is_ktx2(data) {
            ImageKind::Ktx2
        } else {
            ImageKind::Conventional
        }
    }
}

fn pixels_from_image(image: DynamicImage) -> ((u32, u32), Vec<u8>, TextureFormat) {
    fn le_bytes(data: Vec<u16>) -> Vec<u8> {
        data.into_iter().flat_map(u16::to_le_bytes).collect()
    }

    match image {
        DynamicImage::ImageLuma8(image) => {
            (image.dimensions(), image.into_vec(), TextureFormat::Ru8)
        }
        DynamicImage::ImageLumaA8(image) => {
            (image.dimensions(), image.into_vec(), TextureFormat::Rgu8)
        }
        DynamicImage::ImageRgb8(image) => {
            (image.dimensions(), image.into_vec(), TextureFormat::Rgbu8)
        }
        DynamicImage::ImageRgba8(image) => {
            (image.dimensions(), image.into_vec(), TextureFormat::Rgbau8)
        }
        DynamicImage::ImageLuma16(image) => (
            image.dimensions(),
            le_bytes(image.into_vec()),
            TextureFormat::Ru16,
        ),
        DynamicImage::ImageLumaA16(image) => (
            image.dimensions(),
            le_bytes(image.into_vec()),
            TextureFormat::Rgu16,
        ),
        DynamicImage::ImageRgb16(image) => (
            image.dimensions(),
            le_bytes(image.into_vec()),
            TextureFormat::Rgbu16,
        ),
        DynamicImage::ImageRgba16(image) => (
            image.dimensions(),
            le_bytes(image.into_vec()),
            TextureFormat::Rgbau16,
        ),
        DynamicImage::ImageRgb32F(image) => {
            let converted: DynamicImage = image.into();
            (
                converted.dimensions(),
                le_bytes(converted.into_rgb16().into_vec()),
                TextureFormat::Rgbu16,
            )
        }
        DynamicImage::ImageRgba32F(image) => {
            let converted: DynamicImage = image.into();
            (
                converted.dimensions(),
                le_bytes(converted.into_rgba16().into_vec()),
                TextureFormat::Rgbau16,
            )
        }
        image => (
            image.dimensions(),
            image.into_rgba8().into_vec(),
            TextureFormat::Rgbau8,
        ),
    }
}

/// Decode a conventional image. The format comes from `mime` when given,
/// otherwise it is guessed from the content.
pub(crate) fn decode_image(
    source: &ImageSource,
    data: &[u8],
    mime: Option<&str>,
) -> Result<((u32, u32), TextureData), ImportError> {
    let mut reader = ImageReader::new(Cursor::new(data));
    match mime {
        Some(mime) => {
            let format = ImageFormat::from_mime_type(mime)
                .ok_or_else(|| ImportError::BadImageMime(source.clone(), mime.to_string()))?;
            reader.set_format(format);
        }
        None => {
            reader = reader
                .with_guessed_format()
                .map_err(|error| ImportError::Io(source.to_string().into(), error))?;
        }
    }
    let image = reader
        .decode()
        .map_err(|error| ImportError::BadImage(source.clone(), error))?;
    let (size, bytes, format) = pixels_from_image(image);
    Ok((size, TextureData::Pixels { format, bytes }))
}

pub(crate) fn load_ktx2(
    source: &ImageSource,
    data: Vec<u8>,
) -> Result<((u32, u32), TextureData), ImportError> {
    let header =
        Ktx2Header::parse(&data).map_err(|error| ImportError::BadKtx2(source.clone(), error))?;
    if header.is_cube_map() {
        return Err(ImportError::Unsupported(format!(
            "cube map {} used as a 2D texture",
            source
        )));
    }
    Ok((
        (header.pixel_width, header.pixel_height),
        TextureData::Ktx2 {
            header,
            bytes: data,
        },
    ))
}

/// Build a 2D texture from an encoded payload of either kind.
pub(crate) fn load_texture(
    handle: Handle,
    name: String,
    source: &ImageSource,
    data: Vec<u8>,
    kind: ImageKind,
    mime: Option<&str>,
    sampler: SamplerAsset,
) -> Result<Texture2D, ImportError> {
    let (size, data) = match kind {
        ImageKind::Ktx2 => load_ktx2(source, data)?,
        // The MIME of a KTX2 image never reaches the decoder
        ImageKind::Conventional => decode_image(source, &data, mime)?,
    };
    Ok(Texture2D {
        handle,
        name,
        size,
        data,
        sampler,
    })
}

pub(crate) fn load_cube_map(
    handle: Handle,
    name: String,
    source: &ImageSource,
    data: Vec<u8>,
) -> Result<TextureCubeMap, ImportError> {
    let header =
        Ktx2Header::parse(&data).map_err(|error| ImportError::BadKtx2(source.clone(), error))?;
    if !header.is_cube_map() {
        return Err(ImportError::Unsupported(format!(
            "{} has {} faces, a cube map needs 6",
            source, header.face_count
        )));
    }
    Ok(TextureCubeMap {
        handle,
        name,
        size: header.pixel_width,
        mip_levels: header.mip_levels(),
        header,
        bytes: data,
    })
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut data = Cursor::new(Vec::new());
    image
        .write_to(&mut data, ImageFormat::Png)
        .expect("encode png");
    data.into_inner()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::loader::ktx2::header_bytes;

    #[test]
    fn test_classify() {
        assert_eq!(
            ImageKind::classify(Some(Path::new("a/b.KTX2")), None, &[]),
            ImageKind::Ktx2
        );
        assert_eq!(
            ImageKind::classify(None, Some("image/ktx2"), &[]),
            ImageKind::Ktx2
        );
        assert_eq!(
            ImageKind::classify(None, None, &header_bytes(4, 4, 1)),
            ImageKind::Ktx2
        );
        assert_eq!(
            ImageKind::classify(Some(Path::new("b.png")), Some("image/png"), &[0x89]),
            ImageKind::Conventional
        );
    }

    #[test]
    fn test_decode_png() {
        let source = ImageSource::Uri("a.png".into());
        let (size, data) = decode_image(&source, &png_bytes(3, 2, [10, 20, 30, 40]), None).unwrap();
        assert_eq!(size, (3, 2));
        let TextureData::Pixels { format, bytes } = data else {
            panic!("expected pixels");
        };
        assert_eq!(format, TextureFormat::Rgbau8);
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert_eq!(&bytes[..4], &[10, 20, 30, 40]);
    }

    #[test]
    fn test_ktx2_is_kept_raw() {
        let source = ImageSource::Uri("a.ktx2".into());
        let payload = header_bytes(8, 4, 1);
        let texture = load_texture(
            Handle::from_raw(1),
            "a".into(),
            &source,
            payload.clone(),
            ImageKind::Ktx2,
            Some(KTX2_MIME),
            SamplerAsset::default(),
        )
        .unwrap();
        assert!(texture.data.is_ktx2());
        assert_eq!(texture.size, (8, 4));
        assert_eq!(texture.data.bytes(), payload.as_slice());
    }

    #[test]
    fn test_cube_map_requires_six_faces() {
        let source = ImageSource::Uri("sky.ktx2".into());
        let cube = load_cube_map(
            Handle::from_raw(1),
            "sky".into(),
            &source,
            header_bytes(32, 32, 6),
        )
        .unwrap();
        assert_eq!(cube.size, 32);
        assert!(load_cube_map(
            Handle::from_raw(1),
            "sky".into(),
            &source,
            header_bytes(32, 32, 1)
        )
        .is_err());
    }
}
