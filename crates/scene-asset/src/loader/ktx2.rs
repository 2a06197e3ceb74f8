use std::io::Cursor;

use binrw::prelude::*;
use log::debug;

pub const KTX2_MAGIC: [u8; 12] = *b"\xABKTX 20\xBB\r\n\x1A\n";

/// Fixed part of a KTX2 header. The level index and data format descriptor
/// that follow are left to the GPU side texture constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(little, magic = b"\xABKTX 20\xBB\r\n\x1A\n")]
pub struct Ktx2Header {
    pub vk_format: u32,
    pub type_size: u32,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixel_depth: u32,
    pub layer_count: u32,
    #[br(assert(face_count == 1 || face_count == 6))]
    pub face_count: u32,
    pub level_count: u32,
    pub supercompression_scheme: u32,
}

impl Ktx2Header {
    pub fn parse(data: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(data))
    }

    pub fn is_cube_map(&self) -> bool {
        self.face_count == 6
    }

    /// Zero in the header means the full mip chain is to be generated.
    pub fn mip_levels(&self) -> u32 {
        self.level_count.max(1)
    }

    /// `VK_FORMAT_UNDEFINED` together with a Basis Universal payload.
    pub fn is_basis(&self) -> bool {
        self.vk_format == 0
    }
}

pub fn is_ktx2(data: &[u8]) -> bool {
    data.starts_with(&KTX2_MAGIC)
}

/// Basis Universal transcoder state, shared by every texture of one import.
///
/// This is only the once-per-import initialization point. KTX2 payloads are
/// kept as raw bytes and nothing is transcoded here.
#[derive(Debug)]
pub struct BasisTranscoder {
    _private: (),
}

impl BasisTranscoder {
    /// Called at most once per import, when the document declares
    /// `KHR_texture_basisu`.
    pub fn initialize() -> Self {
        debug!("Basis Universal transcoder initialized");
        Self { _private: () }
    }
}

#[cfg(test)]
pub(crate) fn header_bytes(width: u32, height: u32, face_count: u32) -> Vec<u8> {
    let mut data = KTX2_MAGIC.to_vec();
    for value in [0, 1, width, height, 0, 0, face_count, 1, 1] {
        data.extend_from_slice(&u32::to_le_bytes(value));
    }
    // level index, enough for one level
    data.extend_from_slice(&[0u8; 24]);
    data
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_header() {
        let data = header_bytes(64, 32, 1);
        assert!(is_ktx2(&data));
        let header = Ktx2Header::parse(&data).unwrap();
        assert_eq!(header.pixel_width, 64);
        assert_eq!(header.pixel_height, 32);
        assert!(!header.is_cube_map());
        assert!(header.is_basis());
        assert_eq!(header.supercompression_scheme, 1);
    }

    #[test]
    fn test_cube_map_header() {
        let header = Ktx2Header::parse(&header_bytes(16, 16, 6)).unwrap();
        assert!(header.is_cube_map());
        assert_eq!(header.mip_levels(), 1);
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut data = header_bytes(16, 16, 1);
        data[1] = b'X';
        assert!(!is_ktx2(&data));
        assert!(Ktx2Header::parse(&data).is_err());
    }

    #[test]
    fn test_bad_face_count_is_rejected() {
        assert!(Ktx2Header::parse(&header_bytes(16, 16, 3)).is_err());
    }
}
