use std::{
    collections::HashMap,
    fmt::{self, Display, Formatter, LowerHex, UpperHex},
};

use uuid::Uuid;

use crate::metadata::AssetType;

/// Opaque identity of an asset, independent of where the asset is stored.
///
/// Zero is reserved as the "no asset" sentinel, see [`Handle::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Handle(u64);

impl Handle {
    pub const NONE: Handle = Handle(0);

    /// Draw a fresh random handle. Never returns [`Handle::NONE`].
    pub fn new() -> Self {
        loop {
            let (high, low) = Uuid::new_v4().as_u64_pair();
            let value = high ^ low;
            if value != 0 {
                return Self(value);
            }
        }
    }

    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl LowerHex for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl UpperHex for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self)
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Hands out handles for the sub-assets generated by one import.
///
/// When re-importing an already registered compound asset, the handles of its
/// registered children are offered again by `(type, name)` so that references
/// persisted elsewhere keep resolving.
#[derive(Debug, Default)]
pub struct HandleSource {
    reuse: HashMap<(AssetType, String), Handle>,
}

impl HandleSource {
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn reusing(entries: impl IntoIterator<Item = (AssetType, String, Handle)>) -> Self {
        let mut reuse = HashMap::new();
        for (asset_type, name, handle) in entries {
            reuse.entry((asset_type, name)).or_insert(handle);
        }
        Self { reuse }
    }

    pub fn next(&mut self, asset_type: AssetType, name: &str) -> Handle {
        self.reuse
            .remove(&(asset_type, name.to_string()))
            .unwrap_or_else(Handle::new)
    }
}
