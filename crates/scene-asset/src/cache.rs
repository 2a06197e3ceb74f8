use std::collections::HashMap;

use log::{debug, warn};

use crate::{asset::Asset, handle::Handle};

/// Resident assets by handle. At most one instance per handle; entries only
/// leave through [`AssetCache::evict`] or [`AssetCache::clear`].
#[derive(Debug, Default)]
pub struct AssetCache {
    assets: HashMap<Handle, Asset>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: Handle) -> Option<&Asset> {
        self.assets.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.assets.contains_key(&handle)
    }

    /// Make `asset` resident under `handle`, replacing any previous instance.
    pub fn insert(&mut self, handle: Handle, asset: Asset) {
        if let Some(previous) = self.assets.insert(handle, asset) {
            debug!("Replace resident {} {}", previous.asset_type(), handle);
        }
    }

    pub fn evict(&mut self, handle: Handle) -> Option<Asset> {
        let asset = self.assets.remove(&handle);
        if asset.is_none() {
            warn!("Evict non-resident asset {}", handle);
        }
        asset
    }

    pub fn clear(&mut self) {
        self.assets.clear();
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scene::SceneAsset;

    #[test]
    fn test_insert_get_evict() {
        let mut cache = AssetCache::new();
        let handle = Handle::from_raw(9);
        let asset = Asset::from(SceneAsset {
            handle,
            ..Default::default()
        });
        cache.insert(handle, asset.clone());
        assert!(cache.contains(handle));
        assert!(cache.get(handle).unwrap().ptr_eq(&asset));
        assert!(cache.evict(handle).is_some());
        assert!(cache.evict(handle).is_none());
        assert!(cache.is_empty());

        cache.insert(handle, asset);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
