//! Import glTF scenes into a renderer-ready scene graph, and keep track of
//! the resulting assets.
//!
//! A glTF or GLB file is decoded into a [`model::Model`]: an arena of nodes
//! with packed vertex and index buffers, skins and animations. Wrapped as a
//! [`prefab::Prefab`], its textures and materials become assets of their own.
//! Every asset is identified by a [`handle::Handle`]; the
//! [`manager::AssetManager`] keeps the registry of known handles and the
//! cache of resident assets, and imports each asset at most once.
//!
pub mod animation;
pub mod asset;
pub mod bounds;
pub mod cache;
pub mod dispatch;
pub mod error;
pub mod handle;
/// Format decoders
pub mod loader;
pub mod manager;
pub mod material;
pub mod mesh;
pub mod metadata;
pub mod model;
pub mod node;
pub mod prefab;
pub mod primitive;
pub mod registry;
pub mod scene;
pub mod skin;
pub mod source;
pub mod texture;

#[cfg(test)]
mod test_util;
