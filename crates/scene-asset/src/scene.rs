use crate::handle::Handle;

/// A scene as described by a project scene file: a named set of placed
/// prefabs. Scene files are read by the project layer, which inserts the
/// result into the cache itself.
#[derive(Debug, Clone, Default)]
pub struct SceneAsset {
    pub handle: Handle,
    pub name: Option<String>,
    pub prefabs: Vec<Handle>,
}
