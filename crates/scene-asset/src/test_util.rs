//! Builds small glTF documents for tests.

use base64::{engine::general_purpose::STANDARD, Engine};
use glam::Mat4;
use serde_json::{json, Value};

const FLOAT: u32 = 5126;
const UNSIGNED_BYTE: u32 = 5121;
const UNSIGNED_SHORT: u32 = 5123;
const UNSIGNED_INT: u32 = 5125;

#[derive(Debug, Default)]
pub(crate) struct GltfBuilder {
    buffer: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    nodes: Vec<Value>,
    scenes: Vec<Value>,
    images: Vec<Value>,
    textures: Vec<Value>,
    materials: Vec<Value>,
    animations: Vec<Value>,
    skins: Vec<Value>,
    extensions_used: Vec<String>,
}

fn push(list: &mut Vec<Value>, value: Value) -> usize {
    list.push(value);
    list.len() - 1
}

impl GltfBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn view(&mut self, bytes: &[u8]) -> usize {
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        push(
            &mut self.buffer_views,
            json!({ "buffer": 0, "byteOffset": offset, "byteLength": bytes.len() }),
        )
    }

    fn accessor(
        &mut self,
        bytes: &[u8],
        component_type: u32,
        count: usize,
        kind: &str,
        extra: Value,
    ) -> usize {
        let view = self.view(bytes);
        let mut accessor = json!({
            "bufferView": view,
            "componentType": component_type,
            "count": count,
            "type": kind,
        });
        if let (Some(accessor), Value::Object(extra)) = (accessor.as_object_mut(), extra) {
            accessor.extend(extra);
        }
        push(&mut self.accessors, accessor)
    }

    pub(crate) fn scalar_accessor(&mut self, data: &[f32]) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|value| value.to_le_bytes()).collect();
        let min = data.iter().copied().fold(f32::MAX, f32::min);
        let max = data.iter().copied().fold(f32::MIN, f32::max);
        self.accessor(
            &bytes,
            FLOAT,
            data.len(),
            "SCALAR",
            json!({ "min": [min], "max": [max] }),
        )
    }

    pub(crate) fn vec3_accessor(&mut self, data: &[[f32; 3]], with_bounds: bool) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flatten()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        let extra = if with_bounds {
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for item in data {
                for axis in 0..3 {
                    min[axis] = min[axis].min(item[axis]);
                    max[axis] = max[axis].max(item[axis]);
                }
            }
            json!({ "min": min, "max": max })
        } else {
            json!({})
        };
        self.accessor(&bytes, FLOAT, data.len(), "VEC3", extra)
    }

    pub(crate) fn vec4_accessor(&mut self, data: &[[f32; 4]]) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flatten()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        self.accessor(&bytes, FLOAT, data.len(), "VEC4", json!({}))
    }

    /// VEC3 float accessor of `count` zeroes with its first element
    /// replaced through a sparse substitution.
    pub(crate) fn sparse_vec3_accessor(&mut self, count: usize, first: [f32; 3]) -> usize {
        let indices = self.view(&0u16.to_le_bytes());
        let values: Vec<u8> = first.iter().flat_map(|value| value.to_le_bytes()).collect();
        let values = self.view(&values);
        push(
            &mut self.accessors,
            json!({
                "componentType": FLOAT,
                "count": count,
                "type": "VEC3",
                "sparse": {
                    "count": 1,
                    "indices": { "bufferView": indices, "componentType": UNSIGNED_SHORT },
                    "values": { "bufferView": values },
                },
            }),
        )
    }

    pub(crate) fn mat4_accessor(&mut self, data: &[Mat4]) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flat_map(|matrix| matrix.to_cols_array())
            .flat_map(|value| value.to_le_bytes())
            .collect();
        self.accessor(&bytes, FLOAT, data.len(), "MAT4", json!({}))
    }

    pub(crate) fn u8_vec4_accessor(&mut self, data: &[[u8; 4]]) -> usize {
        let bytes: Vec<u8> = data.iter().flatten().copied().collect();
        self.accessor(&bytes, UNSIGNED_BYTE, data.len(), "VEC4", json!({}))
    }

    pub(crate) fn u16_vec4_accessor(&mut self, data: &[[u16; 4]]) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flatten()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        self.accessor(&bytes, UNSIGNED_SHORT, data.len(), "VEC4", json!({}))
    }

    pub(crate) fn u32_vec4_accessor(&mut self, data: &[[u32; 4]]) -> usize {
        let bytes: Vec<u8> = data
            .iter()
            .flatten()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        self.accessor(&bytes, UNSIGNED_INT, data.len(), "VEC4", json!({}))
    }

    pub(crate) fn index_accessor(&mut self, data: &[u16]) -> usize {
        let bytes: Vec<u8> = data.iter().flat_map(|value| value.to_le_bytes()).collect();
        self.accessor(&bytes, UNSIGNED_SHORT, data.len(), "SCALAR", json!({}))
    }

    /// Indexed triangle at `origin`, `origin + x` and `origin + y`.
    pub(crate) fn triangle_primitive(&mut self, origin: [f32; 3]) -> Value {
        let [x, y, z] = origin;
        let positions =
            self.vec3_accessor(&[[x, y, z], [x + 1.0, y, z], [x, y + 1.0, z]], true);
        let indices = self.index_accessor(&[0, 1, 2]);
        json!({ "attributes": { "POSITION": positions }, "indices": indices })
    }

    pub(crate) fn mesh(&mut self, primitives: Vec<Value>) -> usize {
        push(&mut self.meshes, json!({ "primitives": primitives }))
    }

    pub(crate) fn node(&mut self, node: Value) -> usize {
        push(&mut self.nodes, node)
    }

    pub(crate) fn scene(&mut self, nodes: &[usize]) -> usize {
        push(&mut self.scenes, json!({ "nodes": nodes }))
    }

    pub(crate) fn image_data_uri(&mut self, mime: &str, data: &[u8]) -> usize {
        let uri = format!("data:{};base64,{}", mime, STANDARD.encode(data));
        push(&mut self.images, json!({ "uri": uri }))
    }

    pub(crate) fn image_uri(&mut self, uri: &str) -> usize {
        push(&mut self.images, json!({ "uri": uri }))
    }

    pub(crate) fn texture(&mut self, texture: Value) -> usize {
        push(&mut self.textures, texture)
    }

    pub(crate) fn material(&mut self, material: Value) -> usize {
        push(&mut self.materials, material)
    }

    pub(crate) fn animation(&mut self, animation: Value) -> usize {
        push(&mut self.animations, animation)
    }

    pub(crate) fn skin(&mut self, skin: Value) -> usize {
        push(&mut self.skins, skin)
    }

    pub(crate) fn extensions_used(&mut self, extensions: &[&str]) {
        self.extensions_used
            .extend(extensions.iter().map(|name| name.to_string()));
    }

    /// Binary buffer, padded to 4 bytes.
    pub(crate) fn buffer(&self) -> Vec<u8> {
        let mut buffer = self.buffer.clone();
        while buffer.len() % 4 != 0 {
            buffer.push(0);
        }
        buffer
    }

    fn document(&self, buffer_uri: Option<String>) -> Value {
        let mut document = json!({ "asset": { "version": "2.0" } });
        let Some(root) = document.as_object_mut() else {
            unreachable!();
        };
        let lists = [
            ("bufferViews", &self.buffer_views),
            ("accessors", &self.accessors),
            ("meshes", &self.meshes),
            ("nodes", &self.nodes),
            ("scenes", &self.scenes),
            ("images", &self.images),
            ("textures", &self.textures),
            ("materials", &self.materials),
            ("animations", &self.animations),
            ("skins", &self.skins),
        ];
        for (key, list) in lists {
            if !list.is_empty() {
                root.insert(key.to_string(), Value::Array(list.clone()));
            }
        }
        if !self.buffer.is_empty() {
            let mut buffer = json!({ "byteLength": self.buffer().len() });
            if let Some(uri) = buffer_uri {
                buffer["uri"] = Value::String(uri);
            }
            root.insert("buffers".to_string(), json!([buffer]));
        }
        if !self.extensions_used.is_empty() {
            root.insert("extensionsUsed".to_string(), json!(self.extensions_used));
        }
        document
    }

    /// glTF JSON with the buffer embedded as a data URI.
    pub(crate) fn to_json_bytes(&self) -> Vec<u8> {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            STANDARD.encode(self.buffer())
        );
        serde_json::to_vec(&self.document(Some(uri))).expect("serialize document")
    }

    /// glTF JSON referencing the buffer as an external file.
    pub(crate) fn to_json_bytes_with_buffer_uri(&self, uri: &str) -> Vec<u8> {
        serde_json::to_vec(&self.document(Some(uri.to_string()))).expect("serialize document")
    }

    pub(crate) fn to_glb_bytes(&self) -> Vec<u8> {
        let mut json = serde_json::to_vec(&self.document(None)).expect("serialize document");
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let bin = self.buffer();

        let mut length = 12 + 8 + json.len();
        if !bin.is_empty() {
            length += 8 + bin.len();
        }
        let mut glb = Vec::with_capacity(length);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(length as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        if !bin.is_empty() {
            glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            glb.extend_from_slice(b"BIN\0");
            glb.extend_from_slice(&bin);
        }
        glb
    }
}

/// Unit cube around the origin: one node, 24 vertices and 36 indices.
pub(crate) fn cube() -> GltfBuilder {
    let mut builder = GltfBuilder::new();
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();
    for axis in 0..3 {
        for sign in [1.0f32, -1.0] {
            let mut normal = [0.0; 3];
            normal[axis] = sign;
            let u = (axis + 1) % 3;
            let v = (axis + 2) % 3;
            let base = positions.len() as u16;
            for (du, dv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut position = normal;
                position[u] = du;
                position[v] = dv;
                positions.push(position);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
    let positions = builder.vec3_accessor(&positions, true);
    let normals = builder.vec3_accessor(&normals, false);
    let indices = builder.index_accessor(&indices);
    let mesh = builder.mesh(vec![json!({
        "attributes": { "POSITION": positions, "NORMAL": normals },
        "indices": indices,
    })]);
    let node = builder.node(json!({ "name": "cube", "mesh": mesh }));
    builder.scene(&[node]);
    builder
}
