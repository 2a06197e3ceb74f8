use glam::Vec3;
use gltf::{
    accessor::{DataType, Dimensions},
    json::Value,
    Accessor,
};

use super::GltfData;
use crate::{bounds::BoundingBox, error::ImportError};

pub(crate) fn component_size(data_type: DataType) -> usize {
    match data_type {
        DataType::I8 | DataType::U8 => 1,
        DataType::I16 | DataType::U16 => 2,
        DataType::U32 | DataType::F32 => 4,
    }
}

pub(crate) fn component_count(dimensions: Dimensions) -> usize {
    match dimensions {
        Dimensions::Scalar => 1,
        Dimensions::Vec2 => 2,
        Dimensions::Vec3 => 3,
        Dimensions::Vec4 => 4,
        Dimensions::Mat2 => 4,
        Dimensions::Mat3 => 9,
        Dimensions::Mat4 => 16,
    }
}

/// Raw element bytes of an accessor, tightly packed.
pub(crate) fn read_bytes(data: &GltfData, accessor: &Accessor) -> Result<Vec<u8>, ImportError> {
    if accessor.sparse().is_some() {
        return Err(ImportError::Unsupported(format!(
            "sparse accessor #{}",
            accessor.index()
        )));
    }

    let item_length = component_size(accessor.data_type()) * component_count(accessor.dimensions());
    let count = accessor.count();
    let Some(view) = accessor.view() else {
        // No buffer view means all zeroes
        return Ok(vec![0; count * item_length]);
    };

    let buffer_index = view.buffer().index();
    let buffer = data
        .buffers
        .get(buffer_index)
        .ok_or_else(|| ImportError::ResourceNotFound(format!("buffer #{}", buffer_index)))?;
    let offset = view.offset() + accessor.offset();
    let stride = view.stride().unwrap_or(item_length).max(item_length);
    let end = match count {
        0 => offset,
        count => offset + stride * (count - 1) + item_length,
    };
    let limit = (view.offset() + view.length()).min(buffer.len());
    if end > limit {
        return Err(ImportError::BufferOutOfBounds {
            accessor: accessor.index(),
            end,
            length: limit,
        });
    }

    let mut result = Vec::with_capacity(count * item_length);
    for index in 0..count {
        let start = offset + index * stride;
        result.extend_from_slice(&buffer[start..start + item_length]);
    }
    Ok(result)
}

/// Accessor components as floats. Integer components are normalized when
/// the accessor says so and converted as-is otherwise.
pub(crate) fn read_f32(data: &GltfData, accessor: &Accessor) -> Result<Vec<f32>, ImportError> {
    let bytes = read_bytes(data, accessor)?;
    let normalized = accessor.normalized();
    let values = match accessor.data_type() {
        DataType::F32 => bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
        DataType::U8 => bytes
            .iter()
            .map(|item| match normalized {
                true => *item as f32 / u8::MAX as f32,
                false => *item as f32,
            })
            .collect(),
        DataType::I8 => bytes
            .iter()
            .map(|item| match normalized {
                true => (*item as i8 as f32 / i8::MAX as f32).max(-1.0),
                false => *item as i8 as f32,
            })
            .collect(),
        DataType::U16 => bytes
            .chunks_exact(2)
            .map(|chunk| {
                let item = u16::from_le_bytes([chunk[0], chunk[1]]);
                match normalized {
                    true => item as f32 / u16::MAX as f32,
                    false => item as f32,
                }
            })
            .collect(),
        DataType::I16 => bytes
            .chunks_exact(2)
            .map(|chunk| {
                let item = i16::from_le_bytes([chunk[0], chunk[1]]);
                match normalized {
                    true => (item as f32 / i16::MAX as f32).max(-1.0),
                    false => item as f32,
                }
            })
            .collect(),
        DataType::U32 => bytes
            .chunks_exact(4)
            .map(|chunk| {
                let item = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                match normalized {
                    true => item as f32 / u32::MAX as f32,
                    false => item as f32,
                }
            })
            .collect(),
    };
    Ok(values)
}

/// Unsigned integer components widened to `u32`.
pub(crate) fn read_u32(data: &GltfData, accessor: &Accessor) -> Result<Vec<u32>, ImportError> {
    let bytes = read_bytes(data, accessor)?;
    match accessor.data_type() {
        DataType::U8 => Ok(bytes.into_iter().map(u32::from).collect()),
        DataType::U16 => Ok(bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]) as u32)
            .collect()),
        DataType::U32 => Ok(bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()),
        data_type => Err(ImportError::Unsupported(format!(
            "{:?} components in accessor #{}",
            data_type,
            accessor.index()
        ))),
    }
}

fn vec3_value(value: &Value) -> Option<Vec3> {
    let array = value.as_array()?;
    if array.len() != 3 {
        return None;
    }
    Some(Vec3::new(
        array[0].as_f64()? as f32,
        array[1].as_f64()? as f32,
        array[2].as_f64()? as f32,
    ))
}

/// Box from the declared `min` and `max` of a POSITION accessor.
pub(crate) fn declared_bounds(accessor: &Accessor) -> Option<BoundingBox> {
    let min = vec3_value(&accessor.min()?)?;
    let max = vec3_value(&accessor.max()?)?;
    Some(BoundingBox::new(min, max))
}
