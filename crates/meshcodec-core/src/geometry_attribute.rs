use byteorder::{ByteOrder, LittleEndian};
use num_traits::{NumCast, ToPrimitive};

use crate::data_buffer::DataBuffer;
use crate::data_type::DataType;
use crate::geometry_indices::{AttributeValueIndex, PointIndex, INVALID_ATTRIBUTE_VALUE_INDEX};
use crate::status::{corrupt, CodecError, CodecResult, Status};

/// Semantic of an attribute. Drives prediction scheme selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryAttributeType {
    Invalid = -1,
    Position = 0,
    Normal,
    Color,
    TexCoord,
    Generic,
}

impl GeometryAttributeType {
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        Ok(match value {
            0 => GeometryAttributeType::Position,
            1 => GeometryAttributeType::Normal,
            2 => GeometryAttributeType::Color,
            3 => GeometryAttributeType::TexCoord,
            4 => GeometryAttributeType::Generic,
            _ => return Err(corrupt(format!("unknown attribute type {value}"))),
        })
    }
}

/// Attribute values plus the mapping from points to those values.
///
/// With identity mapping point `i` reads value `i`. An explicit mapping lets
/// many points share one value, which is how seams and shared vertices are
/// expressed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointAttribute {
    attribute_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    unique_id: u32,
    buffer: DataBuffer,
    indices_map: Vec<AttributeValueIndex>,
    identity_mapping: bool,
    num_unique_entries: usize,
}

impl PointAttribute {
    pub fn new(
        attribute_type: GeometryAttributeType,
        num_components: u8,
        data_type: DataType,
        normalized: bool,
        num_attribute_values: usize,
    ) -> Self {
        let mut buffer = DataBuffer::new();
        buffer.resize(num_attribute_values * num_components as usize * data_type.byte_length());
        Self {
            attribute_type,
            data_type,
            num_components,
            normalized,
            unique_id: 0,
            buffer,
            indices_map: Vec::new(),
            identity_mapping: true,
            num_unique_entries: num_attribute_values,
        }
    }

    pub fn attribute_type(&self) -> GeometryAttributeType {
        self.attribute_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn num_components(&self) -> u8 {
        self.num_components
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn unique_id(&self) -> u32 {
        self.unique_id
    }

    pub fn set_unique_id(&mut self, id: u32) {
        self.unique_id = id;
    }

    /// Number of stored values.
    pub fn size(&self) -> usize {
        self.num_unique_entries
    }

    pub fn byte_stride(&self) -> usize {
        self.num_components as usize * self.data_type.byte_length()
    }

    pub fn buffer(&self) -> &DataBuffer {
        &self.buffer
    }

    /// Grows or shrinks the value storage.
    pub fn resize(&mut self, num_attribute_values: usize) {
        self.num_unique_entries = num_attribute_values;
        self.buffer.resize(num_attribute_values * self.byte_stride());
    }

    pub fn is_mapping_identity(&self) -> bool {
        self.identity_mapping
    }

    pub fn mapped_index(&self, point_index: PointIndex) -> AttributeValueIndex {
        if self.identity_mapping {
            return AttributeValueIndex(point_index.0);
        }
        self.indices_map
            .get(point_index.as_usize())
            .copied()
            .unwrap_or(INVALID_ATTRIBUTE_VALUE_INDEX)
    }

    pub fn set_identity_mapping(&mut self) {
        self.identity_mapping = true;
        self.indices_map.clear();
    }

    pub fn set_explicit_mapping(&mut self, num_points: usize) {
        self.identity_mapping = false;
        self.indices_map.clear();
        self.indices_map.resize(num_points, INVALID_ATTRIBUTE_VALUE_INDEX);
    }

    /// Shares the point to value mapping of `other`.
    pub fn copy_mapping_from(&mut self, other: &PointAttribute) {
        self.identity_mapping = other.identity_mapping;
        self.indices_map.clone_from(&other.indices_map);
    }

    /// Requires a prior call to [`set_explicit_mapping`](Self::set_explicit_mapping).
    pub fn set_point_map_entry(&mut self, point_index: PointIndex, entry_index: AttributeValueIndex) {
        debug_assert!(!self.identity_mapping);
        if let Some(slot) = self.indices_map.get_mut(point_index.as_usize()) {
            *slot = entry_index;
        }
    }

    /// Reads the components of one value converted to `T`. Reads at most
    /// `out.len()` components.
    pub fn get_value<T: NumCast>(&self, index: AttributeValueIndex, out: &mut [T]) -> Status {
        if index.as_usize() >= self.num_unique_entries {
            return Err(CodecError::InvalidParameter(format!(
                "attribute value {} out of range ({} values)",
                index.0, self.num_unique_entries
            )));
        }
        let component_size = self.data_type.byte_length();
        let base = index.as_usize() * self.byte_stride();
        let n = out.len().min(self.num_components as usize);
        for (i, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.read_component(base + i * component_size)?;
        }
        Ok(())
    }

    /// Writes the components of one value, converting from `T` to the storage type.
    pub fn set_value<T: ToPrimitive + Copy>(&mut self, index: AttributeValueIndex, values: &[T]) -> Status {
        if index.as_usize() >= self.num_unique_entries {
            return Err(CodecError::InvalidParameter(format!(
                "attribute value {} out of range ({} values)",
                index.0, self.num_unique_entries
            )));
        }
        let component_size = self.data_type.byte_length();
        let base = index.as_usize() * self.byte_stride();
        for (i, v) in values.iter().take(self.num_components as usize).enumerate() {
            self.write_component(base + i * component_size, *v)?;
        }
        Ok(())
    }

    fn read_component<T: NumCast>(&self, byte_pos: usize) -> CodecResult<T> {
        let d = &self.buffer.data()[byte_pos..];
        let value = match self.data_type {
            DataType::Int8 => <T as NumCast>::from(d[0] as i8),
            DataType::Uint8 | DataType::Bool => <T as NumCast>::from(d[0]),
            DataType::Int16 => <T as NumCast>::from(LittleEndian::read_i16(d)),
            DataType::Uint16 => <T as NumCast>::from(LittleEndian::read_u16(d)),
            DataType::Int32 => <T as NumCast>::from(LittleEndian::read_i32(d)),
            DataType::Uint32 => <T as NumCast>::from(LittleEndian::read_u32(d)),
            DataType::Int64 => <T as NumCast>::from(LittleEndian::read_i64(d)),
            DataType::Uint64 => <T as NumCast>::from(LittleEndian::read_u64(d)),
            DataType::Float32 => <T as NumCast>::from(LittleEndian::read_f32(d)),
            DataType::Float64 => <T as NumCast>::from(LittleEndian::read_f64(d)),
            DataType::Invalid => None,
        };
        value.ok_or_else(|| {
            CodecError::InvalidParameter(format!("component not representable as target type ({:?})", self.data_type))
        })
    }

    fn write_component<T: ToPrimitive>(&mut self, byte_pos: usize, value: T) -> Status {
        let out_of_range =
            || CodecError::InvalidParameter(format!("value does not fit attribute type {:?}", self.data_type));
        let mut bytes = [0u8; 8];
        match self.data_type {
            DataType::Int8 => bytes[0] = value.to_i8().ok_or_else(out_of_range)? as u8,
            DataType::Uint8 | DataType::Bool => bytes[0] = value.to_u8().ok_or_else(out_of_range)?,
            DataType::Int16 => LittleEndian::write_i16(&mut bytes, value.to_i16().ok_or_else(out_of_range)?),
            DataType::Uint16 => LittleEndian::write_u16(&mut bytes, value.to_u16().ok_or_else(out_of_range)?),
            DataType::Int32 => LittleEndian::write_i32(&mut bytes, value.to_i32().ok_or_else(out_of_range)?),
            DataType::Uint32 => LittleEndian::write_u32(&mut bytes, value.to_u32().ok_or_else(out_of_range)?),
            DataType::Int64 => LittleEndian::write_i64(&mut bytes, value.to_i64().ok_or_else(out_of_range)?),
            DataType::Uint64 => LittleEndian::write_u64(&mut bytes, value.to_u64().ok_or_else(out_of_range)?),
            DataType::Float32 => LittleEndian::write_f32(&mut bytes, value.to_f32().ok_or_else(out_of_range)?),
            DataType::Float64 => LittleEndian::write_f64(&mut bytes, value.to_f64().ok_or_else(out_of_range)?),
            DataType::Invalid => return Err(out_of_range()),
        }
        self.buffer.write(byte_pos, &bytes[..self.data_type.byte_length()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_mapping_shares_values() {
        let mut att = PointAttribute::new(GeometryAttributeType::Generic, 2, DataType::Int16, false, 2);
        att.set_value(AttributeValueIndex(0), &[-5i32, 7]).unwrap();
        att.set_value(AttributeValueIndex(1), &[300i32, -300]).unwrap();
        att.set_explicit_mapping(3);
        att.set_point_map_entry(PointIndex(0), AttributeValueIndex(1));
        att.set_point_map_entry(PointIndex(1), AttributeValueIndex(0));
        att.set_point_map_entry(PointIndex(2), AttributeValueIndex(1));

        let mut v = [0i32; 2];
        att.get_value(att.mapped_index(PointIndex(2)), &mut v).unwrap();
        assert_eq!(v, [300, -300]);
        att.get_value(att.mapped_index(PointIndex(1)), &mut v).unwrap();
        assert_eq!(v, [-5, 7]);
        assert_eq!(att.mapped_index(PointIndex(9)), INVALID_ATTRIBUTE_VALUE_INDEX);

        att.set_identity_mapping();
        assert!(att.is_mapping_identity());
        assert_eq!(att.mapped_index(PointIndex(9)), AttributeValueIndex(9));
    }

    #[test]
    fn out_of_range_write_is_rejected() {
        let mut att = PointAttribute::new(GeometryAttributeType::Color, 1, DataType::Uint8, true, 1);
        assert!(att.set_value(AttributeValueIndex(0), &[256i32]).is_err());
        assert!(att.set_value(AttributeValueIndex(1), &[1i32]).is_err());
    }
}
