use crate::data_type::DataType;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::AttributeValueIndex;
use crate::normal_compression_utils::OctahedronToolBox;
use crate::status::{corrupt, CodecError, CodecResult, Status};

/// Converts unit normals into quantized octahedral `(s, t)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeOctahedronTransform {
    quantization_bits: i32,
}

impl Default for AttributeOctahedronTransform {
    fn default() -> Self {
        Self { quantization_bits: -1 }
    }
}

impl AttributeOctahedronTransform {
    pub fn new(quantization_bits: i32) -> Self {
        Self { quantization_bits }
    }

    pub fn is_initialized(&self) -> bool {
        self.quantization_bits != -1
    }

    pub fn quantization_bits(&self) -> i32 {
        self.quantization_bits
    }

    /// Largest octahedral coordinate, the bound the prediction transforms use.
    pub fn max_quantized_value(&self) -> i32 {
        if !(2..=30).contains(&self.quantization_bits) {
            return -1;
        }
        (1 << self.quantization_bits) - 1
    }

    fn tool_box(&self) -> CodecResult<OctahedronToolBox> {
        OctahedronToolBox::with_quantization_bits(self.quantization_bits)
    }

    /// Two component portable attribute with the mapping of `attribute`.
    pub fn generate_portable_attribute(&self, attribute: &PointAttribute) -> CodecResult<PointAttribute> {
        if attribute.num_components() != 3 {
            return Err(CodecError::InvalidParameter(format!(
                "octahedral coordinates need 3D normals, got {} components",
                attribute.num_components()
            )));
        }
        let converter = self.tool_box()?;
        let mut portable =
            PointAttribute::new(attribute.attribute_type(), 2, DataType::Int32, false, attribute.size());
        portable.copy_mapping_from(attribute);

        let mut att_val = [0f32; 3];
        for i in 0..attribute.size() {
            let index = AttributeValueIndex(i as u32);
            attribute.get_value(index, &mut att_val)?;
            let (s, t) = converter.float_vector_to_quantized_octahedral_coords(&att_val);
            portable.set_value(index, &[s, t])?;
        }
        Ok(portable)
    }

    pub fn inverse_transform_attribute(&self, portable: &PointAttribute, target: &mut PointAttribute) -> Status {
        if target.data_type() != DataType::Float32 || target.num_components() != 3 {
            return Err(CodecError::InvalidParameter(format!(
                "normals decode into 3 float32 components, target has {} {:?}",
                target.num_components(),
                target.data_type()
            )));
        }
        let converter = self.tool_box()?;
        let mut coords = [0i32; 2];
        for i in 0..portable.size() {
            let index = AttributeValueIndex(i as u32);
            portable.get_value(index, &mut coords)?;
            let att_val = converter.quantized_octahedral_coords_to_unit_vector(coords[0], coords[1]);
            target.set_value(index, &att_val)?;
        }
        Ok(())
    }

    pub fn encode_parameters(&self, buffer: &mut EncoderBuffer) -> Status {
        if !self.is_initialized() {
            return Err(CodecError::InvalidParameter(
                "octahedron transform has no quantization bits".to_string(),
            ));
        }
        buffer.encode_u8(self.quantization_bits as u8);
        Ok(())
    }

    pub fn decode_parameters(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        let bits = buffer.decode_u8()? as i32;
        if !(2..=30).contains(&bits) {
            return Err(corrupt(format!("invalid octahedral quantization bits {bits}")));
        }
        self.quantization_bits = bits;
        Ok(())
    }
}
