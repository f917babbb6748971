use crate::data_type::DataType;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::AttributeValueIndex;
use crate::quantization_utils::{check_quantization_bits, Dequantizer, Quantizer};
use crate::status::{corrupt, CodecError, CodecResult, Status};

/// Maps float components onto `[0, 2^bits - 1]` using per-component minima
/// and one range shared by all components.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeQuantizationTransform {
    quantization_bits: i32,
    min_values: Vec<f32>,
    range: f32,
}

impl Default for AttributeQuantizationTransform {
    fn default() -> Self {
        Self {
            quantization_bits: -1,
            min_values: Vec::new(),
            range: 0.0,
        }
    }
}

impl AttributeQuantizationTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_parameters(&mut self, quantization_bits: i32, min_values: &[f32], range: f32) -> Status {
        check_quantization_bits(quantization_bits)?;
        self.quantization_bits = quantization_bits;
        self.min_values = min_values.to_vec();
        self.range = range;
        Ok(())
    }

    pub fn quantization_bits(&self) -> i32 {
        self.quantization_bits
    }

    pub fn min_values(&self) -> &[f32] {
        &self.min_values
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    fn max_quantized_value(&self) -> i32 {
        ((1u32 << self.quantization_bits) - 1) as i32
    }

    /// Bounding box of all values of `attribute`. A flat box gets range 1.
    pub fn compute_parameters(&mut self, attribute: &PointAttribute, quantization_bits: i32) -> Status {
        check_quantization_bits(quantization_bits)?;
        if attribute.data_type() != DataType::Float32 {
            return Err(CodecError::InvalidParameter(format!(
                "quantization needs float32 values, got {:?}",
                attribute.data_type()
            )));
        }
        let num_components = attribute.num_components() as usize;
        let mut min_values = vec![f32::MAX; num_components];
        let mut max_values = vec![f32::MIN; num_components];
        let mut value = vec![0f32; num_components];
        for i in 0..attribute.size() {
            attribute.get_value(AttributeValueIndex(i as u32), &mut value)?;
            for c in 0..num_components {
                min_values[c] = min_values[c].min(value[c]);
                max_values[c] = max_values[c].max(value[c]);
            }
        }
        if attribute.size() == 0 {
            min_values.fill(0.0);
            max_values.fill(0.0);
        }

        let mut range = min_values
            .iter()
            .zip(&max_values)
            .map(|(min, max)| max - min)
            .fold(0f32, f32::max);
        if range == 0.0 {
            range = 1.0;
        }
        self.quantization_bits = quantization_bits;
        self.min_values = min_values;
        self.range = range;
        Ok(())
    }

    /// One quantized value per attribute value, same mapping as `attribute`.
    pub fn generate_portable_attribute(&self, attribute: &PointAttribute) -> CodecResult<PointAttribute> {
        check_quantization_bits(self.quantization_bits)?;
        let num_components = attribute.num_components() as usize;
        if self.min_values.len() != num_components {
            return Err(CodecError::InvalidParameter(format!(
                "{} minima for {num_components} components",
                self.min_values.len()
            )));
        }
        let mut portable = PointAttribute::new(
            attribute.attribute_type(),
            attribute.num_components(),
            DataType::Int32,
            false,
            attribute.size(),
        );
        portable.copy_mapping_from(attribute);

        let quantizer = Quantizer::new(self.range, self.max_quantized_value());
        let mut value = vec![0f32; num_components];
        let mut quantized = vec![0i32; num_components];
        for i in 0..attribute.size() {
            let index = AttributeValueIndex(i as u32);
            attribute.get_value(index, &mut value)?;
            for c in 0..num_components {
                quantized[c] = quantizer.quantize_float(value[c] - self.min_values[c]);
            }
            portable.set_value(index, &quantized)?;
        }
        Ok(portable)
    }

    /// Writes dequantized floats into `target`, which must hold as many
    /// values as `portable`.
    pub fn inverse_transform_attribute(&self, portable: &PointAttribute, target: &mut PointAttribute) -> Status {
        if target.data_type() != DataType::Float32 {
            return Err(CodecError::InvalidParameter(format!(
                "dequantization needs a float32 target, got {:?}",
                target.data_type()
            )));
        }
        let dequantizer = Dequantizer::new(self.range, self.max_quantized_value())?;
        let num_components = target.num_components() as usize;
        let mut quantized = vec![0i32; num_components];
        let mut value = vec![0f32; num_components];
        for i in 0..portable.size() {
            let index = AttributeValueIndex(i as u32);
            portable.get_value(index, &mut quantized)?;
            for c in 0..num_components {
                value[c] = dequantizer.dequantize_float(quantized[c]) + self.min_values[c];
            }
            target.set_value(index, &value)?;
        }
        Ok(())
    }

    pub fn encode_parameters(&self, buffer: &mut EncoderBuffer) {
        for &min in &self.min_values {
            buffer.encode_f32(min);
        }
        buffer.encode_f32(self.range);
        buffer.encode_u8(self.quantization_bits as u8);
    }

    pub fn decode_parameters(&mut self, num_components: usize, buffer: &mut DecoderBuffer<'_>) -> Status {
        self.min_values = (0..num_components)
            .map(|_| buffer.decode_f32())
            .collect::<CodecResult<Vec<_>>>()?;
        self.range = buffer.decode_f32()?;
        self.quantization_bits = buffer.decode_u8()? as i32;
        check_quantization_bits(self.quantization_bits)
            .map_err(|_| corrupt(format!("invalid quantization bits {}", self.quantization_bits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_attribute::GeometryAttributeType;

    #[test]
    fn quantizes_into_the_bounding_box() {
        let mut att = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, 3);
        att.set_value(AttributeValueIndex(0), &[0.0f32, 0.5]).unwrap();
        att.set_value(AttributeValueIndex(1), &[1.0f32, 0.5]).unwrap();
        att.set_value(AttributeValueIndex(2), &[0.5f32, 0.75]).unwrap();

        let mut transform = AttributeQuantizationTransform::new();
        transform.compute_parameters(&att, 8).unwrap();
        assert_eq!(transform.min_values(), &[0.0, 0.5]);
        assert_eq!(transform.range(), 1.0);

        let portable = transform.generate_portable_attribute(&att).unwrap();
        let mut q = [0i32; 2];
        portable.get_value(AttributeValueIndex(1), &mut q).unwrap();
        assert_eq!(q, [255, 0]);
        portable.get_value(AttributeValueIndex(2), &mut q).unwrap();
        assert_eq!(q, [128, 64]);

        let mut buffer = EncoderBuffer::new();
        transform.encode_parameters(&mut buffer);
        let mut decoded = AttributeQuantizationTransform::new();
        decoded
            .decode_parameters(2, &mut DecoderBuffer::new(buffer.data()))
            .unwrap();
        assert_eq!(decoded, transform);

        let mut restored = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, 3);
        decoded.inverse_transform_attribute(&portable, &mut restored).unwrap();
        let mut v = [0f32; 2];
        restored.get_value(AttributeValueIndex(2), &mut v).unwrap();
        assert!((v[0] - 0.5).abs() < 1.0 / 255.0);
        assert!((v[1] - 0.75).abs() < 1.0 / 255.0);
    }

    #[test]
    fn explicit_parameters_are_checked() {
        let mut transform = AttributeQuantizationTransform::new();
        assert!(transform.set_parameters(1, &[0.0], 1.0).is_err());
        transform.set_parameters(12, &[-1.0, 2.0], 4.0).unwrap();
        assert_eq!(transform.quantization_bits(), 12);
        assert_eq!(transform.min_values(), &[-1.0, 2.0]);
        assert_eq!(transform.range(), 4.0);
    }

    #[test]
    fn rejects_bad_bit_counts() {
        let mut buffer = EncoderBuffer::new();
        buffer.encode_f32(0.0);
        buffer.encode_f32(1.0);
        buffer.encode_u8(0);
        let mut transform = AttributeQuantizationTransform::new();
        assert!(matches!(
            transform.decode_parameters(1, &mut DecoderBuffer::new(buffer.data())),
            Err(CodecError::CorruptEncodingData(_))
        ));
    }
}
