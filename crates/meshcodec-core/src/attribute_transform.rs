//! Conversion between attribute values and the `i32` portable form the
//! prediction schemes work on.

use tracing::debug;

use crate::attribute_octahedron_transform::AttributeOctahedronTransform;
use crate::attribute_quantization_transform::AttributeQuantizationTransform;
use crate::data_type::DataType;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::AttributeValueIndex;
use crate::status::{corrupt, unsupported, CodecResult, Status};

/// Portable form id stored in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTransformType {
    NoTransform = 0,
    RawFloat = 1,
    QuantizationTransform = 2,
    OctahedronTransform = 3,
}

impl AttributeTransformType {
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::NoTransform),
            1 => Ok(Self::RawFloat),
            2 => Ok(Self::QuantizationTransform),
            3 => Ok(Self::OctahedronTransform),
            _ => Err(corrupt(format!("unknown attribute transform {value}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeTransform {
    /// Integer values up to 32 bits, copied as they are.
    NoTransform,
    /// Unquantized `f32` values carried as their bit patterns.
    RawFloat,
    Quantization(AttributeQuantizationTransform),
    Octahedron(AttributeOctahedronTransform),
}

impl AttributeTransform {
    /// Picks the portable form of attribute `att_id` from its data type and
    /// the quantization options.
    pub fn for_attribute(attribute: &PointAttribute, att_id: i32, options: &EncoderOptions) -> CodecResult<Self> {
        let transform = match attribute.data_type() {
            DataType::Int64 | DataType::Uint64 | DataType::Float64 | DataType::Invalid => {
                return Err(unsupported(format!(
                    "attribute {att_id} has unsupported data type {:?}",
                    attribute.data_type()
                )))
            }
            DataType::Float32 => match options.quantization_bits(att_id) {
                None => Self::RawFloat,
                Some(bits)
                    if attribute.attribute_type() == GeometryAttributeType::Normal
                        && attribute.num_components() == 3 =>
                {
                    Self::Octahedron(AttributeOctahedronTransform::new(bits))
                }
                Some(bits) => {
                    let mut quantization = AttributeQuantizationTransform::new();
                    quantization.compute_parameters(attribute, bits)?;
                    Self::Quantization(quantization)
                }
            },
            _ => Self::NoTransform,
        };
        debug!(attribute = att_id, transform = ?transform.transform_type(), "attribute transform selected");
        Ok(transform)
    }

    pub fn transform_type(&self) -> AttributeTransformType {
        match self {
            Self::NoTransform => AttributeTransformType::NoTransform,
            Self::RawFloat => AttributeTransformType::RawFloat,
            Self::Quantization(_) => AttributeTransformType::QuantizationTransform,
            Self::Octahedron(_) => AttributeTransformType::OctahedronTransform,
        }
    }

    /// True when the portable values are positions on an integer grid that
    /// geometric predictions can use.
    pub fn is_geometric(&self) -> bool {
        matches!(self, Self::NoTransform | Self::Quantization(_))
    }

    pub fn portable_num_components(&self, num_components: u8) -> u8 {
        match self {
            Self::Octahedron(_) => 2,
            _ => num_components,
        }
    }

    /// `Int32` attribute with one portable value per value of `attribute`
    /// and the same point mapping.
    pub fn generate_portable_attribute(&self, attribute: &PointAttribute) -> CodecResult<PointAttribute> {
        match self {
            Self::Quantization(t) => t.generate_portable_attribute(attribute),
            Self::Octahedron(t) => t.generate_portable_attribute(attribute),
            Self::NoTransform | Self::RawFloat => {
                let num_components = attribute.num_components() as usize;
                let mut portable = PointAttribute::new(
                    attribute.attribute_type(),
                    attribute.num_components(),
                    DataType::Int32,
                    false,
                    attribute.size(),
                );
                portable.copy_mapping_from(attribute);
                let mut wide = vec![0i64; num_components];
                let mut float = vec![0f32; num_components];
                let mut value = vec![0i32; num_components];
                for i in 0..attribute.size() {
                    let index = AttributeValueIndex(i as u32);
                    if matches!(self, Self::RawFloat) {
                        attribute.get_value(index, &mut float)?;
                        for (v, f) in value.iter_mut().zip(&float) {
                            *v = f.to_bits() as i32;
                        }
                    } else {
                        // Uint32 values above i32::MAX keep their bit pattern.
                        attribute.get_value(index, &mut wide)?;
                        for (v, w) in value.iter_mut().zip(&wide) {
                            *v = *w as i32;
                        }
                    }
                    portable.set_value(index, &value)?;
                }
                Ok(portable)
            }
        }
    }

    /// Fills `target` (same value count as `portable`) with values of the
    /// target data type.
    pub fn inverse_transform_attribute(&self, portable: &PointAttribute, target: &mut PointAttribute) -> Status {
        match self {
            Self::Quantization(t) => t.inverse_transform_attribute(portable, target),
            Self::Octahedron(t) => t.inverse_transform_attribute(portable, target),
            Self::NoTransform | Self::RawFloat => {
                let num_components = target.num_components() as usize;
                let mut value = vec![0i32; num_components];
                for i in 0..portable.size() {
                    let index = AttributeValueIndex(i as u32);
                    portable.get_value(index, &mut value)?;
                    match (self, target.data_type()) {
                        (Self::RawFloat, _) => {
                            let floats: Vec<f32> = value.iter().map(|&v| f32::from_bits(v as u32)).collect();
                            target.set_value(index, &floats)?;
                        }
                        (_, DataType::Uint32) => {
                            let unsigned: Vec<u32> = value.iter().map(|&v| v as u32).collect();
                            target.set_value(index, &unsigned)?;
                        }
                        _ => target
                            .set_value(index, &value)
                            .map_err(|_| corrupt(format!("decoded value {i} does not fit {:?}", target.data_type())))?,
                    }
                }
                Ok(())
            }
        }
    }

    /// Form id followed by its parameters.
    pub fn encode_parameters(&self, buffer: &mut EncoderBuffer) -> Status {
        buffer.encode_u8(self.transform_type() as u8);
        match self {
            Self::Quantization(t) => t.encode_parameters(buffer),
            Self::Octahedron(t) => t.encode_parameters(buffer)?,
            Self::NoTransform | Self::RawFloat => {}
        }
        Ok(())
    }

    pub fn decode_parameters(
        data_type: DataType,
        num_components: u8,
        buffer: &mut DecoderBuffer<'_>,
    ) -> CodecResult<Self> {
        let transform = match AttributeTransformType::from_u8(buffer.decode_u8()?)? {
            AttributeTransformType::NoTransform => Self::NoTransform,
            AttributeTransformType::RawFloat => Self::RawFloat,
            AttributeTransformType::QuantizationTransform => {
                let mut t = AttributeQuantizationTransform::new();
                t.decode_parameters(num_components as usize, buffer)?;
                Self::Quantization(t)
            }
            AttributeTransformType::OctahedronTransform => {
                if num_components != 3 {
                    return Err(corrupt(format!(
                        "octahedral coordinates for a {num_components} component attribute"
                    )));
                }
                let mut t = AttributeOctahedronTransform::default();
                t.decode_parameters(buffer)?;
                Self::Octahedron(t)
            }
        };
        let consistent = match transform {
            Self::NoTransform => data_type.is_integral() && data_type.byte_length() <= 4,
            _ => data_type == DataType::Float32,
        };
        if !consistent {
            return Err(corrupt(format!(
                "{:?} values cannot use the {:?} form",
                data_type,
                transform.transform_type()
            )));
        }
        Ok(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_floats_keep_their_bits() {
        let mut att = PointAttribute::new(GeometryAttributeType::Generic, 2, DataType::Float32, false, 2);
        att.set_value(AttributeValueIndex(0), &[1.5f32, -0.0]).unwrap();
        att.set_value(AttributeValueIndex(1), &[f32::MIN_POSITIVE, 3.25e7]).unwrap();
        let transform = AttributeTransform::for_attribute(&att, 0, &EncoderOptions::new()).unwrap();
        assert_eq!(transform, AttributeTransform::RawFloat);

        let portable = transform.generate_portable_attribute(&att).unwrap();
        let mut restored = PointAttribute::new(GeometryAttributeType::Generic, 2, DataType::Float32, false, 2);
        transform.inverse_transform_attribute(&portable, &mut restored).unwrap();
        assert_eq!(restored, att);
    }

    #[test]
    fn large_unsigned_values_survive() {
        let mut att = PointAttribute::new(GeometryAttributeType::Generic, 1, DataType::Uint32, false, 2);
        att.set_value(AttributeValueIndex(0), &[u32::MAX]).unwrap();
        att.set_value(AttributeValueIndex(1), &[7u32]).unwrap();
        let transform = AttributeTransform::for_attribute(&att, 0, &EncoderOptions::new()).unwrap();
        let portable = transform.generate_portable_attribute(&att).unwrap();
        let mut v = [0i32; 1];
        portable.get_value(AttributeValueIndex(0), &mut v).unwrap();
        assert_eq!(v, [-1]);

        let mut restored = PointAttribute::new(GeometryAttributeType::Generic, 1, DataType::Uint32, false, 2);
        transform.inverse_transform_attribute(&portable, &mut restored).unwrap();
        assert_eq!(restored, att);
    }

    #[test]
    fn stream_form_must_match_the_data_type() {
        let mut buffer = EncoderBuffer::new();
        AttributeTransform::RawFloat.encode_parameters(&mut buffer).unwrap();
        assert!(AttributeTransform::decode_parameters(DataType::Int16, 3, &mut DecoderBuffer::new(buffer.data())).is_err());
        assert_eq!(
            AttributeTransform::decode_parameters(DataType::Float32, 3, &mut DecoderBuffer::new(buffer.data())).unwrap(),
            AttributeTransform::RawFloat
        );
        assert!(
            AttributeTransform::for_attribute(
                &PointAttribute::new(GeometryAttributeType::Generic, 1, DataType::Int64, false, 0),
                0,
                &EncoderOptions::new()
            )
            .is_err()
        );
    }
}
