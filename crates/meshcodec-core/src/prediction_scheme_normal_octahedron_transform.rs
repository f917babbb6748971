//! Correction transform for octahedral normal coordinates.
//!
//! Values are `(s, t)` pairs in `[0, max_quantized_value]`. Before the
//! difference is taken both points are shifted so the square is centered at
//! the origin; if the prediction lies outside the inner diamond both points
//! are mirrored into it, which keeps the wrap around the octahedron seam
//! short.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::math_utils::most_significant_bit;
use crate::normal_compression_utils::OctahedronToolBox;
use crate::status::{corrupt, CodecError, Status};
use crate::version::has_implicit_normal_parameters;

/// Quantization state shared by the plain and the canonicalized transform.
#[derive(Debug, Clone, Default)]
pub struct OctahedronTransformBase {
    octahedron_tool_box: OctahedronToolBox,
}

impl OctahedronTransformBase {
    pub fn with_max_quantized_value(max_quantized_value: i32) -> Result<Self, CodecError> {
        let mut base = Self::default();
        base.set_max_quantized_value(max_quantized_value)?;
        Ok(base)
    }

    /// Expects `2^q - 1`.
    pub fn set_max_quantized_value(&mut self, max_quantized_value: i32) -> Status {
        if max_quantized_value <= 0 || max_quantized_value % 2 == 0 {
            return Err(CodecError::InvalidParameter(format!(
                "max quantized value {max_quantized_value} is not of the form 2^q - 1"
            )));
        }
        let q = most_significant_bit(max_quantized_value as u32) + 1;
        self.octahedron_tool_box.set_quantization_bits(q)
    }

    pub fn tool_box(&self) -> &OctahedronToolBox {
        &self.octahedron_tool_box
    }

    pub fn max_quantized_value(&self) -> i32 {
        self.octahedron_tool_box.max_quantized_value()
    }

    pub fn center_value(&self) -> i32 {
        self.octahedron_tool_box.center_value()
    }

    pub fn quantization_bits(&self) -> i32 {
        self.octahedron_tool_box.quantization_bits()
    }

    pub(crate) fn check_initialized(&self) -> Status {
        if !self.octahedron_tool_box.is_initialized() {
            return Err(CodecError::InvalidParameter(
                "octahedron transform used before its quantization was set".into(),
            ));
        }
        Ok(())
    }

    /// Reads `max_quantized_value`, optionally followed by an ignored center value.
    pub(crate) fn decode_quantization(&mut self, buffer: &mut DecoderBuffer<'_>, with_center: bool) -> Status {
        let max_quantized_value = buffer.decode_i32()?;
        if with_center {
            let _center_value = buffer.decode_i32()?;
        }
        self.set_max_quantized_value(max_quantized_value)
            .map_err(|e| corrupt(e.to_string()))
    }
}

/// Octahedron transform without rotation.
#[derive(Debug, Clone, Default)]
pub struct NormalOctahedronTransform {
    base: OctahedronTransformBase,
}

impl NormalOctahedronTransform {
    pub fn new(max_quantized_value: i32) -> Result<Self, CodecError> {
        Ok(Self {
            base: OctahedronTransformBase::with_max_quantized_value(max_quantized_value)?,
        })
    }

    /// Uninitialized transform, to be filled by [`decode_transform_data`](Self::decode_transform_data).
    pub fn for_decoding() -> Self {
        Self::default()
    }

    pub fn base(&self) -> &OctahedronTransformBase {
        &self.base
    }

    pub fn compute_correction(&self, original_vals: &[i32], predicted_vals: &[i32], out_corr_vals: &mut [i32]) {
        let tb = self.base.tool_box();
        let center = tb.center_value();
        let mut orig = (original_vals[0] - center, original_vals[1] - center);
        let mut pred = (predicted_vals[0] - center, predicted_vals[1] - center);
        if !tb.is_in_diamond(pred.0, pred.1) {
            orig = tb.invert_diamond(orig.0, orig.1);
            pred = tb.invert_diamond(pred.0, pred.1);
        }
        out_corr_vals[0] = tb.make_positive(orig.0 - pred.0);
        out_corr_vals[1] = tb.make_positive(orig.1 - pred.1);
    }

    pub fn compute_original_value(&self, predicted_vals: &[i32], corr_vals: &[i32], out_original_vals: &mut [i32]) {
        let tb = self.base.tool_box();
        let center = tb.center_value();
        let mut pred = (
            predicted_vals[0].wrapping_sub(center),
            predicted_vals[1].wrapping_sub(center),
        );
        let pred_is_in_diamond = tb.is_in_diamond(pred.0, pred.1);
        if !pred_is_in_diamond {
            pred = tb.invert_diamond(pred.0, pred.1);
        }
        let mut orig = (
            tb.mod_max(pred.0.wrapping_add(corr_vals[0])),
            tb.mod_max(pred.1.wrapping_add(corr_vals[1])),
        );
        if !pred_is_in_diamond {
            orig = tb.invert_diamond(orig.0, orig.1);
        }
        out_original_vals[0] = orig.0.wrapping_add(center);
        out_original_vals[1] = orig.1.wrapping_add(center);
    }

    /// Streams older than 2.2 also carry the center value.
    pub fn encode_transform_data(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_i32(self.base.max_quantized_value());
        if !has_implicit_normal_parameters(buffer.bitstream_version()) {
            buffer.encode_i32(self.base.center_value());
        }
    }

    pub fn decode_transform_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        let with_center = !has_implicit_normal_parameters(buffer.bitstream_version());
        self.base.decode_quantization(buffer, with_center)
    }
}
