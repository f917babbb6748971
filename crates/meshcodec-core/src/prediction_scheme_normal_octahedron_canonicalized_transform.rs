use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::prediction_scheme_normal_octahedron_transform::OctahedronTransformBase;
use crate::status::{CodecError, Status};

/// Octahedron transform that additionally rotates the centered prediction
/// into the bottom-left quadrant, so that corrections of all quadrants
/// share one distribution.
#[derive(Debug, Clone, Default)]
pub struct NormalOctahedronCanonicalizedTransform {
    base: OctahedronTransformBase,
}

/// Quarter turns that bring `p` into the bottom-left quadrant.
pub fn get_rotation_count(p: (i32, i32)) -> u32 {
    let (x, y) = p;
    if x == 0 {
        if y == 0 {
            0
        } else if y > 0 {
            3
        } else {
            1
        }
    } else if x > 0 {
        if y >= 0 {
            2
        } else {
            1
        }
    } else if y <= 0 {
        0
    } else {
        3
    }
}

pub fn rotate_point(p: (i32, i32), rotation_count: u32) -> (i32, i32) {
    match rotation_count {
        1 => (p.1, p.0.wrapping_neg()),
        2 => (p.0.wrapping_neg(), p.1.wrapping_neg()),
        3 => (p.1.wrapping_neg(), p.0),
        _ => p,
    }
}

pub fn is_in_bottom_left(p: (i32, i32)) -> bool {
    (p.0 == 0 && p.1 == 0) || (p.0 < 0 && p.1 <= 0)
}

impl NormalOctahedronCanonicalizedTransform {
    pub fn new(max_quantized_value: i32) -> Result<Self, CodecError> {
        Ok(Self {
            base: OctahedronTransformBase::with_max_quantized_value(max_quantized_value)?,
        })
    }

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
        if !is_in_bottom_left(pred) {
            let rotation_count = get_rotation_count(pred);
            orig = rotate_point(orig, rotation_count);
            pred = rotate_point(pred, rotation_count);
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
        let pred_is_in_bottom_left = is_in_bottom_left(pred);
        let rotation_count = get_rotation_count(pred);
        if !pred_is_in_bottom_left {
            pred = rotate_point(pred, rotation_count);
        }
        let mut orig = (
            tb.mod_max(pred.0.wrapping_add(corr_vals[0])),
            tb.mod_max(pred.1.wrapping_add(corr_vals[1])),
        );
        if !pred_is_in_bottom_left {
            orig = rotate_point(orig, (4 - rotation_count) % 4);
        }
        if !pred_is_in_diamond {
            orig = tb.invert_diamond(orig.0, orig.1);
        }
        out_original_vals[0] = orig.0.wrapping_add(center);
        out_original_vals[1] = orig.1.wrapping_add(center);
    }

    /// Always writes both the max quantized value and the center value.
    pub fn encode_transform_data(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_i32(self.base.max_quantized_value());
        buffer.encode_i32(self.base.center_value());
    }

    pub fn decode_transform_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        self.base.decode_quantization(buffer, true)
    }
}
