//! Uniform scalar quantization of floats onto `[0, max_quantized_value]`.

use crate::status::{CodecError, Status};

#[derive(Debug, Default, Clone, Copy)]
pub struct Quantizer {
    inverse_delta: f32,
}

impl Quantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Self {
        let inverse_delta = if range > 0.0 {
            max_quantized_value as f32 / range
        } else {
            0.0
        };
        Self { inverse_delta }
    }

    /// Rounds half up.
    pub fn quantize_float(&self, val: f32) -> i32 {
        (val * self.inverse_delta + 0.5).floor() as i32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Dequantizer {
    delta: f32,
}

impl Dequantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Result<Self, CodecError> {
        if max_quantized_value <= 0 {
            return Err(CodecError::InvalidParameter(format!(
                "max quantized value must be positive, got {max_quantized_value}"
            )));
        }
        Ok(Self {
            delta: range / max_quantized_value as f32,
        })
    }

    pub fn dequantize_float(&self, val: i32) -> f32 {
        val as f32 * self.delta
    }
}

/// Fails unless `bits` is a usable quantization precision for float attributes.
pub fn check_quantization_bits(bits: i32) -> Status {
    if !(1..=30).contains(&bits) {
        return Err(CodecError::InvalidParameter(format!(
            "quantization bits must be in 1..=30, got {bits}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_error_is_within_half_step() {
        let range = 2.5f32;
        let max = (1 << 10) - 1;
        let q = Quantizer::new(range, max);
        let d = Dequantizer::new(range, max).unwrap();
        for i in 0..100 {
            let v = i as f32 * range / 99.0;
            let back = d.dequantize_float(q.quantize_float(v));
            assert!((back - v).abs() <= range / max as f32 * 0.5 + 1e-6);
        }
    }

    #[test]
    fn zero_range_quantizes_to_zero() {
        let q = Quantizer::new(0.0, 255);
        assert_eq!(q.quantize_float(3.0), 0);
        assert!(Dequantizer::new(1.0, 0).is_err());
    }
}
