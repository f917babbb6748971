use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::status::{corrupt, CodecError, Status};

/// Delta transform that keeps corrections inside the value range of the
/// data. Predictions are clamped to `[min, max]` and differences wrap
/// around modulo `max - min + 1`, so no correction needs more than the
/// bits of the range.
#[derive(Debug, Clone, Default)]
pub struct WrapTransform {
    num_components: usize,
    min_value: i32,
    max_value: i32,
    max_dif: i32,
    min_correction: i32,
    max_correction: i32,
}

impl WrapTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the value range of `orig_data`. Fails when the range is too
    /// wide to wrap in 32 bits.
    pub fn init_encoding(&mut self, orig_data: &[i32], num_components: usize) -> Status {
        self.num_components = num_components;
        let Some(&first) = orig_data.first() else {
            return Ok(());
        };
        let (min_value, max_value) = orig_data
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        self.min_value = min_value;
        self.max_value = max_value;
        self.init_correction_bounds()
    }

    pub fn init_decoding(&mut self, num_components: usize) {
        self.num_components = num_components;
    }

    /// True when `orig_data` has a range the transform can wrap.
    pub fn can_wrap(orig_data: &[i32]) -> bool {
        let min = orig_data.iter().copied().min().unwrap_or(0) as i64;
        let max = orig_data.iter().copied().max().unwrap_or(0) as i64;
        max - min < i32::MAX as i64
    }

    fn init_correction_bounds(&mut self) -> Status {
        let dif = self.max_value as i64 - self.min_value as i64;
        if dif < 0 || dif >= i32::MAX as i64 {
            return Err(CodecError::InvalidParameter(format!(
                "value range [{}, {}] cannot be wrapped",
                self.min_value, self.max_value
            )));
        }
        self.max_dif = 1 + dif as i32;
        self.max_correction = self.max_dif / 2;
        self.min_correction = -self.max_correction;
        if self.max_dif & 1 == 0 {
            self.max_correction -= 1;
        }
        Ok(())
    }

    #[inline]
    fn clamp(&self, predicted: i32) -> i32 {
        if predicted > self.max_value {
            self.max_value
        } else if predicted < self.min_value {
            self.min_value
        } else {
            predicted
        }
    }

    pub fn compute_correction(&self, original_vals: &[i32], predicted_vals: &[i32], out_corr_vals: &mut [i32]) {
        for i in 0..self.num_components {
            let mut corr = original_vals[i].wrapping_sub(self.clamp(predicted_vals[i]));
            if corr < self.min_correction {
                corr = corr.wrapping_add(self.max_dif);
            } else if corr > self.max_correction {
                corr = corr.wrapping_sub(self.max_dif);
            }
            out_corr_vals[i] = corr;
        }
    }

    pub fn compute_original_value(&self, predicted_vals: &[i32], corr_vals: &[i32], out_original_vals: &mut [i32]) {
        for i in 0..self.num_components {
            let mut val = self.clamp(predicted_vals[i]).wrapping_add(corr_vals[i]);
            if val > self.max_value {
                val = val.wrapping_sub(self.max_dif);
            } else if val < self.min_value {
                val = val.wrapping_add(self.max_dif);
            }
            out_original_vals[i] = val;
        }
    }

    pub fn encode_transform_data(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_i32(self.min_value);
        buffer.encode_i32(self.max_value);
    }

    pub fn decode_transform_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        self.min_value = buffer.decode_i32()?;
        self.max_value = buffer.decode_i32()?;
        if self.min_value > self.max_value {
            return Err(corrupt(format!(
                "wrap bounds out of order: [{}, {}]",
                self.min_value, self.max_value
            )));
        }
        self.init_correction_bounds().map_err(|e| corrupt(e.to_string()))
    }
}
