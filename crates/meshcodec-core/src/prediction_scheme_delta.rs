//! Plain delta coding: each value is predicted by its predecessor in
//! encode order.

use crate::prediction_scheme_transform::PredictionTransform;
use crate::status::{corrupt, CodecError, Status};

/// `correction = original - prediction` with two's complement wrapping.
#[derive(Debug, Clone, Default)]
pub struct DeltaTransform {
    num_components: usize,
}

impl DeltaTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&mut self, num_components: usize) {
        self.num_components = num_components;
    }

    pub fn compute_correction(&self, original_vals: &[i32], predicted_vals: &[i32], out_corr_vals: &mut [i32]) {
        for i in 0..self.num_components {
            out_corr_vals[i] = original_vals[i].wrapping_sub(predicted_vals[i]);
        }
    }

    pub fn compute_original_value(&self, predicted_vals: &[i32], corr_vals: &[i32], out_original_vals: &mut [i32]) {
        for i in 0..self.num_components {
            out_original_vals[i] = predicted_vals[i].wrapping_add(corr_vals[i]);
        }
    }
}

/// Difference scheme. Needs no connectivity.
#[derive(Debug, Clone)]
pub struct PredictionSchemeDelta {
    transform: PredictionTransform,
}

impl PredictionSchemeDelta {
    pub fn new(transform: PredictionTransform) -> Self {
        Self { transform }
    }

    pub fn transform(&self) -> &PredictionTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PredictionTransform {
        &mut self.transform
    }

    pub fn compute_correction_values(&mut self, in_data: &[i32], out_corr: &mut [i32], num_components: usize) -> Status {
        if num_components == 0 || in_data.len() % num_components != 0 || out_corr.len() != in_data.len() {
            return Err(CodecError::InvalidParameter(format!(
                "{} values do not split into entries of {} components",
                in_data.len(),
                num_components
            )));
        }
        self.transform.init_encoding(in_data, num_components)?;
        let nc = num_components;
        // Back to front so every prediction reads an untouched original.
        let mut i = in_data.len();
        while i > nc {
            i -= nc;
            self.transform
                .compute_correction(&in_data[i..i + nc], &in_data[i - nc..i], &mut out_corr[i..i + nc]);
        }
        if in_data.len() >= nc {
            let zero = vec![0; nc];
            self.transform.compute_correction(&in_data[..nc], &zero, &mut out_corr[..nc]);
        }
        Ok(())
    }

    pub fn compute_original_values(&mut self, in_corr: &[i32], out_data: &mut [i32], num_components: usize) -> Status {
        if in_corr.len() != out_data.len() || num_components == 0 || in_corr.len() % num_components != 0 {
            return Err(corrupt("correction count does not match the value count"));
        }
        self.transform.init_decoding(num_components)?;
        let nc = num_components;
        if out_data.is_empty() {
            return Ok(());
        }
        let zero = vec![0; nc];
        self.transform.compute_original_value(&zero, &in_corr[..nc], &mut out_data[..nc]);
        for i in (nc..out_data.len()).step_by(nc) {
            let (done, rest) = out_data.split_at_mut(i);
            self.transform
                .compute_original_value(&done[i - nc..], &in_corr[i..i + nc], &mut rest[..nc]);
        }
        Ok(())
    }
}
