//! Transforms turning (original, predicted) pairs into corrections.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::prediction_scheme_delta::DeltaTransform;
use crate::prediction_scheme_normal_octahedron_canonicalized_transform::NormalOctahedronCanonicalizedTransform;
use crate::prediction_scheme_normal_octahedron_transform::{NormalOctahedronTransform, OctahedronTransformBase};
use crate::prediction_scheme_wrap::WrapTransform;
use crate::status::{corrupt, unsupported, CodecResult, Status};

/// Transform id stored in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionSchemeTransformType {
    Delta = 0,
    Wrap = 1,
    NormalOctahedron = 2,
    NormalOctahedronCanonicalized = 3,
}

impl PredictionSchemeTransformType {
    pub fn from_i8(value: i8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::Delta),
            1 => Ok(Self::Wrap),
            2 => Ok(Self::NormalOctahedron),
            3 => Ok(Self::NormalOctahedronCanonicalized),
            _ => Err(corrupt(format!("unknown prediction transform {value}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PredictionTransform {
    Delta(DeltaTransform),
    Wrap(WrapTransform),
    NormalOctahedron(NormalOctahedronTransform),
    NormalOctahedronCanonicalized(NormalOctahedronCanonicalizedTransform),
}

impl PredictionTransform {
    /// Empty transform of the given type, ready for `decode_transform_data`.
    pub fn for_decoding(transform_type: PredictionSchemeTransformType) -> Self {
        match transform_type {
            PredictionSchemeTransformType::Delta => Self::Delta(DeltaTransform::new()),
            PredictionSchemeTransformType::Wrap => Self::Wrap(WrapTransform::new()),
            PredictionSchemeTransformType::NormalOctahedron => {
                Self::NormalOctahedron(NormalOctahedronTransform::for_decoding())
            }
            PredictionSchemeTransformType::NormalOctahedronCanonicalized => {
                Self::NormalOctahedronCanonicalized(NormalOctahedronCanonicalizedTransform::for_decoding())
            }
        }
    }

    pub fn transform_type(&self) -> PredictionSchemeTransformType {
        match self {
            Self::Delta(_) => PredictionSchemeTransformType::Delta,
            Self::Wrap(_) => PredictionSchemeTransformType::Wrap,
            Self::NormalOctahedron(_) => PredictionSchemeTransformType::NormalOctahedron,
            Self::NormalOctahedronCanonicalized(_) => PredictionSchemeTransformType::NormalOctahedronCanonicalized,
        }
    }

    /// Octahedron corrections are already non-negative and are stored
    /// without sign folding.
    pub fn are_corrections_positive(&self) -> bool {
        matches!(self, Self::NormalOctahedron(_) | Self::NormalOctahedronCanonicalized(_))
    }

    pub fn octahedron_base(&self) -> Option<&OctahedronTransformBase> {
        match self {
            Self::NormalOctahedron(t) => Some(t.base()),
            Self::NormalOctahedronCanonicalized(t) => Some(t.base()),
            _ => None,
        }
    }

    /// Prepares the transform for computing corrections of `orig_data`.
    pub fn init_encoding(&mut self, orig_data: &[i32], num_components: usize) -> Status {
        match self {
            Self::Delta(t) => {
                t.init(num_components);
                Ok(())
            }
            Self::Wrap(t) => t.init_encoding(orig_data, num_components),
            Self::NormalOctahedron(t) => Self::check_octahedron(t.base(), num_components),
            Self::NormalOctahedronCanonicalized(t) => Self::check_octahedron(t.base(), num_components),
        }
    }

    pub fn init_decoding(&mut self, num_components: usize) -> Status {
        match self {
            Self::Delta(t) => {
                t.init(num_components);
                Ok(())
            }
            Self::Wrap(t) => {
                t.init_decoding(num_components);
                Ok(())
            }
            Self::NormalOctahedron(t) => Self::check_octahedron(t.base(), num_components),
            Self::NormalOctahedronCanonicalized(t) => Self::check_octahedron(t.base(), num_components),
        }
    }

    fn check_octahedron(base: &OctahedronTransformBase, num_components: usize) -> Status {
        if num_components != 2 {
            return Err(unsupported(format!(
                "octahedron transform needs 2 components, got {num_components}"
            )));
        }
        base.check_initialized()
    }

    #[inline]
    pub fn compute_correction(&self, original_vals: &[i32], predicted_vals: &[i32], out_corr_vals: &mut [i32]) {
        match self {
            Self::Delta(t) => t.compute_correction(original_vals, predicted_vals, out_corr_vals),
            Self::Wrap(t) => t.compute_correction(original_vals, predicted_vals, out_corr_vals),
            Self::NormalOctahedron(t) => t.compute_correction(original_vals, predicted_vals, out_corr_vals),
            Self::NormalOctahedronCanonicalized(t) => {
                t.compute_correction(original_vals, predicted_vals, out_corr_vals)
            }
        }
    }

    #[inline]
    pub fn compute_original_value(&self, predicted_vals: &[i32], corr_vals: &[i32], out_original_vals: &mut [i32]) {
        match self {
            Self::Delta(t) => t.compute_original_value(predicted_vals, corr_vals, out_original_vals),
            Self::Wrap(t) => t.compute_original_value(predicted_vals, corr_vals, out_original_vals),
            Self::NormalOctahedron(t) => t.compute_original_value(predicted_vals, corr_vals, out_original_vals),
            Self::NormalOctahedronCanonicalized(t) => {
                t.compute_original_value(predicted_vals, corr_vals, out_original_vals)
            }
        }
    }

    pub fn encode_transform_data(&self, buffer: &mut EncoderBuffer) {
        match self {
            Self::Delta(_) => {}
            Self::Wrap(t) => t.encode_transform_data(buffer),
            Self::NormalOctahedron(t) => t.encode_transform_data(buffer),
            Self::NormalOctahedronCanonicalized(t) => t.encode_transform_data(buffer),
        }
    }

    pub fn decode_transform_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        match self {
            Self::Delta(_) => Ok(()),
            Self::Wrap(t) => t.decode_transform_data(buffer),
            Self::NormalOctahedron(t) => t.decode_transform_data(buffer),
            Self::NormalOctahedronCanonicalized(t) => t.decode_transform_data(buffer),
        }
    }
}
