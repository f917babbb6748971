//! Closed set of prediction schemes.
//!
//! Each scheme turns attribute values in encode order into corrections and
//! back. The encoder side runs back to front so that every prediction reads
//! original values; the decoder runs front to back over the values it has
//! already reconstructed.

use crate::corner_table::CornerTableView;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::PointIndex;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::prediction_scheme_delta::PredictionSchemeDelta;
use crate::prediction_scheme_geometric_normal::PredictionSchemeGeometricNormal;
use crate::prediction_scheme_multi_parallelogram::PredictionSchemeMultiParallelogram;
use crate::prediction_scheme_parallelogram::PredictionSchemeParallelogram;
use crate::prediction_scheme_tex_coords_portable::PredictionSchemeTexCoordsPortable;
use crate::prediction_scheme_transform::{PredictionSchemeTransformType, PredictionTransform};
use crate::status::{corrupt, unsupported, CodecError, CodecResult, Status};

/// Scheme id stored in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictionSchemeMethod {
    Difference = 0,
    Parallelogram = 1,
    MultiParallelogram = 2,
    TexCoordsPortable = 5,
    GeometricNormal = 6,
}

impl PredictionSchemeMethod {
    pub fn from_i8(value: i8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::Difference),
            1 => Ok(Self::Parallelogram),
            2 => Ok(Self::MultiParallelogram),
            // Deprecated texture coordinates and constrained multi-parallelogram.
            3 | 4 => Err(unsupported(format!("prediction method {value} is not supported"))),
            5 => Ok(Self::TexCoordsPortable),
            6 => Ok(Self::GeometricNormal),
            _ => Err(corrupt(format!("unknown prediction method {value}"))),
        }
    }

    /// Options carry the method as a plain integer.
    pub fn from_option(value: i32) -> CodecResult<Self> {
        i8::try_from(value)
            .map_err(|_| CodecError::InvalidParameter(format!("prediction method {value} out of range")))
            .and_then(Self::from_i8)
            .map_err(|e| CodecError::InvalidParameter(e.to_string()))
    }
}

pub enum PredictionScheme<'a, T: CornerTableView> {
    Difference(PredictionSchemeDelta),
    Parallelogram(PredictionSchemeParallelogram<'a, T>),
    MultiParallelogram(PredictionSchemeMultiParallelogram<'a, T>),
    TexCoordsPortable(PredictionSchemeTexCoordsPortable<'a, T>),
    GeometricNormal(PredictionSchemeGeometricNormal<'a, T>),
}

impl<'a, T: CornerTableView> PredictionScheme<'a, T> {
    /// Builds `method` over `transform`.
    ///
    /// Mesh schemes need `mesh_data`; texture coordinate and normal
    /// prediction also need the portable position attribute. A missing input
    /// is reported as an unsupported configuration.
    pub fn new(
        method: PredictionSchemeMethod,
        transform: PredictionTransform,
        mesh_data: Option<MeshPredictionSchemeData<'a, T>>,
        position_attribute: Option<&'a PointAttribute>,
    ) -> CodecResult<Self> {
        let mesh_data = || mesh_data.ok_or_else(|| unsupported(format!("{method:?} prediction needs mesh connectivity")));
        let position = || position_attribute.ok_or_else(|| unsupported(format!("{method:?} prediction needs positions")));
        Ok(match method {
            PredictionSchemeMethod::Difference => Self::Difference(PredictionSchemeDelta::new(transform)),
            PredictionSchemeMethod::Parallelogram => {
                Self::Parallelogram(PredictionSchemeParallelogram::new(transform, mesh_data()?))
            }
            PredictionSchemeMethod::MultiParallelogram => {
                Self::MultiParallelogram(PredictionSchemeMultiParallelogram::new(transform, mesh_data()?))
            }
            PredictionSchemeMethod::TexCoordsPortable => Self::TexCoordsPortable(
                PredictionSchemeTexCoordsPortable::new(transform, mesh_data()?, position()?),
            ),
            PredictionSchemeMethod::GeometricNormal => Self::GeometricNormal(PredictionSchemeGeometricNormal::new(
                transform,
                mesh_data()?,
                position()?,
            )?),
        })
    }

    pub fn method(&self) -> PredictionSchemeMethod {
        match self {
            Self::Difference(_) => PredictionSchemeMethod::Difference,
            Self::Parallelogram(_) => PredictionSchemeMethod::Parallelogram,
            Self::MultiParallelogram(_) => PredictionSchemeMethod::MultiParallelogram,
            Self::TexCoordsPortable(_) => PredictionSchemeMethod::TexCoordsPortable,
            Self::GeometricNormal(_) => PredictionSchemeMethod::GeometricNormal,
        }
    }

    pub fn transform(&self) -> &PredictionTransform {
        match self {
            Self::Difference(s) => s.transform(),
            Self::Parallelogram(s) => s.transform(),
            Self::MultiParallelogram(s) => s.transform(),
            Self::TexCoordsPortable(s) => s.transform(),
            Self::GeometricNormal(s) => s.transform(),
        }
    }

    pub fn transform_type(&self) -> PredictionSchemeTransformType {
        self.transform().transform_type()
    }

    /// Positive corrections are stored as plain varints, others are sign folded.
    pub fn are_corrections_positive(&self) -> bool {
        self.transform().are_corrections_positive()
    }

    /// `entry_to_point_ids` maps encode order to point ids; only the schemes
    /// that read positions use it.
    pub fn compute_correction_values(
        &mut self,
        in_data: &[i32],
        out_corr: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        if in_data.len() != out_corr.len() {
            return Err(CodecError::InvalidParameter(format!(
                "{} values but room for {} corrections",
                in_data.len(),
                out_corr.len()
            )));
        }
        match self {
            Self::Difference(s) => s.compute_correction_values(in_data, out_corr, num_components),
            Self::Parallelogram(s) => s.compute_correction_values(in_data, out_corr, num_components),
            Self::MultiParallelogram(s) => s.compute_correction_values(in_data, out_corr, num_components),
            Self::TexCoordsPortable(s) => {
                s.compute_correction_values(in_data, out_corr, num_components, entry_to_point_ids)
            }
            Self::GeometricNormal(s) => s.compute_correction_values(in_data, out_corr, num_components, entry_to_point_ids),
        }
    }

    pub fn compute_original_values(
        &mut self,
        in_corr: &[i32],
        out_data: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        match self {
            Self::Difference(s) => s.compute_original_values(in_corr, out_data, num_components),
            Self::Parallelogram(s) => s.compute_original_values(in_corr, out_data, num_components),
            Self::MultiParallelogram(s) => s.compute_original_values(in_corr, out_data, num_components),
            Self::TexCoordsPortable(s) => s.compute_original_values(in_corr, out_data, num_components, entry_to_point_ids),
            Self::GeometricNormal(s) => s.compute_original_values(in_corr, out_data, num_components, entry_to_point_ids),
        }
    }

    /// Writes whatever the decoder needs besides the corrections. Must run
    /// after [`compute_correction_values`](Self::compute_correction_values).
    pub fn encode_prediction_data(&mut self, buffer: &mut EncoderBuffer) -> Status {
        match self {
            Self::Difference(s) => s.transform().encode_transform_data(buffer),
            Self::Parallelogram(s) => s.transform().encode_transform_data(buffer),
            Self::MultiParallelogram(s) => s.transform().encode_transform_data(buffer),
            Self::TexCoordsPortable(s) => return s.encode_prediction_data(buffer),
            Self::GeometricNormal(s) => return s.encode_prediction_data(buffer),
        }
        Ok(())
    }

    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        match self {
            Self::Difference(s) => s.transform_mut().decode_transform_data(buffer),
            Self::Parallelogram(s) => s.transform_mut().decode_transform_data(buffer),
            Self::MultiParallelogram(s) => s.transform_mut().decode_transform_data(buffer),
            Self::TexCoordsPortable(s) => s.decode_prediction_data(buffer),
            Self::GeometricNormal(s) => s.decode_prediction_data(buffer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corner_table::CornerTable;
    use crate::prediction_scheme_delta::DeltaTransform;
    use crate::prediction_scheme_wrap::WrapTransform;

    #[test]
    fn method_codes() {
        for method in [
            PredictionSchemeMethod::Difference,
            PredictionSchemeMethod::Parallelogram,
            PredictionSchemeMethod::MultiParallelogram,
            PredictionSchemeMethod::TexCoordsPortable,
            PredictionSchemeMethod::GeometricNormal,
        ] {
            assert_eq!(PredictionSchemeMethod::from_i8(method as i8).unwrap(), method);
        }
        assert!(matches!(
            PredictionSchemeMethod::from_i8(4),
            Err(CodecError::UnsupportedConfiguration(_))
        ));
        assert!(matches!(
            PredictionSchemeMethod::from_i8(9),
            Err(CodecError::CorruptEncodingData(_))
        ));
    }

    #[test]
    fn mesh_schemes_need_connectivity() {
        let result = PredictionScheme::<CornerTable>::new(
            PredictionSchemeMethod::Parallelogram,
            PredictionTransform::Delta(DeltaTransform::new()),
            None,
            None,
        );
        assert!(matches!(result, Err(CodecError::UnsupportedConfiguration(_))));
    }

    #[test]
    fn difference_round_trips_through_the_enum() {
        let mut scheme = PredictionScheme::<CornerTable>::new(
            PredictionSchemeMethod::Difference,
            PredictionTransform::Wrap(WrapTransform::new()),
            None,
            None,
        )
        .unwrap();
        assert!(!scheme.are_corrections_positive());
        let data = [3, -4, 8, 100, -100, 0];
        let mut corr = [0; 6];
        scheme.compute_correction_values(&data, &mut corr, 3, &[]).unwrap();
        let mut buffer = EncoderBuffer::new();
        scheme.encode_prediction_data(&mut buffer).unwrap();

        let mut decoder = PredictionScheme::<CornerTable>::new(
            PredictionSchemeMethod::Difference,
            PredictionTransform::for_decoding(PredictionSchemeTransformType::Wrap),
            None,
            None,
        )
        .unwrap();
        let mut input = DecoderBuffer::new(buffer.data());
        decoder.decode_prediction_data(&mut input).unwrap();
        let mut out = [0; 6];
        decoder.compute_original_values(&corr, &mut out, 3, &[]).unwrap();
        assert_eq!(out, data);
    }
}
