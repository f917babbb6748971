//! Predicts normals from the positions of the surrounding faces.
//!
//! The prediction is the area weighted sum of the face normals around the
//! vertex, mapped to octahedral coordinates. The geometric estimate can point
//! to either side of the surface, so one flip bit per entry tells the decoder
//! which side the encoder picked.

use crate::corner_table::CornerTableView;
use crate::corner_table_iterators::VertexCornersIterator;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{CornerIndex, PointIndex};
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::normal_compression_utils::OctahedronToolBox;
use crate::prediction_scheme_parallelogram::check_entry_count;
use crate::prediction_scheme_transform::PredictionTransform;
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{corrupt, unsupported, CodecResult, Status};
use crate::version::bitstream_version;

/// Upper bound of the L1 norm of a predicted normal before it is
/// canonicalized. Keeps the canonicalization inside `i64`.
const NORMAL_UPPER_BOUND: u64 = 1 << 29;

/// Which faces around a vertex contribute to the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalPredictionMode {
    /// Only the face of the predicted corner, counted once per fan face.
    OneTriangle = 0,
    #[default]
    TriangleArea = 1,
}

impl NormalPredictionMode {
    pub fn from_u8(value: u8) -> CodecResult<Self> {
        match value {
            0 => Ok(Self::OneTriangle),
            1 => Ok(Self::TriangleArea),
            _ => Err(corrupt(format!("unknown normal prediction mode {value}"))),
        }
    }
}

pub struct PredictionSchemeGeometricNormal<'a, T: CornerTableView> {
    transform: PredictionTransform,
    mesh_data: MeshPredictionSchemeData<'a, T>,
    position_attribute: &'a PointAttribute,
    normal_prediction_mode: NormalPredictionMode,
    flip_normal_bit_encoder: RAnsBitEncoder,
    flip_normal_bits: Vec<bool>,
}

impl<'a, T: CornerTableView> PredictionSchemeGeometricNormal<'a, T> {
    /// The corrections are only well defined in the canonicalized octahedron
    /// frame, so any other transform is rejected.
    pub fn new(
        transform: PredictionTransform,
        mesh_data: MeshPredictionSchemeData<'a, T>,
        position_attribute: &'a PointAttribute,
    ) -> CodecResult<Self> {
        if !matches!(transform, PredictionTransform::NormalOctahedronCanonicalized(_)) {
            return Err(unsupported(format!(
                "geometric normal prediction cannot use the {:?} transform",
                transform.transform_type()
            )));
        }
        if position_attribute.num_components() < 3 {
            return Err(unsupported("geometric normal prediction needs 3D positions"));
        }
        Ok(Self {
            transform,
            mesh_data,
            position_attribute,
            normal_prediction_mode: NormalPredictionMode::default(),
            flip_normal_bit_encoder: RAnsBitEncoder::new(),
            flip_normal_bits: Vec::new(),
        })
    }

    pub fn transform(&self) -> &PredictionTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PredictionTransform {
        &mut self.transform
    }

    pub fn normal_prediction_mode(&self) -> NormalPredictionMode {
        self.normal_prediction_mode
    }

    fn tool_box(&self) -> CodecResult<&OctahedronToolBox> {
        self.transform
            .octahedron_base()
            .map(|base| base.tool_box())
            .filter(|tool_box| tool_box.is_initialized())
            .ok_or_else(|| unsupported("geometric normal prediction without octahedron quantization"))
    }

    fn position_for_corner(&self, corner: CornerIndex, entry_to_point_ids: &[PointIndex]) -> CodecResult<[i64; 3]> {
        let data_id = self.mesh_data.data_id_of_corner(corner);
        let point_id = usize::try_from(data_id)
            .ok()
            .and_then(|id| entry_to_point_ids.get(id))
            .copied()
            .ok_or_else(|| corrupt(format!("corner {} has no decoded position", corner.0)))?;
        let mut pos = [0i64; 3];
        self.position_attribute
            .get_value(self.position_attribute.mapped_index(point_id), &mut pos)?;
        Ok(pos)
    }

    /// Sum of the face normals around the vertex of `corner_id`, scaled down
    /// when its L1 norm exceeds [`NORMAL_UPPER_BOUND`].
    fn compute_predicted_value(&self, corner_id: CornerIndex, entry_to_point_ids: &[PointIndex]) -> CodecResult<[i64; 3]> {
        let table = self.mesh_data.corner_table();
        let pos_cent = self.position_for_corner(corner_id, entry_to_point_ids)?;
        let mut normal = [0i64; 3];
        for corner in VertexCornersIterator::from_corner(table, corner_id) {
            let (c_next, c_prev) = match self.normal_prediction_mode {
                NormalPredictionMode::OneTriangle => (table.next(corner_id), table.previous(corner_id)),
                NormalPredictionMode::TriangleArea => (table.next(corner), table.previous(corner)),
            };
            let pos_next = self.position_for_corner(c_next, entry_to_point_ids)?;
            let pos_prev = self.position_for_corner(c_prev, entry_to_point_ids)?;
            let delta_next = sub3(pos_next, pos_cent);
            let delta_prev = sub3(pos_prev, pos_cent);
            let cross = cross3(delta_next, delta_prev);
            for i in 0..3 {
                normal[i] = normal[i].wrapping_add(cross[i]);
            }
        }

        let abs_sum = normal
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(v.unsigned_abs()));
        if abs_sum > NORMAL_UPPER_BOUND {
            let quotient = (abs_sum / NORMAL_UPPER_BOUND) as i64;
            for v in normal.iter_mut() {
                *v /= quotient;
            }
        }
        Ok(normal)
    }

    /// Canonicalized prediction, negated when `flip` is set, in octahedral coordinates.
    fn predicted_octahedral_coords(
        tool_box: &OctahedronToolBox,
        mut pred_normal_3d: [i64; 3],
        flip: bool,
    ) -> [i32; 2] {
        tool_box.canonicalize_integer_vector(&mut pred_normal_3d);
        if flip {
            pred_normal_3d = pred_normal_3d.map(|v| -v);
        }
        let int_vec = pred_normal_3d.map(|v| v as i32);
        let (s, t) = tool_box.integer_vector_to_quantized_octahedral_coords(&int_vec);
        [s, t]
    }

    pub fn compute_correction_values(
        &mut self,
        in_data: &[i32],
        out_corr: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        check_entry_count(&self.mesh_data, in_data.len(), out_corr.len(), num_components)?;
        self.transform.init_encoding(in_data, num_components)?;
        let tool_box = *self.tool_box()?;
        let mut flip_encoder = std::mem::take(&mut self.flip_normal_bit_encoder);
        flip_encoder.start_encoding();
        let mut pos_correction = [0i32; 2];
        let mut neg_correction = [0i32; 2];

        for (data_id, &corner_id) in self.mesh_data.data_to_corner_map().iter().enumerate() {
            let pred_normal_3d = self.compute_predicted_value(corner_id, entry_to_point_ids)?;
            let pos_pred = Self::predicted_octahedral_coords(&tool_box, pred_normal_3d, false);
            let neg_pred = Self::predicted_octahedral_coords(&tool_box, pred_normal_3d, true);

            let data_offset = data_id * 2;
            let original = &in_data[data_offset..data_offset + 2];
            self.transform.compute_correction(original, &pos_pred, &mut pos_correction);
            self.transform.compute_correction(original, &neg_pred, &mut neg_correction);
            for v in pos_correction.iter_mut().chain(neg_correction.iter_mut()) {
                *v = tool_box.mod_max(*v);
            }
            let pos_abs_sum = pos_correction[0].unsigned_abs() + pos_correction[1].unsigned_abs();
            let neg_abs_sum = neg_correction[0].unsigned_abs() + neg_correction[1].unsigned_abs();
            let chosen = if pos_abs_sum < neg_abs_sum {
                flip_encoder.encode_bit(false);
                &pos_correction
            } else {
                flip_encoder.encode_bit(true);
                &neg_correction
            };
            out_corr[data_offset] = tool_box.make_positive(chosen[0]);
            out_corr[data_offset + 1] = tool_box.make_positive(chosen[1]);
        }
        self.flip_normal_bit_encoder = flip_encoder;
        Ok(())
    }

    pub fn compute_original_values(
        &mut self,
        in_corr: &[i32],
        out_data: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        check_entry_count(&self.mesh_data, out_data.len(), in_corr.len(), num_components)?;
        self.transform.init_decoding(num_components)?;
        let tool_box = *self.tool_box()?;
        if self.flip_normal_bits.len() != self.mesh_data.data_to_corner_map().len() {
            return Err(corrupt(format!(
                "{} flip bits for {} normals",
                self.flip_normal_bits.len(),
                self.mesh_data.data_to_corner_map().len()
            )));
        }

        for (data_id, &corner_id) in self.mesh_data.data_to_corner_map().iter().enumerate() {
            let pred_normal_3d = self.compute_predicted_value(corner_id, entry_to_point_ids)?;
            let pred = Self::predicted_octahedral_coords(&tool_box, pred_normal_3d, self.flip_normal_bits[data_id]);
            let data_offset = data_id * 2;
            self.transform.compute_original_value(
                &pred,
                &in_corr[data_offset..data_offset + 2],
                &mut out_data[data_offset..data_offset + 2],
            );
        }
        Ok(())
    }

    /// Transform parameters, the prediction mode on streams older than 2.2,
    /// then the flip bits.
    pub fn encode_prediction_data(&mut self, buffer: &mut EncoderBuffer) -> Status {
        self.transform.encode_transform_data(buffer);
        if buffer.bitstream_version() < bitstream_version(2, 2) {
            buffer.encode_u8(self.normal_prediction_mode as u8);
        }
        self.flip_normal_bit_encoder.end_encoding(buffer)
    }

    /// Reads one flip bit per traversed normal.
    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        self.transform.decode_transform_data(buffer)?;
        if buffer.bitstream_version() < bitstream_version(2, 2) {
            self.normal_prediction_mode = NormalPredictionMode::from_u8(buffer.decode_u8()?)?;
        }
        let mut decoder = RAnsBitDecoder::new();
        decoder.start_decoding(buffer)?;
        let num_entries = self.mesh_data.data_to_corner_map().len();
        self.flip_normal_bits = (0..num_entries).map(|_| decoder.decode_next_bit()).collect();
        decoder.end_decoding();
        Ok(())
    }
}

fn sub3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [a[0].wrapping_sub(b[0]), a[1].wrapping_sub(b[1]), a[2].wrapping_sub(b[2])]
}

fn cross3(u: [i64; 3], v: [i64; 3]) -> [i64; 3] {
    [
        u[1].wrapping_mul(v[2]).wrapping_sub(u[2].wrapping_mul(v[1])),
        u[2].wrapping_mul(v[0]).wrapping_sub(u[0].wrapping_mul(v[2])),
        u[0].wrapping_mul(v[1]).wrapping_sub(u[1].wrapping_mul(v[0])),
    ]
}
