//! Texture coordinate prediction from the shape of the position triangle.
//!
//! The tip UV is placed so that the UV triangle is similar to the position
//! triangle. The construction has a mirror ambiguity; the encoder picks the
//! closer of the two candidates and stores one orientation bit for every
//! prediction that used positions. All arithmetic is integral so both sides
//! reproduce the prediction bit for bit.

use crate::corner_table::CornerTableView;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{CornerIndex, PointIndex};
use crate::math_utils::int_sqrt;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::prediction_scheme_parallelogram::{check_entry_count, corner_of_entry};
use crate::prediction_scheme_transform::PredictionTransform;
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{corrupt, unsupported, CodecError, CodecResult, Status};

const NUM_COMPONENTS: usize = 2;

/// Whether the predictor records a new orientation or consumes a decoded one.
enum Orientation<'o> {
    Record(&'o mut Vec<bool>),
    Replay(&'o mut Vec<bool>),
}

pub struct PredictionSchemeTexCoordsPortable<'a, T: CornerTableView> {
    transform: PredictionTransform,
    mesh_data: MeshPredictionSchemeData<'a, T>,
    position_attribute: &'a PointAttribute,
    orientations: Vec<bool>,
}

impl<'a, T: CornerTableView> PredictionSchemeTexCoordsPortable<'a, T> {
    pub fn new(
        transform: PredictionTransform,
        mesh_data: MeshPredictionSchemeData<'a, T>,
        position_attribute: &'a PointAttribute,
    ) -> Self {
        Self {
            transform,
            mesh_data,
            position_attribute,
            orientations: Vec::new(),
        }
    }

    pub fn transform(&self) -> &PredictionTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PredictionTransform {
        &mut self.transform
    }

    /// Orientation bits in the order they were recorded.
    pub fn orientations(&self) -> &[bool] {
        &self.orientations
    }

    pub fn compute_correction_values(
        &mut self,
        in_data: &[i32],
        out_corr: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        check_num_components(num_components)?;
        check_entry_count(&self.mesh_data, in_data.len(), out_corr.len(), num_components)?;
        self.transform.init_encoding(in_data, num_components)?;
        let mut orientations = std::mem::take(&mut self.orientations);
        orientations.clear();

        for p in (0..self.mesh_data.data_to_corner_map().len()).rev() {
            let corner_id = corner_of_entry(&self.mesh_data, p)?;
            let predicted = self.compute_predicted_value(
                corner_id,
                in_data,
                p,
                entry_to_point_ids,
                Orientation::Record(&mut orientations),
            )?;
            let dst_offset = p * NUM_COMPONENTS;
            self.transform.compute_correction(
                &in_data[dst_offset..dst_offset + NUM_COMPONENTS],
                &predicted,
                &mut out_corr[dst_offset..dst_offset + NUM_COMPONENTS],
            );
        }
        self.orientations = orientations;
        Ok(())
    }

    pub fn compute_original_values(
        &mut self,
        in_corr: &[i32],
        out_data: &mut [i32],
        num_components: usize,
        entry_to_point_ids: &[PointIndex],
    ) -> Status {
        check_num_components(num_components)?;
        check_entry_count(&self.mesh_data, out_data.len(), in_corr.len(), num_components)?;
        self.transform.init_decoding(num_components)?;
        let mut orientations = std::mem::take(&mut self.orientations);

        for p in 0..self.mesh_data.data_to_corner_map().len() {
            let corner_id = corner_of_entry(&self.mesh_data, p)?;
            let predicted = self.compute_predicted_value(
                corner_id,
                out_data,
                p,
                entry_to_point_ids,
                Orientation::Replay(&mut orientations),
            )?;
            let dst_offset = p * NUM_COMPONENTS;
            self.transform.compute_original_value(
                &predicted,
                &in_corr[dst_offset..dst_offset + NUM_COMPONENTS],
                &mut out_data[dst_offset..dst_offset + NUM_COMPONENTS],
            );
        }
        self.orientations = orientations;
        Ok(())
    }

    /// Writes the orientation count, the orientation bits delta coded against
    /// the previous bit, then the transform parameters.
    pub fn encode_prediction_data(&self, buffer: &mut EncoderBuffer) -> Status {
        let num_orientations = i32::try_from(self.orientations.len())
            .map_err(|_| CodecError::InvalidParameter("too many orientation bits".into()))?;
        buffer.encode_i32(num_orientations);
        let mut last_orientation = true;
        let mut encoder = RAnsBitEncoder::new();
        encoder.start_encoding();
        for &orientation in &self.orientations {
            encoder.encode_bit(orientation == last_orientation);
            last_orientation = orientation;
        }
        encoder.end_encoding(buffer)?;
        self.transform.encode_transform_data(buffer);
        Ok(())
    }

    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        let num_orientations = buffer.decode_i32()?;
        if num_orientations < 0 {
            return Err(corrupt(format!("negative orientation count {num_orientations}")));
        }
        let num_orientations = num_orientations as usize;
        // Every orientation belongs to a traversed entry.
        if num_orientations > self.mesh_data.data_to_corner_map().len() {
            return Err(corrupt(format!(
                "{num_orientations} orientations for {} entries",
                self.mesh_data.data_to_corner_map().len()
            )));
        }
        self.orientations.clear();
        self.orientations.reserve(num_orientations);
        let mut last_orientation = true;
        let mut decoder = RAnsBitDecoder::new();
        decoder.start_decoding(buffer)?;
        for _ in 0..num_orientations {
            if !decoder.decode_next_bit() {
                last_orientation = !last_orientation;
            }
            self.orientations.push(last_orientation);
        }
        decoder.end_decoding();
        self.transform.decode_transform_data(buffer)
    }

    fn tex_coord(data: &[i32], entry_id: usize) -> [i64; 2] {
        let offset = entry_id * NUM_COMPONENTS;
        [data[offset] as i64, data[offset + 1] as i64]
    }

    fn position(&self, entry_id: usize, entry_to_point_ids: &[PointIndex]) -> CodecResult<[i64; 3]> {
        let point_id = entry_to_point_ids
            .get(entry_id)
            .copied()
            .ok_or_else(|| corrupt(format!("entry {entry_id} has no point")))?;
        let mut pos = [0i64; 3];
        self.position_attribute
            .get_value(self.position_attribute.mapped_index(point_id), &mut pos)?;
        Ok(pos)
    }

    fn compute_predicted_value(
        &self,
        corner_id: CornerIndex,
        data: &[i32],
        data_id: usize,
        entry_to_point_ids: &[PointIndex],
        orientation: Orientation<'_>,
    ) -> CodecResult<[i32; NUM_COMPONENTS]> {
        let table = self.mesh_data.corner_table();
        let next_data_id = self.mesh_data.data_id_of_corner(table.next(corner_id));
        let prev_data_id = self.mesh_data.data_id_of_corner(table.previous(corner_id));
        if next_data_id < 0 || prev_data_id < 0 {
            return Err(corrupt(format!("corner {} has an unmapped neighbor", corner_id.0)));
        }
        let (next_data_id, prev_data_id) = (next_data_id as usize, prev_data_id as usize);

        if prev_data_id < data_id && next_data_id < data_id {
            let n_uv = Self::tex_coord(data, next_data_id);
            let p_uv = Self::tex_coord(data, prev_data_id);
            if p_uv == n_uv {
                // Degenerate UV triangle.
                return Ok([p_uv[0] as i32, p_uv[1] as i32]);
            }

            let tip_pos = self.position(data_id, entry_to_point_ids)?;
            let next_pos = self.position(next_data_id, entry_to_point_ids)?;
            let prev_pos = self.position(prev_data_id, entry_to_point_ids)?;

            let pn = sub3(prev_pos, next_pos);
            let pn_norm2_squared = squared_norm3(pn);
            if pn_norm2_squared != 0 {
                // Work in UV space scaled by |PN|^2 so that the projection of
                // the tip onto PN stays integral.
                let cn = sub3(tip_pos, next_pos);
                let cn_dot_pn = dot3(pn, cn);
                let pn_uv = [p_uv[0].wrapping_sub(n_uv[0]), p_uv[1].wrapping_sub(n_uv[1])];

                // Input the encoder cannot represent is a caller error; on the
                // decoding side it can only come from a corrupt stream.
                let encoding = matches!(orientation, Orientation::Record(_));
                let overflow = || {
                    if encoding {
                        CodecError::InvalidParameter("texture coordinate prediction overflows".into())
                    } else {
                        corrupt("texture coordinate prediction overflows")
                    }
                };
                let n_uv_absmax_element = n_uv[0].unsigned_abs().max(n_uv[1].unsigned_abs());
                if exceeds_i64_product(n_uv_absmax_element, pn_norm2_squared) {
                    return Err(overflow());
                }
                let pn_uv_absmax_element = pn_uv[0].unsigned_abs().max(pn_uv[1].unsigned_abs());
                if exceeds_i64_product(cn_dot_pn.unsigned_abs(), pn_uv_absmax_element) {
                    return Err(overflow());
                }
                let scale = pn_norm2_squared as i64;
                let x_uv = [
                    n_uv[0].wrapping_mul(scale).wrapping_add(cn_dot_pn.wrapping_mul(pn_uv[0])),
                    n_uv[1].wrapping_mul(scale).wrapping_add(cn_dot_pn.wrapping_mul(pn_uv[1])),
                ];
                let pn_absmax_element = pn[0].unsigned_abs().max(pn[1].unsigned_abs()).max(pn[2].unsigned_abs());
                if exceeds_i64_product(cn_dot_pn.unsigned_abs(), pn_absmax_element) {
                    return Err(overflow());
                }

                // Foot of the tip on PN, back in position space.
                let x_pos = [
                    next_pos[0].wrapping_add(cn_dot_pn.wrapping_mul(pn[0]).wrapping_div(scale)),
                    next_pos[1].wrapping_add(cn_dot_pn.wrapping_mul(pn[1]).wrapping_div(scale)),
                    next_pos[2].wrapping_add(cn_dot_pn.wrapping_mul(pn[2]).wrapping_div(scale)),
                ];
                let cx_norm2_squared = squared_norm3(sub3(tip_pos, x_pos));

                // PN_UV rotated by 90 degrees and scaled by |CX| * |PN|.
                let norm_squared = int_sqrt(cx_norm2_squared.wrapping_mul(pn_norm2_squared)) as i64;
                let cx_uv = [
                    pn_uv[1].wrapping_mul(norm_squared),
                    pn_uv[0].wrapping_neg().wrapping_mul(norm_squared),
                ];
                let plus = [
                    x_uv[0].wrapping_add(cx_uv[0]).wrapping_div(scale),
                    x_uv[1].wrapping_add(cx_uv[1]).wrapping_div(scale),
                ];
                let minus = [
                    x_uv[0].wrapping_sub(cx_uv[0]).wrapping_div(scale),
                    x_uv[1].wrapping_sub(cx_uv[1]).wrapping_div(scale),
                ];

                let predicted_uv = match orientation {
                    Orientation::Record(orientations) => {
                        let c_uv = Self::tex_coord(data, data_id);
                        let d_plus = squared_norm2([c_uv[0].wrapping_sub(plus[0]), c_uv[1].wrapping_sub(plus[1])]);
                        let d_minus = squared_norm2([c_uv[0].wrapping_sub(minus[0]), c_uv[1].wrapping_sub(minus[1])]);
                        if d_plus < d_minus {
                            orientations.push(true);
                            plus
                        } else {
                            orientations.push(false);
                            minus
                        }
                    }
                    Orientation::Replay(orientations) => {
                        match orientations.pop() {
                            Some(true) => plus,
                            Some(false) => minus,
                            None => return Err(corrupt("ran out of texture coordinate orientations")),
                        }
                    }
                };
                return Ok([predicted_uv[0] as i32, predicted_uv[1] as i32]);
            }
        }

        // No usable triangle: predict from the nearest processed entry.
        let data_offset = if next_data_id < data_id {
            next_data_id * NUM_COMPONENTS
        } else if data_id > 0 {
            (data_id - 1) * NUM_COMPONENTS
        } else {
            return Ok([0; NUM_COMPONENTS]);
        };
        Ok([data[data_offset], data[data_offset + 1]])
    }
}

fn check_num_components(num_components: usize) -> Status {
    if num_components != NUM_COMPONENTS {
        return Err(unsupported(format!(
            "texture coordinate prediction needs {NUM_COMPONENTS} components, got {num_components}"
        )));
    }
    Ok(())
}

/// True when `a * b` would not fit an `i64`.
fn exceeds_i64_product(a: u64, b: u64) -> bool {
    b != 0 && a > i64::MAX as u64 / b
}

fn sub3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [a[0].wrapping_sub(b[0]), a[1].wrapping_sub(b[1]), a[2].wrapping_sub(b[2])]
}

fn dot3(a: [i64; 3], b: [i64; 3]) -> i64 {
    a[0].wrapping_mul(b[0])
        .wrapping_add(a[1].wrapping_mul(b[1]))
        .wrapping_add(a[2].wrapping_mul(b[2]))
}

fn squared_norm3(a: [i64; 3]) -> u64 {
    dot3(a, a) as u64
}

fn squared_norm2(a: [i64; 2]) -> u64 {
    (a[0].wrapping_mul(a[0]) as u64).wrapping_add(a[1].wrapping_mul(a[1]) as u64)
}
