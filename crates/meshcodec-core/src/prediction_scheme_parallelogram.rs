//! Parallelogram prediction: completes the parallelogram spanned by the
//! face across the edge opposite to the predicted corner.

use crate::corner_table::CornerTableView;
use crate::geometry_indices::CornerIndex;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::prediction_scheme_transform::PredictionTransform;
use crate::status::{corrupt, Status};

/// Predicts entry `data_entry_id` from the face opposite to `ci`.
///
/// Returns false when the opposite face does not exist or one of its three
/// entries has not been processed yet.
pub(crate) fn compute_parallelogram_prediction<T: CornerTableView>(
    data_entry_id: usize,
    ci: CornerIndex,
    table: &T,
    vertex_to_data_map: &[i32],
    in_data: &[i32],
    num_components: usize,
    out_prediction: &mut [i32],
) -> bool {
    let oci = table.opposite(ci);
    if !oci.is_valid() {
        return false;
    }
    let entry = |c: CornerIndex| -> Option<usize> {
        let v = table.vertex(c);
        if !v.is_valid() {
            return None;
        }
        let id = *vertex_to_data_map.get(v.as_usize())?;
        if id < 0 || id as usize >= data_entry_id {
            return None;
        }
        Some(id as usize)
    };
    let (Some(vert_opp), Some(vert_next), Some(vert_prev)) =
        (entry(oci), entry(table.next(oci)), entry(table.previous(oci)))
    else {
        return false;
    };

    let v_opp_off = vert_opp * num_components;
    let v_next_off = vert_next * num_components;
    let v_prev_off = vert_prev * num_components;
    for c in 0..num_components {
        let next = in_data[v_next_off + c] as i64;
        let prev = in_data[v_prev_off + c] as i64;
        let opp = in_data[v_opp_off + c] as i64;
        out_prediction[c] = (next + prev - opp) as i32;
    }
    true
}

/// Looks up the corner that introduced entry `p`.
pub(crate) fn corner_of_entry<T: CornerTableView>(mesh_data: &MeshPredictionSchemeData<'_, T>, p: usize) -> Result<CornerIndex, crate::status::CodecError> {
    mesh_data
        .data_to_corner_map()
        .get(p)
        .copied()
        .filter(|c| c.is_valid())
        .ok_or_else(|| corrupt(format!("no corner recorded for entry {p}")))
}

/// Checks that the correction and value arrays match the traversal.
pub(crate) fn check_entry_count<T: CornerTableView>(
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    values: usize,
    corrections: usize,
    num_components: usize,
) -> Status {
    if num_components == 0 || values != corrections || values != mesh_data.data_to_corner_map().len() * num_components {
        return Err(corrupt(format!(
            "{} values for {} traversed entries of {} components",
            corrections,
            mesh_data.data_to_corner_map().len(),
            num_components
        )));
    }
    Ok(())
}

pub struct PredictionSchemeParallelogram<'a, T: CornerTableView> {
    transform: PredictionTransform,
    mesh_data: MeshPredictionSchemeData<'a, T>,
}

impl<'a, T: CornerTableView> PredictionSchemeParallelogram<'a, T> {
    pub fn new(transform: PredictionTransform, mesh_data: MeshPredictionSchemeData<'a, T>) -> Self {
        Self { transform, mesh_data }
    }

    pub fn transform(&self) -> &PredictionTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PredictionTransform {
        &mut self.transform
    }

    pub fn compute_correction_values(&mut self, in_data: &[i32], out_corr: &mut [i32], num_components: usize) -> Status {
        check_entry_count(&self.mesh_data, in_data.len(), out_corr.len(), num_components)?;
        self.transform.init_encoding(in_data, num_components)?;
        let nc = num_components;
        let table = self.mesh_data.corner_table();
        let vertex_to_data_map = self.mesh_data.vertex_to_data_map();
        let mut pred_vals = vec![0i32; nc];

        for p in (1..self.mesh_data.data_to_corner_map().len()).rev() {
            let corner_id = corner_of_entry(&self.mesh_data, p)?;
            let dst_offset = p * nc;
            if !compute_parallelogram_prediction(p, corner_id, table, vertex_to_data_map, in_data, nc, &mut pred_vals) {
                pred_vals.copy_from_slice(&in_data[dst_offset - nc..dst_offset]);
            }
            self.transform
                .compute_correction(&in_data[dst_offset..dst_offset + nc], &pred_vals, &mut out_corr[dst_offset..dst_offset + nc]);
        }
        if !in_data.is_empty() {
            pred_vals.fill(0);
            self.transform.compute_correction(&in_data[..nc], &pred_vals, &mut out_corr[..nc]);
        }
        Ok(())
    }

    pub fn compute_original_values(&mut self, in_corr: &[i32], out_data: &mut [i32], num_components: usize) -> Status {
        check_entry_count(&self.mesh_data, out_data.len(), in_corr.len(), num_components)?;
        self.transform.init_decoding(num_components)?;
        let nc = num_components;
        if out_data.is_empty() {
            return Ok(());
        }
        let table = self.mesh_data.corner_table();
        let vertex_to_data_map = self.mesh_data.vertex_to_data_map();
        let mut pred_vals = vec![0i32; nc];
        self.transform.compute_original_value(&pred_vals, &in_corr[..nc], &mut out_data[..nc]);

        for p in 1..self.mesh_data.data_to_corner_map().len() {
            let corner_id = corner_of_entry(&self.mesh_data, p)?;
            let dst_offset = p * nc;
            if !compute_parallelogram_prediction(p, corner_id, table, vertex_to_data_map, out_data, nc, &mut pred_vals) {
                pred_vals.copy_from_slice(&out_data[dst_offset - nc..dst_offset]);
            }
            self.transform
                .compute_original_value(&pred_vals, &in_corr[dst_offset..dst_offset + nc], &mut out_data[dst_offset..dst_offset + nc]);
        }
        Ok(())
    }
}
