//! Averages the parallelogram predictions of every face around the
//! predicted vertex.

use crate::corner_table::CornerTableView;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::prediction_scheme_parallelogram::{check_entry_count, compute_parallelogram_prediction, corner_of_entry};
use crate::prediction_scheme_transform::PredictionTransform;
use crate::status::{CodecResult, Status};

pub struct PredictionSchemeMultiParallelogram<'a, T: CornerTableView> {
    transform: PredictionTransform,
    mesh_data: MeshPredictionSchemeData<'a, T>,
}

impl<'a, T: CornerTableView> PredictionSchemeMultiParallelogram<'a, T> {
    pub fn new(transform: PredictionTransform, mesh_data: MeshPredictionSchemeData<'a, T>) -> Self {
        Self { transform, mesh_data }
    }

    pub fn transform(&self) -> &PredictionTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut PredictionTransform {
        &mut self.transform
    }

    /// Writes the prediction of entry `p` into `pred_vals`. Falls back to
    /// entry `p - 1` when no surrounding face forms a complete parallelogram.
    fn predict(
        &self,
        p: usize,
        data: &[i32],
        num_components: usize,
        pred_vals: &mut [i32],
        scratch: &mut [i32],
        sums: &mut [i64],
    ) -> CodecResult<()> {
        let table = self.mesh_data.corner_table();
        let vertex_to_data_map = self.mesh_data.vertex_to_data_map();
        let start_corner_id = corner_of_entry(&self.mesh_data, p)?;

        sums.fill(0);
        let mut num_parallelograms = 0i64;
        let mut corner_id = start_corner_id;
        while corner_id.is_valid() {
            if compute_parallelogram_prediction(p, corner_id, table, vertex_to_data_map, data, num_components, scratch) {
                for (sum, v) in sums.iter_mut().zip(scratch.iter()) {
                    *sum += *v as i64;
                }
                num_parallelograms += 1;
            }
            corner_id = table.swing_right(corner_id);
            if corner_id == start_corner_id {
                break;
            }
        }

        if num_parallelograms == 0 {
            let offset = p * num_components;
            pred_vals.copy_from_slice(&data[offset - num_components..offset]);
        } else {
            for (pred, sum) in pred_vals.iter_mut().zip(sums.iter()) {
                *pred = (*sum / num_parallelograms) as i32;
            }
        }
        Ok(())
    }

    pub fn compute_correction_values(&mut self, in_data: &[i32], out_corr: &mut [i32], num_components: usize) -> Status {
        check_entry_count(&self.mesh_data, in_data.len(), out_corr.len(), num_components)?;
        self.transform.init_encoding(in_data, num_components)?;
        let nc = num_components;
        let mut pred_vals = vec![0i32; nc];
        let mut scratch = vec![0i32; nc];
        let mut sums = vec![0i64; nc];

        for p in (1..self.mesh_data.data_to_corner_map().len()).rev() {
            self.predict(p, in_data, nc, &mut pred_vals, &mut scratch, &mut sums)?;
            let dst_offset = p * nc;
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
        let mut pred_vals = vec![0i32; nc];
        let mut scratch = vec![0i32; nc];
        let mut sums = vec![0i64; nc];
        self.transform.compute_original_value(&pred_vals, &in_corr[..nc], &mut out_data[..nc]);

        for p in 1..self.mesh_data.data_to_corner_map().len() {
            self.predict(p, out_data, nc, &mut pred_vals, &mut scratch, &mut sums)?;
            let dst_offset = p * nc;
            self.transform
                .compute_original_value(&pred_vals, &in_corr[dst_offset..dst_offset + nc], &mut out_data[dst_offset..dst_offset + nc]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corner_table::CornerTable;
    use crate::geometry_indices::{CornerIndex, VertexIndex};
    use crate::prediction_scheme_delta::DeltaTransform;

    #[test]
    fn averages_around_the_fan() {
        // Closed fan around vertex 4 on a square; vertex 4 is encoded last.
        let faces: Vec<[VertexIndex; 3]> = [[4, 0, 1], [4, 1, 2], [4, 2, 3], [4, 3, 0], [0, 3, 2], [0, 2, 1]]
            .iter()
            .map(|f| f.map(VertexIndex))
            .collect();
        let table = CornerTable::create(&faces).unwrap();
        let data_to_corner = [CornerIndex(1), CornerIndex(2), CornerIndex(5), CornerIndex(8), CornerIndex(0)];
        let vertex_to_data = [0, 1, 2, 3, 4];
        let data = [0, 0, 10, 0, 10, 10, 0, 10, 5, 5];

        let mesh_data = MeshPredictionSchemeData::new(&table, &data_to_corner, &vertex_to_data);
        let mut scheme =
            PredictionSchemeMultiParallelogram::new(PredictionTransform::Delta(DeltaTransform::new()), mesh_data);
        let mut corr = [0; 10];
        scheme.compute_correction_values(&data, &mut corr, 2).unwrap();
        let mut out = [0; 10];
        scheme.compute_original_values(&corr, &mut out, 2).unwrap();
        assert_eq!(out, data);
    }
}
