use crate::encoder_options::EncoderOptions;
use crate::geometry_attribute::GeometryAttributeType;
use crate::point_cloud::PointCloud;
use crate::prediction_scheme::PredictionSchemeMethod;
use crate::status::{CodecError, CodecResult};
use crate::traverser::TraversalMethod;

/// True when the position attribute exists and is available in an integer
/// domain, either natively or after quantization.
fn is_position_usable(point_cloud: &PointCloud, options: &EncoderOptions) -> bool {
    let pos_att_id = point_cloud.named_attribute_id(GeometryAttributeType::Position);
    let Some(pos_att) = point_cloud.named_attribute(GeometryAttributeType::Position) else {
        return false;
    };
    pos_att.num_components() == 3
        && (pos_att.data_type().is_integral() || options.quantization_bits(pos_att_id).is_some())
}

/// Picks the prediction method of attribute `att_id`. A method forced
/// through the options wins.
pub fn select_prediction_method(
    att_id: i32,
    point_cloud: &PointCloud,
    options: &EncoderOptions,
) -> CodecResult<PredictionSchemeMethod> {
    if let Some(forced) = options.prediction_scheme(att_id) {
        return PredictionSchemeMethod::from_option(forced);
    }
    let speed = options.encoding_speed();
    if speed >= 10 {
        return Ok(PredictionSchemeMethod::Difference);
    }
    let att = point_cloud.attribute(att_id);

    if att.attribute_type() == GeometryAttributeType::TexCoord && att.num_components() == 2 {
        if let Some(att_quant) = options.quantization_bits(att_id) {
            let pos_att_id = point_cloud.named_attribute_id(GeometryAttributeType::Position);
            // The scaled UV arithmetic must stay inside 64 bits.
            let fits = match point_cloud.named_attribute(GeometryAttributeType::Position) {
                Some(pos_att) if pos_att.data_type().is_integral() => true,
                Some(_) => options
                    .quantization_bits(pos_att_id)
                    .is_some_and(|pos_quant| pos_quant <= 21 && 2 * pos_quant + att_quant < 64),
                None => false,
            };
            if fits && is_position_usable(point_cloud, options) && speed < 4 {
                return Ok(PredictionSchemeMethod::TexCoordsPortable);
            }
        }
    }

    if att.attribute_type() == GeometryAttributeType::Normal {
        if speed < 4 && is_position_usable(point_cloud, options) {
            return Ok(PredictionSchemeMethod::GeometricNormal);
        }
        return Ok(PredictionSchemeMethod::Difference);
    }

    if speed >= 8 {
        return Ok(PredictionSchemeMethod::Difference);
    }
    if speed >= 2 || point_cloud.num_points() < 40 {
        return Ok(PredictionSchemeMethod::Parallelogram);
    }
    Ok(PredictionSchemeMethod::MultiParallelogram)
}

/// Max prediction degree traversal only pays off at the slowest speed.
pub fn select_traversal_method(att_id: i32, options: &EncoderOptions) -> CodecResult<TraversalMethod> {
    if let Some(forced) = options.traversal_method(att_id) {
        let code = u8::try_from(forced)
            .map_err(|_| CodecError::InvalidParameter(format!("traversal method {forced} out of range")))?;
        return TraversalMethod::from_u8(code).map_err(|e| CodecError::InvalidParameter(e.to_string()));
    }
    if options.encoding_speed() == 0 {
        Ok(TraversalMethod::MaxPredictionDegree)
    } else {
        Ok(TraversalMethod::DepthFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::DataType;
    use crate::geometry_attribute::PointAttribute;

    fn cloud(num_points: usize) -> PointCloud {
        let mut pc = PointCloud::new();
        pc.set_num_points(num_points);
        pc.add_attribute(PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, num_points));
        pc.add_attribute(PointAttribute::new(GeometryAttributeType::Normal, 3, DataType::Float32, false, num_points));
        pc.add_attribute(PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, num_points));
        pc
    }

    #[test]
    fn speed_policy() {
        let pc = cloud(100);
        let mut options = EncoderOptions::new();
        assert_eq!(select_prediction_method(0, &pc, &options).unwrap(), PredictionSchemeMethod::Parallelogram);
        assert_eq!(select_prediction_method(1, &pc, &options).unwrap(), PredictionSchemeMethod::Difference);

        options.set_encoding_speed(0);
        options.set_global_int("quantization_bits", 11);
        assert_eq!(select_prediction_method(0, &pc, &options).unwrap(), PredictionSchemeMethod::MultiParallelogram);
        assert_eq!(select_prediction_method(1, &pc, &options).unwrap(), PredictionSchemeMethod::GeometricNormal);
        assert_eq!(select_prediction_method(2, &pc, &options).unwrap(), PredictionSchemeMethod::TexCoordsPortable);
        assert_eq!(select_traversal_method(0, &options).unwrap(), TraversalMethod::MaxPredictionDegree);

        options.set_encoding_speed(10);
        assert_eq!(select_prediction_method(2, &pc, &options).unwrap(), PredictionSchemeMethod::Difference);
        assert_eq!(select_traversal_method(0, &options).unwrap(), TraversalMethod::DepthFirst);
    }

    #[test]
    fn small_meshes_use_parallelogram() {
        let pc = cloud(12);
        let mut options = EncoderOptions::new();
        options.set_encoding_speed(1);
        assert_eq!(select_prediction_method(0, &pc, &options).unwrap(), PredictionSchemeMethod::Parallelogram);
    }

    #[test]
    fn forced_methods_are_validated() {
        let pc = cloud(12);
        let mut options = EncoderOptions::new();
        options.set_prediction_scheme(0, 2);
        assert_eq!(select_prediction_method(0, &pc, &options).unwrap(), PredictionSchemeMethod::MultiParallelogram);
        options.set_prediction_scheme(0, 4);
        assert!(matches!(
            select_prediction_method(0, &pc, &options),
            Err(CodecError::InvalidParameter(_))
        ));
        options.set_traversal_method(0, 7);
        assert!(select_traversal_method(0, &options).is_err());
    }
}
