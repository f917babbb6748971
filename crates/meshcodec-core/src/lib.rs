//! Mesh connectivity and attribute prediction for triangle mesh compression.
//!
//! The corner table describes the connectivity, attribute corner tables
//! split it along attribute seams, traversers turn it into an encode order,
//! and prediction schemes with their transforms turn attribute values into
//! small corrections. [`MeshEncoder`] and [`MeshDecoder`] tie the pieces into
//! a byte stream.

#![allow(clippy::needless_range_loop)]

pub mod ans;
pub mod attribute_octahedron_transform;
pub mod attribute_quantization_transform;
pub mod attribute_transform;
pub mod corner_table;
pub mod corner_table_iterators;
pub mod data_buffer;
pub mod data_type;
pub mod decoder_buffer;
pub mod depth_first_traverser;
pub mod encoder_buffer;
pub mod encoder_options;
pub mod geometry_attribute;
pub mod geometry_indices;
pub mod math_utils;
pub mod max_prediction_degree_traverser;
pub mod mesh;
pub mod mesh_attribute_corner_table;
pub mod mesh_decoder;
pub mod mesh_encoder;
pub mod mesh_prediction_scheme_data;
pub mod mesh_traversal_sequencer;
pub mod normal_compression_utils;
pub mod point_cloud;
pub mod prediction_scheme;
pub mod prediction_scheme_delta;
pub mod prediction_scheme_geometric_normal;
pub mod prediction_scheme_multi_parallelogram;
pub mod prediction_scheme_normal_octahedron_canonicalized_transform;
pub mod prediction_scheme_normal_octahedron_transform;
pub mod prediction_scheme_parallelogram;
pub mod prediction_scheme_selection;
pub mod prediction_scheme_tex_coords_portable;
pub mod prediction_scheme_transform;
pub mod prediction_scheme_wrap;
pub mod quantization_utils;
pub mod rans_bit_decoder;
pub mod rans_bit_encoder;
pub mod status;
pub mod traverser;
pub mod version;

pub use ans::{AnsCoder, AnsDecoder};
pub use attribute_octahedron_transform::AttributeOctahedronTransform;
pub use attribute_quantization_transform::AttributeQuantizationTransform;
pub use attribute_transform::{AttributeTransform, AttributeTransformType};
pub use corner_table::{CornerTable, CornerTableView};
pub use corner_table_iterators::{VertexCornersIterator, VertexRingIterator};
pub use data_buffer::DataBuffer;
pub use data_type::DataType;
pub use decoder_buffer::DecoderBuffer;
pub use depth_first_traverser::DepthFirstTraverser;
pub use encoder_buffer::EncoderBuffer;
pub use encoder_options::EncoderOptions;
pub use geometry_attribute::{GeometryAttributeType, PointAttribute};
pub use geometry_indices::{
    AttributeValueIndex, CornerIndex, FaceIndex, PointIndex, VertexIndex, INVALID_ATTRIBUTE_VALUE_INDEX,
    INVALID_CORNER_INDEX, INVALID_FACE_INDEX, INVALID_POINT_INDEX, INVALID_VERTEX_INDEX,
};
pub use max_prediction_degree_traverser::MaxPredictionDegreeTraverser;
pub use mesh::Mesh;
pub use mesh_attribute_corner_table::MeshAttributeCornerTable;
pub use mesh_decoder::MeshDecoder;
pub use mesh_encoder::MeshEncoder;
pub use mesh_prediction_scheme_data::MeshPredictionSchemeData;
pub use mesh_traversal_sequencer::{MeshAttributeIndicesEncodingData, MeshTraversalSequencer, PointSequence};
pub use normal_compression_utils::OctahedronToolBox;
pub use point_cloud::PointCloud;
pub use prediction_scheme::{PredictionScheme, PredictionSchemeMethod};
pub use prediction_scheme_geometric_normal::NormalPredictionMode;
pub use prediction_scheme_transform::{PredictionSchemeTransformType, PredictionTransform};
pub use rans_bit_decoder::RAnsBitDecoder;
pub use rans_bit_encoder::RAnsBitEncoder;
pub use status::{CodecError, CodecResult, Status};
pub use traverser::{MeshTraverser, TraversalMethod, TraversalObserver};
