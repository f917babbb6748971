//! Mesh encoder.
//!
//! Stream layout: version, the face list over position vertices, one
//! descriptor per attribute (with its seam edges), then one value block per
//! attribute holding the prediction corrections. The position block comes
//! first so later blocks can predict from decoded positions.

use tracing::{debug, warn};

use crate::attribute_transform::AttributeTransform;
use crate::corner_table::{CornerTable, CornerTableView};
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::{CornerIndex, FaceIndex, VertexIndex};
use crate::mesh::Mesh;
use crate::mesh_attribute_corner_table::MeshAttributeCornerTable;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::mesh_traversal_sequencer::MeshTraversalSequencer;
use crate::prediction_scheme::{PredictionScheme, PredictionSchemeMethod};
use crate::prediction_scheme_delta::DeltaTransform;
use crate::prediction_scheme_normal_octahedron_canonicalized_transform::NormalOctahedronCanonicalizedTransform;
use crate::prediction_scheme_normal_octahedron_transform::NormalOctahedronTransform;
use crate::prediction_scheme_selection::{select_prediction_method, select_traversal_method};
use crate::prediction_scheme_transform::PredictionTransform;
use crate::prediction_scheme_wrap::WrapTransform;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{malformed, unsupported, CodecError, CodecResult, Status};
use crate::version::is_version_supported;

/// Faces that go into the stream, with degenerate faces removed.
struct EncodedConnectivity {
    /// Kept faces over the original point ids, no attributes.
    mesh: Mesh,
    /// Kept faces over position values.
    faces: Vec<[VertexIndex; 3]>,
    num_vertices: usize,
}

/// An attribute in its `i32` form.
struct PortableAttribute {
    transform: AttributeTransform,
    portable: PointAttribute,
}

impl PortableAttribute {
    fn new(attribute: &PointAttribute, att_id: i32, options: &EncoderOptions) -> CodecResult<Self> {
        let transform = AttributeTransform::for_attribute(attribute, att_id, options)?;
        let portable = transform.generate_portable_attribute(attribute)?;
        Ok(Self { transform, portable })
    }
}

#[derive(Default)]
pub struct MeshEncoder {
    mesh: Option<Mesh>,
    options: EncoderOptions,
    num_encoded_faces: usize,
}

impl MeshEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.mesh = Some(mesh);
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Faces written by the last [`encode`](Self::encode). Degenerate faces
    /// are not counted.
    pub fn num_encoded_faces(&self) -> usize {
        self.num_encoded_faces
    }

    pub fn encode(&mut self, options: &EncoderOptions, out_buffer: &mut EncoderBuffer) -> Status {
        self.options = options.clone();
        let mesh = self
            .mesh
            .as_ref()
            .ok_or_else(|| CodecError::InvalidParameter("mesh not set".to_string()))?;

        encode_header(&self.options, out_buffer)?;
        let connectivity = build_connectivity(mesh)?;
        encode_connectivity(&connectivity, out_buffer);
        let corner_table = CornerTable::create(&connectivity.faces)?;

        let pos_att_id = mesh.named_attribute_id(GeometryAttributeType::Position);
        let attribute_tables = encode_attribute_descriptors(mesh, &connectivity.mesh, &corner_table, out_buffer)?;

        let position = if pos_att_id >= 0 {
            Some(PortableAttribute::new(mesh.attribute(pos_att_id), pos_att_id, &self.options)?)
        } else {
            None
        };
        let geometric_position = position
            .as_ref()
            .filter(|p| p.transform.is_geometric())
            .map(|p| &p.portable);

        let encode_order = (pos_att_id >= 0)
            .then_some(pos_att_id)
            .into_iter()
            .chain((0..mesh.num_attributes()).filter(|&id| id != pos_att_id));
        for att_id in encode_order {
            let owned;
            let portable = match &position {
                Some(p) if att_id == pos_att_id => p,
                _ => {
                    owned = PortableAttribute::new(mesh.attribute(att_id), att_id, &self.options)?;
                    &owned
                }
            };
            let block = AttributeBlock {
                att_id,
                mesh,
                connectivity: &connectivity.mesh,
                portable,
                position: geometric_position,
                options: &self.options,
            };
            match &attribute_tables[att_id as usize] {
                Some(att_table) => block.encode(att_table, out_buffer)?,
                None => block.encode(&corner_table, out_buffer)?,
            }
        }

        self.num_encoded_faces = connectivity.faces.len();
        debug!(
            faces = self.num_encoded_faces,
            attributes = mesh.num_attributes(),
            bytes = out_buffer.size(),
            "mesh encoded"
        );
        Ok(())
    }
}

fn encode_header(options: &EncoderOptions, buffer: &mut EncoderBuffer) -> Status {
    let (major, minor) = options.version();
    if !is_version_supported(major, minor) {
        return Err(CodecError::InvalidParameter(format!(
            "cannot encode bitstream version {major}.{minor}"
        )));
    }
    buffer.encode_u8(major);
    buffer.encode_u8(minor);
    buffer.set_version(major, minor);
    Ok(())
}

/// Maps faces to position values and drops faces that collapse onto fewer
/// than three of them.
fn build_connectivity(mesh: &Mesh) -> CodecResult<EncodedConnectivity> {
    let num_points = mesh.num_points();
    let pos_att_id = mesh.named_attribute_id(GeometryAttributeType::Position);
    let (mapped_faces, num_vertices) = if pos_att_id >= 0 {
        (mesh.faces_mapped_through(pos_att_id), mesh.attribute(pos_att_id).size())
    } else {
        let faces = (0..mesh.num_faces())
            .map(|f| mesh.face(FaceIndex(f as u32)).map(|p| VertexIndex(p.0)))
            .collect();
        (faces, num_points)
    };

    let mut connectivity = Mesh::new();
    connectivity.set_num_points(num_points);
    let mut faces = Vec::with_capacity(mapped_faces.len());
    for (f, vertices) in mapped_faces.into_iter().enumerate() {
        let face = mesh.face(FaceIndex(f as u32));
        if let Some(p) = face.iter().find(|p| p.as_usize() >= num_points) {
            return Err(malformed(format!("face {f} references point {} of {num_points}", p.0)));
        }
        if vertices.iter().any(|v| v.as_usize() >= num_vertices) {
            return Err(malformed(format!("face {f} references a point without a position")));
        }
        let [v0, v1, v2] = vertices;
        if v0 == v1 || v0 == v2 || v1 == v2 {
            continue;
        }
        connectivity.add_face(face);
        faces.push(vertices);
    }
    let dropped = mesh.num_faces() - faces.len();
    if dropped > 0 {
        warn!("dropped {dropped} faces with coincident position vertices");
    }
    Ok(EncodedConnectivity {
        mesh: connectivity,
        faces,
        num_vertices,
    })
}

fn encode_connectivity(connectivity: &EncodedConnectivity, buffer: &mut EncoderBuffer) {
    buffer.encode_varint(connectivity.num_vertices as u64);
    buffer.encode_varint(connectivity.faces.len() as u64);
    for face in &connectivity.faces {
        for v in face {
            buffer.encode_varint(v.0 as u64);
        }
    }
}

/// Writes every attribute descriptor and builds the seam-split corner
/// table of each attribute other than the position.
fn encode_attribute_descriptors<'t>(
    mesh: &Mesh,
    connectivity: &Mesh,
    corner_table: &'t CornerTable,
    buffer: &mut EncoderBuffer,
) -> CodecResult<Vec<Option<MeshAttributeCornerTable<'t>>>> {
    let pos_att_id = mesh.named_attribute_id(GeometryAttributeType::Position);
    buffer.encode_varint(mesh.num_attributes() as u64);
    let mut tables = Vec::with_capacity(mesh.num_attributes() as usize);
    for att_id in 0..mesh.num_attributes() {
        let att = mesh.attribute(att_id);
        buffer.encode_u8(att.attribute_type() as u8);
        buffer.encode_u8(att.data_type() as u8);
        buffer.encode_u8(att.num_components());
        buffer.encode_u8(att.normalized() as u8);
        buffer.encode_varint(att.unique_id() as u64);
        if att_id == pos_att_id {
            buffer.encode_u8(0);
            tables.push(None);
            continue;
        }
        let att_table = MeshAttributeCornerTable::init_from_attribute(connectivity, corner_table, att)?;
        encode_seam_edges(&att_table, buffer)?;
        tables.push(Some(att_table));
    }
    Ok(tables)
}

/// One bit per interior edge, visited from its lower corner.
fn encode_seam_edges(att_table: &MeshAttributeCornerTable<'_>, buffer: &mut EncoderBuffer) -> Status {
    if att_table.no_interior_seams() {
        buffer.encode_u8(0);
        return Ok(());
    }
    buffer.encode_u8(1);
    let base = att_table.base_table();
    let mut encoder = RAnsBitEncoder::new();
    encoder.start_encoding();
    for ci in 0..base.num_corners() {
        let c = CornerIndex(ci as u32);
        let opp = base.opposite(c);
        if opp.is_valid() && opp > c {
            encoder.encode_bit(att_table.is_corner_opposite_to_seam_edge(c));
        }
    }
    encoder.end_encoding(buffer)
}

/// Everything needed to write the value block of one attribute.
struct AttributeBlock<'a> {
    att_id: i32,
    mesh: &'a Mesh,
    connectivity: &'a Mesh,
    portable: &'a PortableAttribute,
    position: Option<&'a PointAttribute>,
    options: &'a EncoderOptions,
}

impl AttributeBlock<'_> {
    fn encode<T: CornerTableView>(&self, table: &T, buffer: &mut EncoderBuffer) -> Status {
        let traversal = select_traversal_method(self.att_id, self.options)?;
        let method = self.prediction_method()?;
        let sequence = MeshTraversalSequencer::new(self.connectivity, table, traversal).generate_sequence()?;

        let portable = &self.portable.portable;
        let num_components = portable.num_components() as usize;
        let mut values = vec![0i32; sequence.point_ids.len() * num_components];
        for (entry, &point_id) in sequence.point_ids.iter().enumerate() {
            let offset = entry * num_components;
            portable.get_value(
                portable.mapped_index(point_id),
                &mut values[offset..offset + num_components],
            )?;
        }

        let transform = self.prediction_transform(&values)?;
        let mesh_data = MeshPredictionSchemeData::from_encoding_data(table, &sequence.encoding_data);
        let mut scheme = PredictionScheme::new(method, transform, Some(mesh_data), self.position)?;
        let mut corrections = vec![0i32; values.len()];
        scheme.compute_correction_values(&values, &mut corrections, num_components, &sequence.point_ids)?;
        debug!(
            attribute = self.att_id,
            ?traversal,
            ?method,
            transform = ?scheme.transform_type(),
            values = sequence.point_ids.len(),
            "attribute encoded"
        );

        buffer.encode_u8(traversal as u8);
        buffer.encode_i8(method as i8);
        buffer.encode_i8(scheme.transform_type() as i8);
        self.portable.transform.encode_parameters(buffer)?;
        if scheme.are_corrections_positive() {
            for &corr in &corrections {
                buffer.encode_varint(corr as u32 as u64);
            }
        } else {
            for &corr in &corrections {
                buffer.encode_varint_signed_i32(corr);
            }
        }
        scheme.encode_prediction_data(buffer)
    }

    /// Narrows the selected method to what the portable form supports.
    /// Raw floats only take differences; octahedral normals take
    /// differences or geometric prediction.
    fn prediction_method(&self) -> CodecResult<PredictionSchemeMethod> {
        let att_id = self.att_id;
        let forced = self.options.prediction_scheme(att_id).is_some();
        let method = select_prediction_method(att_id, self.mesh, self.options)?;
        let fallback = |reason: &str| {
            if forced {
                Err(unsupported(format!("attribute {att_id} cannot use {method:?} prediction: {reason}")))
            } else {
                debug!(attribute = att_id, ?method, "{reason}, using difference prediction");
                Ok(PredictionSchemeMethod::Difference)
            }
        };
        match (&self.portable.transform, method) {
            (_, PredictionSchemeMethod::Difference) => Ok(method),
            (AttributeTransform::RawFloat, _) => fallback("values are not quantized"),
            (AttributeTransform::Octahedron(_), PredictionSchemeMethod::GeometricNormal) => {
                if self.options.octahedron_canonicalized(att_id) {
                    Ok(method)
                } else {
                    fallback("octahedron canonicalization is disabled")
                }
            }
            (AttributeTransform::Octahedron(_), _) => fallback("normals only take difference or geometric prediction"),
            (_, PredictionSchemeMethod::GeometricNormal) => fallback("values are not octahedral normals"),
            _ => Ok(method),
        }
    }

    fn prediction_transform(&self, values: &[i32]) -> CodecResult<PredictionTransform> {
        Ok(match &self.portable.transform {
            AttributeTransform::Octahedron(octahedron) => {
                let max_quantized_value = octahedron.max_quantized_value();
                if self.options.octahedron_canonicalized(self.att_id) {
                    PredictionTransform::NormalOctahedronCanonicalized(NormalOctahedronCanonicalizedTransform::new(
                        max_quantized_value,
                    )?)
                } else {
                    PredictionTransform::NormalOctahedron(NormalOctahedronTransform::new(max_quantized_value)?)
                }
            }
            AttributeTransform::RawFloat => PredictionTransform::Delta(DeltaTransform::new()),
            _ if WrapTransform::can_wrap(values) => PredictionTransform::Wrap(WrapTransform::new()),
            _ => {
                warn!(attribute = self.att_id, "value range too wide to wrap, using plain deltas");
                PredictionTransform::Delta(DeltaTransform::new())
            }
        })
    }
}
