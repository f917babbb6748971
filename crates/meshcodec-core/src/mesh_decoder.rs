//! Mesh decoder, the inverse of [`MeshEncoder`](crate::mesh_encoder::MeshEncoder).
//!
//! Points are not stored in the stream. They are recreated from the corner
//! table: every vertex fan is split wherever one of the attribute corner
//! tables changes vertex, and each piece becomes a point.

use tracing::debug;

use crate::attribute_transform::AttributeTransform;
use crate::corner_table::{CornerTable, CornerTableView};
use crate::data_type::DataType;
use crate::decoder_buffer::DecoderBuffer;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::{AttributeValueIndex, CornerIndex, PointIndex, VertexIndex, INVALID_POINT_INDEX};
use crate::mesh::Mesh;
use crate::mesh_attribute_corner_table::MeshAttributeCornerTable;
use crate::mesh_prediction_scheme_data::MeshPredictionSchemeData;
use crate::mesh_traversal_sequencer::MeshTraversalSequencer;
use crate::prediction_scheme::{PredictionScheme, PredictionSchemeMethod};
use crate::prediction_scheme_transform::{PredictionSchemeTransformType, PredictionTransform};
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::status::{corrupt, malformed, unsupported, CodecResult, Status};
use crate::traverser::TraversalMethod;
use crate::version::is_version_supported;

struct AttributeDescriptor<'t> {
    attribute_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    unique_id: u32,
    /// `None` for the position attribute, which uses the base table.
    table: Option<MeshAttributeCornerTable<'t>>,
}

struct DecodedAttribute {
    transform: AttributeTransform,
    portable: PointAttribute,
    attribute: PointAttribute,
}

#[derive(Default)]
pub struct MeshDecoder {
    corner_table: Option<CornerTable>,
}

impl MeshDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connectivity rebuilt by the last successful [`decode`](Self::decode).
    pub fn corner_table(&self) -> Option<&CornerTable> {
        self.corner_table.as_ref()
    }

    pub fn decode(&mut self, in_buffer: &mut DecoderBuffer<'_>, out_mesh: &mut Mesh) -> Status {
        self.corner_table = None;
        let major = in_buffer.decode_u8()?;
        let minor = in_buffer.decode_u8()?;
        if !is_version_supported(major, minor) {
            return Err(unsupported(format!("bitstream version {major}.{minor}")));
        }
        in_buffer.set_version(major, minor);

        let faces = decode_connectivity(in_buffer)?;
        let corner_table = CornerTable::create(&faces)?;
        let mesh = {
            let descriptors = decode_attribute_descriptors(in_buffer, &corner_table)?;
            let mut mesh = assign_points_to_corners(&corner_table, &descriptors)?;
            let attributes = decode_attributes(&mesh, &corner_table, &descriptors, in_buffer)?;
            for attribute in attributes {
                let unique_id = attribute.unique_id();
                let att_id = mesh.add_attribute(attribute);
                mesh.attribute_mut(att_id).set_unique_id(unique_id);
            }
            mesh
        };
        debug!(
            faces = mesh.num_faces(),
            points = mesh.num_points(),
            attributes = mesh.num_attributes(),
            "mesh decoded"
        );
        *out_mesh = mesh;
        self.corner_table = Some(corner_table);
        Ok(())
    }
}

fn decode_count(buffer: &mut DecoderBuffer<'_>, what: &str) -> CodecResult<usize> {
    let value = buffer.decode_varint()?;
    u32::try_from(value)
        .map(|v| v as usize)
        .map_err(|_| corrupt(format!("{what} count {value} out of range")))
}

fn decode_connectivity(buffer: &mut DecoderBuffer<'_>) -> CodecResult<Vec<[VertexIndex; 3]>> {
    let num_vertices = decode_count(buffer, "vertex")?;
    let num_faces = decode_count(buffer, "face")?;
    // Every vertex id takes at least one byte.
    if num_faces * 3 > buffer.remaining_size() {
        return Err(corrupt(format!("{num_faces} faces do not fit the remaining data")));
    }
    let mut faces = Vec::with_capacity(num_faces);
    for f in 0..num_faces {
        let mut face = [VertexIndex(0); 3];
        for slot in face.iter_mut() {
            let v = buffer.decode_varint()?;
            if v >= num_vertices as u64 {
                return Err(malformed(format!("face {f} references vertex {v} of {num_vertices}")));
            }
            *slot = VertexIndex(v as u32);
        }
        faces.push(face);
    }
    Ok(faces)
}

fn decode_attribute_descriptors<'t>(
    buffer: &mut DecoderBuffer<'_>,
    corner_table: &'t CornerTable,
) -> CodecResult<Vec<AttributeDescriptor<'t>>> {
    let num_attributes = decode_count(buffer, "attribute")?;
    if num_attributes > buffer.remaining_size() {
        return Err(corrupt(format!("{num_attributes} attributes do not fit the remaining data")));
    }
    let mut has_position = false;
    let mut descriptors = Vec::with_capacity(num_attributes);
    for _ in 0..num_attributes {
        let attribute_type = GeometryAttributeType::from_u8(buffer.decode_u8()?)?;
        let data_type = DataType::from_u8(buffer.decode_u8()?)?;
        let num_components = buffer.decode_u8()?;
        if num_components == 0 {
            return Err(corrupt("attribute without components"));
        }
        let normalized = buffer.decode_u8()? != 0;
        let unique_id = buffer.decode_varint_u32()?;
        let seam_flag = buffer.decode_u8()?;

        let is_position = attribute_type == GeometryAttributeType::Position && !has_position;
        let table = if is_position {
            has_position = true;
            if seam_flag != 0 {
                return Err(corrupt("position attribute carries seam edges"));
            }
            None
        } else {
            Some(decode_seam_edges(seam_flag, corner_table, buffer)?)
        };
        descriptors.push(AttributeDescriptor {
            attribute_type,
            data_type,
            num_components,
            normalized,
            unique_id,
            table,
        });
    }
    Ok(descriptors)
}

/// Boundary edges are always seams; interior edges follow the decoded bits.
fn decode_seam_edges<'t>(
    seam_flag: u8,
    corner_table: &'t CornerTable,
    buffer: &mut DecoderBuffer<'_>,
) -> CodecResult<MeshAttributeCornerTable<'t>> {
    let mut att_table = MeshAttributeCornerTable::new_empty(corner_table);
    for ci in 0..corner_table.num_corners() {
        let c = CornerIndex(ci as u32);
        if !corner_table.opposite(c).is_valid() {
            att_table.add_seam_edge(c);
        }
    }
    match seam_flag {
        0 => {}
        1 => {
            let mut decoder = RAnsBitDecoder::new();
            decoder.start_decoding(buffer)?;
            for ci in 0..corner_table.num_corners() {
                let c = CornerIndex(ci as u32);
                let opp = corner_table.opposite(c);
                if opp.is_valid() && opp > c && decoder.decode_next_bit() {
                    att_table.add_seam_edge(c);
                }
            }
            decoder.end_decoding();
        }
        _ => return Err(corrupt(format!("unknown seam flag {seam_flag}"))),
    }
    att_table.recompute_vertices(None)?;
    Ok(att_table)
}

/// Creates one point per piece of every vertex fan, cutting the fan at
/// each corner where some attribute table switches vertex.
fn assign_points_to_corners(corner_table: &CornerTable, descriptors: &[AttributeDescriptor<'_>]) -> CodecResult<Mesh> {
    let att_tables: Vec<&MeshAttributeCornerTable<'_>> =
        descriptors.iter().filter_map(|d| d.table.as_ref()).collect();
    let mut corner_to_point = vec![INVALID_POINT_INDEX; corner_table.num_corners()];
    let mut num_points = 0u32;

    for vi in 0..corner_table.num_vertices() {
        let v = VertexIndex(vi as u32);
        let c = corner_table.left_most_corner(v);
        if !c.is_valid() {
            continue;
        }
        let mut first_c = c;
        if !corner_table.is_on_boundary(v) {
            // Closed fan: start right after a seam so no point spans one.
            'tables: for att_table in &att_tables {
                if !att_table.is_corner_on_seam(c) {
                    continue;
                }
                let vert_id = att_table.vertex(c);
                let mut act_c = corner_table.swing_right(c);
                while act_c != c {
                    if !act_c.is_valid() {
                        return Err(malformed(format!("fan of interior vertex {vi} is open")));
                    }
                    if att_table.vertex(act_c) != vert_id {
                        first_c = act_c;
                        break 'tables;
                    }
                    act_c = corner_table.swing_right(act_c);
                }
            }
        }

        corner_to_point[first_c.as_usize()] = PointIndex(num_points);
        num_points += 1;
        let mut prev_c = first_c;
        let mut act_c = corner_table.swing_right(first_c);
        while act_c.is_valid() && act_c != first_c {
            let crosses_seam = att_tables
                .iter()
                .any(|att_table| att_table.vertex(act_c) != att_table.vertex(prev_c));
            corner_to_point[act_c.as_usize()] = if crosses_seam {
                num_points += 1;
                PointIndex(num_points - 1)
            } else {
                corner_to_point[prev_c.as_usize()]
            };
            prev_c = act_c;
            act_c = corner_table.swing_right(act_c);
        }
    }

    if let Some(c) = corner_to_point.iter().position(|p| !p.is_valid()) {
        return Err(malformed(format!("corner {c} belongs to no vertex fan")));
    }
    let mut mesh = Mesh::new();
    for face in corner_to_point.chunks_exact(3) {
        mesh.add_face([face[0], face[1], face[2]]);
    }
    mesh.set_num_points(num_points as usize);
    Ok(mesh)
}

/// Decodes the value blocks, position first, and returns the attributes in
/// descriptor order.
fn decode_attributes(
    mesh: &Mesh,
    corner_table: &CornerTable,
    descriptors: &[AttributeDescriptor<'_>],
    buffer: &mut DecoderBuffer<'_>,
) -> CodecResult<Vec<PointAttribute>> {
    let mut decoded: Vec<Option<PointAttribute>> = vec![None; descriptors.len()];
    let pos_att_id = descriptors.iter().position(|d| d.table.is_none());

    let position = match pos_att_id {
        Some(pos) => {
            let block = decode_attribute_block(mesh, corner_table, &descriptors[pos], None, buffer)?;
            decoded[pos] = Some(block.attribute);
            block.transform.is_geometric().then_some(block.portable)
        }
        None => None,
    };

    for (att_id, descriptor) in descriptors.iter().enumerate() {
        let block = match &descriptor.table {
            Some(att_table) => decode_attribute_block(mesh, att_table, descriptor, position.as_ref(), buffer)?,
            None => continue,
        };
        decoded[att_id] = Some(block.attribute);
    }
    decoded
        .into_iter()
        .enumerate()
        .map(|(att_id, att)| att.ok_or_else(|| corrupt(format!("attribute {att_id} was not decoded"))))
        .collect()
}

fn decode_attribute_block<T: CornerTableView>(
    mesh: &Mesh,
    table: &T,
    descriptor: &AttributeDescriptor<'_>,
    position: Option<&PointAttribute>,
    buffer: &mut DecoderBuffer<'_>,
) -> CodecResult<DecodedAttribute> {
    let traversal = TraversalMethod::from_u8(buffer.decode_u8()?)?;
    let method = PredictionSchemeMethod::from_i8(buffer.decode_i8()?)?;
    let transform_type = PredictionSchemeTransformType::from_i8(buffer.decode_i8()?)?;
    let transform = AttributeTransform::decode_parameters(descriptor.data_type, descriptor.num_components, buffer)?;

    let sequencer = MeshTraversalSequencer::new(mesh, table, traversal);
    let sequence = sequencer.generate_sequence()?;
    let num_components = transform.portable_num_components(descriptor.num_components) as usize;
    let num_values = sequence.point_ids.len();
    let num_entries = num_values * num_components;
    if num_entries > buffer.remaining_size() {
        return Err(corrupt(format!("{num_entries} corrections do not fit the remaining data")));
    }

    let mesh_data = MeshPredictionSchemeData::from_encoding_data(table, &sequence.encoding_data);
    let mut scheme = PredictionScheme::new(
        method,
        PredictionTransform::for_decoding(transform_type),
        Some(mesh_data),
        position,
    )?;
    let corrections = if scheme.are_corrections_positive() {
        (0..num_entries)
            .map(|_| buffer.decode_varint_u32().map(|v| v as i32))
            .collect::<CodecResult<Vec<_>>>()?
    } else {
        (0..num_entries)
            .map(|_| buffer.decode_varint_signed_i32())
            .collect::<CodecResult<Vec<_>>>()?
    };
    scheme.decode_prediction_data(buffer)?;
    let mut values = vec![0i32; num_entries];
    scheme.compute_original_values(&corrections, &mut values, num_components, &sequence.point_ids)?;

    let mut portable = PointAttribute::new(
        descriptor.attribute_type,
        num_components as u8,
        DataType::Int32,
        false,
        num_values,
    );
    for (i, value) in values.chunks_exact(num_components).enumerate() {
        portable.set_value(AttributeValueIndex(i as u32), value)?;
    }
    sequencer.update_point_to_attribute_index_mapping(&mut portable, &sequence.encoding_data)?;

    let mut attribute = PointAttribute::new(
        descriptor.attribute_type,
        descriptor.num_components,
        descriptor.data_type,
        descriptor.normalized,
        num_values,
    );
    attribute.copy_mapping_from(&portable);
    transform.inverse_transform_attribute(&portable, &mut attribute)?;
    attribute.set_unique_id(descriptor.unique_id);
    debug!(
        attribute = descriptor.unique_id,
        ?traversal,
        ?method,
        ?transform_type,
        values = num_values,
        "attribute decoded"
    );
    Ok(DecodedAttribute {
        transform,
        portable,
        attribute,
    })
}
