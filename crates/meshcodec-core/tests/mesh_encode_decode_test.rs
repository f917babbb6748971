use meshcodec_core::data_type::DataType;
use meshcodec_core::decoder_buffer::DecoderBuffer;
use meshcodec_core::encoder_buffer::EncoderBuffer;
use meshcodec_core::encoder_options::EncoderOptions;
use meshcodec_core::geometry_attribute::{GeometryAttributeType, PointAttribute};
use meshcodec_core::geometry_indices::{AttributeValueIndex, FaceIndex, PointIndex};
use meshcodec_core::mesh::Mesh;
use meshcodec_core::mesh_decoder::MeshDecoder;
use meshcodec_core::mesh_encoder::MeshEncoder;
use meshcodec_core::status::CodecError;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const POS: i32 = 0;
const NORMAL: i32 = 1;
const TEX: i32 = 2;
const COLOR: i32 = 3;

/// Cube vertex ids of each side, counter-clockwise seen from outside.
const SIDE_QUADS: [[u32; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [3, 7, 6, 2],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
];

const SIDE_NORMALS: [[f32; 3]; 6] = [
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [0.0, -1.0, 0.0],
    [0.0, 1.0, 0.0],
    [-1.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
];

fn corner_position(v: u32) -> [f32; 3] {
    [(v & 1) as f32, ((v >> 1) & 1) as f32, (v >> 2) as f32]
}

/// Cube with four points per side: positions and colors are shared per cube
/// vertex, normals per side, texture coordinates are unique per point.
fn textured_cube() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_num_points(24);
    for s in 0..6u32 {
        mesh.add_face([PointIndex(4 * s), PointIndex(4 * s + 1), PointIndex(4 * s + 2)]);
        mesh.add_face([PointIndex(4 * s), PointIndex(4 * s + 2), PointIndex(4 * s + 3)]);
    }

    let mut pos = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, 8);
    let mut color = PointAttribute::new(GeometryAttributeType::Color, 3, DataType::Uint8, true, 8);
    for v in 0..8u32 {
        pos.set_value(AttributeValueIndex(v), &corner_position(v)).unwrap();
        color
            .set_value(AttributeValueIndex(v), &[(v * 30) as u8, 255 - (v * 20) as u8, 7])
            .unwrap();
    }
    let mut normal = PointAttribute::new(GeometryAttributeType::Normal, 3, DataType::Float32, false, 6);
    for (s, n) in SIDE_NORMALS.iter().enumerate() {
        normal.set_value(AttributeValueIndex(s as u32), n).unwrap();
    }
    pos.set_explicit_mapping(24);
    color.set_explicit_mapping(24);
    normal.set_explicit_mapping(24);
    for (s, quad) in SIDE_QUADS.iter().enumerate() {
        for (k, &v) in quad.iter().enumerate() {
            let point = PointIndex((4 * s + k) as u32);
            pos.set_point_map_entry(point, AttributeValueIndex(v));
            color.set_point_map_entry(point, AttributeValueIndex(v));
            normal.set_point_map_entry(point, AttributeValueIndex(s as u32));
        }
    }

    let mut tex = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, 24);
    for s in 0..6u32 {
        let origin = s as f32 / 6.0;
        let quad_uv = [[0.0, 0.0], [0.125, 0.0], [0.125, 0.125], [0.0, 0.125]];
        for (k, uv) in quad_uv.iter().enumerate() {
            tex.set_value(AttributeValueIndex(4 * s + k as u32), &[origin + uv[0], uv[1]])
                .unwrap();
        }
    }

    assert_eq!(mesh.add_attribute(pos), POS);
    assert_eq!(mesh.add_attribute(normal), NORMAL);
    assert_eq!(mesh.add_attribute(tex), TEX);
    assert_eq!(mesh.add_attribute(color), COLOR);
    mesh
}

fn encode(mesh: Mesh, options: &EncoderOptions) -> Result<Vec<u8>, CodecError> {
    let mut encoder = MeshEncoder::new();
    encoder.set_mesh(mesh);
    let mut buffer = EncoderBuffer::new();
    encoder.encode(options, &mut buffer)?;
    Ok(buffer.into_vec())
}

fn decode(data: &[u8]) -> Result<Mesh, CodecError> {
    let mut decoder = MeshDecoder::new();
    let mut mesh = Mesh::new();
    decoder.decode(&mut DecoderBuffer::new(data), &mut mesh)?;
    Ok(mesh)
}

fn value_at<const N: usize>(mesh: &Mesh, att_id: i32, face: usize, k: usize) -> [f32; N] {
    let att = mesh.attribute(att_id);
    let point = mesh.face(FaceIndex(face as u32))[k];
    let mut out = [0f32; N];
    att.get_value(att.mapped_index(point), &mut out).unwrap();
    out
}

/// Calls `check` with the original and decoded value of every face corner.
fn for_each_corner<const N: usize>(original: &Mesh, decoded: &Mesh, att_id: i32, check: impl Fn([f32; N], [f32; N])) {
    assert_eq!(decoded.num_faces(), original.num_faces());
    for f in 0..original.num_faces() {
        for k in 0..3 {
            check(value_at(original, att_id, f, k), value_at(decoded, att_id, f, k));
        }
    }
}

fn quantized_options(speed: i32) -> EncoderOptions {
    let mut options = EncoderOptions::new();
    options.set_encoding_speed(speed);
    options.set_quantization_bits(POS, 11);
    options.set_quantization_bits(NORMAL, 10);
    options.set_quantization_bits(TEX, 10);
    options
}

fn assert_close_normals(a: [f32; 3], b: [f32; 3]) {
    let dot = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
    assert!(dot > 0.999, "{a:?} decoded as {b:?}");
}

fn assert_close<const N: usize>(a: [f32; N], b: [f32; N], tolerance: f32) {
    for i in 0..N {
        assert!((a[i] - b[i]).abs() <= tolerance, "{a:?} decoded as {b:?}");
    }
}

#[test]
fn lossless_floats_decode_exactly() {
    init_tracing();
    let original = textured_cube();
    let data = encode(original.clone(), &EncoderOptions::new()).unwrap();
    let decoded = decode(&data).unwrap();

    assert_eq!(decoded.num_attributes(), 4);
    for att_id in 0..4 {
        let (a, b) = (original.attribute(att_id), decoded.attribute(att_id));
        assert_eq!(a.attribute_type(), b.attribute_type());
        assert_eq!(a.data_type(), b.data_type());
        assert_eq!(a.num_components(), b.num_components());
        assert_eq!(a.normalized(), b.normalized());
        assert_eq!(a.unique_id(), b.unique_id());
    }
    // One decoded value per attribute vertex: normals are split per side.
    assert_eq!(decoded.attribute(POS).size(), 8);
    assert_eq!(decoded.attribute(NORMAL).size(), 24);
    assert_eq!(decoded.attribute(TEX).size(), 24);
    assert_eq!(decoded.attribute(COLOR).size(), 8);
    for_each_corner::<3>(&original, &decoded, POS, |a, b| assert_eq!(a, b));
    for_each_corner::<3>(&original, &decoded, NORMAL, |a, b| assert_eq!(a, b));
    for_each_corner::<2>(&original, &decoded, TEX, |a, b| assert_eq!(a, b));
    for_each_corner::<3>(&original, &decoded, COLOR, |a, b| assert_eq!(a, b));
}

#[test]
fn quantized_cube_at_slowest_speed() {
    init_tracing();
    let original = textured_cube();
    let data = encode(original.clone(), &quantized_options(0)).unwrap();
    let decoded = decode(&data).unwrap();

    // Normal and texture seams run along every cube edge.
    assert_eq!(decoded.num_points(), 24);
    for_each_corner::<3>(&original, &decoded, POS, |a, b| assert_close(a, b, 1e-3));
    for_each_corner::<3>(&original, &decoded, NORMAL, assert_close_normals);
    for_each_corner::<2>(&original, &decoded, TEX, |a, b| assert_close(a, b, 2e-3));
    for_each_corner::<3>(&original, &decoded, COLOR, |a, b| assert_eq!(a, b));
}

#[test]
fn quantized_cube_at_default_speed() {
    let original = textured_cube();
    let data = encode(original.clone(), &quantized_options(5)).unwrap();
    let decoded = decode(&data).unwrap();
    for_each_corner::<3>(&original, &decoded, POS, |a, b| assert_close(a, b, 1e-3));
    for_each_corner::<3>(&original, &decoded, NORMAL, assert_close_normals);
    for_each_corner::<2>(&original, &decoded, TEX, |a, b| assert_close(a, b, 2e-3));
}

/// One point per vertex with a position and a texture coordinate derived
/// from its place in the plane.
fn sheet(faces: &[[u32; 3]], positions: &[[f32; 3]]) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_num_points(positions.len());
    for face in faces {
        mesh.add_face(face.map(PointIndex));
    }
    let mut pos = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, positions.len());
    let mut tex = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, positions.len());
    for (i, p) in positions.iter().enumerate() {
        pos.set_value(AttributeValueIndex(i as u32), p).unwrap();
        tex.set_value(AttributeValueIndex(i as u32), &[p[0] * 0.5, 0.25 + p[1] * 0.5])
            .unwrap();
    }
    assert_eq!(mesh.add_attribute(pos), POS);
    assert_eq!(mesh.add_attribute(tex), SHEET_TEX);
    mesh
}

const SHEET_TEX: i32 = 1;

fn sheet_options(speed: i32) -> EncoderOptions {
    let mut options = EncoderOptions::new();
    options.set_encoding_speed(speed);
    options.set_quantization_bits(POS, 11);
    options.set_quantization_bits(SHEET_TEX, 10);
    options
}

fn assert_sheet_round_trips(original: &Mesh) {
    for speed in [0, 5] {
        let data = encode(original.clone(), &sheet_options(speed)).unwrap();
        let decoded = decode(&data).unwrap();
        for_each_corner::<3>(original, &decoded, POS, |a, b| assert_close(a, b, 1e-3));
        for_each_corner::<2>(original, &decoded, SHEET_TEX, |a, b| assert_close(a, b, 2e-3));
    }
}

#[test]
fn bowtie_mesh_round_trips() {
    init_tracing();
    // Two triangles that share only vertex 0.
    let original = sheet(
        &[[0, 1, 2], [0, 3, 4]],
        &[[0.5, 0.5, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
    );
    assert_sheet_round_trips(&original);
}

#[test]
fn open_grid_with_a_hole_round_trips() {
    init_tracing();
    // 3 x 3 vertex grid, eight triangles with the last one left out.
    let mut positions = Vec::new();
    for y in 0..3 {
        for x in 0..3 {
            positions.push([x as f32 * 0.5, y as f32 * 0.5, (x * y) as f32 * 0.1]);
        }
    }
    let mut faces = Vec::new();
    for y in 0..2u32 {
        for x in 0..2u32 {
            let v = y * 3 + x;
            faces.push([v, v + 1, v + 4]);
            faces.push([v, v + 4, v + 3]);
        }
    }
    faces.pop();
    let original = sheet(&faces, &positions);
    assert_eq!(original.num_faces(), 7);
    assert_sheet_round_trips(&original);
}

#[test]
fn legacy_version_with_plain_octahedron_transform() {
    let original = textured_cube();
    let mut options = quantized_options(0);
    options.set_version(2, 1);
    options.set_attribute_int(NORMAL, "octahedron_canonicalized", 0);
    let data = encode(original.clone(), &options).unwrap();
    assert_eq!(&data[..2], &[2, 1]);
    let decoded = decode(&data).unwrap();
    for_each_corner::<3>(&original, &decoded, NORMAL, assert_close_normals);
    for_each_corner::<3>(&original, &decoded, POS, |a, b| assert_close(a, b, 1e-3));
}

#[test]
fn degenerate_faces_are_dropped() {
    let mut mesh = textured_cube();
    // Points 0 and 8 both sit on cube vertex 0.
    mesh.add_face([PointIndex(0), PointIndex(8), PointIndex(1)]);
    let mut encoder = MeshEncoder::new();
    encoder.set_mesh(mesh);
    let mut buffer = EncoderBuffer::new();
    encoder.encode(&EncoderOptions::new(), &mut buffer).unwrap();
    assert_eq!(encoder.num_encoded_faces(), 12);
    assert_eq!(decode(buffer.data()).unwrap().num_faces(), 12);
}

#[test]
fn face_with_unknown_vertex_is_rejected() {
    let mut buffer = EncoderBuffer::new();
    buffer.encode_u8(2);
    buffer.encode_u8(2);
    buffer.encode_varint(3);
    buffer.encode_varint(1);
    for v in [0, 1, 5] {
        buffer.encode_varint(v);
    }
    buffer.encode_varint(0);
    assert!(matches!(decode(buffer.data()), Err(CodecError::MalformedConnectivity(_))));
}

#[test]
fn truncated_streams_fail_cleanly() {
    let data = encode(textured_cube(), &quantized_options(0)).unwrap();
    for len in [0, 1, 2, 5, data.len() / 2, data.len() - 1] {
        assert!(decode(&data[..len]).is_err(), "prefix of {len} bytes decoded");
    }
}

#[test]
fn unsupported_version_is_rejected() {
    let mut options = EncoderOptions::new();
    options.set_version(3, 0);
    assert!(matches!(
        encode(textured_cube(), &options),
        Err(CodecError::InvalidParameter(_))
    ));
    let mut data = encode(textured_cube(), &EncoderOptions::new()).unwrap();
    data[1] = 9;
    assert!(matches!(decode(&data), Err(CodecError::UnsupportedConfiguration(_))));
}

#[test]
fn forced_methods_are_checked() {
    // Geometric normal prediction of positions.
    let mut options = quantized_options(5);
    options.set_prediction_scheme(POS, 6);
    assert!(matches!(
        encode(textured_cube(), &options),
        Err(CodecError::UnsupportedConfiguration(_))
    ));

    // Deprecated method code.
    let mut options = quantized_options(5);
    options.set_prediction_scheme(TEX, 4);
    assert!(matches!(encode(textured_cube(), &options), Err(CodecError::InvalidParameter(_))));

    // Parallelogram on unquantized floats.
    let mut options = EncoderOptions::new();
    options.set_prediction_scheme(TEX, 1);
    assert!(matches!(
        encode(textured_cube(), &options),
        Err(CodecError::UnsupportedConfiguration(_))
    ));

    // A forced method the data supports goes through.
    let mut options = quantized_options(5);
    options.set_prediction_scheme(POS, 2);
    options.set_traversal_method(POS, 1);
    let original = textured_cube();
    let decoded = decode(&encode(original.clone(), &options).unwrap()).unwrap();
    for_each_corner::<3>(&original, &decoded, POS, |a, b| assert_close(a, b, 1e-3));
}

#[test]
fn wide_attribute_types_are_refused() {
    let mut mesh = textured_cube();
    mesh.add_attribute(PointAttribute::new(GeometryAttributeType::Generic, 1, DataType::Float64, false, 24));
    assert!(matches!(
        encode(mesh, &EncoderOptions::new()),
        Err(CodecError::UnsupportedConfiguration(_))
    ));
}
