use meshcodec_core::corner_table::{CornerTable, CornerTableView};
use meshcodec_core::data_type::DataType;
use meshcodec_core::depth_first_traverser::DepthFirstTraverser;
use meshcodec_core::geometry_attribute::{GeometryAttributeType, PointAttribute};
use meshcodec_core::geometry_indices::{AttributeValueIndex, CornerIndex, FaceIndex, PointIndex, VertexIndex};
use meshcodec_core::max_prediction_degree_traverser::MaxPredictionDegreeTraverser;
use meshcodec_core::mesh::Mesh;
use meshcodec_core::mesh_traversal_sequencer::MeshTraversalSequencer;
use meshcodec_core::traverser::{MeshTraverser, TraversalMethod, TraversalObserver};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `n` x `m` grid of vertices split into triangles. With `wrap` the grid is
/// closed into a torus, otherwise it is a flat sheet with a boundary.
fn grid_mesh(n: u32, m: u32, wrap: bool) -> Mesh {
    let mut mesh = Mesh::new();
    let (rows, cols) = if wrap { (n, m) } else { (n - 1, m - 1) };
    for i in 0..rows {
        for j in 0..cols {
            let v00 = i * m + j;
            let v10 = ((i + 1) % n) * m + j;
            let v01 = i * m + (j + 1) % m;
            let v11 = ((i + 1) % n) * m + (j + 1) % m;
            mesh.add_face([PointIndex(v00), PointIndex(v10), PointIndex(v01)]);
            mesh.add_face([PointIndex(v10), PointIndex(v11), PointIndex(v01)]);
        }
    }
    let mut pos = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, (n * m) as usize);
    for v in 0..n * m {
        let p = [(v / m) as f32, (v % m) as f32, 0.0];
        pos.set_value(AttributeValueIndex(v), &p).unwrap();
    }
    mesh.add_attribute(pos);
    mesh
}

fn table_for(mesh: &Mesh) -> CornerTable {
    CornerTable::create(&mesh.faces_mapped_through(0)).unwrap()
}

fn check_sequence(mesh: &Mesh, table: &CornerTable, method: TraversalMethod) {
    let sequencer = MeshTraversalSequencer::new(mesh, table, method);
    let sequence = sequencer.generate_sequence().unwrap();
    let data = &sequence.encoding_data;

    assert_eq!(sequence.point_ids.len(), table.num_vertices());
    assert_eq!(data.num_values as usize, table.num_vertices());

    let mut order = data.vertex_to_encoded_attribute_value_index_map.clone();
    order.sort_unstable();
    assert_eq!(order, (0..table.num_vertices() as i32).collect::<Vec<_>>(), "{method:?}");

    for (i, &corner) in data.encoded_attribute_value_index_to_corner_map.iter().enumerate() {
        let v = table.vertex(corner);
        assert_eq!(data.vertex_to_encoded_attribute_value_index_map[v.as_usize()], i as i32);
        assert_eq!(sequence.point_ids[i], mesh.corner_to_point_id(corner));
    }
}

#[test]
fn sequences_cover_every_vertex_of_a_torus() {
    init_tracing();
    let mesh = grid_mesh(5, 5, true);
    let table = table_for(&mesh);
    check_sequence(&mesh, &table, TraversalMethod::DepthFirst);
    check_sequence(&mesh, &table, TraversalMethod::MaxPredictionDegree);
}

#[test]
fn sequences_cover_every_vertex_of_an_open_sheet() {
    init_tracing();
    let mesh = grid_mesh(6, 4, false);
    let table = table_for(&mesh);
    assert!(table.is_on_boundary(VertexIndex(0)));
    check_sequence(&mesh, &table, TraversalMethod::DepthFirst);
    check_sequence(&mesh, &table, TraversalMethod::MaxPredictionDegree);
}

#[test]
fn disconnected_components_are_all_reached() {
    let mut mesh = Mesh::new();
    mesh.add_face([PointIndex(0), PointIndex(1), PointIndex(2)]);
    mesh.add_face([PointIndex(3), PointIndex(4), PointIndex(5)]);
    mesh.add_face([PointIndex(3), PointIndex(5), PointIndex(6)]);
    let pos = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, 7);
    mesh.add_attribute(pos);
    let table = table_for(&mesh);
    check_sequence(&mesh, &table, TraversalMethod::DepthFirst);
    check_sequence(&mesh, &table, TraversalMethod::MaxPredictionDegree);
}

#[test]
fn mapping_points_into_encode_order() {
    let mesh = grid_mesh(4, 4, true);
    let table = table_for(&mesh);
    let sequencer = MeshTraversalSequencer::new(&mesh, &table, TraversalMethod::DepthFirst);
    let sequence = sequencer.generate_sequence().unwrap();

    let mut att = PointAttribute::new(GeometryAttributeType::Position, 3, DataType::Float32, false, 16);
    sequencer
        .update_point_to_attribute_index_mapping(&mut att, &sequence.encoding_data)
        .unwrap();
    assert!(!att.is_mapping_identity());
    for (i, &point) in sequence.point_ids.iter().enumerate() {
        assert_eq!(att.mapped_index(point), AttributeValueIndex(i as u32));
    }
}

#[derive(Default)]
struct Recorder {
    faces: Vec<FaceIndex>,
    vertices: Vec<(VertexIndex, CornerIndex)>,
}

impl TraversalObserver for Recorder {
    fn on_new_face_visited(&mut self, face: FaceIndex) {
        self.faces.push(face);
    }

    fn on_new_vertex_visited(&mut self, vertex: VertexIndex, corner: CornerIndex) {
        self.vertices.push((vertex, corner));
    }
}

fn run<M: MeshTraverser<Observer = Recorder>>(mut traverser: M) -> Recorder {
    traverser.on_traversal_start();
    for f in 0..traverser.num_faces() {
        traverser.traverse_from_corner(CornerIndex(3 * f as u32)).unwrap();
    }
    traverser.on_traversal_end();
    traverser.into_observer()
}

#[test]
fn traversers_report_each_face_once() {
    let mesh = grid_mesh(5, 5, true);
    let table = table_for(&mesh);
    for recorder in [
        run(DepthFirstTraverser::new(&table, Recorder::default())),
        run(MaxPredictionDegreeTraverser::new(&table, Recorder::default())),
    ] {
        let mut faces: Vec<u32> = recorder.faces.iter().map(|f| f.0).collect();
        faces.sort_unstable();
        assert_eq!(faces, (0..table.num_faces() as u32).collect::<Vec<_>>());
        assert_eq!(recorder.vertices.len(), table.num_vertices());
        for &(vertex, corner) in &recorder.vertices {
            assert_eq!(table.vertex(corner), vertex);
        }
    }
}

#[test]
fn depth_first_starts_with_the_seed_face() {
    let mesh = grid_mesh(5, 5, true);
    let table = table_for(&mesh);
    let recorder = run(DepthFirstTraverser::new(&table, Recorder::default()));
    assert_eq!(recorder.faces[0], FaceIndex(0));
    // The tip of the seed corner's face is reached after its two neighbours.
    assert_eq!(recorder.vertices[0].1, CornerIndex(1));
    assert_eq!(recorder.vertices[1].1, CornerIndex(2));
    assert_eq!(recorder.vertices[2].1, CornerIndex(0));
}
