use meshcodec_core::normal_compression_utils::OctahedronToolBox;
use meshcodec_core::prediction_scheme_normal_octahedron_canonicalized_transform::{
    get_rotation_count, is_in_bottom_left, rotate_point, NormalOctahedronCanonicalizedTransform,
};
use meshcodec_core::prediction_scheme_normal_octahedron_transform::NormalOctahedronTransform;
use proptest::prelude::*;

const BITS: i32 = 10;

fn tool_box() -> OctahedronToolBox {
    OctahedronToolBox::with_quantization_bits(BITS).unwrap()
}

fn unit_vector() -> impl Strategy<Value = [f32; 3]> {
    (-1.0f32..1.0, -1.0f32..1.0, -1.0f32..1.0)
        .prop_filter("needs a direction", |(x, y, z)| x.abs() + y.abs() + z.abs() > 1e-3)
        .prop_map(|(x, y, z)| {
            let n = (x * x + y * y + z * z).sqrt();
            [x / n, y / n, z / n]
        })
}

#[test]
fn border_points_fold_onto_one_representative() {
    let tb = tool_box();
    let max = tb.max_value();
    assert_eq!(tb.canonicalize_octahedral_coords(0, 0), (max, max));
    assert_eq!(tb.canonicalize_octahedral_coords(0, max), (max, max));
    assert_eq!(tb.canonicalize_octahedral_coords(max, 0), (max, max));
    let c = tb.center_value();
    assert_eq!(tb.canonicalize_octahedral_coords(0, c + 3), (0, c - 3));
    assert_eq!(tb.canonicalize_octahedral_coords(c, c), (c, c));
}

#[test]
fn rotations_compose_to_identity() {
    for p in [(3, 4), (-3, 4), (3, -4), (-3, -4), (0, 5), (5, 0)] {
        for r in 0..4 {
            assert_eq!(rotate_point(rotate_point(p, r), (4 - r) % 4), p);
        }
        assert!(is_in_bottom_left(rotate_point(p, get_rotation_count(p))), "{p:?}");
    }
}

proptest! {
    #[test]
    fn invert_diamond_is_an_involution(s in -510i32..=510, t in -510i32..=510) {
        let tb = tool_box();
        let c = tb.center_value();
        prop_assume!(s.abs() < c && t.abs() < c);
        let (s2, t2) = tb.invert_diamond(s, t);
        prop_assert_eq!(tb.invert_diamond(s2, t2), (s, t));
        if !tb.is_in_diamond(s, t) {
            prop_assert!(tb.is_in_diamond(s2, t2));
        }
    }

    #[test]
    fn quantized_normals_point_the_same_way(v in unit_vector()) {
        let tb = tool_box();
        let (s, t) = tb.float_vector_to_quantized_octahedral_coords(&v);
        prop_assert!((0..=tb.max_value()).contains(&s) && (0..=tb.max_value()).contains(&t));
        let back = tb.quantized_octahedral_coords_to_unit_vector(s, t);
        let dot = v[0] * back[0] + v[1] * back[1] + v[2] * back[2];
        prop_assert!(dot > 0.999, "{v:?} came back as {back:?}");
    }

    #[test]
    fn canonicalized_corrections_invert(
        v in unit_vector(),
        ps in 0i32..=1022,
        pt in 0i32..=1022,
    ) {
        let tb = tool_box();
        let (s, t) = tb.float_vector_to_quantized_octahedral_coords(&v);
        let transform = NormalOctahedronCanonicalizedTransform::new(tb.max_quantized_value()).unwrap();
        let mut corr = [0; 2];
        transform.compute_correction(&[s, t], &[ps, pt], &mut corr);
        prop_assert!(corr.iter().all(|&c| (0..tb.max_quantized_value()).contains(&c)), "{corr:?}");
        let mut out = [0; 2];
        transform.compute_original_value(&[ps, pt], &corr, &mut out);
        prop_assert_eq!(out, [s, t]);
    }

    #[test]
    fn plain_octahedron_corrections_invert(
        v in unit_vector(),
        ps in 0i32..=1022,
        pt in 0i32..=1022,
    ) {
        let tb = tool_box();
        let (s, t) = tb.float_vector_to_quantized_octahedral_coords(&v);
        let transform = NormalOctahedronTransform::new(tb.max_quantized_value()).unwrap();
        let mut corr = [0; 2];
        transform.compute_correction(&[s, t], &[ps, pt], &mut corr);
        let mut out = [0; 2];
        transform.compute_original_value(&[ps, pt], &corr, &mut out);
        prop_assert_eq!(out, [s, t]);
    }
}
