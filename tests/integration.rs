//! Whole-pipeline integration tests exercising spec-mandated scenarios
//! (concrete byte-layout examples and quantified invariants) that span
//! more than one module: header + bbox + codec + peek/compare together.

use std::cmp::Ordering;

use geoserial::functions::{accessors, compare, io, peek};
use geoserial::geom::{Geom, PointArray, TypeCode};
use geoserial::header::Flags;

fn empty_point() -> Geom<'static> {
    Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![], 2) }
}

fn point(x: f64, y: f64) -> Geom<'static> {
    Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![x, y], 2) }
}

fn line3(coords: [(f64, f64); 3]) -> Geom<'static> {
    let mut data = Vec::with_capacity(6);
    for (x, y) in coords {
        data.push(x);
        data.push(y);
    }
    Geom::Line { flags: Flags::empty(), points: PointArray::owned(data, 2) }
}

fn ring(coords: &[(f64, f64)]) -> PointArray<'static> {
    let mut data = Vec::with_capacity(coords.len() * 2);
    for &(x, y) in coords {
        data.push(x);
        data.push(y);
    }
    PointArray::owned(data, 2)
}

/// Scenario 1: an empty 2D Point, SRID 4326, has no cached bbox, an empty
/// WKT rendering, and a header whose SRID triplet is `00 10 E6`.
#[test]
fn empty_point_srid_4326_matches_concrete_layout() {
    let blob = io::serialize(&empty_point(), 4326).unwrap();

    assert_eq!(&blob[4..7], &[0x00, 0x10, 0xE6]);
    assert_eq!(blob[7], 0x00, "flags byte carries no bits for an empty point");
    assert!(!accessors::has_bbox(&blob).unwrap());
    assert!(peek::peek_is_empty(&blob).unwrap());
    assert!(peek::peek_gbox(&blob).unwrap().is_none());
    assert_eq!(io::to_debug_string(&blob, None).unwrap(), "POINT EMPTY");

    let body = &blob[accessors::header_size(&blob).unwrap()..];
    assert_eq!(&body[0..8], &[0x01, 0, 0, 0, 0, 0, 0, 0]);
}

/// Scenario 2: a 2D point (1, 2) with no SRID peeks its own bbox exactly.
#[test]
fn point_peek_gbox_matches_coordinates() {
    let blob = io::serialize(&point(1.0, 2.0), 0).unwrap();
    assert!(!accessors::has_bbox(&blob).unwrap());
    let gbox = peek::peek_gbox(&blob).unwrap().unwrap();
    assert_eq!(gbox.xmin, 1.0);
    assert_eq!(gbox.xmax, 1.0);
    assert_eq!(gbox.ymin, 2.0);
    assert_eq!(gbox.ymax, 2.0);
}

/// Scenario 3: a 3-vertex linestring always carries a cached bbox, and
/// `header_size` grows to cover it; the blob round-trips byte-identically.
#[test]
fn linestring_caches_bbox_and_round_trips_byte_identical() {
    let geom = line3([(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
    let blob = io::serialize(&geom, 4326).unwrap();

    assert!(accessors::has_bbox(&blob).unwrap());
    assert_eq!(accessors::header_size(&blob).unwrap(), 8 + 16);

    let (decoded, srid) = io::deserialize(&blob, false).unwrap();
    assert_eq!(srid, 4326);
    let re_encoded = io::serialize(&decoded, srid).unwrap();
    assert_eq!(re_encoded, blob, "decode-then-encode must be byte-identical when a bbox is cached");
}

/// Scenario 4: a 3-ring polygon gets a 4-byte pad after the odd-length
/// ring-count table, and decode reproduces it bit-for-bit on re-encode.
#[test]
fn polygon_three_rings_pads_and_round_trips() {
    let geom = Geom::Polygon {
        flags: Flags::empty(),
        rings: vec![
            ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]),
            ring(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]),
            ring(&[(3.0, 3.0), (4.0, 3.0), (4.0, 4.0), (3.0, 3.0)]),
        ],
    };
    let blob = io::serialize(&geom, 0).unwrap();
    let (decoded, srid) = io::deserialize(&blob, false).unwrap();
    let re_encoded = io::serialize(&decoded, srid).unwrap();
    assert_eq!(re_encoded, blob);
    match decoded {
        Geom::Polygon { rings, .. } => assert_eq!(rings.len(), 3),
        _ => panic!("wrong variant"),
    }
}

/// Scenario 5: the comparator's fast path orders two points by their x
/// coordinate when the SRIDs agree.
#[test]
fn comparator_fast_path_orders_by_position() {
    let a = io::serialize(&point(0.0, 0.0), 4326).unwrap();
    let b = io::serialize(&point(1.0, 0.0), 4326).unwrap();
    assert_eq!(compare::cmp(&a, &b).unwrap(), Ordering::Less);
    assert_eq!(compare::cmp(&b, &a).unwrap(), Ordering::Greater);
}

/// Scenario 6: two blobs built from the same `Geom` compare equal via the
/// byte-equality fast path, without needing a decode.
#[test]
fn comparator_byte_identical_blobs_are_equal() {
    let geom = point(3.0, 4.0);
    let a = io::serialize(&geom, 4326).unwrap();
    let b = io::serialize(&geom, 4326).unwrap();
    assert_eq!(a, b);
    assert_eq!(compare::cmp(&a, &b).unwrap(), Ordering::Equal);
}

/// Scenario 7: an empty point sorts before any non-empty point,
/// regardless of the non-empty point's coordinates.
#[test]
fn comparator_emptiness_ordering_ignores_coordinates() {
    let empty = io::serialize(&empty_point(), 0).unwrap();
    for (x, y) in [(-1000.0, -1000.0), (0.0, 0.0), (1000.0, 1000.0)] {
        let full = io::serialize(&point(x, y), 0).unwrap();
        assert_eq!(compare::cmp(&empty, &full).unwrap(), Ordering::Less);
    }
}

/// Scenario 8: SRID clamping folds at the boundary and is stable under a
/// second round through the codec.
#[test]
fn srid_clamp_scenarios() {
    let zero = io::serialize(&point(1.0, 1.0), 0).unwrap();
    assert_eq!(accessors::get_srid(&zero).unwrap(), geoserial::header::SRID_UNKNOWN);

    let negative = io::serialize(&point(1.0, 1.0), -1).unwrap();
    assert_eq!(accessors::get_srid(&negative).unwrap(), geoserial::header::SRID_UNKNOWN);

    let folded_in = geoserial::header::SRID_MAXIMUM + 5;
    let folded = io::serialize(&point(1.0, 1.0), folded_in).unwrap();
    let folded_srid = accessors::get_srid(&folded).unwrap();
    assert_ne!(folded_srid, folded_in);
    assert!(folded_srid > geoserial::header::SRID_USER_MAXIMUM);

    // stable under a second pass
    let re_set = accessors::set_srid(&folded, folded_srid).unwrap();
    assert_eq!(accessors::get_srid(&re_set).unwrap(), folded_srid);
}

/// Invariant 1: encode-then-decode is the identity on the tree, ignoring
/// bbox presence, for a representative mix of shapes.
#[test]
fn encode_decode_identity_on_mixed_shapes() {
    let shapes = vec![
        point(7.0, 8.0),
        line3([(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]),
        Geom::Collection {
            flags: Flags::empty(),
            kind: TypeCode::MultiPoint,
            children: vec![point(0.0, 0.0), point(1.0, 1.0)],
        },
    ];
    for geom in shapes {
        let blob = io::serialize(&geom, 4326).unwrap();
        let (decoded, _) = io::deserialize(&blob, false).unwrap();
        assert_eq!(decoded.type_code(), geom.type_code());
        assert_eq!(geoserial::geom::is_empty(&decoded), geoserial::geom::is_empty(&geom));
    }
}

/// Invariant 3 & 4: `get_type`/`is_empty` accessors agree with a full
/// decode, across shapes with and without a cached bbox.
#[test]
fn peek_accessors_agree_with_full_decode() {
    let geoms = vec![point(1.0, 1.0), empty_point(), line3([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)])];
    for geom in geoms {
        let blob = io::serialize(&geom, 0).unwrap();
        let (decoded, _) = io::deserialize(&blob, false).unwrap();
        assert_eq!(accessors::get_type(&blob).unwrap(), decoded.type_code());
        assert_eq!(peek::peek_is_empty(&blob).unwrap(), geoserial::geom::is_empty(&decoded));
    }
}

/// Invariant 6: the comparator is a total order — antisymmetric and
/// consistent under swap — across an assortment of blobs.
#[test]
fn comparator_is_antisymmetric() {
    let blobs = vec![
        io::serialize(&point(0.0, 0.0), 0).unwrap(),
        io::serialize(&point(1.0, 1.0), 0).unwrap(),
        io::serialize(&empty_point(), 0).unwrap(),
        io::serialize(&line3([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]), 0).unwrap(),
    ];
    for a in &blobs {
        for b in &blobs {
            let fwd = compare::cmp(a, b).unwrap();
            let rev = compare::cmp(b, a).unwrap();
            assert_eq!(fwd, rev.reverse());
        }
    }
}

/// Invariant 9: `clamp_srid` is idempotent end-to-end through `set_srid`.
#[test]
fn set_srid_clamp_is_idempotent_end_to_end() {
    let blob = io::serialize(&point(1.0, 1.0), 0).unwrap();
    let once = accessors::set_srid(&blob, geoserial::header::SRID_MAXIMUM + 50).unwrap();
    let srid_once = accessors::get_srid(&once).unwrap();
    let twice = accessors::set_srid(&once, srid_once).unwrap();
    assert_eq!(accessors::get_srid(&twice).unwrap(), srid_once);
}
