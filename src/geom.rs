//! The in-memory geometry tree (`Geom`) and the structural predicates the
//! codec needs from it — `needs_bbox`, `calculate_gbox`, `is_empty` — plus
//! a minimal debug WKT renderer and the geodetic helper pair. Spec §1
//! treats a full geometry engine, a WKT *parser*, and a general geodetic
//! math library as external collaborators; this module carries only the
//! structural shape and the small pure functions the codec itself calls.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{GeomError, Result};
use crate::header::Flags;

/// Geometry type codes, matching the well-known OGC/PostGIS numbering
/// implied by spec §3.4's variant list and the §4.C compatibility table
/// (see SPEC_FULL §3.7 — the original C source was filtered out of the
/// retrieval pack, so these are the standard values, not invented ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Point = 1,
    Line = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLine = 5,
    MultiPolygon = 6,
    Collection = 7,
    CircularString = 8,
    CompoundCurve = 9,
    CurvePolygon = 10,
    MultiCurve = 11,
    MultiSurface = 12,
    PolyhedralSurface = 13,
    Triangle = 14,
    Tin = 15,
}

impl TypeCode {
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Result<Self> {
        Ok(match code {
            1 => TypeCode::Point,
            2 => TypeCode::Line,
            3 => TypeCode::Polygon,
            4 => TypeCode::MultiPoint,
            5 => TypeCode::MultiLine,
            6 => TypeCode::MultiPolygon,
            7 => TypeCode::Collection,
            8 => TypeCode::CircularString,
            9 => TypeCode::CompoundCurve,
            10 => TypeCode::CurvePolygon,
            11 => TypeCode::MultiCurve,
            12 => TypeCode::MultiSurface,
            13 => TypeCode::PolyhedralSurface,
            14 => TypeCode::Triangle,
            15 => TypeCode::Tin,
            other => return Err(GeomError::UnknownType(other)),
        })
    }

    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            TypeCode::MultiPoint
                | TypeCode::MultiLine
                | TypeCode::MultiPolygon
                | TypeCode::Collection
                | TypeCode::CompoundCurve
                | TypeCode::CurvePolygon
                | TypeCode::MultiCurve
                | TypeCode::MultiSurface
                | TypeCode::PolyhedralSurface
                | TypeCode::Tin
        )
    }

    fn wkt_keyword(self) -> &'static str {
        match self {
            TypeCode::Point => "POINT",
            TypeCode::Line => "LINESTRING",
            TypeCode::Polygon => "POLYGON",
            TypeCode::MultiPoint => "MULTIPOINT",
            TypeCode::MultiLine => "MULTILINESTRING",
            TypeCode::MultiPolygon => "MULTIPOLYGON",
            TypeCode::Collection => "GEOMETRYCOLLECTION",
            TypeCode::CircularString => "CIRCULARSTRING",
            TypeCode::CompoundCurve => "COMPOUNDCURVE",
            TypeCode::CurvePolygon => "CURVEPOLYGON",
            TypeCode::MultiCurve => "MULTICURVE",
            TypeCode::MultiSurface => "MULTISURFACE",
            TypeCode::PolyhedralSurface => "POLYHEDRALSURFACE",
            TypeCode::Triangle => "TRIANGLE",
            TypeCode::Tin => "TIN",
        }
    }
}

/// Subtype compatibility table of spec §4.C: is `child` an allowed member
/// of a collection typed `parent`?
pub fn child_allowed(parent: TypeCode, child: TypeCode) -> bool {
    use TypeCode::*;
    match parent {
        MultiPoint => child == Point,
        MultiLine => child == Line,
        MultiPolygon => child == Polygon,
        CompoundCurve => matches!(child, Line | CircularString),
        CurvePolygon => matches!(child, Line | CircularString | CompoundCurve),
        MultiCurve => matches!(child, Line | CircularString | CompoundCurve),
        MultiSurface => matches!(child, Polygon | CurvePolygon),
        PolyhedralSurface => child == Polygon,
        Tin => child == Triangle,
        Collection => true,
        _ => false,
    }
}

/// A vertex array that either owns its `f64` ordinates or aliases bytes
/// inside a serialized blob (spec §3.6, §9's "pointer-into-blob" design
/// note). `ndims` is carried explicitly rather than re-derived, since a
/// borrowed array has no flags of its own to consult.
#[derive(Debug, Clone)]
pub enum PointArray<'a> {
    Owned { data: Vec<f64>, ndims: u8 },
    Borrowed { bytes: &'a [u8], npoints: usize, ndims: u8 },
}

impl<'a> PointArray<'a> {
    pub fn owned(data: Vec<f64>, ndims: u8) -> Self {
        debug_assert_eq!(data.len() % ndims.max(1) as usize, 0);
        PointArray::Owned { data, ndims }
    }

    pub fn borrowed(bytes: &'a [u8], npoints: usize, ndims: u8) -> Self {
        PointArray::Borrowed { bytes, npoints, ndims }
    }

    pub fn ndims(&self) -> u8 {
        match self {
            PointArray::Owned { ndims, .. } => *ndims,
            PointArray::Borrowed { ndims, .. } => *ndims,
        }
    }

    pub fn npoints(&self) -> usize {
        match self {
            PointArray::Owned { data, ndims } => data.len() / (*ndims).max(1) as usize,
            PointArray::Borrowed { npoints, .. } => *npoints,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.npoints() == 0
    }

    /// The ordinates of the `i`th vertex, in X, Y, [Z], [M] order.
    pub fn vertex(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.npoints() {
            return None;
        }
        let nd = self.ndims() as usize;
        match self {
            PointArray::Owned { data, .. } => Some(data[i * nd..(i + 1) * nd].to_vec()),
            PointArray::Borrowed { bytes, .. } => {
                let mut out = Vec::with_capacity(nd);
                for d in 0..nd {
                    let off = (i * nd + d) * 8;
                    out.push(LittleEndian::read_f64(&bytes[off..off + 8]));
                }
                Some(out)
            }
        }
    }

    /// Every ordinate, flattened (used by the size oracle / encoder).
    pub fn flatten(&self) -> Vec<f64> {
        match self {
            PointArray::Owned { data, .. } => data.clone(),
            PointArray::Borrowed { .. } => {
                (0..self.npoints()).flat_map(|i| self.vertex(i).unwrap()).collect()
            }
        }
    }
}

/// The recursive geometry tree, structurally matching spec §3.4. Each
/// non-collection variant carries the dimensionality (`Flags`) its vertex
/// arrays are encoded with; `Collection` additionally records which
/// specific collection `TypeCode` it is (MultiPoint, CurvePolygon, a
/// generic GeometryCollection, ...).
#[derive(Debug, Clone)]
pub enum Geom<'a> {
    Point { flags: Flags, points: PointArray<'a> },
    Line { flags: Flags, points: PointArray<'a> },
    CircularString { flags: Flags, points: PointArray<'a> },
    Triangle { flags: Flags, points: PointArray<'a> },
    Polygon { flags: Flags, rings: Vec<PointArray<'a>> },
    Collection { flags: Flags, kind: TypeCode, children: Vec<Geom<'a>> },
}

impl<'a> Geom<'a> {
    pub fn type_code(&self) -> TypeCode {
        match self {
            Geom::Point { .. } => TypeCode::Point,
            Geom::Line { .. } => TypeCode::Line,
            Geom::CircularString { .. } => TypeCode::CircularString,
            Geom::Triangle { .. } => TypeCode::Triangle,
            Geom::Polygon { .. } => TypeCode::Polygon,
            Geom::Collection { kind, .. } => *kind,
        }
    }

    pub fn flags(&self) -> Flags {
        match self {
            Geom::Point { flags, .. }
            | Geom::Line { flags, .. }
            | Geom::CircularString { flags, .. }
            | Geom::Triangle { flags, .. }
            | Geom::Polygon { flags, .. }
            | Geom::Collection { flags, .. } => *flags,
        }
    }
}

/// `lwgeom_needs_bbox` — whether the encoder should compute and cache a
/// bounding box when the caller didn't supply one. A lone point's bbox is
/// the point itself and is never worth caching; every other non-empty
/// shape benefits.
pub fn needs_bbox(geom: &Geom) -> bool {
    match geom {
        Geom::Point { .. } => false,
        _ => !is_empty(geom),
    }
}

/// `lwgeom_is_empty` — structural emptiness, per spec §3.4/§3.5: an empty
/// `Point` has zero vertices; every other variant is empty when its count
/// is zero (a `Polygon` with no rings, or whose outer ring has no
/// vertices); a `Collection` is empty iff all children are.
pub fn is_empty(geom: &Geom) -> bool {
    match geom {
        Geom::Point { points, .. }
        | Geom::Line { points, .. }
        | Geom::CircularString { points, .. }
        | Geom::Triangle { points, .. } => points.is_empty(),
        Geom::Polygon { rings, .. } => rings.is_empty() || rings[0].is_empty(),
        Geom::Collection { children, .. } => children.is_empty() || children.iter().all(is_empty),
    }
}

/// `lwgeom_calculate_gbox` — scan every vertex and return the tight
/// bounding box, or `None` for an empty geometry.
pub fn calculate_gbox(geom: &Geom) -> Option<crate::bbox::GBox> {
    let mut acc: Option<crate::bbox::GBox> = None;
    accumulate(geom, &mut acc);
    acc
}

fn accumulate(geom: &Geom, acc: &mut Option<crate::bbox::GBox>) {
    match geom {
        Geom::Point { flags, points }
        | Geom::Line { flags, points }
        | Geom::CircularString { flags, points }
        | Geom::Triangle { flags, points } => {
            for i in 0..points.npoints() {
                expand_with_vertex(acc, &points.vertex(i).unwrap(), *flags);
            }
        }
        Geom::Polygon { flags, rings } => {
            for ring in rings {
                for i in 0..ring.npoints() {
                    expand_with_vertex(acc, &ring.vertex(i).unwrap(), *flags);
                }
            }
        }
        Geom::Collection { children, .. } => {
            for child in children {
                accumulate(child, acc);
            }
        }
    }
}

pub(crate) fn expand_with_vertex(acc: &mut Option<crate::bbox::GBox>, v: &[f64], flags: Flags) {
    use crate::bbox::GBox;
    let mut b = GBox::empty();
    if flags.is_geodetic() {
        let p = geodetic::geog2cart(v[0], v[1]);
        b.xmin = p.x;
        b.xmax = p.x;
        b.ymin = p.y;
        b.ymax = p.y;
        b.zmin = p.z;
        b.zmax = p.z;
    } else {
        b.xmin = v[0];
        b.xmax = v[0];
        b.ymin = v[1];
        b.ymax = v[1];
        let mut idx = 2;
        if flags.has_z() {
            b.zmin = v[idx];
            b.zmax = v[idx];
            idx += 1;
        }
        if flags.has_m() {
            b.mmin = v[idx];
            b.mmax = v[idx];
        }
    }
    match acc {
        None => *acc = Some(b),
        Some(existing) => existing.expand(&b),
    }
}

/// The first vertex in document order, skipping empty leaves and empty
/// collection members (spec §4.D's `peek_first_point`).
pub fn first_vertex(geom: &Geom) -> Option<Vec<f64>> {
    match geom {
        Geom::Point { points, .. }
        | Geom::Line { points, .. }
        | Geom::CircularString { points, .. }
        | Geom::Triangle { points, .. } => points.vertex(0),
        Geom::Polygon { rings, .. } => rings.first().and_then(|r| r.vertex(0)),
        Geom::Collection { children, .. } => children.iter().find_map(first_vertex),
    }
}

/// Render a `Geom` as WKT at `sig_digits` significant digits, the minimal
/// internal stand-in for the external renderer spec §1/§4.E treats as out
/// of scope (see SPEC_FULL §4.E for exactly what's intentionally not
/// covered: no parser, no full OGC conformance on empty-geometry styling).
pub fn to_wkt(geom: &Geom, sig_digits: u32) -> String {
    let mut out = String::new();
    write_wkt(geom, sig_digits, &mut out);
    out
}

fn write_wkt(geom: &Geom, sig: u32, out: &mut String) {
    let kw = geom.type_code().wkt_keyword();
    if is_empty(geom) {
        out.push_str(kw);
        out.push_str(" EMPTY");
        return;
    }
    out.push_str(kw);
    match geom {
        Geom::Point { points, .. } => {
            out.push('(');
            write_vertex(&points.vertex(0).unwrap(), sig, out);
            out.push(')');
        }
        Geom::Line { points, .. } | Geom::CircularString { points, .. } | Geom::Triangle { points, .. } => {
            write_point_list(points, sig, out);
        }
        Geom::Polygon { rings, .. } => {
            out.push('(');
            for (i, ring) in rings.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_point_list(ring, sig, out);
            }
            out.push(')');
        }
        Geom::Collection { children, .. } => {
            out.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_wkt(child, sig, out);
            }
            out.push(')');
        }
    }
}

fn write_point_list(points: &PointArray, sig: u32, out: &mut String) {
    out.push('(');
    for i in 0..points.npoints() {
        if i > 0 {
            out.push(',');
        }
        write_vertex(&points.vertex(i).unwrap(), sig, out);
    }
    out.push(')');
}

fn write_vertex(v: &[f64], sig: u32, out: &mut String) {
    for (i, ord) in v.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&fmt_ordinate(*ord, sig));
    }
}

fn fmt_ordinate(v: f64, sig_digits: u32) -> String {
    if v == 0.0 || !v.is_finite() {
        return format!("{v}");
    }
    let magnitude = v.abs().log10().floor() as i32;
    let decimals = (sig_digits as i32 - 1 - magnitude).max(0) as usize;
    let s = format!("{v:.decimals$}");
    trim_trailing_zeros(&s)
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Minimal geodetic helpers, treated by spec §1/§6 as a pure function from
/// a 3D Cartesian point to a (lon, lat) pair (`cart2geog`) plus a
/// normalizing projection onto the unit sphere (`normalize`). `geog2cart`
/// is the inverse this crate additionally needs internally to build a 3D
/// geocentric bbox from lon/lat vertices (spec §3.3's "bbox is 3D
/// geocentric" for geodetic geometries) — it is not part of the injected
/// collaborator surface, only plumbing this module owns.
pub mod geodetic {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Point3D {
        pub x: f64,
        pub y: f64,
        pub z: f64,
    }

    /// Project `p` onto the unit sphere.
    pub fn normalize(p: Point3D) -> Point3D {
        let norm = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
        if norm == 0.0 {
            return p;
        }
        Point3D { x: p.x / norm, y: p.y / norm, z: p.z / norm }
    }

    /// 3D geocentric Cartesian point (on the unit sphere) to (lon, lat) in
    /// radians.
    pub fn cart2geog(p: Point3D) -> (f64, f64) {
        let lon = p.y.atan2(p.x);
        let lat = p.z.atan2((p.x * p.x + p.y * p.y).sqrt());
        (lon, lat)
    }

    /// Inverse of `cart2geog`: (lon, lat) in radians to a unit-sphere
    /// geocentric point.
    pub fn geog2cart(lon: f64, lat: f64) -> Point3D {
        Point3D {
            x: lat.cos() * lon.cos(),
            y: lat.cos() * lon.sin(),
            z: lat.sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Geom<'static> {
        Geom::Point {
            flags: Flags::empty(),
            points: PointArray::owned(vec![x, y], 2),
        }
    }

    fn empty_point() -> Geom<'static> {
        Geom::Point {
            flags: Flags::empty(),
            points: PointArray::owned(vec![], 2),
        }
    }

    #[test]
    fn empty_point_has_no_coordinates() {
        assert!(is_empty(&empty_point()));
        assert_eq!(to_wkt(&empty_point(), 12), "POINT EMPTY");
    }

    #[test]
    fn non_empty_point_wkt() {
        assert_eq!(to_wkt(&point(1.0, 2.0), 12), "POINT(1 2)");
    }

    #[test]
    fn needs_bbox_false_for_point_true_otherwise() {
        assert!(!needs_bbox(&point(1.0, 2.0)));
        let line = Geom::Line {
            flags: Flags::empty(),
            points: PointArray::owned(vec![0.0, 0.0, 1.0, 1.0], 2),
        };
        assert!(needs_bbox(&line));
    }

    #[test]
    fn calculate_gbox_scans_all_vertices() {
        let line = Geom::Line {
            flags: Flags::empty(),
            points: PointArray::owned(vec![0.0, 0.0, 3.0, 4.0], 2),
        };
        let gbox = calculate_gbox(&line).unwrap();
        assert_eq!(gbox.xmin, 0.0);
        assert_eq!(gbox.xmax, 3.0);
        assert_eq!(gbox.ymax, 4.0);
    }

    #[test]
    fn calculate_gbox_none_for_empty() {
        assert!(calculate_gbox(&empty_point()).is_none());
    }

    #[test]
    fn collection_empty_iff_all_children_empty() {
        let coll = Geom::Collection {
            flags: Flags::empty(),
            kind: TypeCode::MultiPoint,
            children: vec![empty_point(), empty_point()],
        };
        assert!(is_empty(&coll));
        let coll2 = Geom::Collection {
            flags: Flags::empty(),
            kind: TypeCode::MultiPoint,
            children: vec![empty_point(), point(1.0, 1.0)],
        };
        assert!(!is_empty(&coll2));
    }

    #[test]
    fn child_allowed_table_matches_spec() {
        use TypeCode::*;
        assert!(child_allowed(MultiPoint, Point));
        assert!(!child_allowed(MultiPoint, Line));
        assert!(child_allowed(CompoundCurve, CircularString));
        assert!(child_allowed(MultiSurface, CurvePolygon));
        assert!(!child_allowed(MultiSurface, Line));
        assert!(child_allowed(Collection, Polygon));
    }

    #[test]
    fn first_vertex_skips_empty_leading_children() {
        let coll = Geom::Collection {
            flags: Flags::empty(),
            kind: TypeCode::Collection,
            children: vec![empty_point(), point(5.0, 6.0)],
        };
        assert_eq!(first_vertex(&coll), Some(vec![5.0, 6.0]));
    }

    #[test]
    fn geodetic_roundtrip_cart_geog() {
        let p = geodetic::normalize(geodetic::Point3D { x: 1.0, y: 1.0, z: 1.0 });
        let (lon, lat) = geodetic::cart2geog(p);
        let back = geodetic::geog2cart(lon, lat);
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
        assert!((back.z - p.z).abs() < 1e-9);
    }
}
