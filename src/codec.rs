//! Tree Codec — component C.
//!
//! Encodes/decodes the recursive [`Geom`] tree into the body region of a
//! serialized blob (spec §3.4, §4.C): a size oracle, an encoder that
//! writes exactly what the oracle predicts, and a decoder that consumes
//! exactly that many bytes back, optionally aliasing the source buffer.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{GeomError, Result};
use crate::geom::{child_allowed, Geom, PointArray, TypeCode};
use crate::header::Flags;

/// Per-node on-disk header: `[u32 type][u32 count]`.
const NODE_HEADER_SIZE: usize = 8;

fn check_dims(flags: Flags, found: u8) -> Result<()> {
    if flags.ndims() == found {
        Ok(())
    } else {
        Err(GeomError::DimensionMismatch { expected: flags.ndims(), found })
    }
}

/// Size, in bytes, of the body a `Geom` would encode to (spec §4.C table).
pub fn size_of_body(geom: &Geom) -> usize {
    match geom {
        Geom::Point { points, .. }
        | Geom::Line { points, .. }
        | Geom::CircularString { points, .. }
        | Geom::Triangle { points, .. } => {
            NODE_HEADER_SIZE + points.npoints() * points.ndims() as usize * 8
        }
        Geom::Polygon { rings, .. } => {
            let nrings = rings.len();
            let pad = if nrings % 2 == 1 { 4 } else { 0 };
            let sum: usize = rings
                .iter()
                .map(|r| 4 + r.npoints() * r.ndims() as usize * 8)
                .sum();
            NODE_HEADER_SIZE + pad + sum
        }
        Geom::Collection { children, .. } => {
            NODE_HEADER_SIZE + children.iter().map(size_of_body).sum::<usize>()
        }
    }
}

/// Encode `geom`'s body into `out`, verifying the written length matches
/// the size oracle exactly (spec §7: `SizeMismatch` is fatal).
pub fn encode_body(geom: &Geom, out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    let expected = size_of_body(geom);

    match geom {
        Geom::Point { flags, points }
        | Geom::Line { flags, points }
        | Geom::CircularString { flags, points }
        | Geom::Triangle { flags, points } => {
            check_dims(*flags, points.ndims())?;
            out.write_u32::<LittleEndian>(geom.type_code().code())?;
            out.write_u32::<LittleEndian>(points.npoints() as u32)?;
            for v in points.flatten() {
                out.write_f64::<LittleEndian>(v)?;
            }
        }
        Geom::Polygon { flags, rings } => {
            out.write_u32::<LittleEndian>(TypeCode::Polygon.code())?;
            out.write_u32::<LittleEndian>(rings.len() as u32)?;
            for ring in rings {
                check_dims(*flags, ring.ndims())?;
                out.write_u32::<LittleEndian>(ring.npoints() as u32)?;
            }
            if rings.len() % 2 == 1 {
                out.write_u32::<LittleEndian>(0)?;
            }
            for ring in rings {
                for v in ring.flatten() {
                    out.write_f64::<LittleEndian>(v)?;
                }
            }
        }
        Geom::Collection { kind, children, .. } => {
            out.write_u32::<LittleEndian>(kind.code())?;
            out.write_u32::<LittleEndian>(children.len() as u32)?;
            for child in children {
                if !child_allowed(*kind, child.type_code()) {
                    return Err(GeomError::InvalidSubtype {
                        parent: kind.name(),
                        child: child.type_code().name(),
                    });
                }
                // Sub-geometries never carry their own cached bbox (spec §4.C).
                encode_body(child, out)?;
            }
        }
    }

    let actual = out.len() - start;
    if actual != expected {
        return Err(GeomError::SizeMismatch { expected, actual });
    }
    Ok(())
}

/// Decode a body starting at `bytes[0]`, returning the tree and the
/// number of bytes consumed. `zero_copy` selects whether vertex arrays
/// alias `bytes` or are copied out (spec §3.6, §4.C).
pub fn decode_body<'a>(bytes: &'a [u8], flags: Flags, zero_copy: bool) -> Result<(Geom<'a>, usize)> {
    if bytes.len() < NODE_HEADER_SIZE {
        return Err(GeomError::Truncated("node header"));
    }
    let raw_type = LittleEndian::read_u32(&bytes[0..4]);
    let count = LittleEndian::read_u32(&bytes[4..8]) as usize;
    let tc = TypeCode::from_code(raw_type)?;
    let ndims = flags.ndims();

    if matches!(
        tc,
        TypeCode::Point | TypeCode::Line | TypeCode::CircularString | TypeCode::Triangle
    ) {
        return decode_simple(tc, bytes, count, ndims, flags, zero_copy);
    }
    if tc == TypeCode::Polygon {
        return decode_polygon(bytes, count, ndims, flags, zero_copy);
    }
    decode_collection(tc, bytes, count, flags, zero_copy)
}

fn decode_simple<'a>(
    tc: TypeCode,
    bytes: &'a [u8],
    npoints: usize,
    ndims: u8,
    flags: Flags,
    zero_copy: bool,
) -> Result<(Geom<'a>, usize)> {
    let vlen = npoints * ndims as usize * 8;
    let total = NODE_HEADER_SIZE + vlen;
    if bytes.len() < total {
        return Err(GeomError::Truncated("vertex block"));
    }
    let points = read_points(&bytes[NODE_HEADER_SIZE..total], npoints, ndims, zero_copy);
    let geom = match tc {
        TypeCode::Point => Geom::Point { flags, points },
        TypeCode::Line => Geom::Line { flags, points },
        TypeCode::CircularString => Geom::CircularString { flags, points },
        TypeCode::Triangle => Geom::Triangle { flags, points },
        _ => unreachable!("decode_simple called with non-simple type"),
    };
    Ok((geom, total))
}

fn decode_polygon<'a>(
    bytes: &'a [u8],
    nrings: usize,
    ndims: u8,
    flags: Flags,
    zero_copy: bool,
) -> Result<(Geom<'a>, usize)> {
    let table_len = nrings * 4;
    let pad = if nrings % 2 == 1 { 4 } else { 0 };
    let mut offset = NODE_HEADER_SIZE;
    if bytes.len() < offset + table_len + pad {
        return Err(GeomError::Truncated("ring-count table"));
    }
    let mut ring_counts = Vec::with_capacity(nrings);
    for i in 0..nrings {
        let off = offset + i * 4;
        ring_counts.push(LittleEndian::read_u32(&bytes[off..off + 4]) as usize);
    }
    offset += table_len + pad;

    let mut rings = Vec::with_capacity(nrings);
    for npts in ring_counts {
        let vlen = npts * ndims as usize * 8;
        if bytes.len() < offset + vlen {
            return Err(GeomError::Truncated("ring vertex block"));
        }
        rings.push(read_points(&bytes[offset..offset + vlen], npts, ndims, zero_copy));
        offset += vlen;
    }
    Ok((Geom::Polygon { flags, rings }, offset))
}

fn decode_collection<'a>(
    tc: TypeCode,
    bytes: &'a [u8],
    ngeoms: usize,
    flags: Flags,
    zero_copy: bool,
) -> Result<(Geom<'a>, usize)> {
    // Children are always decoded with has_bbox forced off (spec §4.C).
    let mut child_flags = flags;
    child_flags.set_has_bbox(false);

    let mut offset = NODE_HEADER_SIZE;
    let mut children = Vec::with_capacity(ngeoms);
    for _ in 0..ngeoms {
        let (child, used) = decode_body(&bytes[offset..], child_flags, zero_copy)?;
        if !child_allowed(tc, child.type_code()) {
            return Err(GeomError::InvalidSubtype {
                parent: tc.name(),
                child: child.type_code().name(),
            });
        }
        offset += used;
        children.push(child);
    }
    Ok((Geom::Collection { flags, kind: tc, children }, offset))
}

fn read_points<'a>(bytes: &'a [u8], npoints: usize, ndims: u8, zero_copy: bool) -> PointArray<'a> {
    if zero_copy {
        return PointArray::borrowed(bytes, npoints, ndims);
    }
    let total = npoints * ndims as usize;
    let mut data = Vec::with_capacity(total);
    for i in 0..total {
        let off = i * 8;
        data.push(LittleEndian::read_f64(&bytes[off..off + 8]));
    }
    PointArray::owned(data, ndims)
}

impl TypeCode {
    pub fn name(self) -> &'static str {
        match self {
            TypeCode::Point => "Point",
            TypeCode::Line => "LineString",
            TypeCode::Polygon => "Polygon",
            TypeCode::MultiPoint => "MultiPoint",
            TypeCode::MultiLine => "MultiLineString",
            TypeCode::MultiPolygon => "MultiPolygon",
            TypeCode::Collection => "GeometryCollection",
            TypeCode::CircularString => "CircularString",
            TypeCode::CompoundCurve => "CompoundCurve",
            TypeCode::CurvePolygon => "CurvePolygon",
            TypeCode::MultiCurve => "MultiCurve",
            TypeCode::MultiSurface => "MultiSurface",
            TypeCode::PolyhedralSurface => "PolyhedralSurface",
            TypeCode::Triangle => "Triangle",
            TypeCode::Tin => "Tin",
        }
    }
}
