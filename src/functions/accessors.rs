//! Header-level accessors: SRID, flags, dimensionality, and the header
//! size they imply. Each reads only the fixed 8-byte header (and, for
//! `get_type`, the first 4 bytes of the body) — none of these decode
//! the tree.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Result;
use crate::geom::TypeCode;
use crate::header::{self, clamp_srid, pack_srid, Flags};
use crate::serialized::SerializedGeom;

/// The geometry type code recorded at the start of the body, without
/// touching any vertex data.
///
/// # Example
///
/// ```
/// use geoserial::functions::{accessors, io};
/// use geoserial::geom::{Geom, PointArray, TypeCode};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = io::serialize(&geom, 4326).unwrap();
/// assert_eq!(accessors::get_type(&blob).unwrap(), TypeCode::Point);
/// ```
pub fn get_type(bytes: &[u8]) -> Result<TypeCode> {
    let sg = SerializedGeom::from_bytes(bytes)?;
    let body = sg.body_bytes();
    if body.len() < 4 {
        return Err(crate::error::GeomError::Truncated("node header"));
    }
    TypeCode::from_code(LittleEndian::read_u32(&body[0..4]))
}

/// The SRID stored in the header (`UNKNOWN` i.e. `0` if none was set).
///
/// # Example
///
/// ```
/// use geoserial::functions::io;
/// use geoserial::functions::accessors::get_srid;
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = io::serialize(&geom, 4326).unwrap();
/// assert_eq!(get_srid(&blob).unwrap(), 4326);
/// ```
pub fn get_srid(bytes: &[u8]) -> Result<i32> {
    Ok(SerializedGeom::from_bytes(bytes)?.srid())
}

/// Rewrite the header's SRID in place, clamping it into the on-wire
/// range (spec §4.A). Body and cached bbox are untouched.
///
/// # Example
///
/// ```
/// use geoserial::functions::io;
/// use geoserial::functions::accessors::{get_srid, set_srid};
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = io::serialize(&geom, 4326).unwrap();
/// let moved = set_srid(&blob, 3857).unwrap();
/// assert_eq!(get_srid(&moved).unwrap(), 3857);
/// ```
pub fn set_srid(bytes: &[u8], srid: i32) -> Result<Vec<u8>> {
    SerializedGeom::from_bytes(bytes)?;
    let (clamped, notice) = clamp_srid(srid);
    if notice {
        crate::diagnostics::notice(&format!("SRID {srid} out of range; stored as {clamped}"));
    }
    let mut out = bytes.to_vec();
    let packed = pack_srid(clamped);
    out[4] = packed[0];
    out[5] = packed[1];
    out[6] = packed[2];
    Ok(out)
}

/// Whether the blob's flag byte has the empty-point exemption aside: a
/// lone point's emptiness is structural and never cached as a bbox, so
/// this accessor only reports what's *recorded* in the header, not
/// whether the geometry is empty — see [`crate::functions::peek::peek_is_empty`]
/// for that.
pub fn flags(bytes: &[u8]) -> Result<Flags> {
    Ok(SerializedGeom::from_bytes(bytes)?.flags())
}

pub fn has_z(bytes: &[u8]) -> Result<bool> {
    Ok(flags(bytes)?.has_z())
}

pub fn has_m(bytes: &[u8]) -> Result<bool> {
    Ok(flags(bytes)?.has_m())
}

pub fn has_bbox(bytes: &[u8]) -> Result<bool> {
    Ok(flags(bytes)?.has_bbox())
}

pub fn is_geodetic(bytes: &[u8]) -> Result<bool> {
    Ok(flags(bytes)?.is_geodetic())
}

/// `2 + has_z + has_m`, per spec §3.2.
///
/// # Example
///
/// ```
/// use geoserial::functions::io;
/// use geoserial::functions::accessors::ndims;
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = io::serialize(&geom, 0).unwrap();
/// assert_eq!(ndims(&blob).unwrap(), 2);
/// ```
pub fn ndims(bytes: &[u8]) -> Result<u8> {
    Ok(flags(bytes)?.ndims())
}

/// Size, in bytes, of this blob's fixed-plus-bbox header region.
pub fn header_size(bytes: &[u8]) -> Result<usize> {
    Ok(header::header_size(flags(bytes)?))
}

/// Compile-time upper bound on [`header_size`] across every flag
/// combination, re-exported for callers sizing fixed buffers.
pub const fn max_header_size() -> usize {
    header::max_header_size()
}
