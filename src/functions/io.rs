//! Top-level encode/decode entry points and the debug text renderer.

use crate::error::Result;
use crate::geom::Geom;
use crate::header::Flags;
use crate::serialized;

/// Encode a tree into a blob under `srid` (spec §3.6, §4.A).
///
/// # Example
///
/// ```
/// use geoserial::functions::io::serialize;
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = serialize(&geom, 4326).unwrap();
/// assert!(!blob.is_empty());
/// ```
pub fn serialize(geom: &Geom, srid: i32) -> Result<Vec<u8>> {
    serialized::serialize(geom, srid)
}

/// Decode a blob back into a tree and its SRID. `zero_copy` selects
/// whether vertex data aliases `bytes` or is copied out.
///
/// # Example
///
/// ```
/// use geoserial::functions::io::{serialize, deserialize};
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = serialize(&geom, 4326).unwrap();
/// let (decoded, srid) = deserialize(&blob, false).unwrap();
/// assert_eq!(srid, 4326);
/// match decoded {
///     geoserial::geom::Geom::Point { points, .. } => assert_eq!(points.vertex(0).unwrap(), vec![1.0, 2.0]),
///     _ => unreachable!(),
/// }
/// ```
pub fn deserialize(bytes: &[u8], zero_copy: bool) -> Result<(Geom<'_>, i32)> {
    serialized::deserialize(bytes, zero_copy)
}

/// Render a blob's tree as WKT for logging/debugging, at the
/// configured (or explicitly given) significant-digit precision. This
/// is not a conformant WKT writer; it exists only so a blob can be
/// inspected without a full geometry engine on hand (spec §4.E).
///
/// # Example
///
/// ```
/// use geoserial::functions::io::{serialize, to_debug_string};
/// use geoserial::geom::{Geom, PointArray};
/// use geoserial::header::Flags;
///
/// let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
/// let blob = serialize(&geom, 0).unwrap();
/// assert_eq!(to_debug_string(&blob, None).unwrap(), "POINT(1 2)");
/// ```
pub fn to_debug_string(bytes: &[u8], sig_digits: Option<u32>) -> Result<String> {
    let sig = sig_digits.unwrap_or_else(|| crate::config::current().wkt_significant_digits);
    let sg = serialized::SerializedGeom::from_bytes(bytes)?;
    let geom = sg.decode(true)?;
    Ok(crate::geom::to_wkt(&geom, sig))
}
