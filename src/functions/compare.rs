//! The total-order comparator (spec §4.D): a cheap-first chain that
//! only pays for a full tree decode when nothing cheaper settled the
//! question.

use std::cmp::Ordering;

use crate::bbox::sortable_hash;
use crate::error::Result;
use crate::functions::peek::{get_gbox, peek_is_empty};
use crate::serialized::SerializedGeom;

/// Total order over two serialized blobs, usable across rows whose SRIDs
/// differ (spec §6 types this as an infallible `Blob, Blob -> Ordering`
/// comparator; a mismatched SRID never aborts it):
///
/// 1. Empty sorts before non-empty; two empties compare equal.
/// 2. Identical bytes compare equal (fast path, no decoding at all).
/// 3. Otherwise order by [`sortable_hash`] of each side's bbox — cached
///    if present, peeked or computed otherwise.
/// 4. Hash ties are broken by the bbox's own (xmin, ymin, xmax, ymax)
///    lexicographic order.
/// 5. Remaining ties fall back to a byte-lexicographic comparison of
///    the body past the header, the final deterministic rule.
pub fn cmp(a: &[u8], b: &[u8]) -> Result<Ordering> {
    let sa = SerializedGeom::from_bytes(a)?;
    let sb = SerializedGeom::from_bytes(b)?;

    let empty_a = peek_is_empty(a)?;
    let empty_b = peek_is_empty(b)?;
    match (empty_a, empty_b) {
        (true, true) => return Ok(Ordering::Equal),
        (true, false) => return Ok(Ordering::Less),
        (false, true) => return Ok(Ordering::Greater),
        (false, false) => {}
    }

    if a == b {
        return Ok(Ordering::Equal);
    }

    let gbox_a = get_gbox(a)?;
    let gbox_b = get_gbox(b)?;

    if let (Some(ga), Some(gb)) = (gbox_a, gbox_b) {
        let geodetic = sa.flags().is_geodetic();
        let hash_a = sortable_hash(&ga, geodetic);
        let hash_b = sortable_hash(&gb, geodetic);
        if hash_a != hash_b {
            return Ok(hash_a.cmp(&hash_b));
        }
        let box_order = (ga.xmin, ga.ymin, ga.xmax, ga.ymax).partial_cmp(&(gb.xmin, gb.ymin, gb.xmax, gb.ymax));
        if let Some(order) = box_order {
            if order != Ordering::Equal {
                return Ok(order);
            }
        }
    }

    Ok(sa.body_bytes().cmp(sb.body_bytes()))
}

/// An owned, independently-mutable duplicate of a blob. A fresh copy is
/// never read-only, regardless of the source's flag.
pub fn copy(bytes: &[u8]) -> Result<Vec<u8>> {
    SerializedGeom::from_bytes(bytes)?;
    let mut out = bytes.to_vec();
    let mut flags = crate::header::Flags::from_byte(out[7]);
    flags.set_read_only(false);
    out[7] = flags.to_byte();
    Ok(out)
}
