//! Cheap inspection that avoids a full tree decode where the shape
//! allows it, and the degradation chain for the cases it doesn't (spec
//! §4.D).

use byteorder::{ByteOrder, LittleEndian};

use crate::bbox::GBox;
use crate::diagnostics;
use crate::error::{GeomError, Result};
use crate::geom::{calculate_gbox, expand_with_vertex, first_vertex, is_empty, TypeCode};
use crate::header::Flags;
use crate::serialized::SerializedGeom;

/// Per-node on-disk header size, shared with [`crate::codec`]: `[u32
/// type][u32 count]`.
const NODE_HEADER_SIZE: usize = 8;

/// Read the `ndims`-ordinate vertex starting at `offset` within `body`.
fn read_vertex(body: &[u8], offset: usize, ndims: usize) -> Result<Vec<f64>> {
    let end = offset + ndims * 8;
    if body.len() < end {
        return Err(GeomError::Truncated("vertex block"));
    }
    Ok((0..ndims)
        .map(|d| LittleEndian::read_f64(&body[offset + d * 8..offset + d * 8 + 8]))
        .collect())
}

/// The tight bbox of a handful of vertices, via the same per-vertex
/// expansion the authoritative `calculate_gbox` uses.
fn gbox_from_vertices(vertices: &[Vec<f64>], flags: Flags) -> GBox {
    let mut acc: Option<GBox> = None;
    for v in vertices {
        expand_with_vertex(&mut acc, v, flags);
    }
    acc.unwrap_or_else(GBox::empty)
}

/// The geometry type code, read straight from the body header.
pub fn peek_type(bytes: &[u8]) -> Result<TypeCode> {
    crate::functions::accessors::get_type(bytes)
}

/// Whether the tree is structurally empty. Decodes in zero-copy mode,
/// so this allocates the shape of the tree but never copies vertex
/// data.
pub fn peek_is_empty(bytes: &[u8]) -> Result<bool> {
    let sg = SerializedGeom::from_bytes(bytes)?;
    let geom = sg.decode(true)?;
    Ok(is_empty(&geom))
}

/// The cached bbox if one exists; otherwise the bbox if it's cheap to
/// derive without a full tree decode, for the shapes spec §4.D names as
/// eligible (all non-geodetic, no cached bbox):
///
/// - a single, non-empty `Point`;
/// - a `Line` with exactly two vertices;
/// - a `MultiPoint` with exactly one non-empty child;
/// - a `MultiLine` with exactly one two-vertex child.
///
/// Returns `Ok(None)` for every other shape — callers that need a box
/// regardless should use [`get_gbox`].
pub fn peek_gbox(bytes: &[u8]) -> Result<Option<GBox>> {
    let sg = SerializedGeom::from_bytes(bytes)?;
    if sg.flags().has_bbox() {
        return sg.gbox();
    }
    if sg.flags().is_geodetic() {
        return Ok(None);
    }

    let body = sg.body_bytes();
    if body.len() < NODE_HEADER_SIZE {
        return Err(GeomError::Truncated("node header"));
    }
    let flags = sg.flags();
    let ndims = flags.ndims() as usize;
    let raw_type = LittleEndian::read_u32(&body[0..4]);
    let count = LittleEndian::read_u32(&body[4..8]) as usize;
    let tc = TypeCode::from_code(raw_type)?;

    let gbox = match tc {
        TypeCode::Point if count == 1 => {
            let v = read_vertex(body, NODE_HEADER_SIZE, ndims)?;
            Some(gbox_from_vertices(&[v], flags))
        }
        TypeCode::Line if count == 2 => {
            let v0 = read_vertex(body, NODE_HEADER_SIZE, ndims)?;
            let v1 = read_vertex(body, NODE_HEADER_SIZE + ndims * 8, ndims)?;
            Some(gbox_from_vertices(&[v0, v1], flags))
        }
        TypeCode::MultiPoint if count == 1 => {
            peek_single_child(body, ndims, flags, TypeCode::Point, 1)?
        }
        TypeCode::MultiLine if count == 1 => {
            peek_single_child(body, ndims, flags, TypeCode::Line, 2)?
        }
        _ => None,
    };

    Ok(gbox.map(|b: GBox| b.to_f32_envelope()))
}

/// For a collection with exactly one child (already confirmed by the
/// caller), check the child is `expected_type` with `expected_count`
/// vertices and, if so, return its tight bbox — without decoding the
/// collection into a tree.
fn peek_single_child(
    body: &[u8],
    ndims: usize,
    flags: Flags,
    expected_type: TypeCode,
    expected_count: usize,
) -> Result<Option<GBox>> {
    let child_header = NODE_HEADER_SIZE + NODE_HEADER_SIZE;
    if body.len() < child_header {
        return Err(GeomError::Truncated("node header"));
    }
    let child_raw_type = LittleEndian::read_u32(&body[NODE_HEADER_SIZE..NODE_HEADER_SIZE + 4]);
    let child_count =
        LittleEndian::read_u32(&body[NODE_HEADER_SIZE + 4..NODE_HEADER_SIZE + 8]) as usize;
    let child_type = TypeCode::from_code(child_raw_type)?;
    if child_type != expected_type || child_count != expected_count {
        return Ok(None);
    }
    let vertices = (0..expected_count)
        .map(|i| read_vertex(body, child_header + i * ndims * 8, ndims))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(gbox_from_vertices(&vertices, flags)))
}

/// A bbox under any circumstances: cached, peeked, or — as a last
/// resort — computed from a full scan of the tree.
pub fn get_gbox(bytes: &[u8]) -> Result<Option<GBox>> {
    if let Some(gbox) = peek_gbox(bytes)? {
        return Ok(Some(gbox));
    }
    diagnostics::trace("get_gbox falling back to a full tree scan");
    let sg = SerializedGeom::from_bytes(bytes)?;
    let geom = sg.decode(true)?;
    Ok(calculate_gbox(&geom))
}

/// The first vertex in document order, skipping empty leaves.
pub fn peek_first_point(bytes: &[u8]) -> Result<Option<Vec<f64>>> {
    let sg = SerializedGeom::from_bytes(bytes)?;
    let geom = sg.decode(true)?;
    Ok(first_vertex(&geom))
}
