//! The on-wire blob: fixed header, optional cached bbox, tree body
//! (spec §3.1, §3.6). This module owns the top-level `serialize` /
//! `deserialize` entry points; [`crate::header`] and [`crate::codec`]
//! own the sub-layouts they're each responsible for.

use byteorder::{ByteOrder, LittleEndian};

use crate::bbox::{self, GBox};
use crate::codec::{decode_body, encode_body};
use crate::diagnostics;
use crate::error::{GeomError, Result};
use crate::geom::{calculate_gbox, needs_bbox, Geom};
use crate::header::{self, clamp_srid, pack_srid, unpack_srid, Flags, FIXED_HEADER_SIZE};

/// A read-only view over an already-serialized blob, giving access to
/// the header fields and cached bbox without decoding the body (spec
/// §4.D's "peek" design point).
#[derive(Debug, Clone, Copy)]
pub struct SerializedGeom<'a> {
    bytes: &'a [u8],
}

impl<'a> SerializedGeom<'a> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < FIXED_HEADER_SIZE {
            return Err(GeomError::NullInput);
        }
        Ok(SerializedGeom { bytes })
    }

    /// The raw varlena size word: `length << 2`, low 2 bits reserved for
    /// the host's varlena flags (opaque here, always zero on write).
    pub fn declared_size(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[0..4])
    }

    /// The blob's total length in bytes, i.e. `declared_size() >> 2`
    /// (spec §3.1: "Total length equals `size_varlen >> 2`").
    pub fn declared_len(&self) -> usize {
        (self.declared_size() >> 2) as usize
    }

    pub fn srid(&self) -> i32 {
        unpack_srid(self.bytes[4], self.bytes[5], self.bytes[6])
    }

    pub fn flags(&self) -> Flags {
        Flags::from_byte(self.bytes[7])
    }

    fn header_len(&self) -> usize {
        header::header_size(self.flags())
    }

    /// The packed bbox region, if one was cached at encode time.
    pub fn gbox(&self) -> Result<Option<GBox>> {
        if !self.flags().has_bbox() {
            return Ok(None);
        }
        let region = &self.bytes[FIXED_HEADER_SIZE..self.header_len()];
        let mut cursor = std::io::Cursor::new(region);
        Ok(Some(bbox::read_gbox(&mut cursor, self.flags())?))
    }

    /// Bytes of the recursive tree body, past the fixed header and any
    /// cached bbox.
    pub fn body_bytes(&self) -> &'a [u8] {
        &self.bytes[self.header_len()..]
    }

    /// Decode the full tree. `zero_copy` selects whether vertex arrays
    /// alias this blob or are copied out (spec §3.6).
    pub fn decode(&self, zero_copy: bool) -> Result<Geom<'a>> {
        let (geom, _used) = decode_body(self.body_bytes(), self.flags(), zero_copy)?;
        Ok(geom)
    }
}

/// Encode `geom` into a freshly-allocated blob, clamping `srid` into the
/// on-wire range and caching a bbox whenever [`needs_bbox`] says to
/// (spec §3.6, §4.A).
pub fn serialize(geom: &Geom, srid: i32) -> Result<Vec<u8>> {
    let (clamped_srid, notice) = clamp_srid(srid);
    if notice {
        diagnostics::notice(&format!("SRID {srid} out of range; stored as {clamped_srid}"));
    }

    let mut flags = geom.flags();
    let want_bbox = needs_bbox(geom);
    flags.set_has_bbox(want_bbox);

    let hsize = header::header_size(flags);
    let mut buf = vec![0u8; hsize];

    let packed = pack_srid(clamped_srid);
    buf[4] = packed[0];
    buf[5] = packed[1];
    buf[6] = packed[2];
    buf[7] = flags.to_byte();

    if want_bbox {
        let gbox = calculate_gbox(geom).unwrap_or_else(GBox::empty);
        let mut bbox_buf = Vec::new();
        bbox::write_gbox(&mut bbox_buf, &gbox, flags)?;
        buf[FIXED_HEADER_SIZE..FIXED_HEADER_SIZE + bbox_buf.len()].copy_from_slice(&bbox_buf);
    }

    encode_body(geom, &mut buf)?;

    let total = buf.len() as u32;
    LittleEndian::write_u32(&mut buf[0..4], total << 2);
    Ok(buf)
}

/// Decode a blob in full, returning the tree and the SRID it was stored
/// under. Verifies the declared size matches the buffer actually handed
/// in (spec §3.5: a serialized blob is self-describing).
pub fn deserialize<'a>(bytes: &'a [u8], zero_copy: bool) -> Result<(Geom<'a>, i32)> {
    let sg = SerializedGeom::from_bytes(bytes)?;
    if sg.declared_len() != bytes.len() {
        return Err(GeomError::Truncated("declared size does not match buffer length"));
    }
    let geom = sg.decode(zero_copy)?;
    Ok((geom, sg.srid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::PointArray;
    use crate::header::Flags;

    #[test]
    fn point_roundtrip_has_no_cached_bbox() {
        let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
        let blob = serialize(&geom, 4326).unwrap();
        let sg = SerializedGeom::from_bytes(&blob).unwrap();
        assert!(!sg.flags().has_bbox());
        assert_eq!(sg.srid(), 4326);
        let (decoded, srid) = deserialize(&blob, false).unwrap();
        assert_eq!(srid, 4326);
        match decoded {
            Geom::Point { points, .. } => assert_eq!(points.vertex(0).unwrap(), vec![1.0, 2.0]),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn line_roundtrip_caches_bbox() {
        let geom = Geom::Line {
            flags: Flags::empty(),
            points: PointArray::owned(vec![0.0, 0.0, 3.0, 4.0], 2),
        };
        let blob = serialize(&geom, 0).unwrap();
        let sg = SerializedGeom::from_bytes(&blob).unwrap();
        assert!(sg.flags().has_bbox());
        let gbox = sg.gbox().unwrap().unwrap();
        assert_eq!(gbox.xmin, 0.0);
        assert_eq!(gbox.xmax, 3.0);
        let (_decoded, srid) = deserialize(&blob, true).unwrap();
        assert_eq!(srid, 0);
    }

    #[test]
    fn negative_srid_clamps_to_unknown() {
        let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![1.0, 2.0], 2) };
        let blob = serialize(&geom, -5).unwrap();
        let sg = SerializedGeom::from_bytes(&blob).unwrap();
        assert_eq!(sg.srid(), 0);
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let geom = Geom::Line {
            flags: Flags::empty(),
            points: PointArray::owned(vec![0.0, 0.0, 1.0, 1.0], 2),
        };
        let mut blob = serialize(&geom, 0).unwrap();
        blob.truncate(blob.len() - 2);
        assert!(deserialize(&blob, false).is_err());
    }

    #[test]
    fn declared_size_is_length_shifted_left_two() {
        let geom = Geom::Point { flags: Flags::empty(), points: PointArray::owned(vec![5.0, 6.0], 2) };
        let blob = serialize(&geom, 0).unwrap();
        let sg = SerializedGeom::from_bytes(&blob).unwrap();
        assert_eq!(sg.declared_len(), blob.len());
        assert_eq!(sg.declared_size(), (blob.len() as u32) << 2);
    }
}
