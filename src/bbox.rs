//! BBox Codec — component B.
//!
//! Packs a [`GBox`] as outward-rounded `f32` pairs, reads it back, and
//! derives a sortable 64-bit Z-order key from its centroid (spec §3.3,
//! §4.B).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Result;
use crate::geom::geodetic;
use crate::header::Flags;

/// Axis-aligned hyper-rectangle in up to 4 dimensions. Absent axes carry
/// `NAN` so a tight box and a packed-then-widened box share one type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    pub mmin: f64,
    pub mmax: f64,
}

impl GBox {
    pub const fn empty() -> Self {
        GBox {
            xmin: f64::NAN,
            xmax: f64::NAN,
            ymin: f64::NAN,
            ymax: f64::NAN,
            zmin: f64::NAN,
            zmax: f64::NAN,
            mmin: f64::NAN,
            mmax: f64::NAN,
        }
    }

    pub fn from_xy(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        GBox {
            xmin,
            xmax,
            ymin,
            ymax,
            ..GBox::empty()
        }
    }

    /// Widen `other`'s range into `self` in place, ignoring NaN axes.
    pub fn expand(&mut self, other: &GBox) {
        self.xmin = nan_min(self.xmin, other.xmin);
        self.xmax = nan_max(self.xmax, other.xmax);
        self.ymin = nan_min(self.ymin, other.ymin);
        self.ymax = nan_max(self.ymax, other.ymax);
        self.zmin = nan_min(self.zmin, other.zmin);
        self.zmax = nan_max(self.zmax, other.zmax);
        self.mmin = nan_min(self.mmin, other.mmin);
        self.mmax = nan_max(self.mmax, other.mmax);
    }

    /// Conservative outward-rounded conversion to `f32` precision, the form
    /// a stored/packed bbox carries. Used so a peeked box and a cached box
    /// compare equal even though peek and decode can disagree past the
    /// 6th significant digit (spec §4.D).
    pub fn to_f32_envelope(&self) -> GBox {
        GBox {
            xmin: next_float_down(self.xmin) as f64,
            xmax: next_float_up(self.xmax) as f64,
            ymin: next_float_down(self.ymin) as f64,
            ymax: next_float_up(self.ymax) as f64,
            zmin: nan_round(self.zmin, next_float_down),
            zmax: nan_round(self.zmax, next_float_up),
            mmin: nan_round(self.mmin, next_float_down),
            mmax: nan_round(self.mmax, next_float_up),
        }
    }
}

fn nan_round(v: f64, f: impl Fn(f64) -> f32) -> f64 {
    if v.is_nan() {
        f64::NAN
    } else {
        f(v) as f64
    }
}

fn nan_min(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => f64::NAN,
        (true, false) => b,
        (false, true) => a,
        (false, false) => a.min(b),
    }
}

fn nan_max(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => f64::NAN,
        (true, false) => b,
        (false, true) => a,
        (false, false) => a.max(b),
    }
}

/// Number of `f32`s the packed form occupies for a given flag set (spec
/// §3.3): 4 for plain XY, 6 once a third axis (geocentric Z, Z, or M, in
/// that precedence order) is present.
fn float_count(flags: Flags) -> usize {
    if flags.is_geodetic() || flags.has_z() || flags.has_m() {
        6
    } else {
        4
    }
}

/// Packed byte size of the bbox region for this flag set.
pub fn packed_size(flags: Flags) -> usize {
    4 * float_count(flags)
}

/// Largest `f32` ≤ `x` (pass-through for ±∞/NaN). See spec §4.B.
pub fn next_float_down(x: f64) -> f32 {
    if x.is_nan() {
        return f32::NAN;
    }
    if x == f64::INFINITY {
        return f32::INFINITY;
    }
    if x == f64::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    let f = x as f32;
    if (f as f64) > x {
        prev_f32(f)
    } else {
        f
    }
}

/// Smallest `f32` ≥ `x` (pass-through for ±∞/NaN). See spec §4.B.
pub fn next_float_up(x: f64) -> f32 {
    if x.is_nan() {
        return f32::NAN;
    }
    if x == f64::INFINITY {
        return f32::INFINITY;
    }
    if x == f64::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }
    let f = x as f32;
    if (f as f64) < x {
        next_f32(f)
    } else {
        f
    }
}

fn next_f32(f: f32) -> f32 {
    if f.is_infinite() {
        return f;
    }
    if f == 0.0 {
        return f32::from_bits(1); // smallest positive subnormal
    }
    let bits = f.to_bits();
    let bits = if f > 0.0 { bits + 1 } else { bits - 1 };
    f32::from_bits(bits)
}

fn prev_f32(f: f32) -> f32 {
    if f.is_infinite() {
        return f;
    }
    if f == 0.0 {
        return -f32::from_bits(1); // smallest negative subnormal
    }
    let bits = f.to_bits();
    let bits = if f > 0.0 { bits - 1 } else { bits + 1 };
    f32::from_bits(bits)
}

/// Write the present axes of `gbox` (per `flags`) as outward-rounded
/// `f32`s, in X, Y, [geocentric-Z | Z | M] order.
pub fn write_gbox(buf: &mut Vec<u8>, gbox: &GBox, flags: Flags) -> Result<()> {
    buf.write_f32::<LittleEndian>(next_float_down(gbox.xmin))?;
    buf.write_f32::<LittleEndian>(next_float_up(gbox.xmax))?;
    buf.write_f32::<LittleEndian>(next_float_down(gbox.ymin))?;
    buf.write_f32::<LittleEndian>(next_float_up(gbox.ymax))?;
    if flags.is_geodetic() || flags.has_z() {
        buf.write_f32::<LittleEndian>(next_float_down(gbox.zmin))?;
        buf.write_f32::<LittleEndian>(next_float_up(gbox.zmax))?;
    } else if flags.has_m() {
        buf.write_f32::<LittleEndian>(next_float_down(gbox.mmin))?;
        buf.write_f32::<LittleEndian>(next_float_up(gbox.mmax))?;
    }
    Ok(())
}

/// Read a packed bbox back, widening its `f32`s to `f64` and filling
/// absent axes with `NAN`.
pub fn read_gbox(cursor: &mut std::io::Cursor<&[u8]>, flags: Flags) -> Result<GBox> {
    let mut gbox = GBox::empty();
    gbox.xmin = cursor.read_f32::<LittleEndian>()? as f64;
    gbox.xmax = cursor.read_f32::<LittleEndian>()? as f64;
    gbox.ymin = cursor.read_f32::<LittleEndian>()? as f64;
    gbox.ymax = cursor.read_f32::<LittleEndian>()? as f64;
    if flags.is_geodetic() || flags.has_z() {
        gbox.zmin = cursor.read_f32::<LittleEndian>()? as f64;
        gbox.zmax = cursor.read_f32::<LittleEndian>()? as f64;
    } else if flags.has_m() {
        gbox.mmin = cursor.read_f32::<LittleEndian>()? as f64;
        gbox.mmax = cursor.read_f32::<LittleEndian>()? as f64;
    }
    Ok(gbox)
}

fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Morton/Z-order interleave of two 32-bit keys: bit `2i` of the result is
/// bit `i` of `x`, bit `2i+1` is bit `i` of `y` (spec §4.B).
fn morton64(x: u32, y: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1)
}

/// Sortable centroid hash of spec §4.B. `geodetic` selects the
/// geocentric-normalize-then-project branch; otherwise the raw,
/// non-halved `(xmin+xmax, ymin+ymax)` representative point is used.
pub fn sortable_hash(gbox: &GBox, geodetic_flag: bool) -> u64 {
    let (xr, yr) = if geodetic_flag {
        let cx = (gbox.xmin + gbox.xmax) / 2.0;
        let cy = (gbox.ymin + gbox.ymax) / 2.0;
        let cz = (gbox.zmin + gbox.zmax) / 2.0;
        let unit = geodetic::normalize(geodetic::Point3D { x: cx, y: cy, z: cz });
        let (lon, lat) = geodetic::cart2geog(unit);
        (lon, lat)
    } else {
        (gbox.xmin + gbox.xmax, gbox.ymin + gbox.ymax)
    };
    let xb = (xr as f32).to_bits();
    let yb = (yr as f32).to_bits();
    morton64(xb, yb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outward_rounding_covers_f64_value() {
        let x = 1.0_f64 / 3.0;
        let down = next_float_down(x);
        let up = next_float_up(x);
        assert!((down as f64) <= x);
        assert!((up as f64) >= x);
        assert!(down <= up);
    }

    #[test]
    fn outward_rounding_passes_through_infinities_and_nan() {
        assert_eq!(next_float_down(f64::INFINITY), f32::INFINITY);
        assert_eq!(next_float_up(f64::NEG_INFINITY), f32::NEG_INFINITY);
        assert!(next_float_down(f64::NAN).is_nan());
        assert!(next_float_up(f64::NAN).is_nan());
    }

    #[test]
    fn outward_rounding_exact_value_is_unchanged() {
        assert_eq!(next_float_down(2.0), 2.0_f32);
        assert_eq!(next_float_up(2.0), 2.0_f32);
    }

    #[test]
    fn packed_size_xy_only() {
        let flags = Flags::empty();
        assert_eq!(packed_size(flags), 16);
    }

    #[test]
    fn packed_size_with_z() {
        let mut flags = Flags::empty();
        flags.set_has_z(true);
        assert_eq!(packed_size(flags), 24);
    }

    #[test]
    fn write_then_read_gbox_roundtrip() {
        let mut flags = Flags::empty();
        flags.set_has_z(true);
        let gbox = GBox {
            xmin: 1.0,
            xmax: 2.0,
            ymin: 3.0,
            ymax: 4.0,
            zmin: 5.0,
            zmax: 6.0,
            mmin: f64::NAN,
            mmax: f64::NAN,
        };
        let mut buf = Vec::new();
        write_gbox(&mut buf, &gbox, flags).unwrap();
        assert_eq!(buf.len(), packed_size(flags));
        let mut cursor = std::io::Cursor::new(buf.as_slice());
        let back = read_gbox(&mut cursor, flags).unwrap();
        assert_eq!(back.xmin, 1.0);
        assert_eq!(back.zmax, 6.0);
        assert!(back.mmin.is_nan());
    }

    #[test]
    fn fast_path_hash_sign_matches_geometric_order() {
        let a = GBox::from_xy(0.0, 0.0, 0.0, 0.0);
        let b = GBox::from_xy(1.0, 1.0, 0.0, 0.0);
        assert!(sortable_hash(&a, false) < sortable_hash(&b, false));
    }
}
