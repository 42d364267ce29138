#![doc = include_str!("../README.md")]

pub mod bbox;
pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod functions;
pub mod geom;
pub mod header;
pub mod serialized;

pub use error::{GeomError, Result};
pub use geom::{Geom, PointArray, TypeCode};
pub use serialized::SerializedGeom;
