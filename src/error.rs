use thiserror::Error;

/// Error kinds raised by the codec, per the error table of the format
/// specification. Every "fatal" kind there is realized here as an
/// ordinary `Err` — a library must never abort its host process.
#[derive(Debug, Error)]
pub enum GeomError {
    /// Parent flags' (Z, M) disagree with a child/vertex array.
    #[error("dimension mismatch: container expects {expected} ordinates, got {found}")]
    DimensionMismatch { expected: u8, found: u8 },

    /// Type code not in the recognized set.
    #[error("unknown geometry type code: {0}")]
    UnknownType(u32),

    /// Collection contains a subtype the compatibility table forbids.
    #[error("{parent} cannot contain a {child} child")]
    InvalidSubtype {
        parent: &'static str,
        child: &'static str,
    },

    /// Encoder's post-write cursor did not match the size oracle's prediction.
    #[error("size mismatch: oracle predicted {expected} bytes, wrote {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Shape too complex for `peek_gbox` / `peek_first_point`.
    #[error("peek unsupported for this shape")]
    PeekUnsupported,

    /// Null/empty/truncated input where a well-formed blob was required.
    #[error("null or truncated input")]
    NullInput,

    /// Geometry body did not decode to the exact byte count the header implies.
    #[error("truncated or corrupt body: {0}")]
    Truncated(&'static str),

    /// The host's endianness does not match the format's native-endian
    /// encoding (see spec §6: the format carries no endian marker).
    #[error("unsupported host endianness for this serialized format")]
    UnsupportedEndian,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeomError>;
