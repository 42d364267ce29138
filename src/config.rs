//! Process-wide configuration (spec §5.1, §9's "injected allocator"
//! open question — resolved there as: no custom allocator hook, just a
//! small set of behavioral knobs installed once at process start).

use std::sync::OnceLock;

/// Behavioral knobs that apply crate-wide. Installed at most once per
/// process; every caller after that sees the same values.
#[derive(Debug, Clone, Copy)]
pub struct GeomEnv {
    /// Significant digits used by [`crate::functions::io::to_debug_string`].
    pub wkt_significant_digits: u32,
    /// Whether subtype/dimension violations are rejected (`true`) or
    /// best-effort repaired by the caller before calling the codec.
    /// The codec itself always rejects; this flag is advisory for
    /// callers that want to pre-validate.
    pub strict_validation: bool,
}

impl Default for GeomEnv {
    fn default() -> Self {
        // spec §6: `to_debug_string` delegates to the WKT renderer "at 12
        // significant digits" — fixed, not a knob the host can tune away.
        GeomEnv { wkt_significant_digits: 12, strict_validation: true }
    }
}

static ENV: OnceLock<GeomEnv> = OnceLock::new();

/// Install the process-wide configuration. Returns `false` if one was
/// already installed (first writer wins, per `OnceLock` semantics).
pub fn install(env: GeomEnv) -> bool {
    ENV.set(env).is_ok()
}

/// The active configuration, defaulting it in place on first access if
/// nothing was ever installed.
pub fn current() -> GeomEnv {
    *ENV.get_or_init(GeomEnv::default)
}
