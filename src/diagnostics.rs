//! Logging facade (spec §5/§9's injected logger vtable, realized as a
//! thin wrapper over the `log` crate rather than a trait object — there
//! is exactly one sink in this crate's world, the host's configured
//! `log` implementation).

/// A condition worth surfacing to an operator but not worth failing the
/// call over — an SRID fold, a degraded `get_gbox` fallback, and so on.
pub fn notice(message: &str) {
    log::warn!(target: "geoserial", "{message}");
}

/// Verbose, call-site-level detail, compiled out in release builds that
/// disable the `debug` log level at the `log` crate's static max-level.
pub fn trace(message: &str) {
    log::debug!(target: "geoserial", "{message}");
}
