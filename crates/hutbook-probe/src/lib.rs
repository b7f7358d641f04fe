/// The page probe JavaScript implementation.
/// This string is injected into browser contexts by backends.
pub const PROBE_JS: &str = include_str!("probe.js");

/// Expression that evaluates to `true` once the probe is installed.
pub const PROBE_READY_CHECK: &str = "typeof window.Hutbook !== 'undefined'";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn probe_script_is_embedded() {
        assert!(!PROBE_JS.is_empty());
        assert!(PROBE_JS.contains("Hutbook"));
        assert!(PROBE_JS.contains("process"));
    }
}
