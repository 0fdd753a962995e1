//! Tracing subscriber setup for binaries and tests embedding the ledger.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `filter` (an `EnvFilter` directive
/// string such as `"info"` or `"flipledger=debug"`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(filter: &str) -> bool {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("not a [valid filter"));
    }
}
