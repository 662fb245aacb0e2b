//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  ConsoleConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     ConsoleConfig (final)
//! ```

use super::ConsoleConfig;

/// Trait for applying configuration overrides.
///
/// Implementors modify an existing config with their specific overrides,
/// keeping file/env loading separate from runtime overrides (CLI flags).
pub trait ConfigResolver {
    /// Applies overrides to the given configuration.
    ///
    /// Only values the implementor actually holds should be applied,
    /// preserving existing values for unspecified options.
    fn apply(&self, config: &mut ConsoleConfig);
}

/// No-op resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut ConsoleConfig) {}
}
