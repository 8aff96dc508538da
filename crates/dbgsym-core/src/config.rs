//! # Registry configuration
//!
//! Limits applied to every module registry. Defaults match the dbghelp record
//! layout; hosts can tighten them through the environment:
//!
//! - `DBGSYM_SYMBOL_LIMIT`: maximum number of nodes per module
//! - `DBGSYM_NAME_CAPACITY`: name buffer size (in characters, terminator included)
//!   of the records handed to enumeration callbacks and name lookups

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Environment variable overriding [`RegistryConfig::symbol_limit`].
pub const SYMBOL_LIMIT_ENV: &str = "DBGSYM_SYMBOL_LIMIT";
/// Environment variable overriding [`RegistryConfig::name_capacity`].
pub const NAME_CAPACITY_ENV: &str = "DBGSYM_NAME_CAPACITY";

/// Largest node count a module can hold: handles are `index + 1` and must fit a `u32`.
pub const MAX_SYMBOLS: usize = (u32::MAX - 1) as usize;
/// Name buffer of a `SYMBOL_INFO` record as used by type enumeration.
pub const DEFAULT_NAME_CAPACITY: usize = 256;

/// Per-module registry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig
{
    /// Maximum number of nodes (types and lexical symbols) a module may allocate.
    pub symbol_limit: usize,
    /// Name capacity of enumeration and lookup records, terminator included.
    pub name_capacity: usize,
}

impl Default for RegistryConfig
{
    fn default() -> Self
    {
        Self {
            symbol_limit: MAX_SYMBOLS,
            name_capacity: DEFAULT_NAME_CAPACITY,
        }
    }
}

impl RegistryConfig
{
    /// Defaults overridden by `DBGSYM_SYMBOL_LIMIT` / `DBGSYM_NAME_CAPACITY`.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self
    {
        let defaults = Self::default();
        Self {
            symbol_limit: read_env(SYMBOL_LIMIT_ENV).unwrap_or(defaults.symbol_limit),
            name_capacity: read_env(NAME_CAPACITY_ENV).unwrap_or(defaults.name_capacity),
        }
        .clamped()
    }

    /// Same limits with a different symbol cap.
    #[must_use]
    pub fn with_symbol_limit(self, symbol_limit: usize) -> Self
    {
        Self { symbol_limit, ..self }.clamped()
    }

    /// Same limits with a different record name capacity.
    #[must_use]
    pub fn with_name_capacity(self, name_capacity: usize) -> Self
    {
        Self { name_capacity, ..self }.clamped()
    }

    fn clamped(self) -> Self
    {
        Self {
            symbol_limit: self.symbol_limit.min(MAX_SYMBOLS),
            name_capacity: self.name_capacity.max(1),
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T>
{
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = key, value = %raw, "ignoring unparseable registry setting");
            None
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_defaults()
    {
        let config = RegistryConfig::default();
        assert_eq!(config.symbol_limit, MAX_SYMBOLS);
        assert_eq!(config.name_capacity, 256);
    }

    #[test]
    fn test_limits_are_clamped()
    {
        let config = RegistryConfig::default().with_symbol_limit(usize::MAX).with_name_capacity(0);
        assert_eq!(config.symbol_limit, MAX_SYMBOLS);
        assert_eq!(config.name_capacity, 1);
    }
}
