//! Variable locations and the per-module location resolver.
//!
//! Debug formats describe where a variable lives in many ways. Most of them are
//! stored as-is; the ones that need format-specific evaluation (DWARF location
//! expressions, PDB frame-relative records, ...) are stored as
//! [`Location::Deferred`] and handed to the module's [`LocationResolver`] when a
//! `Value` query needs them.

use super::{Module, SymId};

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location
{
    /// The debug information was malformed.
    Error,
    /// Optimised out or otherwise not available.
    Unavailable,
    /// Module-relative offset of the storage.
    Absolute(u64),
    /// Held in a register.
    Register
    {
        register: u16
    },
    /// At `register + offset` (frame-relative locals and parameters).
    RegisterRelative
    {
        register: u16,
        offset: i64,
    },
    /// Offset inside the thread-local storage block.
    TlsRelative(u64),
    /// Format-specific location the resolver must reduce.
    Deferred
    {
        /// Resolver-defined discriminator.
        kind: u32,
        /// Resolver-defined payload (expression offset, record index, ...).
        payload: u64,
    },
}

impl Location
{
    /// Offset of an absolute location.
    #[must_use]
    pub const fn absolute_offset(&self) -> Option<u64>
    {
        match self {
            Location::Absolute(offset) => Some(*offset),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool
    {
        matches!(self, Location::Deferred { .. })
    }
}

/// Format-specific capability that reduces a deferred location.
///
/// Registered per module by whichever debug-format reader populated it. The
/// resolver receives the module read-only, so it may look up other nodes while
/// computing (the variable's enclosing block or function is its
/// `lexical_parent`); it cannot mutate the registry.
pub trait LocationResolver: Send + Sync
{
    /// Reduce the `location` of `variable`. Anything but [`Location::Absolute`]
    /// counts as failure.
    fn compute(&self, module: &Module, variable: SymId, location: &Location) -> Location;
}

impl<F> LocationResolver for F
where
    F: Fn(&Module, SymId, &Location) -> Location + Send + Sync,
{
    fn compute(&self, module: &Module, variable: SymId, location: &Location) -> Location
    {
        self(module, variable, location)
    }
}
