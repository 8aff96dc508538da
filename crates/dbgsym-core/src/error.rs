//! # Error Types
//!
//! Error handling for the symbol registry.
//!
//! We use `thiserror` to generate the `Error` implementations. Every registry
//! operation returns [`RegistryResult`]; nothing in this crate panics on bad
//! input. The engine entry points additionally mirror each failure into a
//! thread-local "last error" code, which callers read only after a failed call.

use std::cell::Cell;
use std::fmt;

use thiserror::Error;

use crate::symbols::QueryKind;
use crate::types::{DataKind, SymTag};

/// Main error type for registry operations
///
/// ## Error Categories
///
/// 1. **Not found**: InvalidHandle, NameNotFound, ProcessNotFound, ModuleNotFound
/// 2. **Kind mismatch**: NotApplicable, UnexpectedTag, NotAType, InvalidDataKind, ForeignSymbol,
///    ScopeMismatch
/// 3. **Unimplemented**: Unimplemented (RTTI family), UnknownQuery
/// 4. **Resource exhaustion**: ArenaExhausted
/// 5. **Deferred computation**: LocationUnavailable, DelegationTooDeep, LengthOverflow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError
{
    /// Handle is zero or beyond the module's current symbol count.
    #[error("Invalid symbol handle: {0}")]
    InvalidHandle(u32),

    /// The referenced symbol was created by a different module registry.
    #[error("Symbol does not belong to this module")]
    ForeignSymbol,

    /// No type with this name (and kind filter) is registered.
    #[error("No type named {0:?}")]
    NameNotFound(String),

    /// The query is meaningful, just not for this kind of node.
    #[error("{query:?} is not applicable to {tag}")]
    NotApplicable
    {
        /// Query that was attempted
        query: QueryKind,
        /// Tag of the node it was attempted on
        tag: SymTag,
    },

    /// A constructor was handed a parent of the wrong kind.
    #[error("Expected a {expected} node, found {found}")]
    UnexpectedTag
    {
        expected: SymTag,
        found: SymTag,
    },

    /// A type reference points at a node that is not a type.
    #[error("Expected a type node, found {0}")]
    NotAType(SymTag),

    /// A block handed in as the enclosing scope belongs to another function.
    #[error("Block {block} is not nested in function {function}")]
    ScopeMismatch
    {
        /// Handle of the offending block
        block: u32,
        /// Handle of the function the caller named
        function: u32,
    },

    /// A function-scoped variable was declared with a non-local data kind.
    #[error("{0:?} is not a function-scoped data kind")]
    InvalidDataKind(DataKind),

    /// Recognised query kind that this registry never answers.
    #[error("Query {0:?} is not implemented")]
    Unimplemented(QueryKind),

    /// Raw query code the dispatcher does not handle.
    #[error("Unsupported query code {0}")]
    UnknownQuery(u32),

    /// The module's symbol arena cannot hold another node.
    #[error("Symbol arena exhausted (limit {limit})")]
    ArenaExhausted
    {
        /// Configured symbol limit at the time of the failure
        limit: usize,
    },

    /// A variable's location could not be reduced to an absolute offset.
    #[error("Location unavailable")]
    LocationUnavailable,

    /// Type delegation (typedef, enum, array element) went deeper than allowed.
    #[error("Type reference chain deeper than {0}")]
    DelegationTooDeep(usize),

    /// Element length times count does not fit in 64 bits.
    #[error("Array length overflows u64")]
    LengthOverflow,

    /// Child window requested outside the node's child list.
    #[error("Children [{start}, {start}+{count}) out of range ({available} available)")]
    ChildrenOutOfRange
    {
        start: u32,
        count: u32,
        available: usize,
    },

    /// No process with this handle is registered with the engine.
    #[error("Process not found: {0:#x}")]
    ProcessNotFound(u64),

    /// No module is loaded at this base address.
    #[error("No module at base address {0:#x}")]
    ModuleNotFound(u64),

    /// A module is already loaded at this base address.
    #[error("Module already loaded at base address {0:#x}")]
    ModuleAlreadyLoaded(u64),
}

impl RegistryError
{
    /// Code stored in the thread's last-error cell when this error reaches the API boundary.
    #[must_use]
    pub fn last_error(&self) -> LastError
    {
        match self {
            RegistryError::InvalidHandle(_) | RegistryError::ForeignSymbol | RegistryError::ProcessNotFound(_) => {
                LastError::InvalidHandle
            }
            RegistryError::NameNotFound(_) => LastError::InvalidName,
            RegistryError::NotApplicable { .. }
            | RegistryError::UnexpectedTag { .. }
            | RegistryError::NotAType(_)
            | RegistryError::ScopeMismatch { .. }
            | RegistryError::InvalidDataKind(_)
            | RegistryError::ChildrenOutOfRange { .. }
            | RegistryError::ModuleAlreadyLoaded(_) => LastError::InvalidParameter,
            RegistryError::Unimplemented(_)
            | RegistryError::UnknownQuery(_)
            | RegistryError::LocationUnavailable
            | RegistryError::DelegationTooDeep(_)
            | RegistryError::LengthOverflow => LastError::NotSupported,
            RegistryError::ArenaExhausted { .. } => LastError::NotEnoughMemory,
            RegistryError::ModuleNotFound(_) => LastError::ModNotFound,
        }
    }
}

/// Convenience type alias for `Result<T, RegistryError>`
///
/// ```rust
/// use dbgsym_core::error::RegistryResult;
/// fn foo() -> RegistryResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Win32-compatible error codes reported through the last-error cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LastError
{
    Success = 0,
    InvalidHandle = 6,
    NotEnoughMemory = 8,
    NotSupported = 50,
    InvalidParameter = 87,
    InvalidName = 123,
    ModNotFound = 126,
}

impl LastError
{
    #[must_use]
    pub const fn code(self) -> u32
    {
        self as u32
    }
}

impl fmt::Display for LastError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            LastError::Success => "ERROR_SUCCESS",
            LastError::InvalidHandle => "ERROR_INVALID_HANDLE",
            LastError::NotEnoughMemory => "ERROR_NOT_ENOUGH_MEMORY",
            LastError::NotSupported => "ERROR_NOT_SUPPORTED",
            LastError::InvalidParameter => "ERROR_INVALID_PARAMETER",
            LastError::InvalidName => "ERROR_INVALID_NAME",
            LastError::ModNotFound => "ERROR_MOD_NOT_FOUND",
        };
        write!(f, "{label} ({})", self.code())
    }
}

thread_local! {
    static LAST_ERROR: Cell<LastError> = const { Cell::new(LastError::Success) };
}

/// Record `code` as this thread's last error.
pub fn set_last_error(code: LastError)
{
    LAST_ERROR.with(|cell| cell.set(code));
}

/// Read this thread's last error. Only meaningful right after a failed call.
#[must_use]
pub fn last_error() -> LastError
{
    LAST_ERROR.with(Cell::get)
}

/// Reset this thread's last error to `Success`.
pub fn clear_last_error()
{
    set_last_error(LastError::Success);
}
