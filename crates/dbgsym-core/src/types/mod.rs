//! # Types
//!
//! Value types shared by the registry and the engine entry points: numbered tag
//! spaces, addresses, constant values and caller-owned names.

pub mod address;
pub mod symbols;
pub mod tags;
pub mod value;

// Re-export all public types
pub use address::Address;
pub use symbols::WideString;
pub use tags::{BasicType, DataKind, SymTag, UdtKind};
pub use value::Variant;
