//! Common module for library exports

pub use crate::config::RegistryConfig;
pub use crate::engine::{global_engine, ProcessHandle, SymbolEngine};
pub use crate::error::{last_error, LastError, RegistryError, RegistryResult};
pub use crate::symbols::{
    Location, LocationResolver, Module, PointKind, QueryKind, SymId, Symbol, SymbolRecord, SymbolRecordW,
    TypeHandle, TypeInfo,
};
pub use crate::types::{Address, BasicType, DataKind, SymTag, UdtKind, Variant, WideString};
