//! # dbgsym-core
//!
//! Debug-information type and symbol registry.
//!
//! Debug-format readers (PDB, DWARF, ...) populate one [`Module`] per loaded
//! image through its node constructors; debugger front ends then query it
//! through handles, type enumeration, name lookup and the generic "get info"
//! dispatcher. The numbered spaces (tags, query codes, handles, last-error
//! codes) follow the dbghelp API so the registry can back that surface.
//!
//! ## Layers
//!
//! - [`symbols`]: the per-module registry and everything that operates on it
//! - [`engine`]: `(process, module base)` routing and last-error reporting
//! - [`types`]: numbered tag spaces, addresses, values and names
//! - [`config`]: registry limits
//!
//! ## Example
//!
//! ```rust
//! use dbgsym_core::prelude::*;
//!
//! let mut module = Module::with_defaults("demo.dll", 0x1000_0000);
//! let int = module.new_base_type(Some("int32"), BasicType::Int, 4)?;
//! let array = module.new_array(0, 10, int, int)?;
//! assert_eq!(module.get_info(array, QueryKind::Length)?, TypeInfo::U64(40));
//! # Ok::<(), RegistryError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod symbols;
pub mod types;

pub use config::RegistryConfig;
pub use engine::{global_engine, ProcessHandle, SymbolEngine};
pub use error::{RegistryError, RegistryResult};
pub use symbols::{Module, QueryKind, SymId, Symbol, TypeHandle, TypeInfo};
