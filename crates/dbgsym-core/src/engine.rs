//! # Symbol engine
//!
//! API-boundary layer over the module registries. Callers address a module by
//! `(process handle, module base)`; every entry point returns a plain success
//! value (`bool` or `Option`) and, on failure, records the reason in the
//! thread's last-error cell (see [`crate::error::last_error`]).
//!
//! The engine itself is not synchronized. [`global_engine`] hands out the
//! process-wide instance behind a single mutex, which serializes every module
//! mutation and query going through it.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::error::{set_last_error, LastError, RegistryError, RegistryResult};
use crate::symbols::{Module, QueryKind, SymbolRecord, SymbolRecordW, TypeHandle, TypeInfo};

static GLOBAL_ENGINE: Lazy<Mutex<SymbolEngine>> = Lazy::new(|| Mutex::new(SymbolEngine::new()));

/// Process-wide engine instance.
#[must_use]
pub fn global_engine() -> &'static Mutex<SymbolEngine>
{
    &GLOBAL_ENGINE
}

/// Opaque handle identifying a debuggee process to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessHandle(u64);

impl ProcessHandle
{
    #[must_use]
    pub const fn from_raw(value: u64) -> Self
    {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }
}

impl From<u64> for ProcessHandle
{
    fn from(value: u64) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for ProcessHandle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:#x}", self.0)
    }
}

/// Modules loaded into one process, keyed by base address.
#[derive(Debug, Default)]
struct ProcessEntry
{
    modules: BTreeMap<u64, Module>,
}

/// Routes entry-point calls to the right module registry.
#[derive(Debug, Default)]
pub struct SymbolEngine
{
    processes: HashMap<ProcessHandle, ProcessEntry>,
}

impl SymbolEngine
{
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Start tracking `process`. Fails if it is already registered.
    pub fn register_process(&mut self, process: ProcessHandle) -> bool
    {
        if self.processes.contains_key(&process) {
            set_last_error(LastError::InvalidParameter);
            return false;
        }
        info!("Registered process {process}");
        self.processes.insert(process, ProcessEntry::default());
        true
    }

    /// Stop tracking `process`, dropping every module loaded into it.
    pub fn unregister_process(&mut self, process: ProcessHandle) -> bool
    {
        match self.processes.remove(&process) {
            Some(entry) => {
                info!("Unregistered process {process} ({} modules)", entry.modules.len());
                true
            }
            None => {
                set_last_error(LastError::InvalidHandle);
                false
            }
        }
    }

    /// Attach `module` to `process` at the module's base address.
    pub fn load_module(&mut self, process: ProcessHandle, module: Module) -> bool
    {
        let result = self.process_mut(process).and_then(|entry| {
            let base = module.base();
            if entry.modules.contains_key(&base) {
                return Err(RegistryError::ModuleAlreadyLoaded(base));
            }
            debug!(%process, base = format_args!("{base:#x}"), symbols = module.len(), "loading module");
            entry.modules.insert(base, module);
            Ok(())
        });
        report(result).is_some()
    }

    /// Detach and return the module loaded at `base`.
    pub fn unload_module(&mut self, process: ProcessHandle, base: u64) -> Option<Module>
    {
        let result = self.process_mut(process).and_then(|entry| {
            entry.modules.remove(&base).ok_or(RegistryError::ModuleNotFound(base))
        });
        let module = report(result)?;
        debug!(%process, base = format_args!("{base:#x}"), "unloaded module");
        Some(module)
    }

    /// Registry of the module loaded at `base`.
    pub fn module(&self, process: ProcessHandle, base: u64) -> RegistryResult<&Module>
    {
        self.processes
            .get(&process)
            .ok_or(RegistryError::ProcessNotFound(process.raw()))?
            .modules
            .get(&base)
            .ok_or(RegistryError::ModuleNotFound(base))
    }

    /// Mutable registry of the module loaded at `base`, for debug-format readers.
    pub fn module_mut(&mut self, process: ProcessHandle, base: u64) -> RegistryResult<&mut Module>
    {
        self.process_mut(process)?
            .modules
            .get_mut(&base)
            .ok_or(RegistryError::ModuleNotFound(base))
    }

    fn process_mut(&mut self, process: ProcessHandle) -> RegistryResult<&mut ProcessEntry>
    {
        self.processes
            .get_mut(&process)
            .ok_or(RegistryError::ProcessNotFound(process.raw()))
    }

    /// Enumerate every type of a module (`SymEnumTypes`).
    ///
    /// Returns `true` once the walk ends, whether it ran to completion or the
    /// callback stopped it.
    pub fn enum_types<F>(&self, process: ProcessHandle, base: u64, callback: F) -> bool
    where
        F: FnMut(&SymbolRecord) -> ControlFlow<()>,
    {
        let Some(module) = report(self.module(process, base)) else {
            return false;
        };
        let _ = module.enumerate_types(callback);
        true
    }

    /// Wide-record flavour of [`SymbolEngine::enum_types`] (`SymEnumTypesW`).
    pub fn enum_types_w<F>(&self, process: ProcessHandle, base: u64, callback: F) -> bool
    where
        F: FnMut(&SymbolRecordW) -> ControlFlow<()>,
    {
        let Some(module) = report(self.module(process, base)) else {
            return false;
        };
        let _ = module.enumerate_types_wide(callback);
        true
    }

    /// Answer a raw query code for handle `type_id` (`SymGetTypeInfo`).
    pub fn get_type_info(&self, process: ProcessHandle, base: u64, type_id: u32, raw_query: u32) -> Option<TypeInfo>
    {
        let result = self.module(process, base).and_then(|module| {
            let id = module.handle_to_symbol_raw(type_id)?;
            module.get_info_raw(id, raw_query)
        });
        report(result)
    }

    /// Window of `count` children starting at `start` (`TI_FINDCHILDREN`).
    ///
    /// Fails without output when the window does not fit the child list.
    pub fn find_children(
        &self,
        process: ProcessHandle,
        base: u64,
        type_id: u32,
        start: u32,
        count: u32,
    ) -> Option<Vec<TypeHandle>>
    {
        let result = self.module(process, base).and_then(|module| {
            let id = module.handle_to_symbol_raw(type_id)?;
            let info = module.get_info(id, QueryKind::FindChildren)?;
            let children = info.as_children().unwrap_or_default();
            let first = start as usize;
            first
                .checked_add(count as usize)
                .and_then(|end| children.get(first..end))
                .map(<[TypeHandle]>::to_vec)
                .ok_or(RegistryError::ChildrenOutOfRange {
                    start,
                    count,
                    available: children.len(),
                })
        });
        report(result)
    }

    /// Look up a type by exact name and fill `record` (`SymGetTypeFromName`).
    ///
    /// On success `index` and `type_index` both hold the handle. `record` is left
    /// untouched on failure.
    pub fn get_type_from_name(
        &self,
        process: ProcessHandle,
        base: u64,
        name: &str,
        record: &mut SymbolRecord,
    ) -> bool
    {
        let result = self.module(process, base).and_then(|module| {
            let id = module.find_type_by_name(name, None)?;
            let mut found = SymbolRecord::with_capacity(record.max_name_len as usize);
            module.describe(id, &mut found)?;
            found.index = found.type_index;
            Ok(found)
        });
        match report(result) {
            Some(found) => {
                *record = found;
                true
            }
            None => false,
        }
    }

    /// UTF-16 flavour of [`SymbolEngine::get_type_from_name`] (`SymGetTypeFromNameW`).
    pub fn get_type_from_name_w(
        &self,
        process: ProcessHandle,
        base: u64,
        name: &[u16],
        record: &mut SymbolRecordW,
    ) -> bool
    {
        let name = String::from_utf16_lossy(name);
        let mut narrow = SymbolRecord::with_capacity(record.max_name_len as usize);
        if !self.get_type_from_name(process, base, &name, &mut narrow) {
            return false;
        }
        record.copy_from(&narrow);
        true
    }
}

/// Convert a core result into an API-boundary value, recording failures in
/// the thread's last-error cell.
fn report<T>(result: RegistryResult<T>) -> Option<T>
{
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!("symbol engine call failed: {err}");
            set_last_error(err.last_error());
            None
        }
    }
}
