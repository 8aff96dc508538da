//! Handle translation and type enumeration.
//!
//! A node's handle is its arena index plus one, so both directions are O(1)
//! and handles stay stable for the lifetime of the module. Enumeration walks
//! the flat type list in creation order and fills one reused record per
//! module walk.

use std::ops::ControlFlow;

use super::{Module, SymId, Symbol, TypeHandle};
use crate::error::{RegistryError, RegistryResult};
use crate::types::symbols::{copy_bounded_name, copy_bounded_wide_name};
use crate::types::SymTag;

/// Fixed-layout symbol descriptor handed to enumeration callbacks and filled
/// by name lookups (`SYMBOL_INFO`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord
{
    pub type_index: u32,
    /// Zero during enumeration; equal to `type_index` after a name lookup.
    pub index: u32,
    /// Byte length when the node has one, 0 otherwise.
    pub size: u64,
    pub mod_base: u64,
    pub flags: u32,
    pub value: u64,
    pub address: u64,
    pub register: u32,
    pub scope: u32,
    pub tag: SymTag,
    /// Name truncated to `max_name_len - 1` characters.
    pub name: String,
    /// Untruncated name length in characters.
    pub name_len: u32,
    pub max_name_len: u32,
}

/// UTF-16 flavour of [`SymbolRecord`] (`SYMBOL_INFOW`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecordW
{
    pub type_index: u32,
    pub index: u32,
    pub size: u64,
    pub mod_base: u64,
    pub flags: u32,
    pub value: u64,
    pub address: u64,
    pub register: u32,
    pub scope: u32,
    pub tag: SymTag,
    /// Name truncated to `max_name_len - 1` code units, no terminator.
    pub name: Vec<u16>,
    /// Untruncated name length in code units.
    pub name_len: u32,
    pub max_name_len: u32,
}

impl SymbolRecord
{
    /// Empty record able to hold `max_name_len` characters, terminator included.
    #[must_use]
    pub fn with_capacity(max_name_len: usize) -> Self
    {
        Self {
            type_index: 0,
            index: 0,
            size: 0,
            mod_base: 0,
            flags: 0,
            value: 0,
            address: 0,
            register: 0,
            scope: 0,
            tag: SymTag::Null,
            name: String::with_capacity(max_name_len),
            name_len: 0,
            max_name_len: saturate(max_name_len),
        }
    }

    fn clear(&mut self)
    {
        self.type_index = 0;
        self.index = 0;
        self.size = 0;
        self.mod_base = 0;
        self.flags = 0;
        self.value = 0;
        self.address = 0;
        self.register = 0;
        self.scope = 0;
        self.tag = SymTag::Null;
        self.name.clear();
        self.name_len = 0;
    }
}

impl SymbolRecordW
{
    #[must_use]
    pub fn with_capacity(max_name_len: usize) -> Self
    {
        Self {
            type_index: 0,
            index: 0,
            size: 0,
            mod_base: 0,
            flags: 0,
            value: 0,
            address: 0,
            register: 0,
            scope: 0,
            tag: SymTag::Null,
            name: Vec::with_capacity(max_name_len),
            name_len: 0,
            max_name_len: saturate(max_name_len),
        }
    }

    /// Copy every field of `record`, transcoding its name into the reused buffer.
    pub fn copy_from(&mut self, record: &SymbolRecord)
    {
        self.type_index = record.type_index;
        self.index = record.index;
        self.size = record.size;
        self.mod_base = record.mod_base;
        self.flags = record.flags;
        self.value = record.value;
        self.address = record.address;
        self.register = record.register;
        self.scope = record.scope;
        self.tag = record.tag;
        copy_bounded_wide_name(&mut self.name, &record.name, self.max_name_len as usize);
        self.name_len = record.name_len;
    }

    /// Name as a Rust string, replacing unpaired surrogates.
    #[must_use]
    pub fn name_lossy(&self) -> String
    {
        String::from_utf16_lossy(&self.name)
    }
}

fn saturate(value: usize) -> u32
{
    u32::try_from(value).unwrap_or(u32::MAX)
}

impl Module
{
    /// Node behind `handle`.
    pub fn handle_to_symbol(&self, handle: TypeHandle) -> RegistryResult<SymId>
    {
        if handle.index() < self.len() {
            let index = handle.raw() - 1;
            Ok(SymId::new(self.tag(), index))
        } else {
            Err(RegistryError::InvalidHandle(handle.raw()))
        }
    }

    /// Like [`Module::handle_to_symbol`] for a raw handle; 0 is rejected.
    pub fn handle_to_symbol_raw(&self, raw: u32) -> RegistryResult<SymId>
    {
        let handle = TypeHandle::from_raw(raw).ok_or(RegistryError::InvalidHandle(raw))?;
        self.handle_to_symbol(handle)
    }

    /// Handle of a node of this module.
    pub fn symbol_to_handle(&self, id: SymId) -> RegistryResult<TypeHandle>
    {
        self.symbol(id)?;
        Ok(id.handle())
    }

    /// Fill `record` with the descriptor of `id`.
    ///
    /// The size is best effort: nodes without a length report 0.
    pub(crate) fn describe(&self, id: SymId, record: &mut SymbolRecord) -> RegistryResult<()>
    {
        let symbol = self.symbol(id)?;
        record.clear();
        record.type_index = id.handle().raw();
        record.size = self.type_length(id).unwrap_or_default();
        record.mod_base = self.base();
        record.tag = symbol.tag();
        let name = symbol.name().unwrap_or_default();
        record.name_len = saturate(copy_bounded_name(&mut record.name, name, record.max_name_len as usize));
        Ok(())
    }

    /// Visit every type node in creation order until `callback` breaks.
    pub fn enumerate_types<F>(&self, mut callback: F) -> ControlFlow<()>
    where
        F: FnMut(&SymbolRecord) -> ControlFlow<()>,
    {
        let mut record = SymbolRecord::with_capacity(self.config().name_capacity);
        for &id in self.types() {
            if self.describe(id, &mut record).is_ok() {
                callback(&record)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Wide-record flavour of [`Module::enumerate_types`].
    ///
    /// One UTF-16 buffer is reused for the whole walk.
    pub fn enumerate_types_wide<F>(&self, mut callback: F) -> ControlFlow<()>
    where
        F: FnMut(&SymbolRecordW) -> ControlFlow<()>,
    {
        let mut wide = SymbolRecordW::with_capacity(self.config().name_capacity);
        self.enumerate_types(|record| {
            wide.copy_from(record);
            callback(&wide)
        })
    }

    /// Handles of every type node, in enumeration order.
    #[must_use]
    pub fn type_handles(&self) -> Vec<TypeHandle>
    {
        self.types().iter().map(|id| id.handle()).collect()
    }
}

impl Symbol
{
    /// Whether the node lives in the flat type list.
    #[must_use]
    pub fn is_type(&self) -> bool
    {
        matches!(
            self,
            Symbol::BaseType(_)
                | Symbol::Udt(_)
                | Symbol::Enum(_)
                | Symbol::Array(_)
                | Symbol::Pointer(_)
                | Symbol::Typedef(_)
                | Symbol::FunctionSignature(_)
        )
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::config::RegistryConfig;
    use crate::types::{BasicType, UdtKind};

    #[test]
    fn test_handle_round_trip()
    {
        let mut module = Module::with_defaults("m", 0);
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let handle = module.symbol_to_handle(int).unwrap();
        assert_eq!(module.handle_to_symbol(handle), Ok(int));
        assert_eq!(module.handle_to_symbol_raw(1), Ok(module.root()));
    }

    #[test]
    fn test_out_of_range_handles_fail()
    {
        let module = Module::with_defaults("m", 0);
        assert_eq!(module.handle_to_symbol_raw(0), Err(RegistryError::InvalidHandle(0)));
        assert_eq!(module.handle_to_symbol_raw(2), Err(RegistryError::InvalidHandle(2)));
    }

    #[test]
    fn test_enumeration_record_contents()
    {
        let mut module = Module::with_defaults("m", 0x1000);
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        module.new_udt(Some("S"), 12, UdtKind::Struct).unwrap();

        let mut seen = Vec::new();
        let flow = module.enumerate_types(|record| {
            seen.push((record.type_index, record.index, record.size, record.mod_base, record.tag, record.name.clone()));
            ControlFlow::Continue(())
        });

        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(
            seen,
            vec![
                (int.handle().raw(), 0, 4, 0x1000, SymTag::BaseType, "int".to_owned()),
                (3, 0, 12, 0x1000, SymTag::Udt, "S".to_owned()),
            ]
        );
    }

    #[test]
    fn test_wide_enumeration_truncates_names()
    {
        let config = RegistryConfig::default().with_name_capacity(4);
        let mut module = Module::new("m", 0, config);
        module.new_udt(Some("LongName"), 0, UdtKind::Class).unwrap();

        let mut names = Vec::new();
        let _ = module.enumerate_types_wide(|record| {
            names.push((record.name_lossy(), record.name_len));
            ControlFlow::Continue(())
        });
        assert_eq!(names, vec![("Lon".to_owned(), 8)]);
    }

    #[test]
    fn test_only_types_are_listed()
    {
        let mut module = Module::with_defaults("m", 0);
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let udt = module.new_udt(Some("S"), 4, UdtKind::Struct).unwrap();
        let member = module.add_udt_member(udt, Some("x"), int, 0, 0, 0).unwrap();

        assert!(module.symbol(int).unwrap().is_type());
        assert!(!module.symbol(member).unwrap().is_type());
        assert_eq!(module.type_handles().len(), 2);
    }
}
