//! Type constructors.
//!
//! Debug-format readers call these while loading a module. Every constructor
//! appends the new node to the flat type list (which fixes its enumeration
//! position) and, when the node is named, to the name index. Child insertion
//! (`add_udt_member`, `add_enum_constant`, `add_function_signature_parameter`)
//! creates nodes that have handles but are not themselves listed as types.

use tracing::{trace, warn};

use super::{
    ArraySymbol, BaseTypeSymbol, DataPayload, DataSymbol, EnumSymbol, FunctionArgSymbol, Module, PointerSymbol,
    SignatureSymbol, SymId, Symbol, TypedefSymbol, UdtSymbol,
};
use crate::error::RegistryResult;
use crate::types::{BasicType, SymTag, UdtKind, Variant};

impl Module
{
    /// Create (or reuse) a base type.
    ///
    /// A named base type with the same name, primitive kind and size as an
    /// already registered one returns the existing node. Unnamed base types are
    /// always created fresh.
    pub fn new_base_type(&mut self, name: Option<&str>, basic: BasicType, size: u64) -> RegistryResult<SymId>
    {
        if let Some(name) = name {
            let existing = self.named(name).iter().copied().find(|&id| {
                matches!(
                    self.symbol(id),
                    Ok(Symbol::BaseType(base)) if base.basic == basic && base.size == size
                )
            });
            if let Some(id) = existing {
                return Ok(id);
            }
        }

        let name = name.map(|name| self.intern(name));
        trace!(name = ?name, ?basic, size, "new base type");
        self.add_type(Symbol::BaseType(BaseTypeSymbol { name, basic, size }))
    }

    /// Create a struct, class, union or interface with no members yet.
    pub fn new_udt(&mut self, name: Option<&str>, size: u64, kind: UdtKind) -> RegistryResult<SymId>
    {
        let name = name.map(|name| self.intern(name));
        trace!(name = ?name, size, ?kind, "new udt");
        self.add_type(Symbol::Udt(UdtSymbol {
            name,
            kind,
            size,
            members: Vec::new(),
        }))
    }

    /// Refine a UDT's declared size.
    ///
    /// Once members exist the size is frozen: a differing request is logged and
    /// ignored, and `Ok(false)` tells the caller nothing changed. Before that the
    /// new size always replaces the old one (`Ok(true)`).
    pub fn set_udt_size(&mut self, udt: SymId, size: u64) -> RegistryResult<bool>
    {
        self.expect_tag(udt, SymTag::Udt)?;
        let Symbol::Udt(node) = self.symbol_mut(udt)? else {
            return Ok(false);
        };
        if node.members.is_empty() {
            node.size = size;
            return Ok(true);
        }
        if node.size != size {
            warn!(
                udt = node.name.as_deref().unwrap_or("<unnamed>"),
                current = node.size,
                requested = size,
                "ignoring size change of a udt that already has members"
            );
        }
        Ok(false)
    }

    /// Append a member to a UDT.
    ///
    /// Adding a name that is already present returns the existing member without
    /// touching the list. Unnamed members (anonymous unions, padding) are always
    /// appended. `bit_length == 0` describes an ordinary member; otherwise the
    /// member is a bit-field starting `bit_offset` bits into byte `offset`.
    pub fn add_udt_member(
        &mut self,
        udt: SymId,
        name: Option<&str>,
        member_type: SymId,
        offset: u32,
        bit_offset: u32,
        bit_length: u32,
    ) -> RegistryResult<SymId>
    {
        self.expect_tag(udt, SymTag::Udt)?;
        self.expect_type(member_type)?;

        if let Some(name) = name {
            if let Some(existing) = self.find_member(udt, name)? {
                trace!(member = name, "member already present, keeping it");
                return Ok(existing);
            }
        }

        let name = name.map(|name| self.intern(name));
        trace!(member = ?name, offset, bit_offset, bit_length, "adding udt member");
        let container = self.root();
        self.add_child(
            udt,
            SymTag::Udt,
            Symbol::Data(DataSymbol {
                container,
                name,
                data_type: Some(member_type),
                payload: DataPayload::Member {
                    offset,
                    bit_offset,
                    bit_length,
                    owner: udt,
                },
            }),
        )
    }

    fn find_member(&self, udt: SymId, name: &str) -> RegistryResult<Option<SymId>>
    {
        let Some(members) = self.symbol(udt)?.children() else {
            return Ok(None);
        };
        Ok(members
            .iter()
            .copied()
            .find(|&member| self.symbol(member).ok().and_then(Symbol::name) == Some(name)))
    }

    /// Create an enumeration over `base_type`, which must be a base type.
    pub fn new_enum(&mut self, name: Option<&str>, base_type: SymId) -> RegistryResult<SymId>
    {
        self.expect_tag(base_type, SymTag::BaseType)?;
        let name = name.map(|name| self.intern(name));
        trace!(name = ?name, "new enum");
        self.add_type(Symbol::Enum(EnumSymbol {
            name,
            base_type,
            constants: Vec::new(),
        }))
    }

    /// Append a named constant to an enumeration.
    pub fn add_enum_constant(&mut self, enumeration: SymId, name: &str, value: i32) -> RegistryResult<SymId>
    {
        self.expect_tag(enumeration, SymTag::Enum)?;
        let data_type = match self.symbol(enumeration)? {
            Symbol::Enum(node) => Some(node.base_type),
            _ => None,
        };
        let name = self.intern(name);
        trace!(constant = %name, value, "adding enum constant");
        self.add_child(
            enumeration,
            SymTag::Enum,
            Symbol::Data(DataSymbol {
                container: enumeration,
                name: Some(name),
                data_type,
                payload: DataPayload::Constant(Variant::I4(value)),
            }),
        )
    }

    /// Create an array type of `count` elements starting at index `start`.
    pub fn new_array(&mut self, start: i32, count: u32, element: SymId, index: SymId) -> RegistryResult<SymId>
    {
        self.expect_type(element)?;
        self.expect_type(index)?;
        trace!(start, count, "new array");
        self.add_type(Symbol::Array(ArraySymbol {
            start,
            count,
            element,
            index,
        }))
    }

    /// Create a pointer of `size` bytes to `target`.
    pub fn new_pointer(&mut self, target: SymId, size: u64) -> RegistryResult<SymId>
    {
        self.expect_type(target)?;
        self.add_type(Symbol::Pointer(PointerSymbol { target, size }))
    }

    /// Create a typedef `name` aliasing `target`.
    pub fn new_typedef(&mut self, target: SymId, name: &str) -> RegistryResult<SymId>
    {
        self.expect_type(target)?;
        let name = self.intern(name);
        trace!(name = %name, "new typedef");
        self.add_type(Symbol::Typedef(TypedefSymbol { name, target }))
    }

    /// Create a function signature with no parameters yet.
    pub fn new_function_signature(&mut self, return_type: Option<SymId>, call_conv: u32) -> RegistryResult<SymId>
    {
        if let Some(return_type) = return_type {
            self.expect_type(return_type)?;
        }
        self.add_type(Symbol::FunctionSignature(SignatureSymbol {
            return_type,
            call_conv,
            params: Vec::new(),
        }))
    }

    /// Append a parameter of type `param_type` to a signature.
    ///
    /// Returns the new `FunctionArgType` node.
    pub fn add_function_signature_parameter(&mut self, signature: SymId, param_type: SymId) -> RegistryResult<SymId>
    {
        self.expect_tag(signature, SymTag::FunctionType)?;
        self.expect_type(param_type)?;
        self.add_child(
            signature,
            SymTag::FunctionType,
            Symbol::FunctionArg(FunctionArgSymbol {
                container: signature,
                arg_type: param_type,
            }),
        )
    }
}
