//! # Type info queries
//!
//! The generic "get info" dispatcher. A query is routed first by its
//! [`QueryKind`], then by the node's variant; combinations outside the closed
//! set of answering kinds fail with [`RegistryError::NotApplicable`].
//!
//! Some answers delegate to another node (the length of a typedef is the
//! length of its target, the length of an array is element length times
//! count, the address of a label is relative to its function). Delegation
//! chains are capped at [`MAX_DELEGATION_DEPTH`] so a malformed cyclic graph
//! produces an error instead of unbounded recursion.

use std::fmt;

use super::warn_once::unknown_queries;
use super::{DataPayload, Location, Module, SymId, Symbol, TypeHandle};
use crate::error::{RegistryError, RegistryResult};
use crate::types::{Address, DataKind, Variant, WideString};

/// Maximum number of delegation hops a single query may take.
pub const MAX_DELEGATION_DEPTH: usize = 32;

/// Query codes (`IMAGEHLP_SYMBOL_TYPE_INFO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum QueryKind
{
    SymTag = 0,
    SymName = 1,
    Length = 2,
    Type = 3,
    TypeId = 4,
    BaseType = 5,
    ArrayIndexTypeId = 6,
    FindChildren = 7,
    DataKind = 8,
    AddressOffset = 9,
    Offset = 10,
    Value = 11,
    Count = 12,
    ChildrenCount = 13,
    BitPosition = 14,
    VirtualBaseClass = 15,
    VirtualTableShapeId = 16,
    VirtualBasePointerOffset = 17,
    ClassParentId = 18,
    Nested = 19,
    SymIndex = 20,
    LexicalParent = 21,
    Address = 22,
    ThisAdjust = 23,
    UdtKind = 24,
    IsEquivTo = 25,
    CallingConvention = 26,
    IsCloseEquivTo = 27,
    GtiexReqsValid = 28,
    VirtualBaseOffset = 29,
    VirtualBaseDispIndex = 30,
    IsReference = 31,
    IndirectVirtualBaseClass = 32,
    VirtualBaseTableType = 33,
    ObjectPointerType = 34,
}

impl QueryKind
{
    const ALL: [QueryKind; 35] = [
        QueryKind::SymTag,
        QueryKind::SymName,
        QueryKind::Length,
        QueryKind::Type,
        QueryKind::TypeId,
        QueryKind::BaseType,
        QueryKind::ArrayIndexTypeId,
        QueryKind::FindChildren,
        QueryKind::DataKind,
        QueryKind::AddressOffset,
        QueryKind::Offset,
        QueryKind::Value,
        QueryKind::Count,
        QueryKind::ChildrenCount,
        QueryKind::BitPosition,
        QueryKind::VirtualBaseClass,
        QueryKind::VirtualTableShapeId,
        QueryKind::VirtualBasePointerOffset,
        QueryKind::ClassParentId,
        QueryKind::Nested,
        QueryKind::SymIndex,
        QueryKind::LexicalParent,
        QueryKind::Address,
        QueryKind::ThisAdjust,
        QueryKind::UdtKind,
        QueryKind::IsEquivTo,
        QueryKind::CallingConvention,
        QueryKind::IsCloseEquivTo,
        QueryKind::GtiexReqsValid,
        QueryKind::VirtualBaseOffset,
        QueryKind::VirtualBaseDispIndex,
        QueryKind::IsReference,
        QueryKind::IndirectVirtualBaseClass,
        QueryKind::VirtualBaseTableType,
        QueryKind::ObjectPointerType,
    ];

    #[must_use]
    pub const fn raw(self) -> u32
    {
        self as u32
    }

    /// C++ RTTI queries. Never answered and never logged.
    #[must_use]
    pub const fn is_rtti(self) -> bool
    {
        matches!(
            self,
            QueryKind::VirtualBaseClass
                | QueryKind::VirtualTableShapeId
                | QueryKind::VirtualBasePointerOffset
                | QueryKind::ClassParentId
                | QueryKind::ThisAdjust
                | QueryKind::VirtualBaseOffset
                | QueryKind::VirtualBaseDispIndex
                | QueryKind::IsReference
                | QueryKind::IndirectVirtualBaseClass
                | QueryKind::VirtualBaseTableType
                | QueryKind::ObjectPointerType
        )
    }
}

impl TryFrom<u32> for QueryKind
{
    type Error = u32;

    fn try_from(raw: u32) -> Result<Self, Self::Error>
    {
        usize::try_from(raw)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(raw)
    }
}

/// Answer to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo
{
    U32(u32),
    U64(u64),
    /// Freshly allocated UTF-16 name owned by the caller.
    Name(WideString),
    Value(Variant),
    /// Child handles in list order.
    Children(Vec<TypeHandle>),
}

impl TypeInfo
{
    #[must_use]
    pub fn as_u32(&self) -> Option<u32>
    {
        match self {
            TypeInfo::U32(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64>
    {
        match self {
            TypeInfo::U64(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_name(&self) -> Option<&WideString>
    {
        match self {
            TypeInfo::Name(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Variant>
    {
        match self {
            TypeInfo::Value(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_children(&self) -> Option<&[TypeHandle]>
    {
        match self {
            TypeInfo::Children(children) => Some(children),
            _ => None,
        }
    }
}

impl fmt::Display for TypeInfo
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TypeInfo::U32(value) => write!(f, "{value}"),
            TypeInfo::U64(value) => write!(f, "{value:#x}"),
            TypeInfo::Name(name) => write!(f, "{name:?}"),
            TypeInfo::Value(value) => write!(f, "{value}"),
            TypeInfo::Children(children) => {
                write!(f, "[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{child}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Module
{
    /// Answer `query` for node `id`.
    pub fn get_info(&self, id: SymId, query: QueryKind) -> RegistryResult<TypeInfo>
    {
        self.info_at(id, query, 0)
    }

    /// Answer a raw query code. Codes outside the known space fail with
    /// [`RegistryError::UnknownQuery`] and are logged once per process.
    pub fn get_info_raw(&self, id: SymId, raw: u32) -> RegistryResult<TypeInfo>
    {
        match QueryKind::try_from(raw) {
            Ok(query) => self.get_info(id, query),
            Err(code) => {
                let tag = self.tag_of(id)?;
                unknown_queries().report(code, tag.as_str());
                Err(RegistryError::UnknownQuery(code))
            }
        }
    }

    /// Byte length of `id` (bit length for bit-field members).
    pub fn type_length(&self, id: SymId) -> RegistryResult<u64>
    {
        self.length_at(id, 0)
    }

    fn info_at(&self, id: SymId, query: QueryKind, depth: usize) -> RegistryResult<TypeInfo>
    {
        let symbol = self.symbol(id)?;
        let not_applicable = || RegistryError::NotApplicable {
            query,
            tag: symbol.tag(),
        };

        match query {
            QueryKind::SymTag => Ok(TypeInfo::U32(symbol.tag().raw())),
            QueryKind::SymName => symbol
                .name()
                .map(|name| TypeInfo::Name(WideString::from_name(name)))
                .ok_or_else(not_applicable),
            QueryKind::Length => self.length_at(id, depth).map(TypeInfo::U64),
            QueryKind::Type | QueryKind::TypeId => Self::referenced_type(symbol)
                .map(|target| TypeInfo::U32(target.handle().raw()))
                .ok_or_else(not_applicable),
            QueryKind::BaseType => match symbol {
                Symbol::BaseType(base) => Ok(TypeInfo::U32(base.basic.raw())),
                Symbol::Enum(enumeration) => self.delegate(enumeration.base_type, query, depth),
                _ => Err(not_applicable()),
            },
            QueryKind::ArrayIndexTypeId => match symbol {
                Symbol::Array(array) => Ok(TypeInfo::U32(array.index.handle().raw())),
                _ => Err(not_applicable()),
            },
            QueryKind::FindChildren => Self::child_list(symbol)
                .map(|children| TypeInfo::Children(children.iter().map(|child| child.handle()).collect()))
                .ok_or_else(not_applicable),
            QueryKind::ChildrenCount => Self::child_list(symbol)
                .map(|children| TypeInfo::U32(count_u32(children.len())))
                .ok_or_else(not_applicable),
            QueryKind::DataKind => match symbol {
                Symbol::Data(data) => Ok(TypeInfo::U32(data.kind().raw())),
                _ => Err(not_applicable()),
            },
            QueryKind::Offset => match symbol {
                Symbol::Data(data) => match data.payload {
                    DataPayload::Member { offset, .. } => Ok(TypeInfo::U32(offset)),
                    DataPayload::Variable {
                        kind: DataKind::Local | DataKind::Param,
                        location: Location::RegisterRelative { offset, .. },
                    } => Ok(TypeInfo::U32(truncate_offset(offset))),
                    _ => Err(not_applicable()),
                },
                _ => Err(not_applicable()),
            },
            QueryKind::Value => self.value_of(id, symbol),
            QueryKind::Count => match symbol {
                Symbol::Array(array) => Ok(TypeInfo::U32(array.count)),
                Symbol::FunctionSignature(signature) => Ok(TypeInfo::U32(count_u32(signature.params.len()))),
                _ => Err(not_applicable()),
            },
            QueryKind::BitPosition => match symbol {
                Symbol::Data(data) => match data.payload {
                    DataPayload::Member {
                        bit_offset, bit_length, ..
                    } if bit_length != 0 => Ok(TypeInfo::U32(bit_offset)),
                    _ => Err(not_applicable()),
                },
                _ => Err(not_applicable()),
            },
            QueryKind::SymIndex => Ok(TypeInfo::U32(id.handle().raw())),
            QueryKind::LexicalParent => symbol
                .lexical_parent()
                .map(|parent| TypeInfo::U32(parent.handle().raw()))
                .ok_or_else(not_applicable),
            QueryKind::Address => self.address_at(id, depth).map(|address| TypeInfo::U64(address.value())),
            QueryKind::UdtKind => match symbol {
                Symbol::Udt(udt) => Ok(TypeInfo::U32(udt.kind.raw())),
                _ => Err(not_applicable()),
            },
            QueryKind::CallingConvention => match symbol {
                Symbol::FunctionSignature(signature) => Ok(TypeInfo::U32(signature.call_conv)),
                _ => Err(not_applicable()),
            },
            QueryKind::Nested
            | QueryKind::AddressOffset
            | QueryKind::IsEquivTo
            | QueryKind::IsCloseEquivTo
            | QueryKind::GtiexReqsValid => {
                unknown_queries().report(query.raw(), symbol.tag().as_str());
                Err(RegistryError::Unimplemented(query))
            }
            rtti => {
                debug_assert!(rtti.is_rtti());
                Err(RegistryError::Unimplemented(rtti))
            }
        }
    }

    fn delegate(&self, target: SymId, query: QueryKind, depth: usize) -> RegistryResult<TypeInfo>
    {
        if depth >= MAX_DELEGATION_DEPTH {
            return Err(RegistryError::DelegationTooDeep(MAX_DELEGATION_DEPTH));
        }
        self.info_at(target, query, depth + 1)
    }

    fn length_at(&self, id: SymId, depth: usize) -> RegistryResult<u64>
    {
        if depth >= MAX_DELEGATION_DEPTH {
            return Err(RegistryError::DelegationTooDeep(MAX_DELEGATION_DEPTH));
        }
        let symbol = self.symbol(id)?;
        match symbol {
            Symbol::BaseType(base) => Ok(base.size),
            Symbol::Pointer(pointer) => Ok(pointer.size),
            Symbol::Udt(udt) => Ok(udt.size),
            Symbol::Function(function) | Symbol::InlineSite(function) => Ok(function.size),
            Symbol::Block(block) => Ok(block.size),
            Symbol::Public(public) => Ok(public.size),
            Symbol::Thunk(thunk) => Ok(thunk.size),
            Symbol::Custom(custom) => Ok(custom.size),
            Symbol::Point(_) => Ok(0),
            Symbol::Enum(enumeration) => self.length_at(enumeration.base_type, depth + 1),
            Symbol::Typedef(typedef) => self.length_at(typedef.target, depth + 1),
            Symbol::Array(array) => {
                let element = self.length_at(array.element, depth + 1)?;
                element
                    .checked_mul(u64::from(array.count))
                    .ok_or(RegistryError::LengthOverflow)
            }
            Symbol::Data(data) => match (&data.payload, data.data_type) {
                (DataPayload::Member { bit_length, .. }, _) if *bit_length != 0 => Ok(u64::from(*bit_length)),
                (_, Some(data_type)) => self.length_at(data_type, depth + 1),
                (_, None) => Err(RegistryError::NotApplicable {
                    query: QueryKind::Length,
                    tag: symbol.tag(),
                }),
            },
            Symbol::Exe(_) | Symbol::Compiland(_) | Symbol::FunctionSignature(_) | Symbol::FunctionArg(_) => {
                Err(RegistryError::NotApplicable {
                    query: QueryKind::Length,
                    tag: symbol.tag(),
                })
            }
        }
    }

    fn address_at(&self, id: SymId, depth: usize) -> RegistryResult<Address>
    {
        if depth >= MAX_DELEGATION_DEPTH {
            return Err(RegistryError::DelegationTooDeep(MAX_DELEGATION_DEPTH));
        }
        let symbol = self.symbol(id)?;
        let not_applicable = || RegistryError::NotApplicable {
            query: QueryKind::Address,
            tag: symbol.tag(),
        };
        match symbol {
            Symbol::Data(data) => match data.payload {
                DataPayload::Variable {
                    kind: DataKind::Global | DataKind::FileStatic | DataKind::StaticLocal,
                    location,
                } => location
                    .absolute_offset()
                    .map(Address::new)
                    .ok_or(RegistryError::LocationUnavailable),
                _ => Err(not_applicable()),
            },
            Symbol::Function(function) | Symbol::InlineSite(function) => Ok(function.address),
            Symbol::Compiland(compiland) => Ok(compiland.address),
            Symbol::Block(block) => Ok(block.address),
            Symbol::Public(public) => Ok(public.address),
            Symbol::Thunk(thunk) => Ok(thunk.address),
            Symbol::Custom(custom) => Ok(custom.address),
            Symbol::Point(point) => {
                let base = match self.address_at(point.parent, depth + 1) {
                    Ok(address) => address,
                    Err(RegistryError::DelegationTooDeep(limit)) => return Err(RegistryError::DelegationTooDeep(limit)),
                    Err(_) => Address::ZERO,
                };
                Ok(base + point.offset)
            }
            _ => Err(not_applicable()),
        }
    }

    /// Constants answer with their stored value; locals and parameters need
    /// a deferred location the module's resolver reduces to an absolute offset.
    fn value_of(&self, id: SymId, symbol: &Symbol) -> RegistryResult<TypeInfo>
    {
        let not_applicable = || RegistryError::NotApplicable {
            query: QueryKind::Value,
            tag: symbol.tag(),
        };
        let Symbol::Data(data) = symbol else {
            return Err(not_applicable());
        };
        match &data.payload {
            DataPayload::Constant(value) => Ok(TypeInfo::Value(*value)),
            DataPayload::Variable {
                kind: DataKind::Local | DataKind::Param,
                location,
            } => {
                if !location.is_deferred() {
                    return Err(RegistryError::LocationUnavailable);
                }
                let resolver = self.location_resolver().ok_or(RegistryError::LocationUnavailable)?;
                resolver
                    .compute(self, id, location)
                    .absolute_offset()
                    .map(|offset| TypeInfo::Value(Variant::UI4(truncate_address(offset))))
                    .ok_or(RegistryError::LocationUnavailable)
            }
            _ => Err(not_applicable()),
        }
    }

    /// Type a node refers to, as answered by `Type`/`TypeId`.
    fn referenced_type(symbol: &Symbol) -> Option<SymId>
    {
        match symbol {
            Symbol::Array(array) => Some(array.element),
            Symbol::Enum(enumeration) => Some(enumeration.base_type),
            Symbol::FunctionArg(arg) => Some(arg.arg_type),
            Symbol::Typedef(typedef) => Some(typedef.target),
            Symbol::FunctionSignature(signature) => signature.return_type,
            Symbol::Pointer(pointer) => Some(pointer.target),
            Symbol::Data(data) => data.data_type,
            Symbol::Function(function) | Symbol::InlineSite(function) => function.signature,
            _ => None,
        }
    }

    /// Children for `FindChildren`/`ChildrenCount`: containers list theirs, leaf
    /// kinds have none, data and public symbols cannot be asked.
    fn child_list(symbol: &Symbol) -> Option<&[SymId]>
    {
        match symbol {
            Symbol::Data(_) | Symbol::Public(_) => None,
            Symbol::Pointer(_)
            | Symbol::Array(_)
            | Symbol::FunctionArg(_)
            | Symbol::Thunk(_)
            | Symbol::Point(_)
            | Symbol::BaseType(_)
            | Symbol::Typedef(_)
            | Symbol::Custom(_) => Some(&[]),
            container => container.children(),
        }
    }
}

fn count_u32(count: usize) -> u32
{
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Frame offsets travel as 32-bit two's complement values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_offset(offset: i64) -> u32
{
    offset as u32
}

/// Resolved variable addresses are reported as `VT_UI4`.
#[allow(clippy::cast_possible_truncation)]
fn truncate_address(offset: u64) -> u32
{
    offset as u32
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::symbols::PointKind;
    use crate::types::{BasicType, SymTag, UdtKind};

    fn module() -> Module
    {
        Module::with_defaults("query.dll", 0x1000_0000)
    }

    #[test]
    fn test_query_codes_match_dbghelp()
    {
        assert_eq!(QueryKind::try_from(0), Ok(QueryKind::SymTag));
        assert_eq!(QueryKind::try_from(13), Ok(QueryKind::ChildrenCount));
        assert_eq!(QueryKind::try_from(22), Ok(QueryKind::Address));
        assert_eq!(QueryKind::try_from(34), Ok(QueryKind::ObjectPointerType));
        assert_eq!(QueryKind::try_from(35), Err(35));
        for (index, kind) in QueryKind::ALL.iter().enumerate() {
            assert_eq!(kind.raw() as usize, index);
        }
    }

    #[test]
    fn test_typedef_length_follows_target()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let alias = module.new_typedef(int, "INT").unwrap();
        let signature = module.new_function_signature(None, 0).unwrap();
        let broken = module.new_typedef(signature, "FN").unwrap();

        assert_eq!(module.type_length(alias), Ok(4));
        assert!(module.type_length(signature).is_err());
        assert!(module.type_length(broken).is_err());
    }

    #[test]
    fn test_enum_base_type_delegates()
    {
        let mut module = module();
        let uint = module.new_base_type(Some("unsigned int"), BasicType::UInt, 4).unwrap();
        let flags = module.new_enum(Some("Flags"), uint).unwrap();
        assert_eq!(
            module.get_info(flags, QueryKind::BaseType),
            Ok(TypeInfo::U32(BasicType::UInt.raw()))
        );
    }

    #[test]
    fn test_leaf_kinds_have_zero_children()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let pointer = module.new_pointer(int, 8).unwrap();
        assert_eq!(module.get_info(pointer, QueryKind::ChildrenCount), Ok(TypeInfo::U32(0)));
        assert_eq!(module.get_info(int, QueryKind::FindChildren), Ok(TypeInfo::Children(Vec::new())));
    }

    #[test]
    fn test_data_cannot_list_children()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let udt = module.new_udt(Some("S"), 4, UdtKind::Struct).unwrap();
        let member = module.add_udt_member(udt, Some("x"), int, 0, 0, 0).unwrap();
        assert_eq!(
            module.get_info(member, QueryKind::ChildrenCount),
            Err(RegistryError::NotApplicable {
                query: QueryKind::ChildrenCount,
                tag: SymTag::Data,
            })
        );
    }

    #[test]
    fn test_point_address_is_relative_to_function()
    {
        let mut module = module();
        let function = module
            .new_function(None, "f", Address::new(0x1000_2000), 0x40, None)
            .unwrap();
        let label = module
            .add_function_point(function, PointKind::Label, 0x10, Some("retry"))
            .unwrap();

        assert_eq!(module.get_info(label, QueryKind::Address), Ok(TypeInfo::U64(0x1000_2010)));
        assert_eq!(module.get_info(label, QueryKind::Length), Ok(TypeInfo::U64(0)));
    }

    #[test]
    fn test_array_length_overflow_fails()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let huge = module.new_udt(Some("Huge"), 1 << 40, UdtKind::Struct).unwrap();
        let array = module.new_array(0, u32::MAX, huge, int).unwrap();
        assert_eq!(module.type_length(array), Err(RegistryError::LengthOverflow));
    }

    #[test]
    fn test_point_address_wraps_like_address()
    {
        let mut module = module();
        let function = module
            .new_function(None, "top", Address::new(u64::MAX - 0xf), 0x10, None)
            .unwrap();
        let end = module
            .add_function_point(function, PointKind::DebugEnd, 0x20, None)
            .unwrap();
        assert_eq!(module.get_info(end, QueryKind::Address), Ok(TypeInfo::U64(0x10)));
    }

    #[test]
    fn test_cyclic_typedef_chain_is_cut_off()
    {
        let mut module = module();
        let int = module.new_base_type(Some("int"), BasicType::Int, 4).unwrap();
        let first = module.new_typedef(int, "A").unwrap();
        let second = module.new_typedef(first, "B").unwrap();
        if let Ok(Symbol::Typedef(typedef)) = module.symbol_mut(first) {
            typedef.target = second;
        }

        assert_eq!(
            module.type_length(second),
            Err(RegistryError::DelegationTooDeep(MAX_DELEGATION_DEPTH))
        );
    }

    #[test]
    fn test_rtti_queries_fail_quietly()
    {
        let mut module = module();
        let udt = module.new_udt(Some("Base"), 8, UdtKind::Class).unwrap();
        assert_eq!(
            module.get_info(udt, QueryKind::VirtualBaseClass),
            Err(RegistryError::Unimplemented(QueryKind::VirtualBaseClass))
        );
        assert!(!unknown_queries().has_warned(QueryKind::VirtualBaseClass.raw()));
    }

    #[test]
    fn test_type_info_accessors()
    {
        assert_eq!(TypeInfo::U32(7).as_u32(), Some(7));
        assert_eq!(TypeInfo::U32(7).as_u64(), None);
        assert_eq!(TypeInfo::U64(0x10).to_string(), "0x10");
    }
}
