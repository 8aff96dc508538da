//! # Symbol registry
//!
//! Per-module graph of debug-information nodes: base types, user-defined types,
//! enums, arrays, pointers, typedefs, function signatures and the lexical symbols
//! (compilands, functions, blocks, variables, labels, ...) that reference them.
//!
//! ## Layout
//!
//! Every node lives in the owning [`Module`]'s arena (a `Vec<Symbol>`) and is
//! referenced everywhere else by [`SymId`], a dense index stamped with the
//! module's identity. Containers own ordered `Vec<SymId>` child lists; type
//! references are plain ids, so the graph has no ownership cycles. Nothing is
//! freed individually: dropping the `Module` reclaims every node at once.
//!
//! The external handle of a node is `index + 1` ([`TypeHandle`]), which keeps 0
//! reserved and makes both directions of the handle mapping O(1).
//!
//! ## Module map
//!
//! - [`module`]: arena, interned names, name index, flat type list
//! - [`construct`]: type constructors and child insertion
//! - [`lexical`]: compilands, functions, blocks, variables and other code symbols
//! - [`handles`]: handle translation and type enumeration
//! - [`lookup`]: name resolution
//! - [`query`]: the generic "get info" dispatcher
//! - [`location`]: variable locations and the pluggable resolver
//! - [`warn_once`]: process-wide log-once state for unhandled query codes

pub mod construct;
pub mod handles;
pub mod lexical;
pub mod location;
pub mod lookup;
pub mod module;
pub mod query;
pub mod warn_once;

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub use handles::{SymbolRecord, SymbolRecordW};
pub use location::{Location, LocationResolver};
pub use module::Module;
pub use query::{QueryKind, TypeInfo};

use crate::types::{Address, BasicType, DataKind, SymTag, UdtKind, Variant};

/// Identity of one module registry.
///
/// Minted from a process-wide counter so ids from one module are never accepted
/// by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleTag(u32);

impl ModuleTag
{
    pub(crate) fn next() -> Self
    {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        ModuleTag(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reference to a node inside a module arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymId
{
    module: ModuleTag,
    index: u32,
}

impl SymId
{
    pub(crate) const fn new(module: ModuleTag, index: u32) -> Self
    {
        Self { module, index }
    }

    /// Module the node was allocated in.
    #[must_use]
    pub const fn module(self) -> ModuleTag
    {
        self.module
    }

    pub(crate) const fn index(self) -> usize
    {
        self.index as usize
    }

    /// External handle for this node (never zero).
    pub(crate) fn handle(self) -> TypeHandle
    {
        TypeHandle(NonZeroU32::MIN.saturating_add(self.index))
    }
}

/// Stable opaque handle of a node, valid for the lifetime of its module.
///
/// Handles are dense and start at 1; 0 is never a valid handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(NonZeroU32);

impl TypeHandle
{
    /// Wrap a raw handle value; `None` for 0.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self>
    {
        NonZeroU32::new(raw).map(Self)
    }

    #[must_use]
    pub const fn raw(self) -> u32
    {
        self.0.get()
    }

    pub(crate) const fn index(self) -> usize
    {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Display for TypeHandle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "#{}", self.0)
    }
}

/// Interned name shared between the name index and the nodes.
pub type Name = Arc<str>;

/// One registry node.
#[derive(Debug, Clone)]
pub enum Symbol
{
    /// Module root; parent of every compiland.
    Exe(ExeSymbol),
    Compiland(CompilandSymbol),
    Function(FunctionSymbol),
    InlineSite(FunctionSymbol),
    Block(BlockSymbol),
    /// Member, variable or constant.
    Data(DataSymbol),
    /// Label or function debug start/end point.
    Point(PointSymbol),
    Public(PublicSymbol),
    Thunk(ThunkSymbol),
    Custom(CustomSymbol),
    BaseType(BaseTypeSymbol),
    Udt(UdtSymbol),
    Enum(EnumSymbol),
    Array(ArraySymbol),
    Pointer(PointerSymbol),
    Typedef(TypedefSymbol),
    FunctionSignature(SignatureSymbol),
    FunctionArg(FunctionArgSymbol),
}

impl Symbol
{
    /// Kind tag reported by `SymTag` queries.
    #[must_use]
    pub fn tag(&self) -> SymTag
    {
        match self {
            Symbol::Exe(_) => SymTag::Exe,
            Symbol::Compiland(_) => SymTag::Compiland,
            Symbol::Function(_) => SymTag::Function,
            Symbol::InlineSite(_) => SymTag::InlineSite,
            Symbol::Block(_) => SymTag::Block,
            Symbol::Data(_) => SymTag::Data,
            Symbol::Point(point) => point.kind.tag(),
            Symbol::Public(_) => SymTag::PublicSymbol,
            Symbol::Thunk(_) => SymTag::Thunk,
            Symbol::Custom(_) => SymTag::Custom,
            Symbol::BaseType(_) => SymTag::BaseType,
            Symbol::Udt(_) => SymTag::Udt,
            Symbol::Enum(_) => SymTag::Enum,
            Symbol::Array(_) => SymTag::ArrayType,
            Symbol::Pointer(_) => SymTag::PointerType,
            Symbol::Typedef(_) => SymTag::Typedef,
            Symbol::FunctionSignature(_) => SymTag::FunctionType,
            Symbol::FunctionArg(_) => SymTag::FunctionArgType,
        }
    }

    /// Name of the node, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str>
    {
        self.name_ref().map(|name| &**name)
    }

    pub(crate) fn name_ref(&self) -> Option<&Name>
    {
        match self {
            Symbol::Exe(exe) => Some(&exe.name),
            Symbol::Compiland(compiland) => Some(&compiland.name),
            Symbol::Function(function) | Symbol::InlineSite(function) => Some(&function.name),
            Symbol::Data(data) => data.name.as_ref(),
            Symbol::Point(point) => point.name.as_ref(),
            Symbol::Public(public) => Some(&public.name),
            Symbol::Thunk(thunk) => Some(&thunk.name),
            Symbol::Custom(custom) => Some(&custom.name),
            Symbol::BaseType(base) => base.name.as_ref(),
            Symbol::Udt(udt) => udt.name.as_ref(),
            Symbol::Enum(enumeration) => enumeration.name.as_ref(),
            Symbol::Typedef(typedef) => Some(&typedef.name),
            Symbol::Block(_)
            | Symbol::Array(_)
            | Symbol::Pointer(_)
            | Symbol::FunctionSignature(_)
            | Symbol::FunctionArg(_) => None,
        }
    }

    /// Ordered child list for container-shaped nodes.
    #[must_use]
    pub fn children(&self) -> Option<&[SymId]>
    {
        match self {
            Symbol::Exe(exe) => Some(&exe.children),
            Symbol::Compiland(compiland) => Some(&compiland.children),
            Symbol::Function(function) | Symbol::InlineSite(function) => Some(&function.children),
            Symbol::Block(block) => Some(&block.children),
            Symbol::Udt(udt) => Some(&udt.members),
            Symbol::Enum(enumeration) => Some(&enumeration.constants),
            Symbol::FunctionSignature(signature) => Some(&signature.params),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<SymId>>
    {
        match self {
            Symbol::Exe(exe) => Some(&mut exe.children),
            Symbol::Compiland(compiland) => Some(&mut compiland.children),
            Symbol::Function(function) | Symbol::InlineSite(function) => Some(&mut function.children),
            Symbol::Block(block) => Some(&mut block.children),
            Symbol::Udt(udt) => Some(&mut udt.members),
            Symbol::Enum(enumeration) => Some(&mut enumeration.constants),
            Symbol::FunctionSignature(signature) => Some(&mut signature.params),
            _ => None,
        }
    }

    /// Lexical container, for nodes that have one.
    #[must_use]
    pub fn lexical_parent(&self) -> Option<SymId>
    {
        match self {
            Symbol::Compiland(compiland) => Some(compiland.container),
            Symbol::Function(function) | Symbol::InlineSite(function) => Some(function.container),
            Symbol::Block(block) => Some(block.container),
            Symbol::Data(data) => Some(data.container),
            Symbol::Point(point) => Some(point.parent),
            Symbol::Public(public) => Some(public.container),
            Symbol::Thunk(thunk) => Some(thunk.container),
            Symbol::Custom(custom) => Some(custom.container),
            _ => None,
        }
    }
}

/// Module root node.
#[derive(Debug, Clone)]
pub struct ExeSymbol
{
    pub name: Name,
    pub children: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct CompilandSymbol
{
    pub container: SymId,
    pub name: Name,
    pub address: Address,
    pub children: Vec<SymId>,
}

/// Function or inline site.
#[derive(Debug, Clone)]
pub struct FunctionSymbol
{
    pub container: SymId,
    pub name: Name,
    pub address: Address,
    pub size: u64,
    /// `FunctionType` node describing the signature.
    pub signature: Option<SymId>,
    /// Blocks, locals, parameters, inline sites and debug points, in insertion order.
    pub children: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct BlockSymbol
{
    pub container: SymId,
    pub address: Address,
    pub size: u64,
    pub children: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct DataSymbol
{
    /// Lexical parent: the module root for members, the enum for constants,
    /// the compiland, function or block otherwise.
    pub container: SymId,
    pub name: Option<Name>,
    pub data_type: Option<SymId>,
    pub payload: DataPayload,
}

impl DataSymbol
{
    /// `DataKind` reported for this node.
    #[must_use]
    pub fn kind(&self) -> DataKind
    {
        match &self.payload {
            DataPayload::Member { .. } => DataKind::Member,
            DataPayload::Variable { kind, .. } => *kind,
            DataPayload::Constant(_) => DataKind::Constant,
        }
    }
}

/// Kind-specific part of a data node.
#[derive(Debug, Clone)]
pub enum DataPayload
{
    /// UDT member. `bit_length == 0` means an ordinary byte-aligned member.
    Member
    {
        offset: u32,
        bit_offset: u32,
        bit_length: u32,
        owner: SymId,
    },
    /// Global, file-static, static-local, local or parameter.
    Variable
    {
        kind: DataKind,
        location: Location,
    },
    /// Inline constant (enumerators and named constants).
    Constant(Variant),
}

/// Which fine-grained lexical point a [`PointSymbol`] marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind
{
    Label,
    DebugStart,
    DebugEnd,
}

impl PointKind
{
    #[must_use]
    pub const fn tag(self) -> SymTag
    {
        match self {
            PointKind::Label => SymTag::Label,
            PointKind::DebugStart => SymTag::FuncDebugStart,
            PointKind::DebugEnd => SymTag::FuncDebugEnd,
        }
    }
}

/// Point whose address is relative to its lexical parent.
#[derive(Debug, Clone)]
pub struct PointSymbol
{
    pub kind: PointKind,
    pub parent: SymId,
    pub name: Option<Name>,
    pub offset: u64,
}

#[derive(Debug, Clone)]
pub struct PublicSymbol
{
    pub container: SymId,
    pub name: Name,
    pub address: Address,
    pub size: u64,
    pub is_function: bool,
}

#[derive(Debug, Clone)]
pub struct ThunkSymbol
{
    pub container: SymId,
    pub name: Name,
    pub address: Address,
    pub size: u64,
    pub ordinal: u32,
}

#[derive(Debug, Clone)]
pub struct CustomSymbol
{
    pub container: SymId,
    pub name: Name,
    pub address: Address,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct BaseTypeSymbol
{
    pub name: Option<Name>,
    pub basic: BasicType,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct UdtSymbol
{
    pub name: Option<Name>,
    pub kind: UdtKind,
    pub size: u64,
    pub members: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct EnumSymbol
{
    pub name: Option<Name>,
    pub base_type: SymId,
    pub constants: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct ArraySymbol
{
    pub start: i32,
    pub count: u32,
    pub element: SymId,
    pub index: SymId,
}

#[derive(Debug, Clone)]
pub struct PointerSymbol
{
    pub target: SymId,
    /// Stored per pointer; never derived from the host's pointer width.
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct TypedefSymbol
{
    pub name: Name,
    pub target: SymId,
}

#[derive(Debug, Clone)]
pub struct SignatureSymbol
{
    /// `None` for functions returning nothing.
    pub return_type: Option<SymId>,
    pub call_conv: u32,
    /// `FunctionArgType` nodes, in declaration order.
    pub params: Vec<SymId>,
}

#[derive(Debug, Clone)]
pub struct FunctionArgSymbol
{
    pub container: SymId,
    pub arg_type: SymId,
}
