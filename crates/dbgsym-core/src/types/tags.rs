//! Numbered tag spaces shared with the dbghelp API surface.
//!
//! The discriminants are part of the external contract: consumers receive them
//! verbatim from `SymTag`, `BaseType`, `UdtKind` and `DataKind` queries, so they
//! must never be renumbered.

use std::fmt;

/// Kind tag of a registry node (`SymTagEnum`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SymTag
{
    Null = 0,
    Exe = 1,
    Compiland = 2,
    CompilandDetails = 3,
    CompilandEnv = 4,
    Function = 5,
    Block = 6,
    Data = 7,
    Annotation = 8,
    Label = 9,
    PublicSymbol = 10,
    Udt = 11,
    Enum = 12,
    FunctionType = 13,
    PointerType = 14,
    ArrayType = 15,
    BaseType = 16,
    Typedef = 17,
    BaseClass = 18,
    Friend = 19,
    FunctionArgType = 20,
    FuncDebugStart = 21,
    FuncDebugEnd = 22,
    UsingNamespace = 23,
    VTableShape = 24,
    VTable = 25,
    Custom = 26,
    Thunk = 27,
    CustomType = 28,
    ManagedType = 29,
    Dimension = 30,
    CallSite = 31,
    InlineSite = 32,
    BaseInterface = 33,
    VectorType = 34,
    MatrixType = 35,
    HlslType = 36,
}

impl SymTag
{
    const ALL: [SymTag; 37] = [
        SymTag::Null,
        SymTag::Exe,
        SymTag::Compiland,
        SymTag::CompilandDetails,
        SymTag::CompilandEnv,
        SymTag::Function,
        SymTag::Block,
        SymTag::Data,
        SymTag::Annotation,
        SymTag::Label,
        SymTag::PublicSymbol,
        SymTag::Udt,
        SymTag::Enum,
        SymTag::FunctionType,
        SymTag::PointerType,
        SymTag::ArrayType,
        SymTag::BaseType,
        SymTag::Typedef,
        SymTag::BaseClass,
        SymTag::Friend,
        SymTag::FunctionArgType,
        SymTag::FuncDebugStart,
        SymTag::FuncDebugEnd,
        SymTag::UsingNamespace,
        SymTag::VTableShape,
        SymTag::VTable,
        SymTag::Custom,
        SymTag::Thunk,
        SymTag::CustomType,
        SymTag::ManagedType,
        SymTag::Dimension,
        SymTag::CallSite,
        SymTag::InlineSite,
        SymTag::BaseInterface,
        SymTag::VectorType,
        SymTag::MatrixType,
        SymTag::HlslType,
    ];

    /// Raw numeric value as exposed through the API.
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self as u32
    }

    /// Name used by dbghelp diagnostics (`SymTagUDT`, `SymTagBaseType`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str
    {
        match self {
            SymTag::Null => "SymTagNull",
            SymTag::Exe => "SymTagExe",
            SymTag::Compiland => "SymTagCompiland",
            SymTag::CompilandDetails => "SymTagCompilandDetails",
            SymTag::CompilandEnv => "SymTagCompilandEnv",
            SymTag::Function => "SymTagFunction",
            SymTag::Block => "SymTagBlock",
            SymTag::Data => "SymTagData",
            SymTag::Annotation => "SymTagAnnotation",
            SymTag::Label => "SymTagLabel",
            SymTag::PublicSymbol => "SymTagPublicSymbol",
            SymTag::Udt => "SymTagUDT",
            SymTag::Enum => "SymTagEnum",
            SymTag::FunctionType => "SymTagFunctionType",
            SymTag::PointerType => "SymTagPointerType",
            SymTag::ArrayType => "SymTagArrayType",
            SymTag::BaseType => "SymTagBaseType",
            SymTag::Typedef => "SymTagTypedef",
            SymTag::BaseClass => "SymTagBaseClass",
            SymTag::Friend => "SymTagFriend",
            SymTag::FunctionArgType => "SymTagFunctionArgType",
            SymTag::FuncDebugStart => "SymTagFuncDebugStart",
            SymTag::FuncDebugEnd => "SymTagFuncDebugEnd",
            SymTag::UsingNamespace => "SymTagUsingNamespace",
            SymTag::VTableShape => "SymTagVTableShape",
            SymTag::VTable => "SymTagVTable",
            SymTag::Custom => "SymTagCustom",
            SymTag::Thunk => "SymTagThunk",
            SymTag::CustomType => "SymTagCustomType",
            SymTag::ManagedType => "SymTagManagedType",
            SymTag::Dimension => "SymTagDimension",
            SymTag::CallSite => "SymTagCallSite",
            SymTag::InlineSite => "SymTagInlineSite",
            SymTag::BaseInterface => "SymTagBaseInterface",
            SymTag::VectorType => "SymTagVectorType",
            SymTag::MatrixType => "SymTagMatrixType",
            SymTag::HlslType => "SymTagHLSLType",
        }
    }
}

impl TryFrom<u32> for SymTag
{
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(value)
    }
}

impl fmt::Display for SymTag
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Primitive kind of a base type (`BasicType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BasicType
{
    NoType = 0,
    Void = 1,
    Char = 2,
    WChar = 3,
    Int = 6,
    UInt = 7,
    Float = 8,
    Bcd = 9,
    Bool = 10,
    Long = 13,
    ULong = 14,
    Currency = 25,
    Date = 26,
    Variant = 27,
    Complex = 28,
    Bit = 29,
    Bstr = 30,
    Hresult = 31,
    Char16 = 32,
    Char32 = 33,
    Char8 = 34,
}

impl BasicType
{
    /// Raw numeric value as exposed through the API.
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self as u32
    }
}

impl TryFrom<u32> for BasicType
{
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        Ok(match value {
            0 => BasicType::NoType,
            1 => BasicType::Void,
            2 => BasicType::Char,
            3 => BasicType::WChar,
            6 => BasicType::Int,
            7 => BasicType::UInt,
            8 => BasicType::Float,
            9 => BasicType::Bcd,
            10 => BasicType::Bool,
            13 => BasicType::Long,
            14 => BasicType::ULong,
            25 => BasicType::Currency,
            26 => BasicType::Date,
            27 => BasicType::Variant,
            28 => BasicType::Complex,
            29 => BasicType::Bit,
            30 => BasicType::Bstr,
            31 => BasicType::Hresult,
            32 => BasicType::Char16,
            33 => BasicType::Char32,
            34 => BasicType::Char8,
            other => return Err(other),
        })
    }
}

/// Flavour of a user-defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum UdtKind
{
    Struct = 0,
    Class = 1,
    Union = 2,
    Interface = 3,
}

impl UdtKind
{
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self as u32
    }
}

impl TryFrom<u32> for UdtKind
{
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        match value {
            0 => Ok(UdtKind::Struct),
            1 => Ok(UdtKind::Class),
            2 => Ok(UdtKind::Union),
            3 => Ok(UdtKind::Interface),
            other => Err(other),
        }
    }
}

/// Role of a data node (`DataKind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataKind
{
    Unknown = 0,
    Local = 1,
    StaticLocal = 2,
    Param = 3,
    ObjectPtr = 4,
    FileStatic = 5,
    Global = 6,
    Member = 7,
    StaticMember = 8,
    Constant = 9,
}

impl DataKind
{
    #[must_use]
    pub const fn raw(self) -> u32
    {
        self as u32
    }
}

impl TryFrom<u32> for DataKind
{
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        Ok(match value {
            0 => DataKind::Unknown,
            1 => DataKind::Local,
            2 => DataKind::StaticLocal,
            3 => DataKind::Param,
            4 => DataKind::ObjectPtr,
            5 => DataKind::FileStatic,
            6 => DataKind::Global,
            7 => DataKind::Member,
            8 => DataKind::StaticMember,
            9 => DataKind::Constant,
            other => return Err(other),
        })
    }
}
