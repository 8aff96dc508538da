//! Typed values carried by constants and returned by `Value` queries.

use std::fmt;

/// Inline typed value, modelled on the OLE `VARIANT` subset debuggers use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variant
{
    /// No value (`VT_EMPTY`).
    Empty,
    Bool(bool),
    I1(i8),
    I2(i16),
    I4(i32),
    I8(i64),
    UI1(u8),
    UI2(u16),
    UI4(u32),
    UI8(u64),
    R4(f32),
    R8(f64),
}

impl Variant
{
    /// `VARTYPE` code of the variant.
    #[must_use]
    pub const fn vartype(&self) -> u16
    {
        match self {
            Variant::Empty => 0,
            Variant::I2(_) => 2,
            Variant::I4(_) => 3,
            Variant::R4(_) => 4,
            Variant::R8(_) => 5,
            Variant::Bool(_) => 11,
            Variant::I1(_) => 16,
            Variant::UI1(_) => 17,
            Variant::UI2(_) => 18,
            Variant::UI4(_) => 19,
            Variant::I8(_) => 20,
            Variant::UI8(_) => 21,
        }
    }

    /// Integer view of the value, when it has one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64>
    {
        match *self {
            Variant::Bool(value) => Some(i64::from(value)),
            Variant::I1(value) => Some(i64::from(value)),
            Variant::I2(value) => Some(i64::from(value)),
            Variant::I4(value) => Some(i64::from(value)),
            Variant::I8(value) => Some(value),
            Variant::UI1(value) => Some(i64::from(value)),
            Variant::UI2(value) => Some(i64::from(value)),
            Variant::UI4(value) => Some(i64::from(value)),
            Variant::UI8(value) => i64::try_from(value).ok(),
            Variant::Empty | Variant::R4(_) | Variant::R8(_) => None,
        }
    }
}

impl fmt::Display for Variant
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Variant::Empty => f.write_str("<empty>"),
            Variant::Bool(value) => write!(f, "{value}"),
            Variant::I1(value) => write!(f, "{value}"),
            Variant::I2(value) => write!(f, "{value}"),
            Variant::I4(value) => write!(f, "{value}"),
            Variant::I8(value) => write!(f, "{value}"),
            Variant::UI1(value) => write!(f, "{value}"),
            Variant::UI2(value) => write!(f, "{value}"),
            Variant::UI4(value) => write!(f, "{value}"),
            Variant::UI8(value) => write!(f, "{value}"),
            Variant::R4(value) => write!(f, "{value}"),
            Variant::R8(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_integer_view()
    {
        assert_eq!(Variant::I4(-3).as_i64(), Some(-3));
        assert_eq!(Variant::UI8(u64::MAX).as_i64(), None);
        assert_eq!(Variant::R8(1.5).as_i64(), None);
    }

    #[test]
    fn test_vartype_codes()
    {
        assert_eq!(Variant::I4(0).vartype(), 3);
        assert_eq!(Variant::UI4(0).vartype(), 19);
        assert_eq!(Variant::Empty.vartype(), 0);
    }
}
