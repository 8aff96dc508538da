//! Memory address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed address inside a debuggee module.
///
/// Lexical symbols (functions, thunks, public symbols) store their location as an
/// `Address` so it cannot be confused with sizes or offsets, which stay plain `u64`.
///
/// ```rust
/// use dbgsym_core::types::Address;
///
/// let entry = Address::new(0x1000);
/// assert_eq!((entry + 0x20).value(), 0x1020);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// Address zero, reported when a lexical container has no address of its own.
    pub const ZERO: Self = Address(0);

    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw `u64` value, as returned by `Address` queries.
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset, returning `None` on overflow.
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
