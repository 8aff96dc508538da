//! Symbol name types.

use std::fmt;

/// Caller-owned UTF-16 name buffer returned by `SymName` queries.
///
/// Every query allocates a fresh buffer; the registry never hands out views into
/// its own name storage. Dropping the value releases it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WideString(Vec<u16>);

impl WideString
{
    /// Transcode a registry name to UTF-16.
    #[must_use]
    pub fn from_name(name: &str) -> Self
    {
        Self(name.encode_utf16().collect())
    }

    /// Code units without a terminator.
    #[must_use]
    pub fn as_slice(&self) -> &[u16]
    {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize
    {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.0.is_empty()
    }

    /// Decode back to a Rust string, replacing unpaired surrogates.
    #[must_use]
    pub fn to_string_lossy(&self) -> String
    {
        String::from_utf16_lossy(&self.0)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u16>
    {
        self.0
    }
}

impl fmt::Display for WideString
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(&self.to_string_lossy())
    }
}

/// Copy `name` into `dst`, keeping at most `capacity - 1` characters.
///
/// Returns the full length of `name` in characters, matching the `NameLen`
/// field of symbol records, which reports the untruncated length.
pub fn copy_bounded_name(dst: &mut String, name: &str, capacity: usize) -> usize
{
    dst.clear();
    let keep = capacity.saturating_sub(1);
    let mut total = 0;
    for ch in name.chars() {
        if total < keep {
            dst.push(ch);
        }
        total += 1;
    }
    total
}

/// UTF-16 counterpart of [`copy_bounded_name`]; `dst` is reused without reallocating
/// once it has grown to `capacity`.
pub fn copy_bounded_wide_name(dst: &mut Vec<u16>, name: &str, capacity: usize) -> usize
{
    dst.clear();
    let keep = capacity.saturating_sub(1);
    let mut total = 0;
    for unit in name.encode_utf16() {
        if total < keep {
            dst.push(unit);
        }
        total += 1;
    }
    total
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_wide_string_round_trip()
    {
        let wide = WideString::from_name("Point");
        assert_eq!(wide.len(), 5);
        assert_eq!(wide.to_string_lossy(), "Point");
    }

    #[test]
    fn test_bounded_name_truncates_but_reports_full_length()
    {
        let mut dst = String::new();
        assert_eq!(copy_bounded_name(&mut dst, "abcdef", 4), 6);
        assert_eq!(dst, "abc");

        assert_eq!(copy_bounded_name(&mut dst, "ab", 4), 2);
        assert_eq!(dst, "ab");
    }

    #[test]
    fn test_bounded_wide_name_reuses_buffer()
    {
        let mut dst = Vec::with_capacity(8);
        copy_bounded_wide_name(&mut dst, "long_name_here", 8);
        assert_eq!(String::from_utf16_lossy(&dst), "long_na");
        let capacity = dst.capacity();
        copy_bounded_wide_name(&mut dst, "x", 8);
        assert_eq!(dst, vec![u16::from(b'x')]);
        assert_eq!(dst.capacity(), capacity);
    }
}
