//! A1-style cell addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;

/// Rows per sheet in the XLSX grid.
pub const MAX_ROWS: usize = 1_048_576;
/// Columns per sheet in the XLSX grid (`A`..=`XFD`).
pub const MAX_COLS: usize = 16_384;

/// Sheet-relative cell position. Row and column are 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse `B5`, `$B$5` or `b5`.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(AddressError::Blank);
        }
        let malformed = || AddressError::Malformed(input.to_string());
        let out_of_bounds = || AddressError::OutOfBounds(input.to_string());

        let rest = text.strip_prefix('$').unwrap_or(text);
        let letters_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(letters_end);
        let digits = rest.strip_prefix('$').unwrap_or(rest);

        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit())
        {
            return Err(malformed());
        }
        if letters.len() > 3 {
            return Err(out_of_bounds());
        }

        let col = letters
            .chars()
            .fold(0usize, |acc, ch| {
                acc * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1)
            })
            - 1;
        let row: usize = digits.parse().map_err(|_| out_of_bounds())?;
        if row == 0 || row > MAX_ROWS || col >= MAX_COLS {
            return Err(out_of_bounds());
        }
        Ok(Self { row: row - 1, col })
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row + 1)
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn column_name(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        assert_eq!(CellAddress::parse("A1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(CellAddress::parse("B5").unwrap(), CellAddress::new(4, 1));
        assert_eq!(CellAddress::parse("aa10").unwrap(), CellAddress::new(9, 26));
        assert_eq!(CellAddress::parse("$C$3").unwrap(), CellAddress::new(2, 2));
        assert_eq!(CellAddress::parse(" D4 ").unwrap(), CellAddress::new(3, 3));
    }

    #[test]
    fn test_parse_limits() {
        assert_eq!(
            CellAddress::parse("XFD1048576").unwrap(),
            CellAddress::new(MAX_ROWS - 1, MAX_COLS - 1)
        );
        assert!(matches!(
            CellAddress::parse("XFE1"),
            Err(AddressError::OutOfBounds(_))
        ));
        assert!(matches!(
            CellAddress::parse("A1048577"),
            Err(AddressError::OutOfBounds(_))
        ));
        assert!(matches!(
            CellAddress::parse("A0"),
            Err(AddressError::OutOfBounds(_))
        ));
        assert!(matches!(
            CellAddress::parse("ABCD1"),
            Err(AddressError::OutOfBounds(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(CellAddress::parse("   "), Err(AddressError::Blank));
        for bad in ["1A", "A", "12", "A1B", "A-1", "R1C1!"] {
            assert!(
                matches!(CellAddress::parse(bad), Err(AddressError::Malformed(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
        assert_eq!(column_name(MAX_COLS - 1), "XFD");
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["A1", "Z99", "AA10", "XFD1048576"] {
            assert_eq!(CellAddress::parse(text).unwrap().to_string(), text);
        }
    }
}
