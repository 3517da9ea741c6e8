//! Text utilities shared by the lexer, the string interner, and the say
//! opcodes: integer literal parsing, NFC normalization, first-codepoint
//! case mapping, and whitespace splitting.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntParseError {
    #[error("invalid integer literal")]
    Invalid,
    #[error("integer literal out of range")]
    OutOfRange,
}

/// Parse an integer literal.
///
/// Accepts an optional leading `-`, the prefixes `0x`/`0X` (hex) and
/// `0b`/`0B` (binary), and `_` as a digit separator. Decimal literals must
/// fit a signed 32-bit integer; hex and binary literals must fit an
/// unsigned 32-bit integer and are stored as the same bits, signed.
pub fn parse_int(text: &str) -> Result<i32, IntParseError> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (base, digits) = if let Some(rest) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, rest)
    } else {
        (10, body)
    };
    if digits.is_empty() {
        return Err(IntParseError::Invalid);
    }
    if negative && base != 10 {
        return Err(IntParseError::Invalid);
    }
    let raw = i64::from_str_radix(digits, base).map_err(|err| {
        use std::num::IntErrorKind;
        match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => IntParseError::OutOfRange,
            _ => IntParseError::Invalid,
        }
    })?;
    if base == 10 {
        let value = if negative { -raw } else { raw };
        if value < i64::from(i32::MIN) || value > i64::from(i32::MAX) {
            return Err(IntParseError::OutOfRange);
        }
        Ok(value as i32)
    } else {
        if raw > i64::from(u32::MAX) {
            return Err(IntParseError::OutOfRange);
        }
        Ok(raw as u32 as i32)
    }
}

/// NFC-normalize a string. Interned strings are stored normalized so that
/// equal-looking text always interns to the same id.
pub fn normalize(s: &str) -> String {
    s.nfc().collect()
}

/// Uppercase the first codepoint, leaving the rest untouched.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn first_codepoint(s: &str) -> Option<char> {
    s.chars().next()
}

/// Split on ASCII whitespace, dropping empty fields.
pub fn explode(s: &str) -> Vec<&str> {
    s.split(|c: char| c.is_ascii_whitespace())
        .filter(|part| !part.is_empty())
        .collect()
}

/// The whitespace set the lexer and string folding agree on.
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Characters that may appear inside identifiers.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// True when a name consists solely of identifier characters and so may be
/// registered as a symbol.
pub fn valid_symbol(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_identifier_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decimal_limits() {
        assert_eq!(parse_int("2147483647"), Ok(2147483647));
        assert_eq!(parse_int("-2147483648"), Ok(-2147483648));
        assert_eq!(parse_int("2147483648"), Err(IntParseError::OutOfRange));
    }

    #[test]
    fn hex_and_binary_use_unsigned_range() {
        assert_eq!(parse_int("0xFFFFFFFF"), Ok(-1));
        assert_eq!(parse_int("0xFFFFFFFF").map(|v| v as u32), Ok(0xFFFF_FFFF));
        assert_eq!(parse_int("0b1011_0010"), Ok(178));
        assert_eq!(parse_int("0X1FFFFFFFF"), Err(IntParseError::OutOfRange));
    }

    #[test]
    fn separators_and_junk() {
        assert_eq!(parse_int("1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int(""), Err(IntParseError::Invalid));
        assert_eq!(parse_int("12abc"), Err(IntParseError::Invalid));
        assert_eq!(parse_int("0x"), Err(IntParseError::Invalid));
        assert_eq!(parse_int("-0x10"), Err(IntParseError::Invalid));
    }

    #[test]
    fn upper_first_maps_one_codepoint() {
        assert_eq!(upper_first("hello"), "Hello");
        assert_eq!(upper_first("ärger"), "Ärger");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn explode_splits_words() {
        assert_eq!(explode("  take the lamp "), vec!["take", "the", "lamp"]);
        assert!(explode("   ").is_empty());
    }

    #[test]
    fn symbol_validity() {
        assert!(valid_symbol("north-west_2"));
        assert!(!valid_symbol("bad name"));
        assert!(!valid_symbol(""));
    }

    proptest! {
        #[test]
        fn in_range_decimals_round_trip(n in any::<i32>()) {
            prop_assert_eq!(parse_int(&n.to_string()), Ok(n));
        }
    }
}
