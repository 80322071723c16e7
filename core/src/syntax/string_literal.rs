//! String literal escaping and unescaping.
//!
//! Converts between runtime strings (with real newline characters) and the
//! double-quoted literal form that appears in expression source.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// A malformed escape inside a string literal. Positions are byte offsets
/// into the literal body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnescapeError {
    #[error("unknown escape '{seq}' at offset {pos}")]
    UnknownEscape { pos: usize, seq: String },
    #[error("\\u escape at offset {pos} needs four hex digits, found '{digits}'")]
    BadUnicodeDigits { pos: usize, digits: String },
    #[error("U+{code:X} at offset {pos} is not a character")]
    NotAChar { pos: usize, code: u32 },
}

impl UnescapeError {
    pub fn position(&self) -> usize {
        match self {
            Self::UnknownEscape { pos, .. }
            | Self::BadUnicodeDigits { pos, .. }
            | Self::NotAChar { pos, .. } => *pos,
        }
    }
}

/// Write `s` as a double-quoted literal.
pub fn escape_string(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

/// Resolve the escape sequences of a literal body (quotes already stripped).
pub fn unescape_string(input: &str) -> Result<Cow<'_, str>, UnescapeError> {
    let Some(first) = input.find('\\') else {
        return Ok(Cow::Borrowed(input));
    };

    let mut out = String::with_capacity(input.len());
    out.push_str(&input[..first]);
    let mut rest = &input[first..];
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let pos = input.len() - rest.len() + at;
        let tail = &rest[at + 1..];
        let mut chars = tail.chars();
        let (decoded, used) = match chars.next() {
            Some('n') => ('\n', 1),
            Some('r') => ('\r', 1),
            Some('t') => ('\t', 1),
            Some('0') => ('\0', 1),
            Some(c @ ('\\' | '"' | '\'')) => (c, 1),
            Some('u') => (decode_unicode(tail.get(1..).unwrap_or(""), pos)?, 5),
            other => {
                return Err(UnescapeError::UnknownEscape {
                    pos,
                    seq: format!("\\{}", other.map(String::from).unwrap_or_default()),
                });
            }
        };
        out.push(decoded);
        rest = &tail[used..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn decode_unicode(text: &str, pos: usize) -> Result<char, UnescapeError> {
    let digits: String = text.chars().take(4).collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(UnescapeError::BadUnicodeDigits { pos, digits });
    }
    let code = u32::from_str_radix(&digits, 16)
        .map_err(|_| UnescapeError::BadUnicodeDigits { pos, digits: digits.clone() })?;
    char::from_u32(code).ok_or(UnescapeError::NotAChar { pos, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_body_is_borrowed() {
        assert!(matches!(unescape_string("abc"), Ok(Cow::Borrowed("abc"))));
    }

    #[test]
    fn sequences_are_decoded() {
        assert_eq!(unescape_string(r#"a\nb\t\"c\""#).unwrap(), "a\nb\t\"c\"");
        assert_eq!(unescape_string(r"x\u0041y").unwrap(), "xAy");
        assert_eq!(unescape_string(r"café!").unwrap(), "café!");
    }

    #[test]
    fn malformed_escapes() {
        assert_eq!(
            unescape_string(r"ab\q"),
            Err(UnescapeError::UnknownEscape {
                pos: 2,
                seq: "\\q".to_string()
            })
        );
        assert_eq!(
            unescape_string(r"\u00"),
            Err(UnescapeError::BadUnicodeDigits {
                pos: 0,
                digits: "00".to_string()
            })
        );
        assert!(matches!(
            unescape_string(r"\ud800"),
            Err(UnescapeError::NotAChar { code: 0xD800, .. })
        ));
        assert_eq!(unescape_string("trailing\\").unwrap_err().position(), 8);
    }

    #[test]
    fn escape_then_unescape() {
        let mut out = String::new();
        escape_string(&mut out, "say \"hi\"\n").unwrap();
        assert_eq!(out, r#""say \"hi\"\n""#);
        assert_eq!(unescape_string(&out[1..out.len() - 1]).unwrap(), "say \"hi\"\n");
    }
}
