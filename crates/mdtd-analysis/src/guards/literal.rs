//! Literal recognition shared by guards, defaults and return values.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::{tokenize, TokKind};
use crate::model::LiteralValue;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9][0-9_]*(?:\.[0-9_]*)?(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?)([A-Za-z0-9]*)$").unwrap()
});

const NULL_WORDS: &[&str] = &["null", "None", "nil", "nullptr", "NULL", "undefined"];

/// Parse numeric literal text in any supported language's syntax
/// (`10L`, `2.5f`, `1_000`, `0xFF`, `3u8`, `1e-3`).
pub fn parse_number(text: &str) -> Option<LiteralValue> {
    let text = text.trim();
    let lower = text.to_ascii_lowercase();
    for (prefix, radix) in [("0x", 16), ("0b", 2), ("0o", 8)] {
        if let Some(digits) = lower.strip_prefix(prefix) {
            let digits: String = digits
                .chars()
                .take_while(|c| c.is_digit(radix) || *c == '_')
                .filter(|c| *c != '_')
                .collect();
            return i64::from_str_radix(&digits, radix).ok().map(LiteralValue::Integer);
        }
    }

    let caps = DECIMAL.captures(text)?;
    let body = caps.get(1)?.as_str().replace('_', "");
    let suffix = caps.get(2).map_or("", |m| m.as_str()).to_ascii_lowercase();
    let float_suffix = matches!(suffix.as_str(), "f" | "d" | "m" | "f32" | "f64");
    let int_suffix = suffix.is_empty()
        || matches!(
            suffix.as_str(),
            "l" | "u" | "ul" | "lu" | "ll" | "ull" | "n" | "i8" | "i16" | "i32" | "i64" | "i128"
                | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize"
        );
    let looks_float = body.contains('.') || body.contains('e') || body.contains('E');

    if looks_float || float_suffix {
        body.parse::<f64>().ok().map(LiteralValue::Float)
    } else if int_suffix {
        body.parse::<i64>().ok().map(LiteralValue::Integer)
    } else {
        None
    }
}

/// Recognize `text` as a single literal, or `None`.
pub fn parse_literal(text: &str) -> Option<LiteralValue> {
    let toks = tokenize(text);
    match toks.as_slice() {
        [t] => match &t.kind {
            TokKind::Str(s) => Some(LiteralValue::Text(s.clone())),
            TokKind::Num(n) => parse_number(n),
            TokKind::Ident(w) => word_literal(w),
            _ => None,
        },
        [m, t] if m.kind == TokKind::Minus => match &t.kind {
            TokKind::Num(n) => match parse_number(n)? {
                LiteralValue::Integer(i) => Some(LiteralValue::Integer(-i)),
                LiteralValue::Float(f) => Some(LiteralValue::Float(-f)),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn word_literal(word: &str) -> Option<LiteralValue> {
    match word {
        "true" | "True" => Some(LiteralValue::Boolean(true)),
        "false" | "False" => Some(LiteralValue::Boolean(false)),
        w if NULL_WORDS.contains(&w) => Some(LiteralValue::Null),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_across_languages() {
        assert_eq!(parse_number("42"), Some(LiteralValue::Integer(42)));
        assert_eq!(parse_number("10L"), Some(LiteralValue::Integer(10)));
        assert_eq!(parse_number("1_000"), Some(LiteralValue::Integer(1000)));
        assert_eq!(parse_number("0xFF"), Some(LiteralValue::Integer(255)));
        assert_eq!(parse_number("3u8"), Some(LiteralValue::Integer(3)));
        assert_eq!(parse_number("2.5f"), Some(LiteralValue::Float(2.5)));
        assert_eq!(parse_number("0.0"), Some(LiteralValue::Float(0.0)));
        assert_eq!(parse_number("1e3"), Some(LiteralValue::Float(1000.0)));
        assert_eq!(parse_number("12abc"), None);
    }

    #[test]
    fn literal_forms() {
        assert_eq!(parse_literal("False"), Some(LiteralValue::Boolean(false)));
        assert_eq!(parse_literal("nullptr"), Some(LiteralValue::Null));
        assert_eq!(parse_literal("'ok'"), Some(LiteralValue::Text("ok".into())));
        assert_eq!(parse_literal("-1"), Some(LiteralValue::Integer(-1)));
        assert_eq!(parse_literal("a + b"), None);
        assert_eq!(parse_literal("result"), None);
    }
}
