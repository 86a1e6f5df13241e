//! Tokenizer for condition text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpTok {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Is,
    IsNot,
    In,
    NotIn,
    InstanceOf,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    And,
    Or,
    Not,
    Cmp(CmpTok),
    Str(String),
    Num(String),
    Ident(String),
    /// Member access: `.`, `?.`, `->`, `::`.
    Dot,
    Minus,
    Other(char),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tok {
    pub kind: TokKind,
    pub start: usize,
    pub end: usize,
}

impl Tok {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is(&self, kind: &TokKind) -> bool {
        &self.kind == kind
    }
}

const STRING_PREFIXES: &[&str] = &["r", "b", "f", "u", "rb", "br", "fr", "rf", "R", "B", "F", "U", "@", "$"];

pub(crate) fn tokenize(src: &str) -> Vec<Tok> {
    let bytes = src.as_bytes();
    let mut toks: Vec<Tok> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let next = bytes.get(i + 1).copied();
        let next2 = bytes.get(i + 2).copied();
        let kind = match c {
            b'(' => {
                i += 1;
                TokKind::LParen
            }
            b')' => {
                i += 1;
                TokKind::RParen
            }
            b'[' => {
                i += 1;
                TokKind::LBracket
            }
            b']' => {
                i += 1;
                TokKind::RBracket
            }
            b'{' => {
                i += 1;
                TokKind::LBrace
            }
            b'}' => {
                i += 1;
                TokKind::RBrace
            }
            b',' => {
                i += 1;
                TokKind::Comma
            }
            b'&' if next == Some(b'&') => {
                i += 2;
                TokKind::And
            }
            b'|' if next == Some(b'|') => {
                i += 2;
                TokKind::Or
            }
            b'!' if next == Some(b'=') => {
                i += if next2 == Some(b'=') { 3 } else { 2 };
                TokKind::Cmp(CmpTok::Ne)
            }
            b'!' => {
                i += 1;
                TokKind::Not
            }
            b'=' if next == Some(b'=') => {
                i += if next2 == Some(b'=') { 3 } else { 2 };
                TokKind::Cmp(CmpTok::Eq)
            }
            b'<' if next == Some(b'=') => {
                i += 2;
                TokKind::Cmp(CmpTok::Le)
            }
            b'>' if next == Some(b'=') => {
                i += 2;
                TokKind::Cmp(CmpTok::Ge)
            }
            b'<' if next != Some(b'<') => {
                i += 1;
                TokKind::Cmp(CmpTok::Lt)
            }
            b'>' if next != Some(b'>') => {
                i += 1;
                TokKind::Cmp(CmpTok::Gt)
            }
            b'-' if next == Some(b'>') => {
                i += 2;
                TokKind::Dot
            }
            b':' if next == Some(b':') => {
                i += 2;
                TokKind::Dot
            }
            b'?' if next == Some(b'.') => {
                i += 2;
                TokKind::Dot
            }
            b'.' if next.is_some_and(|n| n.is_ascii_digit()) => {
                i = scan_number(bytes, i);
                TokKind::Num(src[start..i].to_string())
            }
            b'.' => {
                i += 1;
                TokKind::Dot
            }
            b'-' => {
                i += 1;
                TokKind::Minus
            }
            b'"' | b'\'' | b'`' => {
                let (value, end) = scan_string(src, i);
                i = end;
                TokKind::Str(value)
            }
            b'0'..=b'9' => {
                i = scan_number(bytes, i);
                TokKind::Num(src[start..i].to_string())
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c == b'@' => {
                let mut j = i + 1;
                while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_' || bytes[j] == b'$') {
                    j += 1;
                }
                let word = &src[i..j];
                if STRING_PREFIXES.contains(&word) && matches!(bytes.get(j), Some(b'"') | Some(b'\'')) {
                    let (value, end) = scan_string(src, j);
                    i = end;
                    TokKind::Str(value)
                } else {
                    i = j;
                    keyword_or_ident(word)
                }
            }
            _ => {
                // Multi-byte characters are opaque but must not split a char.
                let ch = src[i..].chars().next().unwrap_or('?');
                i += ch.len_utf8();
                TokKind::Other(ch)
            }
        };
        push(&mut toks, Tok { kind, start, end: i });
    }
    toks
}

/// Push a token, fusing `is not` and `not in` into single operators.
fn push(toks: &mut Vec<Tok>, tok: Tok) {
    if let Some(last) = toks.last_mut() {
        match (&last.kind, &tok.kind) {
            (TokKind::Cmp(CmpTok::Is), TokKind::Not) => {
                last.kind = TokKind::Cmp(CmpTok::IsNot);
                last.end = tok.end;
                return;
            }
            (TokKind::Not, TokKind::Cmp(CmpTok::In)) => {
                last.kind = TokKind::Cmp(CmpTok::NotIn);
                last.end = tok.end;
                return;
            }
            _ => {}
        }
    }
    toks.push(tok);
}

fn keyword_or_ident(word: &str) -> TokKind {
    match word {
        "and" => TokKind::And,
        "or" => TokKind::Or,
        "not" => TokKind::Not,
        "is" => TokKind::Cmp(CmpTok::Is),
        "in" => TokKind::Cmp(CmpTok::In),
        "instanceof" => TokKind::Cmp(CmpTok::InstanceOf),
        _ => TokKind::Ident(word.to_string()),
    }
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        let exponent_sign = (b == b'-' || b == b'+')
            && i > 0
            && matches!(bytes[i - 1], b'e' | b'E')
            && !(bytes.get(i.saturating_sub(2)).is_some_and(|p| *p == b'x' || *p == b'X'));
        if b.is_ascii_alphanumeric() || b == b'_' || exponent_sign {
            i += 1;
        } else if b == b'.' && bytes.get(i + 1).is_some_and(|n| n.is_ascii_digit()) {
            i += 1;
        } else {
            break;
        }
    }
    i
}

/// Scan a quoted string starting at `i`; returns the unescaped body and the
/// index after the closing quote (or the end of input).
fn scan_string(src: &str, i: usize) -> (String, usize) {
    let bytes = src.as_bytes();
    let quote = bytes[i];
    let mut value = String::new();
    let mut j = i + 1;
    let mut escaped = false;
    for (offset, ch) in src[j..].char_indices() {
        if escaped {
            value.push(match ch {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch as u32 == quote as u32 {
            return (value, j + offset + 1);
        }
        value.push(ch);
    }
    j = bytes.len();
    (value, j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("b === 0"),
            vec![TokKind::Ident("b".into()), TokKind::Cmp(CmpTok::Eq), TokKind::Num("0".into())]
        );
        assert_eq!(
            kinds("x !== null"),
            vec![TokKind::Ident("x".into()), TokKind::Cmp(CmpTok::Ne), TokKind::Ident("null".into())]
        );
    }

    #[test]
    fn python_compound_keywords() {
        assert_eq!(
            kinds("x is not None"),
            vec![TokKind::Ident("x".into()), TokKind::Cmp(CmpTok::IsNot), TokKind::Ident("None".into())]
        );
        assert_eq!(
            kinds("op not in ('a', 'b')")[1],
            TokKind::Cmp(CmpTok::NotIn)
        );
    }

    #[test]
    fn strings_and_numbers() {
        assert_eq!(kinds(r#"'add'"#), vec![TokKind::Str("add".into())]);
        assert_eq!(kinds(r#"@"path""#), vec![TokKind::Str("path".into())]);
        assert_eq!(kinds("1.5e-3"), vec![TokKind::Num("1.5e-3".into())]);
        assert_eq!(kinds("0x1F"), vec![TokKind::Num("0x1F".into())]);
        assert_eq!(kinds("-1"), vec![TokKind::Minus, TokKind::Num("1".into())]);
    }

    #[test]
    fn member_access_forms() {
        assert_eq!(
            kinds("self->items::len"),
            vec![
                TokKind::Ident("self".into()),
                TokKind::Dot,
                TokKind::Ident("items".into()),
                TokKind::Dot,
                TokKind::Ident("len".into()),
            ]
        );
    }
}
