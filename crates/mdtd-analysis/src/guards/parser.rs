//! Recursive-descent parser from condition text to [`Condition`].

use super::lexer::{tokenize, CmpTok, Tok, TokKind};
use super::literal::{parse_number, word_literal};
use crate::model::{
    classify_type, CompareOp, Condition, GuardAtom, GuardTest, LiteralValue, TypeCategory,
};
use crate::scanner::Language;

/// Parse `text` as a guard over `params`. Never fails: whatever cannot be
/// interpreted becomes [`Condition::Opaque`].
pub fn parse_condition(text: &str, params: &[&str]) -> Condition {
    let toks = tokenize(text);
    if toks.is_empty() {
        return Condition::opaque(text.trim());
    }
    let mut parser = Parser {
        src: text,
        toks: &toks,
        pos: 0,
        params,
    };
    let cond = parser.parse_or();
    if parser.pos < toks.len() {
        // Trailing tokens mean we misread the structure.
        return Condition::opaque(text.trim());
    }
    cond
}

struct Parser<'a> {
    src: &'a str,
    toks: &'a [Tok],
    pos: usize,
    params: &'a [&'a str],
}

/// A value-level operand.
#[derive(Debug)]
enum Term {
    Param(String),
    Length(String),
    TypeOf(String),
    Literal(LiteralValue),
    Name(String),
    List(Vec<LiteralValue>),
    Other,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a TokKind> {
        self.toks.get(self.pos).map(|t| &t.kind)
    }

    fn parse_or(&mut self) -> Condition {
        let mut terms = vec![self.parse_and()];
        while matches!(self.peek(), Some(TokKind::Or)) {
            self.pos += 1;
            terms.push(self.parse_and());
        }
        Condition::any(terms)
    }

    fn parse_and(&mut self) -> Condition {
        let mut terms = vec![self.parse_not()];
        while matches!(self.peek(), Some(TokKind::And)) {
            self.pos += 1;
            terms.push(self.parse_not());
        }
        Condition::all(terms)
    }

    fn parse_not(&mut self) -> Condition {
        if matches!(self.peek(), Some(TokKind::Not)) {
            self.pos += 1;
            return self.parse_not().negate();
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Condition {
        let first_start = self.pos;
        let lhs = self.take_operand();
        if lhs.is_empty() {
            // Skip one token so a stray operator cannot stall the parser.
            if self.pos < self.toks.len() {
                self.pos += 1;
            }
            return Condition::opaque(self.text_of(first_start, self.pos));
        }

        let mut links: Vec<(CmpTok, &'a [Tok])> = Vec::new();
        while let Some(TokKind::Cmp(op)) = self.peek() {
            self.pos += 1;
            let rhs = self.take_operand();
            links.push((*op, rhs));
        }
        let whole = self.text_of(first_start, self.pos);

        if links.is_empty() {
            return self.predicate(lhs);
        }

        // Chained comparisons: `0 <= x < 10` means `0 <= x and x < 10`.
        let mut left = lhs;
        let mut parts = Vec::with_capacity(links.len());
        for (op, right) in links {
            parts.push(self.comparison(left, op, right).unwrap_or_else(|| Condition::opaque(whole.clone())));
            left = right;
        }
        Condition::all(parts)
    }

    /// Tokens up to the next logical or comparison operator at depth zero.
    fn take_operand(&mut self) -> &'a [Tok] {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(tok) = self.toks.get(self.pos) {
            match tok.kind {
                TokKind::LParen | TokKind::LBracket | TokKind::LBrace => depth += 1,
                TokKind::RParen | TokKind::RBracket | TokKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokKind::And | TokKind::Or | TokKind::Cmp(_) if depth == 0 => break,
                TokKind::Not if depth == 0 && self.pos > start => break,
                _ => {}
            }
            self.pos += 1;
        }
        let toks = self.toks;
        &toks[start..self.pos]
    }

    fn text_of(&self, from: usize, to: usize) -> String {
        match (self.toks.get(from), to.checked_sub(1).and_then(|i| self.toks.get(i))) {
            (Some(a), Some(b)) if b.end >= a.start => self.src[a.start..b.end].trim().to_string(),
            _ => String::new(),
        }
    }

    fn slice_text(&self, toks: &[Tok]) -> String {
        match (toks.first(), toks.last()) {
            (Some(a), Some(b)) => self.src[a.start..b.end].trim().to_string(),
            _ => String::new(),
        }
    }

    fn is_param(&self, name: &str) -> bool {
        self.params.contains(&name)
    }

    /// A boolean-valued operand with no comparison operator.
    fn predicate(&self, toks: &'a [Tok]) -> Condition {
        if let Some(inner) = strip_parens(toks) {
            return parse_condition(&self.slice_text(inner), self.params);
        }
        let text = self.slice_text(toks);
        let idents: Vec<Option<&str>> = toks.iter().map(Tok::ident).collect();

        // `p`
        if let [Some(p)] = idents.as_slice() {
            if self.is_param(p) {
                return atom(p, GuardTest::Truthy);
            }
        }

        // `isinstance(p, T)` / `isinstance(p, (T1, T2))`
        if idents.first() == Some(&Some("isinstance")) && toks.len() >= 6 {
            if let Some(p) = toks.get(2).and_then(Tok::ident) {
                if self.is_param(p) && toks.get(3).is_some_and(|t| t.is(&TokKind::Comma)) {
                    let categories = categories_for_names(toks[4..].iter().filter_map(Tok::ident));
                    if !categories.is_empty() {
                        return atom(p, GuardTest::IsInstance { categories });
                    }
                }
            }
        }

        // `p.isEmpty()`, `p.is_empty()`, `p.empty()`, `p.is_none()`, `p.is_some()`
        if let [Some(p), None, Some(method), None, None] = idents.as_slice() {
            if self.is_param(p)
                && toks[1].is(&TokKind::Dot)
                && toks[3].is(&TokKind::LParen)
                && toks[4].is(&TokKind::RParen)
            {
                match *method {
                    "isEmpty" | "is_empty" | "empty" | "IsEmpty" | "isBlank" | "is_blank" => {
                        return atom(p, GuardTest::IsEmpty)
                    }
                    "is_none" | "isNone" => return atom(p, GuardTest::IsNull),
                    "is_some" | "isPresent" => return atom(p, GuardTest::IsNull).negate(),
                    _ => {}
                }
            }
        }

        // `Helper.check(p)` style static predicates.
        if let [Some(owner), None, Some(method), None, Some(p), None] = idents.as_slice() {
            if self.is_param(p)
                && toks[1].is(&TokKind::Dot)
                && toks[3].is(&TokKind::LParen)
                && toks[5].is(&TokKind::RParen)
            {
                let null_or_empty = || {
                    Condition::any(vec![atom(p, GuardTest::IsNull), atom(p, GuardTest::IsEmpty)])
                };
                match (*owner, *method) {
                    ("string" | "String", "IsNullOrEmpty" | "IsNullOrWhiteSpace") => return null_or_empty(),
                    ("StringUtils" | "Strings", "isEmpty" | "isBlank" | "isNullOrEmpty") => return null_or_empty(),
                    ("StringUtils", "isNotEmpty" | "isNotBlank") => return null_or_empty().negate(),
                    ("Objects", "isNull") => return atom(p, GuardTest::IsNull),
                    ("Objects", "nonNull") => return atom(p, GuardTest::IsNull).negate(),
                    ("Array", "isArray") => {
                        return atom(p, GuardTest::IsInstance {
                            categories: vec![TypeCategory::Collection],
                        })
                    }
                    ("Number", "isInteger" | "isSafeInteger") => {
                        return atom(p, GuardTest::IsInstance {
                            categories: vec![TypeCategory::Integer],
                        })
                    }
                    _ => {}
                }
            }
        }

        Condition::opaque(text)
    }

    fn comparison(&self, lhs: &[Tok], op: CmpTok, rhs: &[Tok]) -> Option<Condition> {
        let left = self.term(lhs);
        let right = self.term(rhs);

        match op {
            CmpTok::Eq | CmpTok::Ne | CmpTok::Is | CmpTok::IsNot => {
                let negated = matches!(op, CmpTok::Ne | CmpTok::IsNot);
                let (subject, other) = match (&left, &right) {
                    (Term::Param(_) | Term::Length(_) | Term::TypeOf(_), _) => (&left, &right),
                    (_, Term::Param(_) | Term::Length(_) | Term::TypeOf(_)) => (&right, &left),
                    _ => return None,
                };
                let cond = equality(subject, other, matches!(op, CmpTok::Is | CmpTok::IsNot))?;
                Some(if negated { cond.negate() } else { cond })
            }
            CmpTok::Lt | CmpTok::Le | CmpTok::Gt | CmpTok::Ge => {
                let cmp = match op {
                    CmpTok::Lt => CompareOp::Lt,
                    CmpTok::Le => CompareOp::Le,
                    CmpTok::Gt => CompareOp::Gt,
                    _ => CompareOp::Ge,
                };
                match (&left, &right) {
                    (Term::Param(p), Term::Literal(v)) => numeric(v).map(|n| compare(p, cmp, n)),
                    (Term::Literal(v), Term::Param(p)) => numeric(v).map(|n| compare(p, cmp.mirrored(), n)),
                    (Term::Length(p), Term::Literal(v)) => length_bound(p, cmp, numeric(v)?),
                    (Term::Literal(v), Term::Length(p)) => length_bound(p, cmp.mirrored(), numeric(v)?),
                    _ => None,
                }
            }
            CmpTok::In | CmpTok::NotIn => {
                let (Term::Param(p), Term::List(items)) = (&left, &right) else {
                    return None;
                };
                let options: Vec<Condition> = items.iter().filter_map(|v| equality_with_literal(p, v)).collect();
                if options.is_empty() || options.len() != items.len() {
                    return None;
                }
                let cond = Condition::any(options);
                Some(if op == CmpTok::NotIn { cond.negate() } else { cond })
            }
            CmpTok::InstanceOf => match (&left, &right) {
                (Term::Param(p), Term::Name(t)) => Some(atom(p, GuardTest::IsInstance {
                    categories: categories_for_names(std::iter::once(t.as_str())),
                })),
                _ => None,
            },
        }
    }

    fn term(&self, toks: &[Tok]) -> Term {
        let mut toks = toks;
        while let Some(inner) = strip_parens(toks) {
            // `('a', 'b')` is a tuple, not a grouping.
            if inner.iter().any(|t| t.is(&TokKind::Comma)) {
                break;
            }
            toks = inner;
        }
        // Dereference and borrow markers.
        while let Some(first) = toks.first() {
            if matches!(first.kind, TokKind::Other('*') | TokKind::Other('&')) && toks.len() > 1 {
                toks = &toks[1..];
            } else {
                break;
            }
        }

        match toks {
            [t] => match &t.kind {
                TokKind::Ident(w) if self.is_param(w) => Term::Param(w.clone()),
                TokKind::Ident(w) => match word_literal(w) {
                    Some(lit) => Term::Literal(lit),
                    None => Term::Name(w.clone()),
                },
                TokKind::Num(n) => parse_number(n).map_or(Term::Other, Term::Literal),
                TokKind::Str(s) => Term::Literal(LiteralValue::Text(s.clone())),
                _ => Term::Other,
            },
            [m, t] if m.is(&TokKind::Minus) => match &t.kind {
                TokKind::Num(n) => match parse_number(n) {
                    Some(LiteralValue::Integer(i)) => Term::Literal(LiteralValue::Integer(-i)),
                    Some(LiteralValue::Float(f)) => Term::Literal(LiteralValue::Float(-f)),
                    _ => Term::Other,
                },
                _ => Term::Other,
            },
            // `typeof p`
            [kw, p] if kw.ident() == Some("typeof") => match p.ident() {
                Some(p) if self.is_param(p) => Term::TypeOf(p.to_string()),
                _ => Term::Other,
            },
            // `typeof(p)`, `type(p)`, `len(p)`, `strlen(p)`
            [f, open, p, close] if open.is(&TokKind::LParen) && close.is(&TokKind::RParen) => {
                match (f.ident(), p.ident()) {
                    (Some("typeof" | "type"), Some(p)) if self.is_param(p) => Term::TypeOf(p.to_string()),
                    (Some("len" | "strlen" | "count" | "size"), Some(p)) if self.is_param(p) => {
                        Term::Length(p.to_string())
                    }
                    _ => Term::Other,
                }
            }
            // `p.length`, `p.Length`, `p.Count`, `p.size`
            [p, dot, prop] if dot.is(&TokKind::Dot) => match (p.ident(), prop.ident()) {
                (Some(p), Some("length" | "Length" | "Count" | "size" | "count")) if self.is_param(p) => {
                    Term::Length(p.to_string())
                }
                _ => Term::Other,
            },
            // `p.length()`, `p.size()`, `p.len()`, `p.count()`, `p.Count()`
            [p, dot, method, open, close]
                if dot.is(&TokKind::Dot) && open.is(&TokKind::LParen) && close.is(&TokKind::RParen) =>
            {
                match (p.ident(), method.ident()) {
                    (Some(p), Some("length" | "size" | "len" | "count" | "Count")) if self.is_param(p) => {
                        Term::Length(p.to_string())
                    }
                    _ => Term::Other,
                }
            }
            [open, .., close]
                if matches!(
                    (&open.kind, &close.kind),
                    (TokKind::LBracket, TokKind::RBracket)
                        | (TokKind::LParen, TokKind::RParen)
                        | (TokKind::LBrace, TokKind::RBrace)
                ) =>
            {
                literal_list(&toks[1..toks.len() - 1]).map_or(Term::Other, Term::List)
            }
            _ => Term::Other,
        }
    }
}

fn atom(param: &str, test: GuardTest) -> Condition {
    Condition::Atom(GuardAtom::new(param, test))
}

fn compare(param: &str, op: CompareOp, value: f64) -> Condition {
    atom(param, GuardTest::Compare { op, value })
}

fn numeric(v: &LiteralValue) -> Option<f64> {
    match v {
        LiteralValue::Integer(i) => Some(*i as f64),
        LiteralValue::Float(f) => Some(*f),
        _ => None,
    }
}

fn equality_with_literal(param: &str, value: &LiteralValue) -> Option<Condition> {
    match value {
        LiteralValue::Null => Some(atom(param, GuardTest::IsNull)),
        LiteralValue::Integer(_) | LiteralValue::Float(_) => {
            numeric(value).map(|n| compare(param, CompareOp::Eq, n))
        }
        LiteralValue::Text(s) => Some(atom(param, GuardTest::EqualsText { value: s.clone() })),
        LiteralValue::Boolean(true) => Some(atom(param, GuardTest::Truthy)),
        LiteralValue::Boolean(false) => Some(atom(param, GuardTest::Truthy).negate()),
    }
}

/// `subject == other`, where `subject` mentions a parameter.
fn equality(subject: &Term, other: &Term, identity: bool) -> Option<Condition> {
    match (subject, other) {
        (Term::Param(p), Term::Literal(v)) => equality_with_literal(p, v),
        // `x is str` in C#, `x is MyType` after a null check.
        (Term::Param(p), Term::Name(t)) if identity => Some(atom(p, GuardTest::IsInstance {
            categories: categories_for_names(std::iter::once(t.as_str())),
        })),
        (Term::Length(p), Term::Literal(v)) if numeric(v) == Some(0.0) => Some(atom(p, GuardTest::IsEmpty)),
        (Term::TypeOf(p), Term::Literal(LiteralValue::Text(t))) => {
            if t == "undefined" {
                return Some(atom(p, GuardTest::IsNull));
            }
            let categories = js_typeof_categories(t);
            (!categories.is_empty()).then(|| atom(p, GuardTest::IsInstance { categories }))
        }
        (Term::TypeOf(p), Term::Name(t)) => Some(atom(p, GuardTest::IsInstance {
            categories: categories_for_names(std::iter::once(t.as_str())),
        })),
        _ => None,
    }
}

/// `len(p) <op> n` where it expresses emptiness.
fn length_bound(param: &str, op: CompareOp, n: f64) -> Option<Condition> {
    let empty = atom(param, GuardTest::IsEmpty);
    match (op, n) {
        (CompareOp::Lt, v) if v == 1.0 => Some(empty),
        (CompareOp::Le, v) if v == 0.0 => Some(empty),
        (CompareOp::Gt, v) if v == 0.0 => Some(empty.negate()),
        (CompareOp::Ge, v) if v == 1.0 => Some(empty.negate()),
        _ => None,
    }
}

fn strip_parens(toks: &[Tok]) -> Option<&[Tok]> {
    let (first, last) = (toks.first()?, toks.last()?);
    if toks.len() < 2 || !first.is(&TokKind::LParen) || !last.is(&TokKind::RParen) {
        return None;
    }
    // The opening paren must close at the very end, not earlier: `(a) + (b)`.
    let mut depth = 0i32;
    for (i, t) in toks.iter().enumerate() {
        match t.kind {
            TokKind::LParen => depth += 1,
            TokKind::RParen => {
                depth -= 1;
                if depth == 0 && i != toks.len() - 1 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(&toks[1..toks.len() - 1])
}

fn literal_list(toks: &[Tok]) -> Option<Vec<LiteralValue>> {
    let mut items = Vec::new();
    for chunk in toks.split(|t| t.is(&TokKind::Comma)) {
        match chunk {
            [] => continue,
            [t] => items.push(match &t.kind {
                TokKind::Str(s) => LiteralValue::Text(s.clone()),
                TokKind::Num(n) => parse_number(n)?,
                TokKind::Ident(w) => word_literal(w)?,
                _ => return None,
            }),
            _ => return None,
        }
    }
    (!items.is_empty()).then_some(items)
}

/// Type names used in `isinstance`, `instanceof` and `is` checks.
fn categories_for_names<'n>(names: impl Iterator<Item = &'n str>) -> Vec<TypeCategory> {
    let mut out: Vec<TypeCategory> = Vec::new();
    for name in names {
        let cats: &[TypeCategory] = match name {
            "numbers" | "typing" | "collections" | "abc" => &[],
            "int" | "Integral" => &[TypeCategory::Integer],
            "float" => &[TypeCategory::FloatingPoint],
            "Number" | "Real" | "Complex" | "number" => &[TypeCategory::Integer, TypeCategory::FloatingPoint],
            "str" => &[TypeCategory::Text],
            "bool" => &[TypeCategory::Boolean],
            _ => {
                let cat = classify_type(Language::Python, name).category;
                if !out.contains(&cat) {
                    out.push(cat);
                }
                continue;
            }
        };
        for c in cats {
            if !out.contains(c) {
                out.push(*c);
            }
        }
    }
    out
}

fn js_typeof_categories(name: &str) -> Vec<TypeCategory> {
    match name {
        "number" | "bigint" => vec![TypeCategory::Integer, TypeCategory::FloatingPoint],
        "string" => vec![TypeCategory::Text],
        "boolean" => vec![TypeCategory::Boolean],
        "object" => vec![TypeCategory::Collection, TypeCategory::ReferenceType],
        "function" => vec![TypeCategory::ReferenceType],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, params: &[&str]) -> Condition {
        parse_condition(text, params)
    }

    fn cmp(p: &str, op: CompareOp, v: f64) -> Condition {
        compare(p, op, v)
    }

    #[test]
    fn numeric_equality_in_every_syntax() {
        let expected = cmp("b", CompareOp::Eq, 0.0);
        assert_eq!(parse("b == 0", &["a", "b"]), expected);
        assert_eq!(parse("(b == 0)", &["a", "b"]), expected);
        assert_eq!(parse("b === 0", &["a", "b"]), expected);
        assert_eq!(parse("0 == b", &["a", "b"]), expected);
        assert_eq!(parse("b == 0.0", &["a", "b"]), expected);
    }

    #[test]
    fn ordering_is_mirrored_when_literal_first() {
        assert_eq!(parse("0 > x", &["x"]), cmp("x", CompareOp::Lt, 0.0));
        assert_eq!(parse("number <= 1", &["number"]), cmp("number", CompareOp::Le, 1.0));
        assert_eq!(parse("x < -5", &["x"]), cmp("x", CompareOp::Lt, -5.0));
    }

    #[test]
    fn null_checks() {
        let is_null = atom("s", GuardTest::IsNull);
        assert_eq!(parse("s == null", &["s"]), is_null);
        assert_eq!(parse("s is None", &["s"]), is_null);
        assert_eq!(parse("s == nil", &["s"]), is_null);
        assert_eq!(parse("nullptr == s", &["s"]), is_null);
        assert_eq!(parse("s is not None", &["s"]), is_null.negate());
        assert_eq!(parse("s.is_none()", &["s"]), is_null);
        assert_eq!(parse("s === undefined", &["s"]), is_null);
    }

    #[test]
    fn emptiness_checks() {
        let empty = atom("s", GuardTest::IsEmpty);
        assert_eq!(parse("len(s) == 0", &["s"]), empty);
        assert_eq!(parse("s.length == 0", &["s"]), empty);
        assert_eq!(parse("s.isEmpty()", &["s"]), empty);
        assert_eq!(parse("s.size() < 1", &["s"]), empty);
        assert_eq!(parse("s.Count > 0", &["s"]), empty.negate());
        assert_eq!(
            parse("string.IsNullOrEmpty(s)", &["s"]),
            Condition::any(vec![atom("s", GuardTest::IsNull), empty.clone()])
        );
    }

    #[test]
    fn python_type_guard() {
        let c = parse(
            "not isinstance(a, (int, float)) or not isinstance(b, (int, float))",
            &["a", "b"],
        );
        let ty = GuardTest::IsInstance {
            categories: vec![TypeCategory::Integer, TypeCategory::FloatingPoint],
        };
        assert_eq!(
            c,
            Condition::any(vec![atom("a", ty.clone()).negate(), atom("b", ty).negate()])
        );
    }

    #[test]
    fn typeof_guard() {
        let c = parse("typeof x !== 'number'", &["x"]);
        assert_eq!(
            c,
            atom("x", GuardTest::IsInstance {
                categories: vec![TypeCategory::Integer, TypeCategory::FloatingPoint]
            })
            .negate()
        );
    }

    #[test]
    fn text_membership() {
        let c = parse("op not in ('add', 'sub')", &["op"]);
        assert_eq!(
            c,
            Condition::all(vec![
                atom("op", GuardTest::EqualsText { value: "add".into() }).negate(),
                atom("op", GuardTest::EqualsText { value: "sub".into() }).negate(),
            ])
        );
    }

    #[test]
    fn logical_structure() {
        let c = parse("a < 0 || b < 0 && !flag", &["a", "b", "flag"]);
        assert_eq!(
            c,
            Condition::any(vec![
                cmp("a", CompareOp::Lt, 0.0),
                Condition::all(vec![cmp("b", CompareOp::Lt, 0.0), atom("flag", GuardTest::Truthy).negate()]),
            ])
        );
    }

    #[test]
    fn chained_comparison() {
        let c = parse("0 <= x < 10", &["x"]);
        assert_eq!(
            c,
            Condition::all(vec![cmp("x", CompareOp::Ge, 0.0), cmp("x", CompareOp::Lt, 10.0)])
        );
    }

    #[test]
    fn uninterpretable_text_is_opaque() {
        let c = parse("!isValid(x)", &["x"]);
        assert_eq!(c, Condition::opaque("isValid(x)").negate());
        assert!(parse("this.count > limit", &["x"]).is_opaque());
        assert!(parse("let Some(v) = cache.get(k)", &["k"]).has_opaque());
    }

    #[test]
    fn non_parameter_identifiers_are_not_atoms() {
        assert!(parse("total == 0", &["x"]).is_opaque());
    }
}
