//! Per-language syntax profiles.
//!
//! A profile maps one grammar's node kinds onto the small vocabulary the
//! shared extractor understands. Everything language-specific lives behind
//! this trait; the extractor and body scanner never match on node kinds.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::scanner::Language;
use mdtd_core::types::collections::SmallVec2;

/// What a syntax node means to the extractor.
pub(crate) enum NodeRole<'t> {
    /// A named callable definition. Call [`SyntaxProfile::function_header`].
    Function,
    /// An anonymous function. Never a unit; its body is not scanned.
    Lambda,
    /// A class, struct, interface, enum or trait declaration.
    TypeDecl,
    /// A scope that attaches methods to a type declared elsewhere (`impl T`).
    OwnerScope { name: String },
    If {
        condition: Node<'t>,
        consequence: Option<Node<'t>>,
        /// `else`/`elif` arms in source order.
        alternatives: SmallVec2<Node<'t>>,
    },
    Loop,
    Switch,
    CaseArm,
    Ternary,
    Catch,
    Raise { name: String },
    /// Fails when `condition` is false.
    Assert { condition: String, name: String },
    ErrorReturn { name: String },
    Return { value: Option<Node<'t>> },
    /// A call; `receiver` is the object of a method call (`items` in
    /// `items.push(x)`).
    Call { name: String, receiver: Option<Node<'t>> },
    Assign { target: Node<'t>, compound: bool },
    Member { object: Node<'t>, property: String },
    Index { object: Node<'t> },
    Other,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawParam {
    pub name: String,
    pub type_text: Option<String>,
    pub default_text: Option<String>,
    /// Annotation texts without the leading `@`, e.g. `Min(0)`.
    pub annotations: Vec<String>,
    pub variadic: bool,
}

impl RawParam {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReturnDecl {
    Declared(String),
    Void,
    /// No annotation; inferred from `return` statements.
    Unspecified,
}

pub(crate) struct FunctionHeader<'t> {
    pub name: String,
    pub kind: UnitKind,
    /// Owner named by the definition itself (Go receiver type, `Foo::bar`).
    pub owner: Option<String>,
    /// Receiver variable through which fields are reached, besides the
    /// profile's fixed prefixes (Go `c` in `func (c *Counter)`).
    pub receiver: Option<String>,
    pub params: Vec<RawParam>,
    pub returns: ReturnDecl,
    pub declared_errors: Vec<String>,
    pub body: Option<Node<'t>>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
}

impl<'t> FunctionHeader<'t> {
    pub fn new(name: impl Into<String>, body: Option<Node<'t>>) -> Self {
        Self {
            name: name.into(),
            kind: UnitKind::Function,
            owner: None,
            receiver: None,
            params: Vec::new(),
            returns: ReturnDecl::Unspecified,
            declared_errors: Vec::new(),
            body,
            visibility: Visibility::Public,
            is_static: false,
            is_async: false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RawField {
    pub name: String,
    pub type_text: Option<String>,
}

pub(crate) struct TypeHeader<'t> {
    pub name: String,
    pub kind: TypeKind,
    pub bases: Vec<String>,
    pub fields: Vec<RawField>,
    /// Where member definitions live.
    pub body: Option<Node<'t>>,
}

pub(crate) trait SyntaxProfile: Send + Sync {
    fn language(&self) -> Language;

    /// Grammar for `path`; only TypeScript distinguishes `.tsx`.
    fn grammar(&self, path: &str) -> tree_sitter::Language;

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t>;

    /// Header of a [`NodeRole::Function`] node. `owner` is the innermost
    /// enclosing type, if any. `None` skips the node.
    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>>;

    /// Header of a [`NodeRole::TypeDecl`] node. `None` skips the node.
    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>>;

    /// Receiver expressions that reach the owning instance (`self`, `this`).
    fn member_prefixes(&self) -> &'static [&'static str];

    /// True when a bare identifier inside a method can name a field.
    fn implicit_members(&self) -> bool {
        false
    }

    /// True when fields come into being by assignment (`self.x = ...`).
    fn fields_from_writes(&self) -> bool {
        false
    }
}

/// Node text, or empty on invalid UTF-8.
pub(crate) fn text<'a>(node: Node<'_>, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

pub(crate) fn field_text(node: Node<'_>, field: &str, src: &[u8]) -> Option<String> {
    node.child_by_field_name(field).map(|n| text(n, src).to_string())
}

pub(crate) fn line_of(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

pub(crate) fn children_by_field<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Role of a call whose callee expression is `function`.
pub(crate) fn call_role<'t, P: SyntaxProfile + ?Sized>(profile: &P, function: Option<Node<'t>>, src: &[u8]) -> NodeRole<'t> {
    let Some(function) = function else {
        return NodeRole::Other;
    };
    match profile.role(function, src) {
        NodeRole::Member { object, property } => NodeRole::Call {
            name: property,
            receiver: Some(object),
        },
        _ => NodeRole::Call {
            name: last_segment(text(function, src)).to_string(),
            receiver: None,
        },
    }
}

/// Whether an assignment node uses a compound operator (`+=`, `|=`).
pub(crate) fn is_compound_assignment(node: Node<'_>, src: &[u8]) -> bool {
    if let Some(op) = node.child_by_field_name("operator") {
        return text(op, src) != "=";
    }
    let mut cursor = node.walk();
    let compound = node
        .children(&mut cursor)
        .filter(|c| !c.is_named() || c.kind().ends_with("operator"))
        .any(|c| {
            let t = text(c, src);
            t.len() > 1 && t.ends_with('=') && !matches!(t, "==" | "!=" | "<=" | ">=")
        });
    compound
}

/// Whether any direct child (named or anonymous) has exactly this text.
pub(crate) fn has_child_text(node: Node<'_>, src: &[u8], wanted: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| text(c, src) == wanted);
    found
}

/// First direct child of one of the given kinds.
pub(crate) fn child_of_kind<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| kinds.contains(&c.kind()));
    found
}

/// Last path segment: `a.b.c` -> `c`, `std::invalid_argument` -> `invalid_argument`.
pub(crate) fn last_segment(path: &str) -> &str {
    let cut = [".", "::", "->"]
        .iter()
        .filter_map(|sep| path.rfind(sep).map(|i| i + sep.len()))
        .max()
        .unwrap_or(0);
    path[cut..].trim()
}

/// Name of the error a `throw`/`raise` expression produces:
/// `new IllegalArgumentException("x")` -> `IllegalArgumentException`,
/// `ValueError("x")` -> `ValueError`, `std::out_of_range(msg)` -> `std::out_of_range`.
pub(crate) fn exception_name(expr: &str, fallback: &str) -> String {
    let mut t = expr.trim();
    if let Some(rest) = t.strip_prefix("new ") {
        t = rest.trim_start();
    }
    let end = t.find(['(', '{', '<', '[']).unwrap_or(t.len());
    let name = t[..end].trim();
    let plausible = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | ':' | '$'));
    if plausible {
        name.to_string()
    } else {
        fallback.to_string()
    }
}

/// Base type name without generics, pointers or references.
pub(crate) fn base_type_name(raw: &str) -> String {
    let t = raw.trim().trim_start_matches('&').trim_start_matches("mut ").trim_start_matches('*');
    let end = t.find(['<', '[', '(']).unwrap_or(t.len());
    t[..end].trim().to_string()
}

/// `public`, `private`, `protected`, `internal` among modifier texts.
pub(crate) fn visibility_from_modifiers(modifiers: &str, default: Visibility) -> Visibility {
    let words: Vec<&str> = modifiers.split_whitespace().collect();
    if words.contains(&"public") {
        Visibility::Public
    } else if words.contains(&"protected") {
        Visibility::Protected
    } else if words.contains(&"private") {
        Visibility::Private
    } else if words.contains(&"internal") {
        Visibility::Internal
    } else {
        default
    }
}
