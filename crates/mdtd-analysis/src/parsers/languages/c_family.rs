//! C and C++ adapters.
//!
//! Both grammars share declarator nesting: the function name sits at the
//! bottom of a chain of pointer, reference and function declarators, and
//! the return type is split between the `type` field and that chain.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    base_type_name, call_role, child_of_kind, children_by_field, exception_name, field_text,
    is_compound_assignment, named_children, text, visibility_from_modifiers, FunctionHeader,
    NodeRole, RawField, RawParam, ReturnDecl, SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(CAdapter, Language::C);
define_adapter!(CppAdapter, Language::Cpp);

const NAME_KINDS: &[&str] = &[
    "identifier",
    "field_identifier",
    "qualified_identifier",
    "destructor_name",
    "operator_name",
    "type_identifier",
];

/// Returned sentinels that mean failure in C.
const C_ERROR_SENTINELS: &[&str] = &["-1", "NULL", "EOF"];

impl SyntaxProfile for CAdapter {
    fn language(&self) -> Language {
        Language::C
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_c::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        if node.parent().is_some_and(|p| p.kind() == "return_statement") && is_error_sentinel(node, src) {
            return NodeRole::ErrorReturn {
                name: text(node, src).trim().to_string(),
            };
        }
        c_role(self, node, src)
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        c_function_header(node, src, owner)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        c_type_header(node, src)
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &[]
    }
}

impl SyntaxProfile for CppAdapter {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_cpp::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "lambda_expression" => NodeRole::Lambda,
            "for_range_loop" => NodeRole::Loop,
            "catch_clause" => NodeRole::Catch,
            "throw_statement" | "throw_expression" => {
                let thrown = named_children(node).into_iter().next().map(|n| text(n, src)).unwrap_or("");
                NodeRole::Raise {
                    name: exception_name(thrown, "exception"),
                }
            }
            _ => c_role(self, node, src),
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        c_function_header(node, src, owner)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        c_type_header(node, src)
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["this", "(*this)"]
    }

    fn implicit_members(&self) -> bool {
        true
    }
}

/// `NULL` and `EOF` always signal failure. `-1` does only beside other
/// returns that read as success codes; a function that also returns `1`
/// (a sign or comparison result) uses it as an ordinary value.
fn is_error_sentinel(node: Node<'_>, src: &[u8]) -> bool {
    let value = text(node, src).trim();
    if !C_ERROR_SENTINELS.contains(&value) {
        return false;
    }
    if value != "-1" {
        return true;
    }
    let mut function = node.parent();
    while let Some(f) = function {
        if f.kind() == "function_definition" {
            break;
        }
        function = f.parent();
    }
    let Some(body) = function.and_then(|f| f.child_by_field_name("body")) else {
        return true;
    };
    let mut others = Vec::new();
    returned_values(body, src, &mut others);
    others.retain(|v| *v != "-1");
    !others.is_empty() && others.iter().all(|v| *v != "1" && !v.starts_with('-'))
}

fn returned_values<'s>(node: Node<'_>, src: &'s [u8], out: &mut Vec<&'s str>) {
    if node.kind() == "return_statement" {
        if let Some(value) = named_children(node).into_iter().next() {
            out.push(text(value, src).trim());
        }
        return;
    }
    for child in named_children(node) {
        returned_values(child, src, out);
    }
}

fn c_role<'t, P: SyntaxProfile + ?Sized>(profile: &P, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
    match node.kind() {
        "function_definition" => NodeRole::Function,
        "struct_specifier" | "class_specifier" | "union_specifier" | "enum_specifier"
            if node.child_by_field_name("body").is_some() =>
        {
            NodeRole::TypeDecl
        }
        "if_statement" => match node.child_by_field_name("condition") {
            Some(condition) => NodeRole::If {
                condition,
                consequence: node.child_by_field_name("consequence"),
                alternatives: node.child_by_field_name("alternative").into_iter().collect(),
            },
            None => NodeRole::Other,
        },
        "for_statement" | "while_statement" | "do_statement" => NodeRole::Loop,
        "switch_statement" => NodeRole::Switch,
        "case_statement" => NodeRole::CaseArm,
        "conditional_expression" => NodeRole::Ternary,
        "return_statement" => NodeRole::Return {
            value: named_children(node).into_iter().next(),
        },
        "call_expression" => {
            let function = node.child_by_field_name("function");
            let callee = function.map(|f| text(f, src)).unwrap_or("");
            let bare = callee.trim_start_matches("std::");
            match bare {
                "abort" | "exit" | "_Exit" | "quick_exit" | "terminate" => NodeRole::Raise {
                    name: bare.to_string(),
                },
                "assert" => match node
                    .child_by_field_name("arguments")
                    .and_then(|a| named_children(a).into_iter().next())
                {
                    Some(cond) => NodeRole::Assert {
                        condition: text(cond, src).to_string(),
                        name: "assert".to_string(),
                    },
                    None => NodeRole::Other,
                },
                _ => call_role(profile, function, src),
            }
        }
        "field_expression" => match (node.child_by_field_name("argument"), node.child_by_field_name("field")) {
            (Some(object), Some(field)) => NodeRole::Member {
                object,
                property: text(field, src).to_string(),
            },
            _ => NodeRole::Other,
        },
        "subscript_expression" => match node.child_by_field_name("argument") {
            Some(object) => NodeRole::Index { object },
            None => NodeRole::Other,
        },
        "assignment_expression" => match node.child_by_field_name("left") {
            Some(target) => NodeRole::Assign {
                target,
                compound: is_compound_assignment(node, src),
            },
            None => NodeRole::Other,
        },
        "update_expression" => match node.child_by_field_name("argument") {
            Some(target) => NodeRole::Assign { target, compound: true },
            None => NodeRole::Other,
        },
        _ => NodeRole::Other,
    }
}

fn c_function_header<'t>(node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>> {
    let top = node.child_by_field_name("declarator")?;
    let (function, pointer_depth) = function_declarator(top)?;
    let name_node = innermost_name(function.child_by_field_name("declarator")?)?;
    if matches!(name_node.kind(), "destructor_name" | "operator_name") {
        return None;
    }
    let full = text(name_node, src);
    let (scope, name) = match full.rfind("::") {
        Some(i) => (Some(base_type_name(full[..i].rsplit("::").next().unwrap_or(""))), full[i + 2..].to_string()),
        None => (None, full.to_string()),
    };
    let effective_owner = scope.clone().or_else(|| owner.map(str::to_string));

    let mut header = FunctionHeader::new(name.clone(), node.child_by_field_name("body"));
    header.owner = scope;
    let storage: Vec<&str> = named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "storage_class_specifier")
        .map(|c| text(c, src))
        .collect();
    let is_static = storage.contains(&"static");
    header.is_static = is_static && effective_owner.is_some();
    header.visibility = match owner {
        Some(_) => member_visibility(node, src),
        None if is_static && effective_owner.is_none() => Visibility::Internal,
        None => Visibility::Public,
    };

    if let Some(params) = function.child_by_field_name("parameters") {
        header.params = named_children(params).into_iter().filter_map(|p| parameter(p, src)).collect();
    }

    let declared = field_text(node, "type", src);
    header.returns = match declared {
        None if effective_owner.as_deref() == Some(name.as_str()) => {
            header.kind = UnitKind::Constructor;
            ReturnDecl::Void
        }
        None => ReturnDecl::Unspecified,
        Some(ty) if pointer_depth > 0 => ReturnDecl::Declared(format!("{ty}{}", "*".repeat(pointer_depth))),
        Some(ty) => ReturnDecl::Declared(ty),
    };
    Some(header)
}

/// The function declarator under `top` and how many pointer levels wrap it.
fn function_declarator(top: Node<'_>) -> Option<(Node<'_>, usize)> {
    let mut node = top;
    let mut pointers = 0;
    loop {
        match node.kind() {
            "function_declarator" => return Some((node, pointers)),
            "pointer_declarator" => pointers += 1,
            "reference_declarator" | "parenthesized_declarator" | "attributed_declarator" => {}
            _ => return None,
        }
        node = node
            .child_by_field_name("declarator")
            .or_else(|| named_children(node).into_iter().last())?;
    }
}

fn innermost_name(declarator: Node<'_>) -> Option<Node<'_>> {
    let mut node = declarator;
    loop {
        if NAME_KINDS.contains(&node.kind()) {
            return Some(node);
        }
        node = node
            .child_by_field_name("declarator")
            .or_else(|| named_children(node).into_iter().find(|c| c.kind() != "type_qualifier"))?;
    }
}

/// Visibility from the closest preceding `public:`/`private:` label.
fn member_visibility(node: Node<'_>, src: &[u8]) -> Visibility {
    let class_default = match node.parent().and_then(|body| body.parent()).map(|c| c.kind()) {
        Some("class_specifier") => Visibility::Private,
        _ => Visibility::Public,
    };
    let mut prev = node.prev_named_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() == "access_specifier" {
            return visibility_from_modifiers(text(sibling, src).trim_end_matches(':'), class_default);
        }
        prev = sibling.prev_named_sibling();
    }
    class_default
}

fn parameter(node: Node<'_>, src: &[u8]) -> Option<RawParam> {
    match node.kind() {
        "parameter_declaration" | "optional_parameter_declaration" => {
            let base = field_text(node, "type", src)?;
            let qualifiers: Vec<&str> = named_children(node)
                .into_iter()
                .filter(|c| c.kind() == "type_qualifier")
                .map(|c| text(c, src))
                .collect();
            let declarator = node.child_by_field_name("declarator")?;
            let mut suffix = String::new();
            let mut cursor = declarator;
            let name = loop {
                match cursor.kind() {
                    "pointer_declarator" => suffix.push('*'),
                    "reference_declarator" => suffix.push('&'),
                    "array_declarator" => suffix.push_str("[]"),
                    kind if NAME_KINDS.contains(&kind) => break text(cursor, src).to_string(),
                    _ => {}
                }
                cursor = cursor
                    .child_by_field_name("declarator")
                    .or_else(|| named_children(cursor).into_iter().find(|c| c.kind() != "type_qualifier"))?;
            };
            let mut p = RawParam::named(name);
            let prefix = if qualifiers.contains(&"const") { "const " } else { "" };
            p.type_text = Some(format!("{prefix}{base}{suffix}"));
            p.default_text = field_text(node, "default_value", src);
            Some(p)
        }
        _ => None,
    }
}

fn c_type_header<'t>(node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
    // `typedef struct { ... } Point;` names the struct through the typedef.
    let name = field_text(node, "name", src).or_else(|| {
        node.parent()
            .filter(|p| p.kind() == "type_definition")
            .and_then(|p| field_text(p, "declarator", src))
    })?;
    let kind = match node.kind() {
        "class_specifier" => TypeKind::Class,
        "enum_specifier" => TypeKind::Enum,
        _ => TypeKind::Struct,
    };
    let body = node.child_by_field_name("body")?;
    let bases = child_of_kind(node, &["base_class_clause"])
        .map(|clause| {
            named_children(clause)
                .into_iter()
                .filter(|c| c.kind() != "access_specifier")
                .map(|c| base_type_name(text(c, src)))
                .collect()
        })
        .unwrap_or_default();

    let mut fields = Vec::new();
    if kind != TypeKind::Enum {
        for decl in named_children(body).into_iter().filter(|c| c.kind() == "field_declaration") {
            let base = field_text(decl, "type", src);
            for declarator in children_by_field(decl, "declarator") {
                if function_declarator(declarator).is_some() {
                    continue;
                }
                let pointer = declarator.kind() == "pointer_declarator";
                let Some(name) = innermost_name(declarator) else {
                    continue;
                };
                fields.push(RawField {
                    name: text(name, src).to_string(),
                    type_text: base.clone().map(|b| if pointer { format!("{b}*") } else { b }),
                });
            }
        }
    }
    Some(TypeHeader {
        name,
        kind,
        bases,
        fields,
        body: Some(body),
    })
}
