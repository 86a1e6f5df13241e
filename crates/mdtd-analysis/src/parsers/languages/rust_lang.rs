//! Rust adapter.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    base_type_name, call_role, child_of_kind, exception_name, field_text, named_children, text,
    FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl, SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(RustAdapter, Language::Rust);

const PANICS: &[&str] = &["panic", "unreachable", "todo", "unimplemented"];

impl SyntaxProfile for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_rust::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "function_item" => NodeRole::Function,
            "closure_expression" => NodeRole::Lambda,
            "struct_item" | "enum_item" | "trait_item" => NodeRole::TypeDecl,
            "impl_item" => match field_text(node, "type", src) {
                Some(ty) => NodeRole::OwnerScope {
                    name: base_type_name(&ty),
                },
                None => NodeRole::Other,
            },
            "if_expression" => match node.child_by_field_name("condition") {
                Some(condition) => NodeRole::If {
                    condition,
                    consequence: node.child_by_field_name("consequence"),
                    alternatives: node.child_by_field_name("alternative").into_iter().collect(),
                },
                None => NodeRole::Other,
            },
            "for_expression" | "while_expression" | "loop_expression" => NodeRole::Loop,
            "match_expression" => NodeRole::Switch,
            "match_arm" => NodeRole::CaseArm,
            "return_expression" => NodeRole::Return {
                value: named_children(node).into_iter().next(),
            },
            "call_expression" => {
                let function = node.child_by_field_name("function");
                if function.map(|f| text(f, src)) == Some("Err") {
                    let arg = node
                        .child_by_field_name("arguments")
                        .and_then(|a| named_children(a).into_iter().next())
                        .map(|a| text(a, src))
                        .unwrap_or("");
                    return NodeRole::ErrorReturn {
                        name: exception_name(arg, "Err"),
                    };
                }
                call_role(self, function, src)
            }
            "macro_invocation" => macro_role(node, src),
            "field_expression" => match (node.child_by_field_name("value"), node.child_by_field_name("field")) {
                (Some(object), Some(field)) => NodeRole::Member {
                    object,
                    property: text(field, src).to_string(),
                },
                _ => NodeRole::Other,
            },
            "index_expression" => match named_children(node).into_iter().next() {
                Some(object) => NodeRole::Index { object },
                None => NodeRole::Other,
            },
            "assignment_expression" | "compound_assignment_expr" => match node.child_by_field_name("left") {
                Some(target) => NodeRole::Assign {
                    target,
                    compound: node.kind() == "compound_assignment_expr",
                },
                None => NodeRole::Other,
            },
            _ => NodeRole::Other,
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let mut header = FunctionHeader::new(name.clone(), node.child_by_field_name("body"));
        header.visibility = match child_of_kind(node, &["visibility_modifier"]).map(|v| text(v, src)) {
            Some("pub") => Visibility::Public,
            Some(_) => Visibility::Internal,
            None if owner.is_some_and(|_| in_trait(node)) => Visibility::Public,
            None => Visibility::Private,
        };
        header.is_async = child_of_kind(node, &["function_modifiers"]).is_some_and(|m| text(m, src).contains("async"));

        let mut has_self = false;
        if let Some(params) = node.child_by_field_name("parameters") {
            for p in named_children(params) {
                match p.kind() {
                    "self_parameter" => has_self = true,
                    "parameter" => {
                        let Some(pattern) = field_text(p, "pattern", src) else {
                            continue;
                        };
                        let mut raw = RawParam::named(pattern.trim_start_matches("mut ").trim());
                        raw.type_text = field_text(p, "type", src);
                        header.params.push(raw);
                    }
                    _ => {}
                }
            }
        }
        header.is_static = owner.is_some() && !has_self;
        if owner.is_some() && !has_self && name == "new" {
            header.kind = UnitKind::Constructor;
        }

        header.returns = match field_text(node, "return_type", src) {
            None => ReturnDecl::Void,
            Some(ty) => {
                let ok = result_ok_type(&ty).unwrap_or(&ty);
                if ok.trim() == "()" {
                    ReturnDecl::Void
                } else if ok.trim() == "Self" {
                    ReturnDecl::Declared(owner.unwrap_or("Self").to_string())
                } else {
                    ReturnDecl::Declared(ok.trim().to_string())
                }
            }
        };
        Some(header)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let (kind, body) = match node.kind() {
            "enum_item" => (TypeKind::Enum, None),
            "trait_item" => (TypeKind::Trait, node.child_by_field_name("body")),
            _ => (TypeKind::Struct, None),
        };
        let mut fields = Vec::new();
        if kind == TypeKind::Struct {
            if let Some(list) = node.child_by_field_name("body") {
                for (i, decl) in named_children(list).into_iter().enumerate() {
                    match decl.kind() {
                        "field_declaration" => {
                            if let Some(field) = field_text(decl, "name", src) {
                                fields.push(RawField {
                                    name: field,
                                    type_text: field_text(decl, "type", src),
                                });
                            }
                        }
                        // Tuple struct: `self.0`.
                        "visibility_modifier" | "attribute_item" => {}
                        _ if list.kind() == "ordered_field_declaration_list" => fields.push(RawField {
                            name: i.to_string(),
                            type_text: Some(text(decl, src).to_string()),
                        }),
                        _ => {}
                    }
                }
            }
        }
        let bases = match (kind, node.child_by_field_name("bounds")) {
            (TypeKind::Trait, Some(bounds)) => named_children(bounds).into_iter().map(|b| text(b, src).to_string()).collect(),
            _ => Vec::new(),
        };
        Some(TypeHeader {
            name,
            kind,
            bases,
            fields,
            body,
        })
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["self"]
    }
}

fn in_trait(node: Node<'_>) -> bool {
    node.parent()
        .and_then(|p| p.parent())
        .is_some_and(|p| p.kind() == "trait_item")
}

fn macro_role<'t>(node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
    let name = field_text(node, "macro", src).unwrap_or_default();
    let name = name.rsplit("::").next().unwrap_or(&name).to_string();
    if PANICS.contains(&name.as_str()) {
        return NodeRole::Raise { name: "panic".to_string() };
    }
    let args = child_of_kind(node, &["token_tree"])
        .map(|t| split_args(text(t, src)))
        .unwrap_or_default();
    let condition = match (name.trim_start_matches("debug_"), args.as_slice()) {
        ("assert", [cond, ..]) => cond.to_string(),
        ("assert_eq", [a, b, ..]) => format!("{a} == {b}"),
        ("assert_ne", [a, b, ..]) => format!("{a} != {b}"),
        _ => return NodeRole::Other,
    };
    NodeRole::Assert {
        condition,
        name: "panic".to_string(),
    }
}

/// Top-level comma-separated arguments of a `(...)` token tree.
fn split_args(tree: &str) -> Vec<&str> {
    let inner = tree
        .trim()
        .strip_prefix(['(', '[', '{'])
        .and_then(|t| t.strip_suffix([')', ']', '}']))
        .unwrap_or(tree);
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut start = 0;
    let mut prev = '\0';
    for (i, c) in inner.char_indices() {
        match c {
            '"' if prev != '\\' => in_str = !in_str,
            '(' | '[' | '{' if !in_str => depth += 1,
            ')' | ']' | '}' if !in_str => depth -= 1,
            ',' if !in_str && depth == 0 => {
                out.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        prev = c;
    }
    let last = inner[start..].trim();
    if !last.is_empty() {
        out.push(last);
    }
    out
}

/// `T` out of `Result<T, E>` or `io::Result<T>`.
fn result_ok_type(ty: &str) -> Option<&str> {
    let t = ty.trim();
    let start = t.find("Result<")?;
    if !t[..start].trim_end_matches("::").chars().all(|c| c.is_alphanumeric() || c == ':' || c == '_') {
        return None;
    }
    let inner = t[start + "Result<".len()..].strip_suffix('>')?;
    let mut depth = 0i32;
    for (i, c) in inner.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => return Some(&inner[..i]),
            _ => {}
        }
    }
    Some(inner)
}
