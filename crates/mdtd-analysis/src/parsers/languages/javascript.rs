//! JavaScript and TypeScript adapters.
//!
//! The TypeScript grammar extends the JavaScript one, so both adapters
//! share the profile below; TypeScript additionally reads type annotations,
//! accessibility modifiers, interfaces and enums.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    call_role, child_of_kind, exception_name, field_text, has_child_text, named_children, text,
    FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl, SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(JavaScriptAdapter, Language::JavaScript);
define_adapter!(TypeScriptAdapter, Language::TypeScript);

impl SyntaxProfile for JavaScriptAdapter {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        ecma_role(self, node, src)
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], _owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        ecma_function_header(node, src)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        ecma_type_header(node, src)
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["this"]
    }

    fn fields_from_writes(&self) -> bool {
        true
    }
}

impl SyntaxProfile for TypeScriptAdapter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn grammar(&self, path: &str) -> tree_sitter::Language {
        if path.ends_with(".tsx") {
            tree_sitter_typescript::LANGUAGE_TSX.into()
        } else {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        }
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        ecma_role(self, node, src)
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], _owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        ecma_function_header(node, src)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        ecma_type_header(node, src)
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["this"]
    }

    fn fields_from_writes(&self) -> bool {
        true
    }
}

const FUNCTION_VALUES: &[&str] = &["arrow_function", "function_expression", "function", "generator_function"];

fn ecma_role<'t, P: SyntaxProfile>(profile: &P, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => NodeRole::Function,
        "variable_declarator"
            if node
                .child_by_field_name("value")
                .is_some_and(|v| FUNCTION_VALUES.contains(&v.kind())) =>
        {
            NodeRole::Function
        }
        k if FUNCTION_VALUES.contains(&k) => NodeRole::Lambda,
        "class_declaration" | "class" | "abstract_class_declaration" | "interface_declaration"
        | "enum_declaration" => NodeRole::TypeDecl,
        "if_statement" => match node.child_by_field_name("condition") {
            Some(condition) => NodeRole::If {
                condition,
                consequence: node.child_by_field_name("consequence"),
                alternatives: node.child_by_field_name("alternative").into_iter().collect(),
            },
            None => NodeRole::Other,
        },
        "for_statement" | "for_in_statement" | "while_statement" | "do_statement" => NodeRole::Loop,
        "switch_statement" => NodeRole::Switch,
        "switch_case" | "switch_default" => NodeRole::CaseArm,
        "ternary_expression" => NodeRole::Ternary,
        "catch_clause" => NodeRole::Catch,
        "throw_statement" => {
            let thrown = named_children(node).into_iter().next().map(|n| text(n, src)).unwrap_or("");
            NodeRole::Raise {
                name: exception_name(thrown, "Error"),
            }
        }
        "return_statement" => NodeRole::Return {
            value: named_children(node).into_iter().next(),
        },
        "call_expression" => call_role(profile, node.child_by_field_name("function"), src),
        "member_expression" => match (node.child_by_field_name("object"), node.child_by_field_name("property")) {
            (Some(object), Some(prop)) => NodeRole::Member {
                object,
                property: text(prop, src).to_string(),
            },
            _ => NodeRole::Other,
        },
        "subscript_expression" => match node.child_by_field_name("object") {
            Some(object) => NodeRole::Index { object },
            None => NodeRole::Other,
        },
        "assignment_expression" => match node.child_by_field_name("left") {
            Some(target) => NodeRole::Assign { target, compound: false },
            None => NodeRole::Other,
        },
        "augmented_assignment_expression" => match node.child_by_field_name("left") {
            Some(target) => NodeRole::Assign { target, compound: true },
            None => NodeRole::Other,
        },
        "update_expression" => match node.child_by_field_name("argument") {
            Some(target) => NodeRole::Assign { target, compound: true },
            None => NodeRole::Other,
        },
        _ => NodeRole::Other,
    }
}

fn ecma_function_header<'t>(node: Node<'t>, src: &[u8]) -> Option<FunctionHeader<'t>> {
    // `const f = (a) => ...` names the function through its declarator.
    let (name, func) = if node.kind() == "variable_declarator" {
        (field_text(node, "name", src)?, node.child_by_field_name("value")?)
    } else {
        (field_text(node, "name", src)?, node)
    };

    let mut header = FunctionHeader::new(name.clone(), func.child_by_field_name("body"));
    header.is_async = has_child_text(func, src, "async");
    header.is_static = has_child_text(func, src, "static");

    if let Some(params) = func.child_by_field_name("parameters") {
        header.params = named_children(params).into_iter().filter_map(|p| parameter(p, src)).collect();
    } else if let Some(single) = func.child_by_field_name("parameter") {
        header.params = vec![RawParam::named(text(single, src))];
    }

    header.returns = match field_text(func, "return_type", src) {
        Some(t) => ReturnDecl::Declared(strip_annotation(&t)),
        None => ReturnDecl::Unspecified,
    };
    if func.kind() == "method_definition" && name == "constructor" {
        header.kind = UnitKind::Constructor;
        header.returns = ReturnDecl::Void;
    }

    header.visibility = match child_of_kind(func, &["accessibility_modifier"]).map(|m| text(m, src)) {
        Some("private") => Visibility::Private,
        Some("protected") => Visibility::Protected,
        _ if name.starts_with('#') => Visibility::Private,
        _ => Visibility::Public,
    };
    Some(header)
}

fn parameter(node: Node<'_>, src: &[u8]) -> Option<RawParam> {
    match node.kind() {
        "identifier" | "object_pattern" | "array_pattern" => Some(RawParam::named(text(node, src))),
        "assignment_pattern" => {
            let mut p = RawParam::named(field_text(node, "left", src)?);
            p.default_text = field_text(node, "right", src);
            Some(p)
        }
        "rest_pattern" => {
            let mut p = RawParam::named(text(node, src).trim_start_matches("...").trim());
            p.variadic = true;
            Some(p)
        }
        "required_parameter" | "optional_parameter" => {
            let pattern = node.child_by_field_name("pattern")?;
            let mut p = match pattern.kind() {
                "rest_pattern" => {
                    let mut r = RawParam::named(text(pattern, src).trim_start_matches("...").trim());
                    r.variadic = true;
                    r
                }
                _ => RawParam::named(text(pattern, src)),
            };
            p.type_text = field_text(node, "type", src).map(|t| {
                let t = strip_annotation(&t);
                if node.kind() == "optional_parameter" {
                    format!("{t}?")
                } else {
                    t
                }
            });
            p.default_text = field_text(node, "value", src);
            Some(p)
        }
        _ => None,
    }
}

/// `: number` -> `number`.
fn strip_annotation(t: &str) -> String {
    t.trim().trim_start_matches(':').trim().to_string()
}

fn ecma_type_header<'t>(node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
    let name = field_text(node, "name", src)?;
    let kind = match node.kind() {
        "interface_declaration" => TypeKind::Interface,
        "enum_declaration" => TypeKind::Enum,
        _ => TypeKind::Class,
    };
    let mut bases = Vec::new();
    if let Some(heritage) = child_of_kind(node, &["class_heritage", "extends_type_clause"]) {
        collect_names(heritage, src, &mut bases);
    }
    let body = node.child_by_field_name("body");
    let mut fields = Vec::new();
    if let Some(body) = body {
        for member in named_children(body) {
            let name = match member.kind() {
                "field_definition" => field_text(member, "property", src),
                "public_field_definition" | "property_signature" => field_text(member, "name", src),
                _ => None,
            };
            if let Some(name) = name {
                fields.push(RawField {
                    name,
                    type_text: field_text(member, "type", src).map(|t| strip_annotation(&t)),
                });
            }
        }
    }
    Some(TypeHeader {
        name,
        kind,
        bases,
        fields,
        body,
    })
}

fn collect_names(node: Node<'_>, src: &[u8], out: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "type_identifier" | "member_expression" | "nested_type_identifier" => {
            out.push(text(node, src).to_string());
        }
        "type_arguments" | "arguments" => {}
        _ => {
            for child in named_children(node) {
                collect_names(child, src, out);
            }
        }
    }
}
