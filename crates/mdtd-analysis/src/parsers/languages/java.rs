//! Java adapter.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    child_of_kind, exception_name, field_text, is_compound_assignment, named_children, text,
    visibility_from_modifiers, FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl,
    SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(JavaAdapter, Language::Java);

impl SyntaxProfile for JavaAdapter {
    fn language(&self) -> Language {
        Language::Java
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_java::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                NodeRole::Function
            }
            "lambda_expression" => NodeRole::Lambda,
            "object_creation_expression" if child_of_kind(node, &["class_body"]).is_some() => NodeRole::Lambda,
            "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
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
            "for_statement" | "enhanced_for_statement" | "while_statement" | "do_statement" => NodeRole::Loop,
            "switch_expression" | "switch_statement" => NodeRole::Switch,
            "switch_block_statement_group" | "switch_rule" => NodeRole::CaseArm,
            "ternary_expression" => NodeRole::Ternary,
            "catch_clause" => NodeRole::Catch,
            "throw_statement" => {
                let thrown = named_children(node).into_iter().next().map(|n| text(n, src)).unwrap_or("");
                NodeRole::Raise {
                    name: exception_name(thrown, "Exception"),
                }
            }
            "assert_statement" => match named_children(node).first() {
                Some(cond) => NodeRole::Assert {
                    condition: text(*cond, src).to_string(),
                    name: "AssertionError".to_string(),
                },
                None => NodeRole::Other,
            },
            "return_statement" => NodeRole::Return {
                value: named_children(node).into_iter().next(),
            },
            "method_invocation" => NodeRole::Call {
                name: field_text(node, "name", src).unwrap_or_default(),
                receiver: node.child_by_field_name("object"),
            },
            "field_access" => match (node.child_by_field_name("object"), node.child_by_field_name("field")) {
                (Some(object), Some(field)) => NodeRole::Member {
                    object,
                    property: text(field, src).to_string(),
                },
                _ => NodeRole::Other,
            },
            "array_access" => match node.child_by_field_name("array") {
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
            "update_expression" => match named_children(node).into_iter().next() {
                Some(target) => NodeRole::Assign { target, compound: true },
                None => NodeRole::Other,
            },
            _ => NodeRole::Other,
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], _owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let mut header = FunctionHeader::new(name, node.child_by_field_name("body"));
        let modifiers = child_of_kind(node, &["modifiers"]).map(|m| text(m, src)).unwrap_or("");

        let in_interface = node
            .parent()
            .is_some_and(|p| p.kind() == "interface_body");
        let default_visibility = if in_interface {
            Visibility::Public
        } else {
            Visibility::Internal
        };
        header.visibility = visibility_from_modifiers(modifiers, default_visibility);
        header.is_static = modifiers.split_whitespace().any(|w| w == "static");

        if let Some(params) = node.child_by_field_name("parameters") {
            header.params = named_children(params)
                .into_iter()
                .filter_map(|p| parameter(p, src))
                .collect();
        }
        if node.kind() == "compact_constructor_declaration" {
            header.params = record_components(node, src);
        }

        header.returns = match node.kind() {
            "method_declaration" => field_text(node, "type", src).map_or(ReturnDecl::Unspecified, ReturnDecl::Declared),
            _ => {
                header.kind = UnitKind::Constructor;
                ReturnDecl::Void
            }
        };
        if let Some(throws) = child_of_kind(node, &["throws"]) {
            header.declared_errors = named_children(throws).into_iter().map(|t| text(t, src).to_string()).collect();
        }
        Some(header)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let kind = match node.kind() {
            "interface_declaration" => TypeKind::Interface,
            "enum_declaration" => TypeKind::Enum,
            "record_declaration" => TypeKind::Record,
            _ => TypeKind::Class,
        };
        let mut bases = Vec::new();
        for clause in ["superclass", "interfaces"] {
            if let Some(c) = node.child_by_field_name(clause) {
                collect_type_names(c, src, &mut bases);
            }
        }
        if let Some(ext) = child_of_kind(node, &["extends_interfaces"]) {
            collect_type_names(ext, src, &mut bases);
        }

        let body = node.child_by_field_name("body");
        let mut fields = Vec::new();
        if kind == TypeKind::Record {
            fields.extend(record_components(node, src).into_iter().map(|p| RawField {
                name: p.name,
                type_text: p.type_text,
            }));
        }
        if let Some(body) = body {
            let mut members = named_children(body);
            // Enum constants are followed by a nested declarations block.
            if let Some(decls) = child_of_kind(body, &["enum_body_declarations"]) {
                members.extend(named_children(decls));
            }
            for member in members {
                if member.kind() != "field_declaration" {
                    continue;
                }
                let ty = field_text(member, "type", src);
                let mut cursor = member.walk();
                for decl in member.children_by_field_name("declarator", &mut cursor) {
                    if let Some(n) = field_text(decl, "name", src) {
                        fields.push(RawField { name: n, type_text: ty.clone() });
                    }
                }
            }
        }
        let body = body.map(|b| child_of_kind(b, &["enum_body_declarations"]).unwrap_or(b));
        Some(TypeHeader {
            name,
            kind,
            bases,
            fields,
            body,
        })
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["this"]
    }

    fn implicit_members(&self) -> bool {
        true
    }
}

fn parameter(node: Node<'_>, src: &[u8]) -> Option<RawParam> {
    match node.kind() {
        "formal_parameter" => {
            let mut p = RawParam::named(field_text(node, "name", src)?);
            p.type_text = field_text(node, "type", src);
            p.annotations = annotations(node, src);
            Some(p)
        }
        "spread_parameter" => {
            let decl = child_of_kind(node, &["variable_declarator"])?;
            let mut p = RawParam::named(field_text(decl, "name", src)?);
            p.type_text = named_children(node)
                .into_iter()
                .find(|c| c.kind().ends_with("type") || c.kind() == "type_identifier")
                .map(|t| format!("{}...", text(t, src)));
            p.variadic = true;
            Some(p)
        }
        _ => None,
    }
}

fn annotations(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let Some(mods) = child_of_kind(node, &["modifiers"]) else {
        return Vec::new();
    };
    named_children(mods)
        .into_iter()
        .filter(|m| matches!(m.kind(), "marker_annotation" | "annotation"))
        .map(|m| text(m, src).trim_start_matches('@').to_string())
        .collect()
}

/// Components of a record: `record Point(int x, int y)`.
fn record_components(node: Node<'_>, src: &[u8]) -> Vec<RawParam> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.kind() == "record_declaration" {
            return n
                .child_by_field_name("parameters")
                .map(|p| named_children(p).into_iter().filter_map(|c| parameter(c, src)).collect())
                .unwrap_or_default();
        }
        current = n.parent();
    }
    Vec::new()
}

fn collect_type_names(node: Node<'_>, src: &[u8], out: &mut Vec<String>) {
    if matches!(node.kind(), "type_identifier" | "generic_type" | "scoped_type_identifier") {
        out.push(text(node, src).to_string());
        return;
    }
    for child in named_children(node) {
        collect_type_names(child, src, out);
    }
}
