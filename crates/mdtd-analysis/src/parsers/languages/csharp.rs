//! C# adapter.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    call_role, child_of_kind, exception_name, field_text, is_compound_assignment, named_children,
    text, visibility_from_modifiers, FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl,
    SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(CSharpAdapter, Language::CSharp);

impl SyntaxProfile for CSharpAdapter {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "method_declaration" | "constructor_declaration" => NodeRole::Function,
            "lambda_expression" | "anonymous_method_expression" | "local_function_statement" => NodeRole::Lambda,
            "class_declaration" | "struct_declaration" | "interface_declaration" | "record_declaration"
            | "record_struct_declaration" | "enum_declaration" => NodeRole::TypeDecl,
            "if_statement" => match node.child_by_field_name("condition") {
                Some(condition) => NodeRole::If {
                    condition,
                    consequence: node.child_by_field_name("consequence"),
                    alternatives: node.child_by_field_name("alternative").into_iter().collect(),
                },
                None => NodeRole::Other,
            },
            "for_statement" | "foreach_statement" | "while_statement" | "do_statement" => NodeRole::Loop,
            "switch_statement" | "switch_expression" => NodeRole::Switch,
            "switch_section" | "switch_expression_arm" => NodeRole::CaseArm,
            "conditional_expression" => NodeRole::Ternary,
            "catch_clause" => NodeRole::Catch,
            "throw_statement" | "throw_expression" => {
                let thrown = named_children(node).into_iter().next().map(|n| text(n, src)).unwrap_or("");
                NodeRole::Raise {
                    name: exception_name(thrown, "Exception"),
                }
            }
            "return_statement" => NodeRole::Return {
                value: named_children(node).into_iter().next(),
            },
            "invocation_expression" => {
                let function = node.child_by_field_name("function");
                let callee = function.map(|f| text(f, src)).unwrap_or("");
                if matches!(callee, "Debug.Assert" | "Trace.Assert") {
                    if let Some(cond) = first_argument(node) {
                        return NodeRole::Assert {
                            condition: text(cond, src).to_string(),
                            name: "AssertionException".to_string(),
                        };
                    }
                }
                call_role(self, function, src)
            }
            "member_access_expression" => match (node.child_by_field_name("expression"), node.child_by_field_name("name")) {
                (Some(object), Some(name)) => NodeRole::Member {
                    object,
                    property: text(name, src).to_string(),
                },
                _ => NodeRole::Other,
            },
            "element_access_expression" => match node.child_by_field_name("expression") {
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
            "postfix_unary_expression" | "prefix_unary_expression" => {
                let t = text(node, src);
                match named_children(node).into_iter().next() {
                    Some(target) if t.contains("++") || t.contains("--") => NodeRole::Assign { target, compound: true },
                    _ => NodeRole::Other,
                }
            }
            _ => NodeRole::Other,
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], _owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let body = node
            .child_by_field_name("body")
            .or_else(|| child_of_kind(node, &["block", "arrow_expression_clause"]));
        let mut header = FunctionHeader::new(name, body);

        let modifiers = modifiers(node, src);
        let in_interface = node
            .parent()
            .and_then(|p| p.parent())
            .is_some_and(|p| p.kind() == "interface_declaration");
        let default_visibility = if in_interface { Visibility::Public } else { Visibility::Private };
        header.visibility = visibility_from_modifiers(&modifiers, default_visibility);
        let words: Vec<&str> = modifiers.split_whitespace().collect();
        header.is_static = words.contains(&"static");
        header.is_async = words.contains(&"async");

        if let Some(params) = node.child_by_field_name("parameters") {
            header.params = named_children(params).into_iter().filter_map(|p| parameter(p, src)).collect();
        }
        header.returns = if node.kind() == "constructor_declaration" {
            header.kind = UnitKind::Constructor;
            ReturnDecl::Void
        } else {
            node.child_by_field_name("returns")
                .or_else(|| node.child_by_field_name("type"))
                .map_or(ReturnDecl::Unspecified, |t| ReturnDecl::Declared(text(t, src).to_string()))
        };
        if header.is_async {
            // `async Task` completes with nothing; `async Task<T>` yields T.
            if let ReturnDecl::Declared(t) = &header.returns {
                if let Some(inner) = t.strip_prefix("Task<").and_then(|r| r.strip_suffix('>')) {
                    header.returns = ReturnDecl::Declared(inner.to_string());
                }
            }
        }
        Some(header)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let kind = match node.kind() {
            "struct_declaration" | "record_struct_declaration" => TypeKind::Struct,
            "interface_declaration" => TypeKind::Interface,
            "record_declaration" => TypeKind::Record,
            "enum_declaration" => TypeKind::Enum,
            _ => TypeKind::Class,
        };
        let bases = child_of_kind(node, &["base_list"])
            .map(|b| named_children(b).into_iter().map(|c| text(c, src).to_string()).collect())
            .unwrap_or_default();

        let mut fields = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters").or_else(|| child_of_kind(node, &["parameter_list"])) {
            for p in named_children(params).into_iter().filter_map(|p| parameter(p, src)) {
                fields.push(RawField {
                    name: p.name,
                    type_text: p.type_text,
                });
            }
        }
        let body = node.child_by_field_name("body");
        if let Some(body) = body {
            for member in named_children(body) {
                match member.kind() {
                    "field_declaration" => {
                        let Some(decl) = child_of_kind(member, &["variable_declaration"]) else {
                            continue;
                        };
                        let ty = field_text(decl, "type", src);
                        for var in named_children(decl).into_iter().filter(|c| c.kind() == "variable_declarator") {
                            let name = field_text(var, "name", src)
                                .or_else(|| child_of_kind(var, &["identifier"]).map(|i| text(i, src).to_string()));
                            if let Some(name) = name {
                                fields.push(RawField { name, type_text: ty.clone() });
                            }
                        }
                    }
                    "property_declaration" => {
                        if let Some(name) = field_text(member, "name", src) {
                            fields.push(RawField {
                                name,
                                type_text: field_text(member, "type", src),
                            });
                        }
                    }
                    _ => {}
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

    fn member_prefixes(&self) -> &'static [&'static str] {
        &["this"]
    }

    fn implicit_members(&self) -> bool {
        true
    }
}

fn modifiers(node: Node<'_>, src: &[u8]) -> String {
    named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "modifier")
        .map(|c| text(c, src))
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_argument(invocation: Node<'_>) -> Option<Node<'_>> {
    let args = invocation.child_by_field_name("arguments")?;
    let first = named_children(args).into_iter().next()?;
    Some(named_children(first).into_iter().last().unwrap_or(first))
}

fn parameter(node: Node<'_>, src: &[u8]) -> Option<RawParam> {
    if node.kind() != "parameter" {
        return None;
    }
    let mut p = RawParam::named(field_text(node, "name", src)?);
    let ty = field_text(node, "type", src);
    let whole = text(node, src).trim_start();
    p.variadic = whole.starts_with("params ");
    p.type_text = ty.map(|t| if p.variadic { format!("{t}...") } else { t });
    p.default_text = default_value(node, src);
    p.annotations = named_children(node)
        .into_iter()
        .filter(|c| c.kind() == "attribute_list")
        .flat_map(|list| named_children(list).into_iter().map(|a| text(a, src).to_string()))
        .collect();
    Some(p)
}

/// The expression after `=` in `int max = 10`. Older grammars wrap it in an
/// `equals_value_clause`; current ones put it directly after the token.
fn default_value(node: Node<'_>, src: &[u8]) -> Option<String> {
    if let Some(clause) = child_of_kind(node, &["equals_value_clause"]) {
        return named_children(clause).into_iter().next().map(|v| text(v, src).to_string());
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    let eq = children.iter().position(|c| !c.is_named() && c.kind() == "=")?;
    children[eq + 1..]
        .iter()
        .find(|c| c.is_named())
        .map(|v| text(*v, src).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SignalKind, TypeCategory};
    use crate::parsers::traits::LanguageAdapter;

    const SOURCE: &str = r#"
using System;

namespace Bank
{
    public class Account
    {
        private decimal balance;
        public string Owner { get; set; }

        public Account(string owner)
        {
            Owner = owner;
        }

        public void Withdraw(decimal amount)
        {
            if (amount > balance)
            {
                throw new InvalidOperationException("Insufficient funds");
            }
            balance -= amount;
        }

        public decimal GetBalance() => balance;

        public static int Clamp(int value, [Range(0, 10)] int max = 10)
        {
            return Math.Min(value, max);
        }
    }
}
"#;

    #[test]
    fn class_members() {
        let unit = CSharpAdapter.parse("Account.cs", SOURCE).unwrap();
        let names: Vec<String> = unit.units.iter().map(|u| u.qualified_name()).collect();
        assert_eq!(names, ["Account.Account", "Account.Withdraw", "Account.GetBalance", "Account.Clamp"]);
        assert_eq!(unit.units[0].kind, UnitKind::Constructor);
        assert!(unit.units[3].is_static);
        assert!(unit.types["Account"].has_field("balance"));
        assert!(unit.types["Account"].has_field("Owner"));
    }

    #[test]
    fn withdraw_signal_and_state() {
        let unit = CSharpAdapter.parse("Account.cs", SOURCE).unwrap();
        let withdraw = &unit.units[1];
        assert_eq!(withdraw.parameters[0].type_category, TypeCategory::FloatingPoint);
        assert_eq!(withdraw.error_signals[0].kind, SignalKind::Throw);
        assert_eq!(withdraw.error_signals[0].name, "InvalidOperationException");
        assert!(withdraw.writes_field("balance"));
        assert!(unit.units[2].reads("balance"));
        assert_eq!(unit.units[2].return_type, Some(TypeCategory::FloatingPoint));
    }

    #[test]
    fn defaults_and_attributes() {
        let unit = CSharpAdapter.parse("Account.cs", SOURCE).unwrap();
        let clamp = &unit.units[3];
        assert_eq!(clamp.parameters[1].default_value.as_deref(), Some("10"));
        let range = clamp.parameters[1].declared_range.unwrap();
        assert_eq!((range.min.unwrap().value, range.max.unwrap().value), (0.0, 10.0));
    }

    #[test]
    fn parameter_defaults_follow_the_equals_token() {
        let src = r#"
class Retry
{
    public void Run(double pause, int attempts = 3, string label = "job", bool verbose = false) { }
}
"#;
        let unit = CSharpAdapter.parse("Retry.cs", src).unwrap();
        let defaults: Vec<Option<&str>> = unit.units[0]
            .parameters
            .iter()
            .map(|p| p.default_value.as_deref())
            .collect();
        assert_eq!(defaults, [None, Some("3"), Some("\"job\""), Some("false")]);
    }
}
