//! Go adapter.
//!
//! Go reports failures through returned `error` values and `panic`. A
//! `return` whose last value is an error constructor, an `Err*` sentinel,
//! a propagated `err` or an `&SomeError{}` literal is an error return.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    base_type_name, call_role, children_by_field, exception_name, field_text, is_compound_assignment,
    named_children, text, FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl, SyntaxProfile,
    TypeHeader,
};
use crate::scanner::Language;

define_adapter!(GoAdapter, Language::Go);

const ERROR_CONSTRUCTORS: &[&str] = &["errors.New", "fmt.Errorf", "errors.Join", "errors.Wrap", "errors.Wrapf"];

impl SyntaxProfile for GoAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "function_declaration" | "method_declaration" => NodeRole::Function,
            "func_literal" => NodeRole::Lambda,
            "type_spec" => NodeRole::TypeDecl,
            "if_statement" => match node.child_by_field_name("condition") {
                Some(condition) => NodeRole::If {
                    condition,
                    consequence: node.child_by_field_name("consequence"),
                    alternatives: node.child_by_field_name("alternative").into_iter().collect(),
                },
                None => NodeRole::Other,
            },
            "for_statement" => NodeRole::Loop,
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => NodeRole::Switch,
            "expression_case" | "type_case" | "communication_case" | "default_case" => NodeRole::CaseArm,
            "return_statement" => NodeRole::Return {
                value: named_children(node).into_iter().next(),
            },
            "expression_list" if node.parent().is_some_and(|p| p.kind() == "return_statement") => {
                match named_children(node).last().and_then(|last| error_value(*last, src)) {
                    Some(name) => NodeRole::ErrorReturn { name },
                    None => NodeRole::Other,
                }
            }
            "call_expression" => {
                let function = node.child_by_field_name("function");
                match function.map(|f| text(f, src)) {
                    Some("panic") => NodeRole::Raise {
                        name: "panic".to_string(),
                    },
                    Some("log.Fatal" | "log.Fatalf" | "log.Fatalln" | "log.Panic" | "log.Panicf") => NodeRole::Raise {
                        name: "fatal".to_string(),
                    },
                    _ => call_role(self, function, src),
                }
            }
            "selector_expression" => match (node.child_by_field_name("operand"), node.child_by_field_name("field")) {
                (Some(object), Some(field)) => NodeRole::Member {
                    object,
                    property: text(field, src).to_string(),
                },
                _ => NodeRole::Other,
            },
            "index_expression" => match node.child_by_field_name("operand") {
                Some(object) => NodeRole::Index { object },
                None => NodeRole::Other,
            },
            "assignment_statement" => {
                let target = node
                    .child_by_field_name("left")
                    .and_then(|l| named_children(l).into_iter().next());
                match target {
                    Some(target) => NodeRole::Assign {
                        target,
                        compound: is_compound_assignment(node, src),
                    },
                    None => NodeRole::Other,
                }
            }
            "inc_statement" | "dec_statement" => match named_children(node).into_iter().next() {
                Some(target) => NodeRole::Assign { target, compound: true },
                None => NodeRole::Other,
            },
            _ => NodeRole::Other,
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], _owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let mut header = FunctionHeader::new(name.clone(), node.child_by_field_name("body"));
        header.visibility = if name.starts_with(|c: char| c.is_uppercase()) {
            Visibility::Public
        } else {
            Visibility::Internal
        };

        if let Some(receiver) = node.child_by_field_name("receiver") {
            if let Some(decl) = named_children(receiver).into_iter().find(|c| c.kind() == "parameter_declaration") {
                header.owner = field_text(decl, "type", src).map(|t| base_type_name(&t));
                header.receiver = field_text(decl, "name", src);
            }
        } else if name.starts_with("New") && name.len() > 3 {
            header.kind = UnitKind::Constructor;
        }

        if let Some(params) = node.child_by_field_name("parameters") {
            header.params = parameters(params, src);
        }
        header.returns = match node.child_by_field_name("result") {
            None => ReturnDecl::Void,
            Some(result) if result.kind() == "parameter_list" => {
                let types: Vec<String> = named_children(result)
                    .into_iter()
                    .filter_map(|d| field_text(d, "type", src))
                    .filter(|t| t != "error")
                    .collect();
                match types.as_slice() {
                    [] => ReturnDecl::Void,
                    [single] => ReturnDecl::Declared(single.clone()),
                    _ => ReturnDecl::Declared(text(result, src).to_string()),
                }
            }
            Some(result) if text(result, src) == "error" => ReturnDecl::Void,
            Some(result) => ReturnDecl::Declared(text(result, src).to_string()),
        };
        Some(header)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let ty = node.child_by_field_name("type")?;
        let kind = match ty.kind() {
            "struct_type" => TypeKind::Struct,
            "interface_type" => TypeKind::Interface,
            _ => return None,
        };
        let mut fields = Vec::new();
        let mut bases = Vec::new();
        if let Some(list) = named_children(ty).into_iter().find(|c| c.kind() == "field_declaration_list") {
            for decl in named_children(list).into_iter().filter(|c| c.kind() == "field_declaration") {
                let type_text = field_text(decl, "type", src);
                let names = children_by_field(decl, "name");
                if names.is_empty() {
                    // Embedded struct.
                    if let Some(t) = &type_text {
                        bases.push(base_type_name(t));
                    }
                }
                for n in names {
                    fields.push(RawField {
                        name: text(n, src).to_string(),
                        type_text: type_text.clone(),
                    });
                }
            }
        }
        Some(TypeHeader {
            name,
            kind,
            bases,
            fields,
            body: None,
        })
    }

    fn member_prefixes(&self) -> &'static [&'static str] {
        &[]
    }
}

fn parameters(list: Node<'_>, src: &[u8]) -> Vec<RawParam> {
    let mut out = Vec::new();
    for decl in named_children(list) {
        let variadic = decl.kind() == "variadic_parameter_declaration";
        if !variadic && decl.kind() != "parameter_declaration" {
            continue;
        }
        let type_text = field_text(decl, "type", src).map(|t| if variadic { format!("{t}...") } else { t });
        // `a, b int` declares two parameters of one type.
        for name in children_by_field(decl, "name") {
            let mut p = RawParam::named(text(name, src));
            p.type_text = type_text.clone();
            p.variadic = variadic;
            out.push(p);
        }
    }
    out
}

/// Error name when `value` denotes a non-nil error.
fn error_value(value: Node<'_>, src: &[u8]) -> Option<String> {
    let t = text(value, src).trim();
    match value.kind() {
        "call_expression" => {
            let callee = field_text(value, "function", src).unwrap_or_default();
            ERROR_CONSTRUCTORS.contains(&callee.as_str()).then(|| "error".to_string())
        }
        "identifier" if t == "err" || t.ends_with("Err") => Some("error".to_string()),
        "identifier" | "selector_expression" => {
            let last = t.rsplit('.').next().unwrap_or(t);
            let sentinel = last.strip_prefix("Err").is_some_and(|rest| rest.starts_with(char::is_uppercase));
            sentinel.then(|| last.to_string())
        }
        "unary_expression" | "composite_literal" => {
            let name = exception_name(t.trim_start_matches('&'), "");
            name.ends_with("Error").then_some(name)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ControlFlowHint, SignalGuard, SignalKind, TypeCategory};
    use crate::parsers::traits::LanguageAdapter;

    const SOURCE: &str = r#"
package calc

import (
    "errors"
    "fmt"
)

var ErrEmpty = errors.New("empty")

type Counter struct {
    count int
    items []string
}

func NewCounter() *Counter {
    return &Counter{}
}

func (c *Counter) Increment() {
    c.count++
}

func (c *Counter) Add(item string) error {
    if item == "" {
        return ErrEmpty
    }
    c.items = append(c.items, item)
    return nil
}

func Divide(a, b int) (int, error) {
    if b == 0 {
        return 0, fmt.Errorf("division by zero")
    }
    return a / b, nil
}

func mustPositive(n int) int {
    if n < 0 {
        panic("negative")
    }
    return n
}
"#;

    #[test]
    fn functions_and_methods() {
        let unit = GoAdapter.parse("calc.go", SOURCE).unwrap();
        let names: Vec<String> = unit.units.iter().map(|u| u.qualified_name()).collect();
        assert_eq!(
            names,
            ["NewCounter", "Counter.Increment", "Counter.Add", "Divide", "mustPositive"]
        );
        assert_eq!(unit.units[0].kind, UnitKind::Constructor);
        assert_eq!(unit.units[1].kind, UnitKind::Method);
        assert_eq!(unit.units[4].visibility, Visibility::Internal);
        assert!(unit.types["Counter"].has_field("items"));
    }

    #[test]
    fn grouped_parameters_share_type() {
        let unit = GoAdapter.parse("calc.go", SOURCE).unwrap();
        let divide = unit.find("Divide").unwrap();
        assert_eq!(divide.parameters.len(), 2);
        assert!(divide.parameters.iter().all(|p| p.type_category == TypeCategory::Integer));
        assert_eq!(divide.return_type, Some(TypeCategory::Integer));
    }

    #[test]
    fn error_returns_and_panics() {
        let unit = GoAdapter.parse("calc.go", SOURCE).unwrap();
        let divide = unit.find("Divide").unwrap();
        assert_eq!(divide.error_signals.len(), 1);
        assert_eq!(divide.error_signals[0].kind, SignalKind::ErrorReturn);
        assert!(matches!(divide.error_signals[0].guard, SignalGuard::Condition { .. }));

        let add = unit.find("Counter.Add").unwrap();
        assert_eq!(add.error_signals[0].name, "ErrEmpty");
        assert!(add.writes_field("items"));

        let must = unit.find("mustPositive").unwrap();
        assert_eq!(must.error_signals[0].kind, SignalKind::Throw);
        assert_eq!(must.error_signals[0].name, "panic");
        assert!(must.has_hint(ControlFlowHint::HasConditional));
    }

    #[test]
    fn receiver_fields() {
        let unit = GoAdapter.parse("calc.go", SOURCE).unwrap();
        assert!(unit.find("Counter.Increment").unwrap().writes_field("count"));
    }
}
