//! Python adapter.

use tree_sitter::Node;

use crate::model::{TypeKind, UnitKind, Visibility};
use crate::parsers::macros::define_adapter;
use crate::parsers::profile::{
    call_role, children_by_field, exception_name, field_text, has_child_text, named_children, text,
    FunctionHeader, NodeRole, RawField, RawParam, ReturnDecl, SyntaxProfile, TypeHeader,
};
use crate::scanner::Language;

define_adapter!(PythonAdapter, Language::Python);

impl SyntaxProfile for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn role<'t>(&self, node: Node<'t>, src: &[u8]) -> NodeRole<'t> {
        match node.kind() {
            "function_definition" => NodeRole::Function,
            "lambda" => NodeRole::Lambda,
            "class_definition" => NodeRole::TypeDecl,
            "if_statement" | "elif_clause" => match node.child_by_field_name("condition") {
                Some(condition) => NodeRole::If {
                    condition,
                    consequence: node.child_by_field_name("consequence"),
                    alternatives: children_by_field(node, "alternative").into_iter().collect(),
                },
                None => NodeRole::Other,
            },
            "for_statement" | "while_statement" | "list_comprehension" | "dictionary_comprehension"
            | "set_comprehension" | "generator_expression" => NodeRole::Loop,
            "match_statement" => NodeRole::Switch,
            "case_clause" => NodeRole::CaseArm,
            "conditional_expression" => NodeRole::Ternary,
            "except_clause" | "except_group_clause" => NodeRole::Catch,
            "raise_statement" => {
                let raised = named_children(node)
                    .into_iter()
                    .next()
                    .map(|n| text(n, src))
                    .unwrap_or("");
                NodeRole::Raise {
                    name: exception_name(raised, "Exception"),
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
            "call" => call_role(self, node.child_by_field_name("function"), src),
            "attribute" => match (node.child_by_field_name("object"), node.child_by_field_name("attribute")) {
                (Some(object), Some(attr)) => NodeRole::Member {
                    object,
                    property: text(attr, src).to_string(),
                },
                _ => NodeRole::Other,
            },
            "subscript" => match node.child_by_field_name("value") {
                Some(object) => NodeRole::Index { object },
                None => NodeRole::Other,
            },
            "assignment" => match node.child_by_field_name("left") {
                Some(target) => NodeRole::Assign { target, compound: false },
                None => NodeRole::Other,
            },
            "augmented_assignment" => match node.child_by_field_name("left") {
                Some(target) => NodeRole::Assign { target, compound: true },
                None => NodeRole::Other,
            },
            _ => NodeRole::Other,
        }
    }

    fn function_header<'t>(&self, node: Node<'t>, src: &[u8], owner: Option<&str>) -> Option<FunctionHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let mut header = FunctionHeader::new(name.clone(), node.child_by_field_name("body"));
        header.is_async = has_child_text(node, src, "async");

        let decorators: Vec<String> = node
            .parent()
            .filter(|p| p.kind() == "decorated_definition")
            .map(|p| {
                named_children(p)
                    .into_iter()
                    .filter(|c| c.kind() == "decorator")
                    .map(|c| text(c, src).trim_start_matches('@').trim().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let is_static = decorators.iter().any(|d| d == "staticmethod");
        let is_classmethod = decorators.iter().any(|d| d == "classmethod");
        header.is_static = is_static || is_classmethod;

        let mut params: Vec<RawParam> = node
            .child_by_field_name("parameters")
            .map(|p| named_children(p).into_iter().filter_map(|c| parameter(c, src)).collect())
            .unwrap_or_default();
        if owner.is_some() && !is_static && !params.is_empty() {
            let receiver = params.remove(0);
            header.receiver = Some(receiver.name);
        }
        header.params = params;

        header.returns = match field_text(node, "return_type", src) {
            Some(t) => ReturnDecl::Declared(t),
            None => ReturnDecl::Unspecified,
        };
        if name == "__init__" {
            header.kind = UnitKind::Constructor;
            header.returns = ReturnDecl::Void;
        }
        let dunder = name.starts_with("__") && name.ends_with("__");
        header.visibility = if name.starts_with('_') && !dunder {
            Visibility::Private
        } else {
            Visibility::Public
        };
        Some(header)
    }

    fn type_header<'t>(&self, node: Node<'t>, src: &[u8]) -> Option<TypeHeader<'t>> {
        let name = field_text(node, "name", src)?;
        let bases: Vec<String> = node
            .child_by_field_name("superclasses")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|c| c.kind() != "keyword_argument")
                    .map(|c| text(c, src).to_string())
                    .collect()
            })
            .unwrap_or_default();
        let body = node.child_by_field_name("body");
        let fields = body.map(|b| class_fields(b, src)).unwrap_or_default();
        let kind = if bases_mention(&bases, "Enum") {
            TypeKind::Enum
        } else {
            TypeKind::Class
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
        &["self", "cls"]
    }

    fn fields_from_writes(&self) -> bool {
        true
    }
}

fn bases_mention(bases: &[String], name: &str) -> bool {
    bases.iter().any(|b| b == name || b.ends_with(&format!(".{name}")))
}

fn parameter(node: Node<'_>, src: &[u8]) -> Option<RawParam> {
    match node.kind() {
        "identifier" => Some(RawParam::named(text(node, src))),
        "typed_parameter" => {
            let inner = named_children(node).into_iter().next()?;
            let mut p = match inner.kind() {
                "list_splat_pattern" | "dictionary_splat_pattern" => splat(inner, src),
                _ => RawParam::named(text(inner, src)),
            };
            p.type_text = field_text(node, "type", src);
            Some(p)
        }
        "default_parameter" | "typed_default_parameter" => {
            let mut p = RawParam::named(field_text(node, "name", src)?);
            p.type_text = field_text(node, "type", src);
            p.default_text = field_text(node, "value", src);
            Some(p)
        }
        "list_splat_pattern" | "dictionary_splat_pattern" => Some(splat(node, src)),
        _ => None,
    }
}

fn splat(node: Node<'_>, src: &[u8]) -> RawParam {
    let mut p = RawParam::named(text(node, src).trim_start_matches('*'));
    p.variadic = true;
    p
}

/// Class-level assignments: `count = 0`, `name: str`.
fn class_fields(body: Node<'_>, src: &[u8]) -> Vec<RawField> {
    let mut fields = Vec::new();
    for stmt in named_children(body) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        for expr in named_children(stmt) {
            if expr.kind() != "assignment" {
                continue;
            }
            let Some(left) = expr.child_by_field_name("left") else {
                continue;
            };
            if left.kind() == "identifier" {
                fields.push(RawField {
                    name: text(left, src).to_string(),
                    type_text: field_text(expr, "type", src),
                });
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompareOp, Condition, ControlFlowHint, GuardAtom, GuardTest, SignalKind, TypeCategory};
    use crate::parsers::traits::LanguageAdapter;

    const SOURCE: &str = r#"
class Account:
    interest = 0.5

    def __init__(self, owner, balance=0):
        self.owner = owner
        self.balance = balance
        self.history = []

    def deposit(self, amount: float) -> None:
        if amount <= 0:
            raise ValueError("amount must be positive")
        self.balance += amount
        self.history.append(amount)

    def get_balance(self):
        return self.balance

    @staticmethod
    def fee(kind):
        if kind == "premium":
            return 0
        elif kind == "basic":
            return 5
        else:
            raise KeyError(kind)


def factorial(n):
    if n < 0:
        raise ValueError("negative")
    if n == 0:
        return 1
    return n * factorial(n - 1)
"#;

    #[test]
    fn units_in_declaration_order() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let names: Vec<String> = unit.units.iter().map(|u| u.qualified_name()).collect();
        assert_eq!(
            names,
            ["Account.__init__", "Account.deposit", "Account.get_balance", "Account.fee", "factorial"]
        );
        assert_eq!(unit.units[0].kind, UnitKind::Constructor);
        assert!(unit.units[3].is_static);
    }

    #[test]
    fn self_is_not_a_parameter() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let init = &unit.units[0];
        let names: Vec<&str> = init.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["owner", "balance"]);
        assert_eq!(init.parameters[1].type_category, TypeCategory::Integer);
        assert_eq!(unit.units[1].parameters[0].type_category, TypeCategory::FloatingPoint);
        assert_eq!(unit.units[1].return_type, None);
    }

    #[test]
    fn raise_guard_is_recovered() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let deposit = &unit.units[1];
        assert_eq!(deposit.error_signals.len(), 1);
        let signal = &deposit.error_signals[0];
        assert_eq!(signal.kind, SignalKind::Throw);
        assert_eq!(signal.name, "ValueError");
        assert_eq!(
            signal.guard.condition(),
            Some(&Condition::Atom(GuardAtom::new(
                "amount",
                GuardTest::Compare { op: CompareOp::Le, value: 0.0 }
            )))
        );
    }

    #[test]
    fn else_arm_carries_negated_prior_arms() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let fee = &unit.units[3];
        let cond = fee.error_signals[0].guard.condition().unwrap();
        assert_eq!(
            cond,
            &Condition::all(vec![
                Condition::Atom(GuardAtom::new("kind", GuardTest::EqualsText { value: "premium".into() })).negate(),
                Condition::Atom(GuardAtom::new("kind", GuardTest::EqualsText { value: "basic".into() })).negate(),
            ])
        );
        assert_eq!(fee.early_returns.len(), 2);
        assert_eq!(fee.parameters[0].type_category, TypeCategory::Text);
    }

    #[test]
    fn fields_and_accesses() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let ty = &unit.types["Account"];
        for f in ["interest", "owner", "balance", "history"] {
            assert!(ty.has_field(f), "missing field {f}");
        }
        let deposit = &unit.units[1];
        assert!(deposit.writes_field("balance"));
        assert!(deposit.writes_field("history"));
        assert!(unit.units[2].reads("balance"));
        assert!(!unit.units[2].writes_field("balance"));
    }

    #[test]
    fn recursion_and_ranges() {
        let unit = PythonAdapter.parse("account.py", SOURCE).unwrap();
        let fact = &unit.units[4];
        assert!(fact.has_hint(ControlFlowHint::HasRecursion));
        assert!(fact.has_hint(ControlFlowHint::HasEarlyReturn));
        assert_eq!(fact.parameters[0].type_category, TypeCategory::Integer);
        let range = fact.parameters[0].declared_range.unwrap();
        assert_eq!(range.min.unwrap().value, 0.0);
        assert_eq!(fact.complexity, 3);
    }

    #[test]
    fn syntax_error_keeps_intact_units() {
        let src = "def good(a):\n    return a\n\ndef broken(:\n    pass\n";
        let failure = PythonAdapter.parse("bad.py", src).unwrap_err();
        assert!(!failure.regions.is_empty());
        assert!(failure.partial.units.iter().any(|u| u.name == "good"));
        assert!(failure.partial.units.iter().all(|u| u.name != "broken"));
    }
}
