//! Guard conditions over callable-unit parameters.
//!
//! A guard is kept as a small boolean tree whose leaves test one parameter.
//! Anything the condition parser could not map onto a parameter test stays
//! as opaque source text.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TypeCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn negated(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
        }
    }

    /// The operator seen from the other side: `c < x` is `x > c`.
    pub fn mirrored(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            other => other,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

/// The test a guard atom applies to its parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum GuardTest {
    Compare { op: CompareOp, value: f64 },
    EqualsText { value: String },
    IsNull,
    IsEmpty,
    IsInstance { categories: Vec<TypeCategory> },
    Truthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardAtom {
    pub param: String,
    #[serde(flatten)]
    pub test: GuardTest,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negated: bool,
}

impl GuardAtom {
    pub fn new(param: impl Into<String>, test: GuardTest) -> Self {
        Self {
            param: param.into(),
            test,
            negated: false,
        }
    }

    pub fn negate(&self) -> GuardAtom {
        match &self.test {
            GuardTest::Compare { op, value } => GuardAtom {
                param: self.param.clone(),
                test: GuardTest::Compare {
                    op: op.negated(),
                    value: *value,
                },
                negated: false,
            },
            _ => GuardAtom {
                negated: !self.negated,
                ..self.clone()
            },
        }
    }
}

/// Boolean structure over guard atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Atom(GuardAtom),
    All { terms: Vec<Condition> },
    Any { terms: Vec<Condition> },
    Opaque {
        text: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        negated: bool,
    },
}

impl Condition {
    pub fn opaque(text: impl Into<String>) -> Self {
        Condition::Opaque {
            text: text.into(),
            negated: false,
        }
    }

    /// Conjunction, flattening nested conjunctions and single terms.
    pub fn all(terms: Vec<Condition>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Condition::All { terms } => flat.extend(terms),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Condition::All { terms: flat }
        }
    }

    /// Disjunction, flattening nested disjunctions and single terms.
    pub fn any(terms: Vec<Condition>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for term in terms {
            match term {
                Condition::Any { terms } => flat.extend(terms),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            Condition::Any { terms: flat }
        }
    }

    /// Logical negation, pushed down to the leaves.
    pub fn negate(&self) -> Condition {
        match self {
            Condition::Atom(atom) => Condition::Atom(atom.negate()),
            Condition::All { terms } => Condition::any(terms.iter().map(Condition::negate).collect()),
            Condition::Any { terms } => Condition::all(terms.iter().map(Condition::negate).collect()),
            Condition::Opaque { text, negated } => Condition::Opaque {
                text: text.clone(),
                negated: !negated,
            },
        }
    }

    /// Independent ways for the condition to hold: the terms of a top-level
    /// disjunction, or the condition itself.
    pub fn disjuncts(&self) -> Vec<&Condition> {
        match self {
            Condition::Any { terms } => terms.iter().flat_map(Condition::disjuncts).collect(),
            other => vec![other],
        }
    }

    /// Every atom in the tree, left to right.
    pub fn atoms(&self) -> Vec<&GuardAtom> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a GuardAtom>) {
        match self {
            Condition::Atom(a) => out.push(a),
            Condition::All { terms } | Condition::Any { terms } => {
                for t in terms {
                    t.collect_atoms(out);
                }
            }
            Condition::Opaque { .. } => {}
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Condition::Opaque { .. })
    }

    /// True when some part of the tree could not be interpreted.
    pub fn has_opaque(&self) -> bool {
        match self {
            Condition::Opaque { .. } => true,
            Condition::Atom(_) => false,
            Condition::All { terms } | Condition::Any { terms } => terms.iter().any(Condition::has_opaque),
        }
    }

    /// Parameters the condition refers to, in first-mention order.
    pub fn params(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for atom in self.atoms() {
            if !seen.contains(&atom.param.as_str()) {
                seen.push(atom.param.as_str());
            }
        }
        seen
    }
}

impl fmt::Display for GuardAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = if self.negated { "not " } else { "" };
        match &self.test {
            GuardTest::Compare { op, value } => write!(f, "{} {} {}", self.param, op.symbol(), value),
            GuardTest::EqualsText { value } => {
                let op = if self.negated { "!=" } else { "==" };
                write!(f, "{} {} \"{}\"", self.param, op, value)
            }
            GuardTest::IsNull => write!(f, "{} is {}null", self.param, not),
            GuardTest::IsEmpty => write!(f, "{} is {}empty", self.param, not),
            GuardTest::IsInstance { categories } => {
                let names: Vec<&str> = categories.iter().map(|c| c.label()).collect();
                write!(f, "{} is {}{}", self.param, not, names.join("|"))
            }
            GuardTest::Truthy => write!(f, "{}{}", if self.negated { "not " } else { "" }, self.param),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Atom(a) => write!(f, "{a}"),
            Condition::All { terms } | Condition::Any { terms } => {
                let sep = if matches!(self, Condition::All { .. }) { " and " } else { " or " };
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    match t {
                        Condition::All { .. } | Condition::Any { .. } => write!(f, "({t})")?,
                        _ => write!(f, "{t}")?,
                    }
                }
                Ok(())
            }
            Condition::Opaque { text, negated } => {
                if *negated {
                    write!(f, "not ({text})")
                } else {
                    f.write_str(text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(p: &str, op: CompareOp, v: f64) -> Condition {
        Condition::Atom(GuardAtom::new(p, GuardTest::Compare { op, value: v }))
    }

    #[test]
    fn negation_applies_de_morgan() {
        let c = Condition::any(vec![cmp("a", CompareOp::Lt, 0.0), cmp("b", CompareOp::Eq, 0.0)]);
        let n = c.negate();
        match n {
            Condition::All { terms } => {
                assert_eq!(terms[0], cmp("a", CompareOp::Ge, 0.0));
                assert_eq!(terms[1], cmp("b", CompareOp::Ne, 0.0));
            }
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn double_negation_is_identity_for_atoms() {
        let a = Condition::Atom(GuardAtom::new("x", GuardTest::IsNull));
        assert_eq!(a.negate().negate(), a);
    }

    #[test]
    fn disjuncts_flatten_nested_any() {
        let c = Condition::any(vec![
            cmp("a", CompareOp::Lt, 0.0),
            Condition::any(vec![cmp("b", CompareOp::Lt, 0.0), cmp("c", CompareOp::Lt, 0.0)]),
        ]);
        assert_eq!(c.disjuncts().len(), 3);
        assert_eq!(c.params(), vec!["a", "b", "c"]);
    }

    #[test]
    fn display_is_readable() {
        let c = Condition::all(vec![
            Condition::Atom(GuardAtom::new("op", GuardTest::EqualsText { value: "add".into() }).negate()),
            cmp("y", CompareOp::Eq, 0.0),
        ]);
        assert_eq!(c.to_string(), "op != \"add\" and y == 0");
    }
}
