//! Three-valued evaluation of guard conditions against scenario inputs.
//!
//! `Unknown` covers opaque guard text, symbolic inputs, unbound parameters
//! and tests that make no sense for the value's type.

use crate::model::{Condition, GuardAtom, GuardTest};

use super::types::{input, InputBinding, ScenarioValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    fn from_bool(b: bool) -> Self {
        if b {
            Truth::True
        } else {
            Truth::False
        }
    }

    fn not(self) -> Self {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        }
    }
}

pub fn evaluate(condition: &Condition, inputs: &[InputBinding]) -> Truth {
    match condition {
        Condition::Atom(atom) => evaluate_atom(atom, inputs),
        Condition::All { terms } => {
            let mut result = Truth::True;
            for term in terms {
                match evaluate(term, inputs) {
                    Truth::False => return Truth::False,
                    Truth::Unknown => result = Truth::Unknown,
                    Truth::True => {}
                }
            }
            result
        }
        Condition::Any { terms } => {
            let mut result = Truth::False;
            for term in terms {
                match evaluate(term, inputs) {
                    Truth::True => return Truth::True,
                    Truth::Unknown => result = Truth::Unknown,
                    Truth::False => {}
                }
            }
            result
        }
        Condition::Opaque { .. } => Truth::Unknown,
    }
}

pub fn evaluate_atom(atom: &GuardAtom, inputs: &[InputBinding]) -> Truth {
    let Some(value) = input(inputs, &atom.param) else {
        return Truth::Unknown;
    };
    let raw = test_value(&atom.test, value);
    if atom.negated {
        raw.not()
    } else {
        raw
    }
}

fn test_value(test: &GuardTest, value: &ScenarioValue) -> Truth {
    if let ScenarioValue::Symbolic(_) = value {
        return Truth::Unknown;
    }
    match test {
        GuardTest::Compare { op, value: rhs } => match value {
            ScenarioValue::Integer(_) | ScenarioValue::Float(_) => {
                Truth::from_bool(op.apply(value.as_f64().unwrap_or_default(), *rhs))
            }
            ScenarioValue::Boolean(b) => Truth::from_bool(op.apply(f64::from(u8::from(*b)), *rhs)),
            _ => Truth::Unknown,
        },
        GuardTest::EqualsText { value: expected } => match value {
            ScenarioValue::Text(s) => Truth::from_bool(s == expected),
            ScenarioValue::LongText(n) => Truth::from_bool(*n == expected.chars().count() && expected.chars().all(|c| c == 'x')),
            _ => Truth::False,
        },
        GuardTest::IsNull => Truth::from_bool(matches!(value, ScenarioValue::Null)),
        GuardTest::IsEmpty => match value {
            ScenarioValue::Text(s) => Truth::from_bool(s.is_empty()),
            ScenarioValue::LongText(n) | ScenarioValue::Collection(n) => Truth::from_bool(*n == 0),
            _ => Truth::Unknown,
        },
        GuardTest::IsInstance { categories } => match value.category() {
            Some(category) => Truth::from_bool(categories.contains(&category)),
            None => Truth::False,
        },
        GuardTest::Truthy => Truth::from_bool(match value {
            ScenarioValue::Integer(i) => *i != 0,
            ScenarioValue::Float(f) => *f != 0.0,
            ScenarioValue::Text(s) => !s.is_empty(),
            ScenarioValue::LongText(n) | ScenarioValue::Collection(n) => *n > 0,
            ScenarioValue::Boolean(b) => *b,
            ScenarioValue::Null => false,
            ScenarioValue::Symbolic(_) => return Truth::Unknown,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guards::parse_condition;
    use crate::synthesis::types::InputBinding;

    fn bind(pairs: &[(&str, ScenarioValue)]) -> Vec<InputBinding> {
        pairs.iter().map(|(n, v)| InputBinding::new(*n, v.clone())).collect()
    }

    #[test]
    fn numeric_comparisons() {
        let c = parse_condition("b == 0", &["a", "b"]);
        assert_eq!(evaluate(&c, &bind(&[("b", ScenarioValue::Integer(0))])), Truth::True);
        assert_eq!(evaluate(&c, &bind(&[("b", ScenarioValue::Float(0.5))])), Truth::False);
        assert_eq!(evaluate(&c, &bind(&[("a", ScenarioValue::Integer(0))])), Truth::Unknown);
    }

    #[test]
    fn kleene_connectives() {
        let c = parse_condition("x < 0 or mystery(y)", &["x", "y"]);
        assert_eq!(evaluate(&c, &bind(&[("x", ScenarioValue::Integer(-1))])), Truth::True);
        assert_eq!(evaluate(&c, &bind(&[("x", ScenarioValue::Integer(1))])), Truth::Unknown);

        let c = parse_condition("x < 0 and mystery(y)", &["x", "y"]);
        assert_eq!(evaluate(&c, &bind(&[("x", ScenarioValue::Integer(1))])), Truth::False);
    }

    #[test]
    fn null_and_emptiness() {
        let c = parse_condition("s is None", &["s"]);
        assert_eq!(evaluate(&c, &bind(&[("s", ScenarioValue::Null)])), Truth::True);
        assert_eq!(evaluate(&c, &bind(&[("s", ScenarioValue::Text("a".into()))])), Truth::False);

        let c = parse_condition("not s", &["s"]);
        assert_eq!(evaluate(&c, &bind(&[("s", ScenarioValue::Text(String::new()))])), Truth::True);
        assert_eq!(evaluate(&c, &bind(&[("s", ScenarioValue::Collection(3))])), Truth::False);
    }

    #[test]
    fn type_tests() {
        let c = parse_condition("not isinstance(n, int)", &["n"]);
        assert_eq!(evaluate(&c, &bind(&[("n", ScenarioValue::Text("x".into()))])), Truth::True);
        assert_eq!(evaluate(&c, &bind(&[("n", ScenarioValue::Integer(3))])), Truth::False);
        assert_eq!(evaluate(&c, &bind(&[("n", ScenarioValue::Symbolic("any".into()))])), Truth::Unknown);
    }
}
