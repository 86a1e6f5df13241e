//! Guard-condition interpretation.
//!
//! Conditions are read from source text, not from a grammar, so one parser
//! serves every language. It recognizes the comparison and predicate idioms
//! that constrain parameters (`b == 0`, `x is None`, `len(s) == 0`,
//! `isinstance(a, int)`, `typeof v !== "number"`, `name.isEmpty()`) and
//! leaves anything else opaque.

mod lexer;
pub mod literal;
mod parser;

pub use literal::{parse_literal, parse_number};
pub use parser::parse_condition;
