//! Body scanning: error signals, guarded returns, control-flow hints,
//! complexity and field accesses of one callable unit.
//!
//! The scanner walks the body once, carrying the chain of branch
//! conditions that must hold to reach the current node. A raise or return
//! reached through that chain gets the conjunction as its guard.

use std::collections::BTreeSet;

use tree_sitter::Node;

use super::profile::{text, NodeRole, SyntaxProfile};
use crate::guards::{parse_condition, parse_literal};
use crate::model::{
    Condition, ControlFlowHint, EarlyReturn, ErrorSignal, LiteralValue, SignalGuard, SignalKind,
};

/// Methods that change the receiver they are called on.
const MUTATORS: &[&str] = &[
    "append", "extend", "insert", "remove", "pop", "clear", "push", "add", "put", "set",
    "delete", "update", "discard", "setdefault", "popitem", "sort", "reverse", "push_back",
    "pop_back", "push_front", "pop_front", "emplace_back", "emplace", "erase", "resize",
    "truncate", "drain", "retain", "addAll", "removeAll", "putAll", "offer", "poll",
    "shift", "unshift", "splice", "Add", "Remove", "Clear", "Insert", "Push", "Pop",
    "Enqueue", "Dequeue", "AddRange", "RemoveAt",
];

#[derive(Debug, Clone)]
enum PathStep {
    Holds(String),
    Fails(String),
    /// Reached through something other than an input-decidable branch:
    /// a loop iteration, a switch arm or a catch block.
    Barrier,
}

/// Facts gathered from one body.
#[derive(Debug, Default)]
pub(crate) struct BodyFacts {
    pub signals: Vec<ErrorSignal>,
    pub early_returns: Vec<EarlyReturn>,
    pub hints: BTreeSet<ControlFlowHint>,
    /// Branch points: conditionals, loops, case arms, catch clauses and
    /// short-circuit operators.
    pub decisions: u32,
    pub member_reads: BTreeSet<String>,
    pub member_writes: BTreeSet<String>,
    pub bare_reads: BTreeSet<String>,
    pub bare_writes: BTreeSet<String>,
    /// One entry per `return <expr>`; the literal when the expression is one.
    pub value_returns: Vec<Option<LiteralValue>>,
}

pub(crate) struct BodyScanner<'a, P: SyntaxProfile + ?Sized> {
    profile: &'a P,
    src: &'a [u8],
    unit_name: &'a str,
    params: &'a [&'a str],
    receivers: Vec<&'a str>,
    facts: BodyFacts,
}

impl<'a, P: SyntaxProfile + ?Sized> BodyScanner<'a, P> {
    pub fn new(
        profile: &'a P,
        src: &'a [u8],
        unit_name: &'a str,
        params: &'a [&'a str],
        receiver: Option<&'a str>,
    ) -> Self {
        let mut receivers: Vec<&'a str> = profile.member_prefixes().to_vec();
        if let Some(r) = receiver {
            receivers.push(r);
        }
        Self {
            profile,
            src,
            unit_name,
            params,
            receivers,
            facts: BodyFacts::default(),
        }
    }

    pub fn scan(mut self, body: Node<'_>) -> BodyFacts {
        let mut path = Vec::new();
        self.visit_children(body, &mut path);
        self.facts
    }

    fn visit_children(&mut self, node: Node<'_>, path: &mut Vec<PathStep>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            self.visit(child, path);
        }
    }

    fn visit(&mut self, node: Node<'_>, path: &mut Vec<PathStep>) {
        if let Some(op) = node.child_by_field_name("operator") {
            if matches!(text(op, self.src), "&&" | "||" | "and" | "or") {
                self.facts.decisions += 1;
            }
        }

        match self.profile.role(node, self.src) {
            NodeRole::Function | NodeRole::Lambda | NodeRole::TypeDecl | NodeRole::OwnerScope { .. } => {}
            NodeRole::If {
                condition,
                consequence,
                alternatives,
            } => {
                self.facts.decisions += 1;
                self.facts.hints.insert(ControlFlowHint::HasConditional);
                self.visit(condition, path);
                let cond = text(condition, self.src).to_string();
                let mark = path.len();

                path.push(PathStep::Holds(cond.clone()));
                if let Some(consequence) = consequence {
                    self.visit(consequence, path);
                }
                path.truncate(mark);

                path.push(PathStep::Fails(cond));
                for alt in alternatives {
                    // `elif` arms are siblings: each one also excludes the
                    // arms before it.
                    let elif = match self.profile.role(alt, self.src) {
                        NodeRole::If { condition, .. } => Some(text(condition, self.src).to_string()),
                        _ => None,
                    };
                    self.visit(alt, path);
                    if let Some(c) = elif {
                        path.push(PathStep::Fails(c));
                    }
                }
                path.truncate(mark);
            }
            NodeRole::Loop => {
                self.facts.decisions += 1;
                self.facts.hints.insert(ControlFlowHint::HasLoop);
                self.visit_behind_barrier(node, path);
            }
            NodeRole::Switch => {
                self.facts.hints.insert(ControlFlowHint::HasConditional);
                self.visit_behind_barrier(node, path);
            }
            NodeRole::CaseArm => {
                self.facts.decisions += 1;
                self.visit_children(node, path);
            }
            NodeRole::Ternary => {
                self.facts.decisions += 1;
                self.facts.hints.insert(ControlFlowHint::HasConditional);
                self.visit_children(node, path);
            }
            NodeRole::Catch => {
                self.facts.decisions += 1;
                self.visit_behind_barrier(node, path);
            }
            NodeRole::Raise { name } => {
                self.signal(SignalKind::Throw, name, node, path);
            }
            NodeRole::Assert { condition, name } => {
                path.push(PathStep::Fails(condition));
                self.signal(SignalKind::Assertion, name, node, path);
                path.pop();
            }
            NodeRole::ErrorReturn { name } => {
                self.signal(SignalKind::ErrorReturn, name, node, path);
            }
            NodeRole::Return { value } => self.visit_return(node, value, path),
            NodeRole::Call { name, receiver } => {
                let on_self = receiver.map_or(true, |r| self.receivers.contains(&text(r, self.src)));
                if name == self.unit_name && on_self {
                    self.facts.hints.insert(ControlFlowHint::HasRecursion);
                }
                if let Some(receiver) = receiver {
                    if MUTATORS.contains(&name.as_str()) {
                        self.record_write(receiver);
                    }
                }
                self.visit_children(node, path);
            }
            NodeRole::Assign { target, compound } => {
                self.record_write(target);
                if compound {
                    self.visit(target, path);
                }
                let mut cursor = node.walk();
                let rest: Vec<Node<'_>> = node.children(&mut cursor).filter(|c| c.id() != target.id()).collect();
                for child in rest {
                    self.visit(child, path);
                }
            }
            NodeRole::Member { .. } => match self.field_of(node) {
                Some(field) => {
                    self.facts.member_reads.insert(field);
                }
                None => self.visit_children(node, path),
            },
            NodeRole::Index { .. } => self.visit_children(node, path),
            NodeRole::Other => {
                if self.profile.implicit_members() && node.kind() == "identifier" {
                    self.facts.bare_reads.insert(text(node, self.src).to_string());
                }
                self.visit_children(node, path);
            }
        }
    }

    fn visit_behind_barrier(&mut self, node: Node<'_>, path: &mut Vec<PathStep>) {
        path.push(PathStep::Barrier);
        self.visit_children(node, path);
        path.pop();
    }

    fn visit_return(&mut self, node: Node<'_>, value: Option<Node<'_>>, path: &mut Vec<PathStep>) {
        if let Some(v) = value {
            if let NodeRole::ErrorReturn { name } = self.profile.role(v, self.src) {
                self.signal(SignalKind::ErrorReturn, name, node, path);
                return;
            }
        }
        let literal = value.and_then(|v| parse_literal(text(v, self.src)));
        if value.is_some() {
            self.facts.value_returns.push(literal.clone());
        }
        if !path.is_empty() {
            self.facts.hints.insert(ControlFlowHint::HasEarlyReturn);
            if let Some(guard) = self.condition_of(path) {
                self.facts.early_returns.push(EarlyReturn {
                    guard,
                    value: literal,
                    line: node.start_position().row as u32 + 1,
                });
            }
        }
        if let Some(v) = value {
            self.visit(v, path);
        }
    }

    fn signal(&mut self, kind: SignalKind, name: String, node: Node<'_>, path: &[PathStep]) {
        let guard = if path.iter().any(|s| matches!(s, PathStep::Barrier)) {
            SignalGuard::Undetermined
        } else {
            match self.condition_of(path) {
                Some(condition) => SignalGuard::Condition { condition },
                None => SignalGuard::Unconditional,
            }
        };
        self.facts.signals.push(ErrorSignal {
            kind,
            name,
            guard,
            line: node.start_position().row as u32 + 1,
        });
    }

    /// Conjunction of the path, or `None` for an empty path or one that
    /// crosses a barrier.
    fn condition_of(&self, path: &[PathStep]) -> Option<Condition> {
        if path.is_empty() {
            return None;
        }
        let mut terms = Vec::with_capacity(path.len());
        for step in path {
            match step {
                PathStep::Holds(t) => terms.push(parse_condition(t, self.params)),
                PathStep::Fails(t) => terms.push(parse_condition(t, self.params).negate()),
                PathStep::Barrier => return None,
            }
        }
        Some(Condition::all(terms))
    }

    fn record_write(&mut self, target: Node<'_>) {
        if let Some(field) = self.field_of(target) {
            self.facts.member_writes.insert(field);
            return;
        }
        let mut node = target;
        while let NodeRole::Index { object } = self.profile.role(node, self.src) {
            node = object;
        }
        if node.kind() == "identifier" {
            self.facts.bare_writes.insert(text(node, self.src).to_string());
        }
    }

    /// The owning-instance field a member expression starts from:
    /// `self.items[0].name` -> `items`.
    fn field_of(&self, node: Node<'_>) -> Option<String> {
        let mut current = node;
        let mut candidate: Option<String>;
        loop {
            match self.profile.role(current, self.src) {
                NodeRole::Member { object, property } => {
                    candidate = Some(property);
                    current = object;
                }
                NodeRole::Index { object } => {
                    candidate = None;
                    current = object;
                }
                _ => break,
            }
            if self.receivers.contains(&text(current, self.src)) {
                return candidate.filter(|c| !c.is_empty());
            }
        }
        None
    }
}
