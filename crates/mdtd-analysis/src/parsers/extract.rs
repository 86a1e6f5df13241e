//! Shared extraction driver: parse with the profile's grammar, collect
//! units and types, then resolve fields and infer parameter types.

use std::collections::{BTreeMap, BTreeSet};

use mdtd_core::errors::{AdapterError, MdtdErrorCode};
use tree_sitter::{Node, Parser};

use super::body::{BodyFacts, BodyScanner};
use super::error_tolerant::syntax_regions;
use super::profile::{base_type_name, line_of, NodeRole, RawParam, ReturnDecl, SyntaxProfile};
use crate::guards::parse_literal;
use crate::model::{
    classify_type, is_void_type, AccessMode, CallableUnit, CompareOp, ErrorSignal, FieldAccess,
    FieldModel, GuardTest, LiteralValue, NumericRange, ParseFailure, Parameter, RangeOrigin,
    SignalGuard, SignalKind, SourceUnit, TypeCategory, TypeModel, UnitKind,
};
use crate::scanner::hasher::hash_hex;
use crate::scanner::Language;

/// Parse `source` with `profile` and build the file's model.
pub(crate) fn extract<P: SyntaxProfile + ?Sized>(
    profile: &P,
    path: &str,
    source: &str,
) -> Result<SourceUnit, ParseFailure> {
    let language = profile.language();
    let hash = hash_hex(source.as_bytes());

    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&profile.grammar(path)) {
        let err = AdapterError::GrammarLoad {
            language: language.name().to_string(),
            message: e.to_string(),
        };
        tracing::warn!(path, error = %err, "grammar could not be loaded");
        return Err(ParseFailure::whole_file(path, language, hash, err.coded_message()));
    }
    let Some(tree) = parser.parse(source, None) else {
        return Err(ParseFailure::whole_file(path, language, hash, "parser produced no syntax tree"));
    };
    let root = tree.root_node();

    let mut collector = Collector {
        profile,
        src: source.as_bytes(),
        language,
        pending: Vec::new(),
        types: BTreeMap::new(),
    };
    let mut owners = Vec::new();
    collector.walk(root, &mut owners);

    if root.has_error() {
        let regions = syntax_regions(root);
        if let Some(first) = regions.first() {
            recover_after(&mut collector, &mut parser, source, first.start_line);
        }
        let model = collector.finish(path, hash);
        tracing::debug!(path, regions = regions.len(), units = model.units.len(), "partial parse");
        return Err(ParseFailure {
            path: path.to_string(),
            language,
            partial: model,
            regions,
        });
    }
    Ok(collector.finish(path, hash))
}

const MAX_RECOVERY_PASSES: usize = 32;

/// Reparse the text from each later top-level line with everything before
/// it blanked out, so declarations that follow a broken region are still
/// recognized. Offsets and line numbers are unchanged by the blanking.
fn recover_after<P: SyntaxProfile + ?Sized>(
    collector: &mut Collector<'_, P>,
    parser: &mut Parser,
    source: &str,
    error_line: u32,
) {
    let mut after = error_line;
    for _ in 0..MAX_RECOVERY_PASSES {
        let Some((line, offset)) = next_top_level_line(source, after) else {
            break;
        };
        let Some(tree) = parser.parse(blank_before(source, offset), None) else {
            break;
        };
        let root = tree.root_node();
        let mut owners = Vec::new();
        collector.walk(root, &mut owners);
        if !root.has_error() {
            break;
        }
        let next_error = syntax_regions(root).first().map_or(line, |r| r.start_line);
        after = next_error.max(line);
    }
}

/// First line after `after` (1-based) that starts at column 0 with
/// something other than a closing bracket, with its byte offset.
fn next_top_level_line(source: &str, after: u32) -> Option<(u32, usize)> {
    let mut offset = 0;
    for (index, line) in source.split_inclusive('\n').enumerate() {
        let number = index as u32 + 1;
        let starts_declaration = line
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '}' | ')' | ']'));
        if number > after && starts_declaration {
            return Some((number, offset));
        }
        offset += line.len();
    }
    None
}

fn blank_before(source: &str, offset: usize) -> String {
    let (head, tail) = source.split_at(offset);
    let mut out = String::with_capacity(source.len());
    out.extend(head.bytes().map(|b| if b == b'\n' || b == b'\r' { b as char } else { ' ' }));
    out.push_str(tail);
    out
}

struct PendingUnit {
    unit: CallableUnit,
    facts: BodyFacts,
    returns: ReturnDecl,
    declared_errors: Vec<String>,
    raw_params: Vec<RawParam>,
}

struct Collector<'a, P: SyntaxProfile + ?Sized> {
    profile: &'a P,
    src: &'a [u8],
    language: Language,
    pending: Vec<PendingUnit>,
    types: BTreeMap<String, TypeModel>,
}

impl<'a, P: SyntaxProfile + ?Sized> Collector<'a, P> {
    fn walk(&mut self, node: Node<'_>, owners: &mut Vec<String>) {
        match self.profile.role(node, self.src) {
            NodeRole::Function => {
                // Units with broken syntax are dropped; the region is
                // reported by the caller.
                if !node.has_error() {
                    self.collect_unit(node, owners.last().map(String::as_str));
                }
            }
            NodeRole::Lambda => {}
            NodeRole::TypeDecl => {
                let Some(header) = self.profile.type_header(node, self.src) else {
                    self.walk_children(node, owners);
                    return;
                };
                let fields = header
                    .fields
                    .iter()
                    .map(|f| FieldModel {
                        name: f.name.clone(),
                        type_category: f
                            .type_text
                            .as_deref()
                            .map_or(TypeCategory::Unknown, |t| classify_type(self.language, t).category),
                        declared_type: f.type_text.clone(),
                    })
                    .collect();
                let entry = self.types.entry(header.name.clone()).or_insert_with(|| TypeModel {
                    name: header.name.clone(),
                    kind: header.kind,
                    fields: Vec::new(),
                    methods: Vec::new(),
                    bases: Vec::new(),
                    line: line_of(node),
                });
                merge_fields(&mut entry.fields, fields);
                for base in header.bases {
                    if !entry.bases.contains(&base) {
                        entry.bases.push(base);
                    }
                }
                if let Some(body) = header.body {
                    owners.push(header.name);
                    self.walk_children(body, owners);
                    owners.pop();
                }
            }
            NodeRole::OwnerScope { name } => {
                owners.push(name);
                self.walk_children(node, owners);
                owners.pop();
            }
            _ => self.walk_children(node, owners),
        }
    }

    fn walk_children(&mut self, node: Node<'_>, owners: &mut Vec<String>) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            self.walk(child, owners);
        }
    }

    fn collect_unit(&mut self, node: Node<'_>, enclosing: Option<&str>) {
        let Some(header) = self.profile.function_header(node, self.src, enclosing) else {
            return;
        };
        let line = line_of(node);
        if self.pending.iter().any(|p| p.unit.line == line && p.unit.name == header.name) {
            return;
        }
        let Some(body) = header.body else {
            return;
        };
        let owner = header.owner.clone().or_else(|| enclosing.map(str::to_string));

        let param_names: Vec<&str> = header.params.iter().map(|p| p.name.as_str()).collect();
        let facts = BodyScanner::new(self.profile, self.src, &header.name, &param_names, header.receiver.as_deref())
            .scan(body);

        let kind = match header.kind {
            UnitKind::Constructor => UnitKind::Constructor,
            _ if owner.is_some() => UnitKind::Method,
            other => other,
        };
        let parameters = header.params.iter().map(|p| self.parameter(p)).collect();
        let end = node.end_position().row as u32 + 1;

        let unit = CallableUnit {
            name: header.name.clone(),
            kind,
            owning_type: owner,
            parameters,
            return_type: None,
            error_signals: Vec::new(),
            early_returns: Vec::new(),
            control_flow_hints: BTreeSet::new(),
            field_accesses: BTreeSet::new(),
            visibility: header.visibility,
            is_static: header.is_static,
            is_async: header.is_async,
            complexity: 1,
            line,
            end_line: end,
        };
        self.pending.push(PendingUnit {
            unit,
            facts,
            returns: header.returns,
            declared_errors: header.declared_errors,
            raw_params: header.params,
        });
    }

    fn parameter(&self, raw: &RawParam) -> Parameter {
        let mut param = Parameter::new(&raw.name, TypeCategory::Unknown);
        param.default_value = raw.default_text.clone();
        param.variadic = raw.variadic;
        if let Some(ty) = &raw.type_text {
            let info = classify_type(self.language, ty);
            param.type_category = info.category;
            param.nullable = info.nullable;
            param.declared_range = info.range;
            param.declared_type = Some(ty.clone());
        }
        if raw.variadic {
            param.type_category = TypeCategory::Collection;
            param.declared_range = None;
        }
        if let Some(range) = annotation_range(&raw.annotations, param.type_category) {
            param.declared_range = Some(match param.declared_range {
                Some(width) => width.narrowed(&range),
                None => range,
            });
        }
        param
    }

    fn finish(self, path: &str, hash: String) -> SourceUnit {
        let Collector {
            profile,
            language,
            mut pending,
            mut types,
            ..
        } = self;
        pending.sort_by_key(|p| p.unit.line);

        // Methods per owner, and fields that come into being by assignment.
        let mut methods: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for p in &pending {
            if let Some(owner) = &p.unit.owning_type {
                methods.entry(owner.clone()).or_default().push(p.unit.name.clone());
                if profile.fields_from_writes() {
                    if let Some(ty) = types.get_mut(owner) {
                        let written = p.facts.member_writes.iter().map(|w| FieldModel {
                            name: w.clone(),
                            type_category: TypeCategory::Unknown,
                            declared_type: None,
                        });
                        merge_fields(&mut ty.fields, written.collect());
                    }
                }
            }
        }
        for (owner, names) in &methods {
            if let Some(ty) = types.get_mut(owner) {
                ty.methods = names.clone();
            }
        }

        let units = pending
            .into_iter()
            .map(|p| finish_unit(p, language, &types, &methods))
            .collect();

        SourceUnit {
            path: path.to_string(),
            language,
            content_hash: hash,
            units,
            types,
        }
    }
}

fn merge_fields(into: &mut Vec<FieldModel>, new: Vec<FieldModel>) {
    for field in new {
        if !into.iter().any(|f| f.name == field.name) {
            into.push(field);
        }
    }
}

fn finish_unit(
    pending: PendingUnit,
    language: Language,
    types: &BTreeMap<String, TypeModel>,
    methods: &BTreeMap<String, Vec<String>>,
) -> CallableUnit {
    let PendingUnit {
        mut unit,
        facts,
        returns,
        declared_errors,
        raw_params,
    } = pending;

    unit.complexity = 1 + facts.decisions;
    unit.control_flow_hints = facts.hints;
    unit.early_returns = facts.early_returns;
    unit.error_signals = facts.signals;

    // Signature-declared errors with no raise site of the same name.
    for declared in declared_errors {
        let raised = unit
            .error_signals
            .iter()
            .any(|s| s.name == declared || base_type_name(&s.name).ends_with(&declared));
        if !raised {
            unit.error_signals.push(ErrorSignal {
                kind: SignalKind::Declared,
                name: declared,
                guard: SignalGuard::Undetermined,
                line: unit.line,
            });
        }
    }

    unit.return_type = match returns {
        ReturnDecl::Void => None,
        ReturnDecl::Declared(t) if is_void_type(&t) => None,
        ReturnDecl::Declared(t) => Some(classify_type(language, &t).category),
        ReturnDecl::Unspecified => infer_return(&facts.value_returns),
    };

    if let Some(owner) = unit.owning_type.clone() {
        let own_methods = methods.get(&owner);
        let is_method = |name: &str| own_methods.is_some_and(|m| m.iter().any(|n| n == name));
        let ty = types.get(&owner);
        let params: Vec<&str> = raw_params.iter().map(|p| p.name.as_str()).collect();
        let mut accesses = BTreeSet::new();

        for field in &facts.member_reads {
            if !is_method(field) {
                accesses.insert(FieldAccess { field: field.clone(), mode: AccessMode::Read });
            }
        }
        for field in &facts.member_writes {
            accesses.insert(FieldAccess { field: field.clone(), mode: AccessMode::Write });
        }
        if let Some(ty) = ty {
            let implicit = |name: &String| ty.has_field(name) && !params.contains(&name.as_str());
            for field in facts.bare_reads.iter().filter(|n| implicit(n)) {
                accesses.insert(FieldAccess { field: field.clone(), mode: AccessMode::Read });
            }
            for field in facts.bare_writes.iter().filter(|n| implicit(n)) {
                accesses.insert(FieldAccess { field: field.clone(), mode: AccessMode::Write });
            }
        }
        unit.field_accesses = accesses;
    }

    infer_parameters(&mut unit, &raw_params);
    unit
}

fn infer_return(values: &[Option<LiteralValue>]) -> Option<TypeCategory> {
    if values.is_empty() {
        return None;
    }
    let mut seen: Option<TypeCategory> = None;
    for v in values {
        let cat = match v {
            Some(LiteralValue::Integer(_)) => TypeCategory::Integer,
            Some(LiteralValue::Float(_)) => TypeCategory::FloatingPoint,
            Some(LiteralValue::Text(_)) => TypeCategory::Text,
            Some(LiteralValue::Boolean(_)) => TypeCategory::Boolean,
            Some(LiteralValue::Null) => continue,
            None => return Some(TypeCategory::Unknown),
        };
        match seen {
            None => seen = Some(cat),
            Some(prev) if prev == cat => {}
            Some(_) => return Some(TypeCategory::Unknown),
        }
    }
    Some(seen.unwrap_or(TypeCategory::Unknown))
}

/// Fill in types of untyped parameters from defaults and guard usage, mark
/// nullability seen in guards, and narrow numeric ranges by error guards.
fn infer_parameters(unit: &mut CallableUnit, raw: &[RawParam]) {
    let signal_atoms: Vec<(String, GuardTest, bool)> = unit
        .error_signals
        .iter()
        .filter_map(|s| s.guard.condition())
        .chain(unit.early_returns.iter().map(|r| &r.guard))
        .flat_map(|c| c.atoms())
        .map(|a| (a.param.clone(), a.test.clone(), a.negated))
        .collect();

    for (param, raw) in unit.parameters.iter_mut().zip(raw) {
        if raw.type_text.is_none() && !raw.variadic {
            if let Some(cat) = raw.default_text.as_deref().and_then(category_of_default) {
                param.type_category = cat;
            } else if let Some(cat) = category_from_usage(&param.name, &signal_atoms) {
                param.type_category = cat;
            }
            if raw.default_text.as_deref().and_then(parse_literal) == Some(LiteralValue::Null) {
                param.nullable = true;
            }
        }
        if signal_atoms
            .iter()
            .any(|(p, t, _)| p == &param.name && matches!(t, GuardTest::IsNull))
        {
            param.nullable = true;
        }
    }

    for signal in &unit.error_signals {
        let Some(condition) = signal.guard.condition() else {
            continue;
        };
        for disjunct in condition.disjuncts() {
            let crate::model::Condition::Atom(atom) = disjunct else {
                continue;
            };
            let GuardTest::Compare { op, value } = atom.test else {
                continue;
            };
            let Some(param) = unit.parameters.iter_mut().find(|p| p.name == atom.param) else {
                continue;
            };
            if !param.type_category.is_numeric() {
                continue;
            }
            if let Some(range) = guard_range(op, value, param.type_category == TypeCategory::Integer) {
                let narrowed = match param.declared_range {
                    Some(existing) => existing.narrowed(&range),
                    None => range,
                };
                if narrowed.is_consistent() {
                    param.declared_range = Some(narrowed);
                }
            }
        }
    }
}

/// Valid range implied by an error guard `param <op> value` that raises.
fn guard_range(op: CompareOp, value: f64, integral: bool) -> Option<NumericRange> {
    let step = if integral { 1.0 } else { 0.0 };
    let (min, max) = match op {
        CompareOp::Lt => (Some(value), None),
        CompareOp::Le => (Some(value + step), None),
        CompareOp::Gt => (None, Some(value)),
        CompareOp::Ge => (None, Some(value - step)),
        CompareOp::Eq | CompareOp::Ne => return None,
    };
    Some(NumericRange::new(min, max, RangeOrigin::Guard))
}

fn category_of_default(text: &str) -> Option<TypeCategory> {
    let t = text.trim();
    if t.starts_with('[') || t.starts_with('{') || t.starts_with("()") || t.starts_with("new Array") {
        return Some(TypeCategory::Collection);
    }
    match parse_literal(t)? {
        LiteralValue::Integer(_) => Some(TypeCategory::Integer),
        LiteralValue::Float(_) => Some(TypeCategory::FloatingPoint),
        LiteralValue::Text(_) => Some(TypeCategory::Text),
        LiteralValue::Boolean(_) => Some(TypeCategory::Boolean),
        LiteralValue::Null => None,
    }
}

fn category_from_usage(name: &str, atoms: &[(String, GuardTest, bool)]) -> Option<TypeCategory> {
    let mut numeric: Option<TypeCategory> = None;
    for (_, test, _) in atoms.iter().filter(|(p, _, _)| p == name) {
        match test {
            GuardTest::IsInstance { categories } => {
                if categories.contains(&TypeCategory::FloatingPoint) {
                    return Some(TypeCategory::FloatingPoint);
                }
                if let Some(first) = categories.first() {
                    return Some(*first);
                }
            }
            GuardTest::EqualsText { .. } => return Some(TypeCategory::Text),
            GuardTest::Compare { value, .. } => {
                let cat = if value.fract() == 0.0 {
                    TypeCategory::Integer
                } else {
                    TypeCategory::FloatingPoint
                };
                numeric = match numeric {
                    Some(TypeCategory::FloatingPoint) => Some(TypeCategory::FloatingPoint),
                    _ => Some(cat),
                };
            }
            _ => {}
        }
    }
    numeric
}

/// Range from validation annotations: `@Min(0)`, `@Max(100)`, `@Positive`,
/// `@PositiveOrZero`, `@Negative`, `@NegativeOrZero`, `@Range(min = 1, max = 9)`, `[Range(0, 9)]`.
fn annotation_range(annotations: &[String], category: TypeCategory) -> Option<NumericRange> {
    if !category.is_numeric() {
        return None;
    }
    let step: f64 = if category == TypeCategory::Integer { 1.0 } else { 0.0 };
    let mut min: Option<f64> = None;
    let mut max: Option<f64> = None;
    for ann in annotations {
        let (name, args) = match ann.find('(') {
            Some(i) => (ann[..i].trim(), ann[i + 1..].trim_end_matches(')').trim()),
            None => (ann.trim(), ""),
        };
        let number = |s: &str| match parse_literal(s.trim().trim_matches('"')) {
            Some(LiteralValue::Integer(i)) => Some(i as f64),
            Some(LiteralValue::Float(f)) => Some(f),
            _ => None,
        };
        let named = |key: &str| {
            args.split(',')
                .filter_map(|kv| kv.split_once('='))
                .find(|(k, _)| k.trim() == key)
                .and_then(|(_, v)| number(v))
        };
        match last_word(name) {
            "Min" | "DecimalMin" => min = named("value").or_else(|| number(args)).or(min),
            "Max" | "DecimalMax" => max = named("value").or_else(|| number(args)).or(max),
            "Positive" => min = Some(step.max(f64::MIN_POSITIVE)),
            "PositiveOrZero" => min = Some(0.0),
            "Negative" => max = Some(-step.max(f64::MIN_POSITIVE)),
            "NegativeOrZero" => max = Some(0.0),
            "Range" => {
                let positional: Vec<&str> = args.split(',').filter(|a| !a.contains('=')).collect();
                min = named("min").or_else(|| positional.first().and_then(|a| number(*a))).or(min);
                max = named("max").or_else(|| positional.get(1).and_then(|a| number(*a))).or(max);
            }
            _ => {}
        }
    }
    let range = NumericRange::new(min, max, RangeOrigin::Annotation);
    (!range.is_open()).then_some(range)
}

fn last_word(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
