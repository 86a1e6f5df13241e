//! Boundary value analysis.
//!
//! Numeric parameters are tried at the edges of their declared range and
//! next to every constant they are compared against in a guard. Text and
//! collection parameters tested for emptiness get lengths 0 and 1.
//! Unconstrained numeric parameters fall back to `-1, 0, 1`.

use crate::model::{CallableUnit, Condition, GuardTest, Parameter, RangeOrigin, TypeCategory};

use super::oracle::expected_outcome;
use super::partitions::nominal_inputs;
use super::strategy::{Draft, ScenarioStrategy, StrategyOutcome, UnitContext};
use super::types::{rebind, ScenarioCategory, ScenarioValue};

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPoint {
    pub value: ScenarioValue,
    pub note: String,
}

pub struct BoundaryValueStrategy;

impl ScenarioStrategy for BoundaryValueStrategy {
    fn category(&self) -> ScenarioCategory {
        ScenarioCategory::BoundaryValue
    }

    fn synthesize(&self, ctx: &UnitContext<'_>) -> StrategyOutcome {
        let unit = ctx.unit;
        let nominal = nominal_inputs(unit);
        let mut drafts = Vec::new();
        for param in &unit.parameters {
            for point in boundary_points(unit, param) {
                let mut inputs = nominal.clone();
                rebind(&mut inputs, &param.name, point.value.clone());
                let description = format!("{} = {} ({})", param.name, point.value, point.note);
                let expected = expected_outcome(unit, &inputs);
                drafts.push(Draft::new(description, inputs, expected));
            }
        }
        if drafts.is_empty() {
            return StrategyOutcome::skipped("no numeric or length-bounded parameters");
        }
        StrategyOutcome::drafts(drafts)
    }
}

/// Boundary points of one parameter, ascending and free of duplicates.
pub fn boundary_points(unit: &CallableUnit, param: &Parameter) -> Vec<BoundaryPoint> {
    let guards: Vec<&Condition> = unit
        .error_signals
        .iter()
        .filter_map(|s| s.guard.condition())
        .chain(unit.early_returns.iter().map(|r| &r.guard))
        .collect();
    let mut constants = Vec::new();
    let mut emptiness = false;
    for atom in guards.iter().flat_map(|g| g.atoms()).filter(|a| a.param == param.name) {
        match atom.test {
            GuardTest::Compare { value, .. } => constants.push(value),
            GuardTest::IsEmpty => emptiness = true,
            _ => {}
        }
    }

    match param.type_category {
        TypeCategory::Text if emptiness => vec![
            point(ScenarioValue::Text(String::new()), "empty"),
            point(ScenarioValue::Text("x".to_string()), "single character"),
        ],
        TypeCategory::Collection if emptiness => vec![
            point(ScenarioValue::Collection(0), "empty"),
            point(ScenarioValue::Collection(1), "single element"),
        ],
        TypeCategory::Integer | TypeCategory::FloatingPoint => numeric_points(param, param.type_category, &constants),
        TypeCategory::Unknown if !constants.is_empty() => {
            let category = if constants.iter().all(|c| c.fract() == 0.0) {
                TypeCategory::Integer
            } else {
                TypeCategory::FloatingPoint
            };
            numeric_points(param, category, &constants)
        }
        _ => Vec::new(),
    }
}

fn numeric_points(param: &Parameter, category: TypeCategory, constants: &[f64]) -> Vec<BoundaryPoint> {
    let mut raw: Vec<(f64, String)> = Vec::new();
    let range = param.declared_range.unwrap_or_default();

    if let Some(lo) = range.min {
        raw.push((lo.value, "lower bound".to_string()));
        raw.push((lo.value + 1.0, "just above lower bound".to_string()));
        if lo.origin != RangeOrigin::TypeWidth {
            raw.push((lo.value - 1.0, "just below lower bound".to_string()));
        }
    }
    if let Some(hi) = range.max {
        raw.push((hi.value, "upper bound".to_string()));
        raw.push((hi.value - 1.0, "just below upper bound".to_string()));
        if hi.origin != RangeOrigin::TypeWidth {
            raw.push((hi.value + 1.0, "just above upper bound".to_string()));
        }
    }
    if let (Some(lo), Some(hi)) = (range.min, range.max) {
        let mid = (lo.value + hi.value) / 2.0;
        let mid = if category == TypeCategory::Integer { mid.floor() } else { mid };
        raw.push((mid, "in range".to_string()));
    }
    for &c in constants {
        raw.push((c, format!("guard constant {}", fmt_number(c))));
        raw.push((c - 1.0, format!("below guard constant {}", fmt_number(c))));
        raw.push((c + 1.0, format!("above guard constant {}", fmt_number(c))));
    }
    if raw.is_empty() {
        for v in [-1.0, 0.0, 1.0] {
            raw.push((v, "unconstrained default".to_string()));
        }
    }

    // Values past a type-width bound are not representable.
    let width_min = range.min.filter(|b| b.origin == RangeOrigin::TypeWidth).map(|b| b.value);
    let width_max = range.max.filter(|b| b.origin == RangeOrigin::TypeWidth).map(|b| b.value);

    let mut points: Vec<(f64, BoundaryPoint)> = raw
        .into_iter()
        .filter(|(v, _)| v.is_finite())
        .filter(|(v, _)| width_min.map_or(true, |m| *v >= m) && width_max.map_or(true, |m| *v <= m))
        .map(|(v, note)| {
            let value = ScenarioValue::number(category, v);
            let key = value.as_f64().unwrap_or(v);
            (key, BoundaryPoint { value, note })
        })
        .collect();
    // Stable: the first note recorded for a value is kept.
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.dedup_by(|a, b| a.0 == b.0);
    points.into_iter().map(|(_, p)| p).collect()
}

fn point(value: ScenarioValue, note: &str) -> BoundaryPoint {
    BoundaryPoint {
        value,
        note: note.to_string(),
    }
}

fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
