//! Composable predicates over platform facts and collected answers.
//!
//! `And`/`Or` short-circuit; an empty `And` is true and an empty `Or` is
//! false. `System` fields compare with exact equality or glob (`*`).
//! `Variable` resolves from answers first, then platform facts, and
//! supports existence, equality, containment, regex, and numeric
//! comparison operators. A regex that fails to compile is an error, never
//! a silent false.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::setup::error::SetupError;
use crate::setup::state::SetupState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    System(SystemCondition),
    Variable(VariableCondition),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SystemCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_desktop: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCondition {
    pub name: String,
    pub operator: VarOperator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarOperator {
    Exists,
    NotExists,
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Matches,
    NotMatches,
    GreaterThan,
    LessThan,
}

/// Evaluate a condition tree against the current state.
pub fn evaluate(condition: &Condition, state: &SetupState) -> Result<bool, SetupError> {
    match condition {
        Condition::And(children) => {
            for child in children {
                if !evaluate(child, state)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(children) => {
            for child in children {
                if evaluate(child, state)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Condition::Not(child) => Ok(!evaluate(child, state)?),
        Condition::System(system) => evaluate_system(system, state),
        Condition::Variable(variable) => evaluate_variable(variable, state),
    }
}

fn evaluate_system(condition: &SystemCondition, state: &SetupState) -> Result<bool, SetupError> {
    let system = &state.system;
    let checks = [
        (&condition.os, &system.os),
        (&condition.distribution, &system.distribution),
        (&condition.desktop, &system.desktop),
        (&condition.arch, &system.arch),
    ];
    for (pattern, actual) in checks {
        if let Some(pattern) = pattern {
            if !glob_match(pattern, actual)? {
                return Ok(false);
            }
        }
    }
    if let Some(expected) = condition.has_desktop {
        if system.has_desktop() != expected {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Exact equality, or a regex match when the pattern carries `*`.
fn glob_match(pattern: &str, actual: &str) -> Result<bool, SetupError> {
    if !pattern.contains('*') {
        return Ok(pattern.eq_ignore_ascii_case(actual));
    }
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    let re = regex::Regex::new(&format!("(?i)^{}$", escaped)).map_err(|source| {
        SetupError::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        }
    })?;
    Ok(re.is_match(actual))
}

fn evaluate_variable(
    condition: &VariableCondition,
    state: &SetupState,
) -> Result<bool, SetupError> {
    let target = state.lookup(&condition.name);

    match condition.operator {
        VarOperator::Exists => Ok(value_exists(target)),
        VarOperator::NotExists => Ok(!value_exists(target)),
        VarOperator::Equals => Ok(canonical(target) == canonical(Some(&condition.value))),
        VarOperator::NotEquals => Ok(canonical(target) != canonical(Some(&condition.value))),
        VarOperator::Contains => Ok(contains(target, &condition.value)),
        VarOperator::NotContains => Ok(!contains(target, &condition.value)),
        VarOperator::Matches => matches(target, &condition.value),
        VarOperator::NotMatches => matches(target, &condition.value).map(|m| !m),
        VarOperator::GreaterThan => {
            numeric_compare(condition, target).map(|(lhs, rhs)| lhs > rhs)
        }
        VarOperator::LessThan => {
            numeric_compare(condition, target).map(|(lhs, rhs)| lhs < rhs)
        }
    }
}

/// Nil and the empty string count as non-existent.
fn value_exists(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Canonical string form used by equality and containment checks.
pub fn canonical(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

/// Slice membership by string equality, or substring for scalars.
fn contains(target: Option<&Value>, needle: &Value) -> bool {
    let needle = canonical(Some(needle));
    match target {
        Some(Value::Array(items)) => items.iter().any(|item| canonical(Some(item)) == needle),
        Some(scalar) => canonical(Some(scalar)).contains(&needle),
        None => false,
    }
}

fn matches(target: Option<&Value>, pattern: &Value) -> Result<bool, SetupError> {
    let pattern = canonical(Some(pattern));
    let re = regex::Regex::new(&pattern).map_err(|source| SetupError::InvalidRegex {
        pattern: pattern.clone(),
        source,
    })?;
    Ok(re.is_match(&canonical(target)))
}

fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Both sides must coerce to a float (int, float, or numeric string).
fn numeric_compare(
    condition: &VariableCondition,
    target: Option<&Value>,
) -> Result<(f64, f64), SetupError> {
    let lhs = target.and_then(to_f64).ok_or_else(|| {
        SetupError::NonNumericComparison {
            variable: condition.name.clone(),
            value: canonical(target),
        }
    })?;
    let rhs = to_f64(&condition.value).ok_or_else(|| SetupError::NonNumericComparison {
        variable: condition.name.clone(),
        value: canonical(Some(&condition.value)),
    })?;
    Ok((lhs, rhs))
}
