//! Search filter expressions
//!
//! Attribute filters narrow a vector store search to files whose attributes
//! satisfy a predicate tree.
//!
//! ## Filter Types
//!
//! - **Comparison**: tests one attribute `key` with an operator against a value
//! - **Compound**: `and` / `or` over a non-empty list of nested filters
//!
//! ## Example
//!
//! ```rust,ignore
//! let filter = json!({
//!     "type": "and",
//!     "filters": [
//!         { "type": "eq", "key": "region", "value": "eu" },
//!         { "type": "gte", "key": "year", "value": 2020 }
//!     ]
//! });
//! assert!(validate_filter(&filter));
//! let expr = FilterExpression::from_value(&filter)?;
//! ```
//!
//! Nesting depth is not capped here.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use thiserror::Error;

/// Message returned by [`explain_filter`] when no specific rule is violated
pub const GENERIC_FILTER_MESSAGE: &str = "invalid filter expression";

// ============================================================================
// Operators
// ============================================================================

/// Leaf comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 6] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Typed Expression
// ============================================================================

/// Scalar value a comparison can test against
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterPrimitive {
    String(String),
    Number(Number),
    Bool(bool),
}

impl FilterPrimitive {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }

    fn kind(&self) -> PrimitiveKind {
        match self {
            Self::String(_) => PrimitiveKind::String,
            Self::Number(_) => PrimitiveKind::Number,
            Self::Bool(_) => PrimitiveKind::Bool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimitiveKind {
    String,
    Number,
    Bool,
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Scalar(FilterPrimitive),
    /// Non-empty, all elements of the same primitive kind
    List(Vec<FilterPrimitive>),
}

/// Leaf filter node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonFilter {
    #[serde(rename = "type")]
    pub op: ComparisonOperator,
    pub key: String,
    pub value: FilterValue,
}

/// AND/OR node over nested filters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompoundFilter {
    #[serde(rename = "type")]
    pub op: LogicalOperator,
    pub filters: Vec<FilterExpression>,
}

/// A validated filter tree.
///
/// Only obtainable through [`FilterExpression::from_value`] (or `Deserialize`,
/// which routes through it), so every instance satisfies the filter rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterExpression {
    Comparison(ComparisonFilter),
    Compound(CompoundFilter),
}

impl FilterExpression {
    /// Validate and convert an untyped payload
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        parse_node(value)
    }

    /// Render back to the wire shape
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl<'de> Deserialize<'de> for FilterExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Violations
// ============================================================================

/// A single violated filter rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterViolation {
    #[error("filter must be an object")]
    NotObject,

    #[error("filter must have a string 'type' field")]
    MissingType,

    #[error("unsupported filter type '{0}'; expected one of and, or, eq, ne, gt, gte, lt, lte")]
    UnknownType(String),

    #[error("compound filter 'filters' must be an array")]
    FiltersNotArray,

    #[error("compound filter 'filters' must not be empty")]
    EmptyFilters,

    #[error("comparison filter 'key' must be a non-empty string")]
    InvalidKey,

    #[error("comparison filter 'value' must not be null or missing")]
    MissingValue,

    #[error("comparison filter 'value' must be a string, number, boolean or array of them")]
    InvalidValue,

    #[error("comparison filter 'value' array must not be empty")]
    EmptyValueList,

    #[error("comparison filter 'value' array must contain only strings, numbers or booleans")]
    NonPrimitiveListItem,

    #[error("comparison filter 'value' array must not mix value types")]
    MixedValueList,
}

/// First violation found, with the position of the offending node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterError {
    /// Indices into successive `filters` arrays, outermost first
    pub path: Vec<usize>,
    pub violation: FilterViolation,
}

impl FilterError {
    fn at_root(violation: FilterViolation) -> Self {
        Self {
            path: Vec::new(),
            violation,
        }
    }

    fn nested(mut self, index: usize) -> Self {
        self.path.insert(0, index);
        self
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.violation);
        }
        let path: Vec<String> = self.path.iter().map(|i| format!("filters[{i}]")).collect();
        write!(f, "{}: {}", path.join("."), self.violation)
    }
}

impl std::error::Error for FilterError {}

// ============================================================================
// Recursive Descent
// ============================================================================

fn parse_node(value: &Value) -> Result<FilterExpression, FilterError> {
    let obj = value
        .as_object()
        .ok_or_else(|| FilterError::at_root(FilterViolation::NotObject))?;

    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| FilterError::at_root(FilterViolation::MissingType))?;

    if let Some(op) = LogicalOperator::parse(ty) {
        return parse_compound(op, obj).map(FilterExpression::Compound);
    }

    match ComparisonOperator::parse(ty) {
        Some(op) => parse_comparison(op, obj)
            .map(FilterExpression::Comparison)
            .map_err(FilterError::at_root),
        None => Err(FilterError::at_root(FilterViolation::UnknownType(
            ty.to_string(),
        ))),
    }
}

fn parse_compound(op: LogicalOperator, obj: &Map<String, Value>) -> Result<CompoundFilter, FilterError> {
    let children = obj
        .get("filters")
        .and_then(Value::as_array)
        .ok_or_else(|| FilterError::at_root(FilterViolation::FiltersNotArray))?;

    // Vacuous truth does not apply: an empty combinator is an error in itself.
    if children.is_empty() {
        return Err(FilterError::at_root(FilterViolation::EmptyFilters));
    }

    let mut filters = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        filters.push(parse_node(child).map_err(|e| e.nested(index))?);
    }

    Ok(CompoundFilter { op, filters })
}

fn parse_comparison(
    op: ComparisonOperator,
    obj: &Map<String, Value>,
) -> Result<ComparisonFilter, FilterViolation> {
    let key = match obj.get("key").and_then(Value::as_str) {
        Some(k) if !k.is_empty() => k.to_string(),
        _ => return Err(FilterViolation::InvalidKey),
    };

    let value = match obj.get("value") {
        None | Some(Value::Null) => return Err(FilterViolation::MissingValue),
        Some(Value::Array(items)) => FilterValue::List(parse_list(items)?),
        Some(other) => {
            FilterValue::Scalar(FilterPrimitive::from_json(other).ok_or(FilterViolation::InvalidValue)?)
        }
    };

    Ok(ComparisonFilter { op, key, value })
}

fn parse_list(items: &[Value]) -> Result<Vec<FilterPrimitive>, FilterViolation> {
    if items.is_empty() {
        return Err(FilterViolation::EmptyValueList);
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let primitive = FilterPrimitive::from_json(item).ok_or(FilterViolation::NonPrimitiveListItem)?;
        if let Some(first) = out.first() {
            if FilterPrimitive::kind(first) != primitive.kind() {
                return Err(FilterViolation::MixedValueList);
            }
        }
        out.push(primitive);
    }
    Ok(out)
}

// ============================================================================
// Predicates
// ============================================================================

/// Check an untyped filter payload against the filter rules
pub fn validate_filter(expr: &Value) -> bool {
    parse_node(expr).is_ok()
}

/// Most specific violated rule for `expr`, or a generic message
pub fn explain_filter(expr: &Value) -> String {
    match parse_node(expr) {
        Err(e) => e.to_string(),
        Ok(_) => GENERIC_FILTER_MESSAGE.to_string(),
    }
}
