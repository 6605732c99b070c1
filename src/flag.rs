//! Flag definitions, targeting conditions, and evaluation contexts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A feature flag definition.
///
/// Definitions are immutable per evaluation: the client reads a snapshot from
/// the store and never writes back. Creating, replacing, and deleting
/// definitions goes through the store's upsert/delete operations, which fully
/// replace the prior definition for a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDefinition {
    /// Master switch. When false the flag is disabled for every context and
    /// no other field is consulted.
    pub enabled: bool,

    /// Human-readable description. No evaluation effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Access restrictions. All conditions must pass (AND).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Percentage rollout gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout: Option<Rollout>,

    /// Weighted experiment variants, in declaration order.
    ///
    /// Order is significant: cumulative-weight bucketing walks this list as
    /// declared, so reordering reassigns subjects. Stores must preserve it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
}

impl FlagDefinition {
    /// Create a definition with the given master switch and nothing else.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            description: None,
            conditions: Vec::new(),
            rollout: None,
            variants: Vec::new(),
        }
    }

    /// An enabled flag with no restrictions.
    pub fn on() -> Self {
        Self::new(true)
    }

    /// A disabled flag.
    pub fn off() -> Self {
        Self::new(false)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a targeting condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Set the rollout configuration.
    pub fn with_rollout(mut self, rollout: Rollout) -> Self {
        self.rollout = Some(rollout);
        self
    }

    /// Append a weighted variant.
    pub fn with_variant(mut self, name: impl Into<String>, weight: f64) -> Self {
        self.variants.push(Variant::new(name, weight));
        self
    }

    /// Whether every condition passes for `context`.
    ///
    /// Short-circuits on the first failure; an empty condition list passes.
    pub fn conditions_pass(&self, context: &EvaluationContext) -> bool {
        self.conditions.iter().all(|c| c.matches(context))
    }
}

/// A single attribute comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Context attribute to compare.
    pub attribute: String,

    /// Comparison operator.
    pub operator: Operator,

    /// Value to compare against. For `in`/`not_in` this must be an array.
    pub value: Value,
}

impl Condition {
    /// Create a condition.
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            operator,
            value: value.into(),
        }
    }

    /// Whether `context` satisfies this condition.
    ///
    /// Comparison is strict: same JSON type and same value, no coercion
    /// (string `"1"` never equals number `1`). An attribute missing from the
    /// context compares as absent.
    pub fn matches(&self, context: &EvaluationContext) -> bool {
        let actual = context.get(&self.attribute);

        match self.operator {
            Operator::Eq => actual == Some(&self.value),
            Operator::Neq => actual != Some(&self.value),
            Operator::In => match &self.value {
                Value::Array(allowed) => actual.map(|v| allowed.contains(v)).unwrap_or(false),
                _ => false,
            },
            // A non-array value cannot contain anything, so `not_in` against
            // one vacuously passes.
            Operator::NotIn => match &self.value {
                Value::Array(denied) => actual.map(|v| !denied.contains(v)).unwrap_or(true),
                _ => true,
            },
            // Unrecognized operators never match: an unknown rule disables
            // the flag rather than silently allowing it.
            Operator::Unknown => false,
        }
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    In,
    NotIn,
    /// Any operator this version does not recognize. Never matches.
    #[serde(other)]
    Unknown,
}

/// Gradual rollout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rollout {
    /// Percentage of subjects to include, clamped to `[0, 100]` at
    /// evaluation.
    pub percentage: f64,

    /// Context attribute used for bucketing. Falls back to the client-wide
    /// default (`"userId"` unless reconfigured).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Rollout {
    /// Create a rollout at `percentage`.
    pub fn new(percentage: f64) -> Self {
        Self {
            percentage,
            attribute: None,
        }
    }

    /// Bucket by `attribute` instead of the client default.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub(crate) fn clamped_percentage(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }
}

/// A named, weighted experiment variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name, unique within a flag.
    pub name: String,

    /// Relative weight. Negative weights count as zero.
    pub weight: f64,
}

impl Variant {
    /// Create a variant.
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub(crate) fn clamped_weight(&self) -> f64 {
        if self.weight > 0.0 { self.weight } else { 0.0 }
    }
}

/// Evaluation context: the attributes of whoever is being evaluated.
///
/// Lives only for the duration of one evaluation call and is never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    attributes: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `userId` attribute, the default bucketing identifier.
    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        self.with_attribute("userId", user_id.into())
    }

    /// Set an arbitrary attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Get an attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String form of an attribute for hash bucketing.
    ///
    /// Absent and null attributes both coerce to the empty string; strings
    /// are used as-is, everything else via its JSON rendering.
    pub(crate) fn identifier(&self, attribute: &str) -> String {
        match self.attributes.get(attribute) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Result of evaluating one flag for one context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Whether the flag is enabled for this context.
    pub enabled: bool,

    /// Assigned variant, when the flag is enabled and declares weighted
    /// variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// The evaluated definition. Absent when the key was not in the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<FlagDefinition>,
}

impl EvaluationResult {
    /// A disabled result, carrying the definition when the flag existed.
    pub fn disabled(flag: Option<FlagDefinition>) -> Self {
        Self {
            enabled: false,
            variant: None,
            flag,
        }
    }
}
