//! Feature Flag Core
//!
//! Defines flags, their conditions and variations, and evaluation logic.

use crate::rule::null_as_default;
use crate::{Context, Rule, Value};
use serde::{Deserialize, Serialize};

/// Feature flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flag {
    /// Flag slug
    #[serde(alias = "Slug")]
    pub slug: String,

    /// Variation served when no condition matches
    #[serde(
        default,
        alias = "DefaultVariation",
        alias = "defaultvariation",
        deserialize_with = "null_as_default"
    )]
    pub default_variation: Variation,

    /// Conditions, evaluated in order
    #[serde(default, alias = "Conditions", deserialize_with = "null_as_default")]
    pub conditions: Vec<Condition>,
}

impl Flag {
    /// Create a flag serving `default_variation` to everyone.
    pub fn new(slug: impl Into<String>, default_variation: Variation) -> Self {
        Self {
            slug: slug.into(),
            default_variation,
            conditions: Vec::new(),
        }
    }

    /// Append a condition
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Evaluate flag for a context
    ///
    /// The first condition whose rules all match wins; otherwise the default
    /// variation applies. Inactive variations never carry a value.
    pub fn evaluate<C: Context + ?Sized>(&self, context: &C) -> Variation {
        self.conditions
            .iter()
            .find(|condition| condition.matches(context))
            .map_or(&self.default_variation, |condition| &condition.variation)
            .resolved()
    }
}

/// Outcome of a flag evaluation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    #[serde(default, alias = "Active", deserialize_with = "null_as_default")]
    pub active: bool,

    #[serde(default, alias = "Value")]
    pub value: Value,
}

impl Variation {
    /// An active variation serving `value`
    pub fn active(value: impl Into<Value>) -> Self {
        Self {
            active: true,
            value: value.into(),
        }
    }

    /// The inactive variation
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Copy of this variation with the value cleared when inactive
    pub fn resolved(&self) -> Self {
        if self.active {
            self.clone()
        } else {
            Self::inactive()
        }
    }
}

/// Condition: all rules must match for its variation to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Rules, AND-ed
    #[serde(default, alias = "Rules", deserialize_with = "null_as_default")]
    pub rules: Vec<Rule>,

    /// Variation served when the condition matches
    #[serde(default, alias = "Variation", deserialize_with = "null_as_default")]
    pub variation: Variation,
}

impl Condition {
    pub fn new(variation: Variation) -> Self {
        Self {
            rules: Vec::new(),
            variation,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn matches<C: Context + ?Sized>(&self, context: &C) -> bool {
        self.rules.iter().all(|rule| rule.matches(context))
    }
}
