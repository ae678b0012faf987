//! Targeting rules and the per-operator matching logic.

use crate::{Context, FlagError, Operator, Value};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use tggl_log::{TARGET_FLAGS, warn};
use xxhash_rust::xxh32::xxh32;

/// Template used to extend partial ISO dates for `DATE_AFTER`.
const DATE_AFTER_TEMPLATE: &str = "2000-01-01T23:59:59";

/// Template used to extend partial ISO dates for `DATE_BEFORE`.
const DATE_BEFORE_TEMPLATE: &str = "2000-01-01T00:00:00";

/// Numeric dates below this value (2000-01-01 in milliseconds) are in seconds.
const SECONDS_THRESHOLD: f64 = 631_152_000_000.0;

/// Tolerance used by `EQ`.
const EPSILON: f64 = 1e-10;

/// A single targeting rule: one operator applied to one context property.
///
/// Decoding fails on an unknown operator. A `REGEXP` pattern that does not
/// compile is logged and kept; the rule then never matches, negated or not.
/// [`Rule::validate`] reports such a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct Rule {
    /// Context property the rule reads
    pub key: String,

    /// Operator
    pub operator: Operator,

    /// Invert the match
    pub negate: bool,

    /// Membership operands
    pub values: Option<Vec<String>>,

    /// Comparison operand
    pub value: Option<Value>,

    /// Percentage range start (inclusive)
    pub range_start: Option<f64>,

    /// Percentage range end (exclusive)
    pub range_end: Option<f64>,

    /// Percentage hash seed
    pub seed: Option<i64>,

    /// Semver components
    pub version: Option<Vec<i64>>,

    /// Date operand in milliseconds
    pub timestamp: Option<f64>,

    /// Date operand as ISO string
    pub iso: Option<String>,

    pattern: Option<Regex>,
}

impl Rule {
    pub fn new(key: impl Into<String>, operator: Operator) -> Self {
        Self {
            key: key.into(),
            operator,
            negate: false,
            values: None,
            value: None,
            range_start: None,
            range_end: None,
            seed: None,
            version: None,
            timestamp: None,
            iso: None,
            pattern: None,
        }
    }

    pub fn negated(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the comparison operand.
    ///
    /// For `REGEXP` rules the pattern is compiled here; use
    /// [`Rule::validate`] to surface a pattern that does not compile.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.pattern = compile_pattern(self.operator, Some(&value)).ok().flatten();
        self.value = Some(value);
        self
    }

    pub fn with_range(mut self, start: f64, end: f64) -> Self {
        self.range_start = Some(start);
        self.range_end = Some(end);
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_version(mut self, version: Vec<i64>) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_iso(mut self, iso: impl Into<String>) -> Self {
        self.iso = Some(iso.into());
        self
    }

    /// Check that the rule can be evaluated as configured.
    pub fn validate(self) -> Result<Self, FlagError> {
        compile_pattern(self.operator, self.value.as_ref())?;
        Ok(self)
    }

    /// Evaluate the rule against the context property it names.
    pub fn matches<C: Context + ?Sized>(&self, context: &C) -> bool {
        let value = context.get(&self.key).unwrap_or_default();
        self.evaluate(&value)
    }

    /// Evaluate the rule against an extracted value.
    ///
    /// `EMPTY` is checked before anything else. Every other operator fails on
    /// `Null` or when its guard does not hold, regardless of `negate`.
    pub fn evaluate(&self, value: &Value) -> bool {
        if self.operator == Operator::Empty {
            let empty = matches!(value, Value::Null) || value.as_str() == Some("");
            return empty != self.negate;
        }

        if value.is_null() {
            return false;
        }

        match self.raw_match(value) {
            Some(matched) => matched != self.negate,
            None => false,
        }
    }

    /// Match before negation, or `None` when the guard fails.
    fn raw_match(&self, value: &Value) -> Option<bool> {
        match self.operator {
            Operator::Empty => None,
            Operator::True => Some(value.as_bool() == Some(true)),
            Operator::StrEqual => {
                let s = value.as_str()?;
                Some(self.values().iter().any(|v| v == s))
            }
            Operator::StrEqualSoft => {
                if !matches!(value, Value::String(_) | Value::Number(_)) {
                    return None;
                }
                let s = value.stringify().to_lowercase();
                Some(self.values().iter().any(|v| v.to_lowercase() == s))
            }
            Operator::StrStartsWith => {
                let s = value.as_str()?;
                Some(self.values().iter().any(|v| s.starts_with(v.as_str())))
            }
            Operator::StrEndsWith => {
                let s = value.as_str()?;
                Some(self.values().iter().any(|v| s.ends_with(v.as_str())))
            }
            Operator::StrContains => {
                let s = value.as_str()?;
                Some(self.values().iter().any(|v| s.contains(v.as_str())))
            }
            Operator::StrBefore => {
                let (s, operand) = (value.as_str()?, self.str_operand()?);
                Some(s <= operand)
            }
            Operator::StrAfter => {
                let (s, operand) = (value.as_str()?, self.str_operand()?);
                Some(s >= operand)
            }
            Operator::RegExp => {
                let s = value.as_str()?;
                self.str_operand()?;
                Some(self.pattern.as_ref()?.is_match(s))
            }
            Operator::Eq => {
                let (n, operand) = (value.as_f64()?, self.num_operand()?);
                Some((n - operand).abs() < EPSILON)
            }
            Operator::Lt => {
                let (n, operand) = (value.as_f64()?, self.num_operand()?);
                Some(n < operand)
            }
            Operator::Gt => {
                let (n, operand) = (value.as_f64()?, self.num_operand()?);
                Some(n > operand)
            }
            Operator::ArrOverlap => {
                let items = value.as_list()?;
                let values = self.values();
                Some(
                    items
                        .iter()
                        .any(|item| values.contains(&item.stringify())),
                )
            }
            Operator::DateAfter => self.date_match(value, DateDirection::After),
            Operator::DateBefore => self.date_match(value, DateDirection::Before),
            Operator::SemverEq => {
                let parts = parse_semver(value.as_str()?)?;
                let version = self.version.as_deref().unwrap_or_default();
                Some(
                    version
                        .iter()
                        .enumerate()
                        .all(|(i, expected)| parts.get(i) == Some(expected)),
                )
            }
            Operator::SemverGte => {
                let parts = parse_semver(value.as_str()?)?;
                let version = self.version.as_deref().unwrap_or_default();
                Some(compare_semver(&parts, version, Ordering::Greater))
            }
            Operator::SemverLte => {
                let parts = parse_semver(value.as_str()?)?;
                let version = self.version.as_deref().unwrap_or_default();
                Some(compare_semver(&parts, version, Ordering::Less))
            }
            Operator::Percentage => {
                if !matches!(value, Value::String(_) | Value::Number(_)) {
                    return None;
                }
                let (start, end) = (self.range_start?, self.range_end?);
                let p = percentage(&value.stringify(), self.seed.unwrap_or(0));
                Some(p >= start && p < end)
            }
        }
    }

    fn values(&self) -> &[String] {
        self.values.as_deref().unwrap_or_default()
    }

    fn str_operand(&self) -> Option<&str> {
        self.value.as_ref()?.as_str()
    }

    fn num_operand(&self) -> Option<f64> {
        self.value.as_ref()?.as_f64()
    }

    /// Date comparison shared by `DATE_AFTER` and `DATE_BEFORE`.
    ///
    /// String values are extended to the template length and compared with
    /// `iso` ordinally. Numeric values below the seconds threshold are scaled
    /// to milliseconds before comparing with `timestamp`.
    fn date_match(&self, value: &Value, direction: DateDirection) -> Option<bool> {
        match value {
            Value::String(s) => {
                let iso = self.iso.as_deref()?;
                let padded = pad_to_template(s, direction.template());
                Some(match direction {
                    DateDirection::After => iso <= padded.as_str(),
                    DateDirection::Before => iso >= padded.as_str(),
                })
            }
            Value::Number(n) => {
                let timestamp = self.timestamp?;
                let ms = if *n < SECONDS_THRESHOLD { n * 1000.0 } else { *n };
                Some(match direction {
                    DateDirection::After => ms >= timestamp,
                    DateDirection::Before => ms <= timestamp,
                })
            }
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum DateDirection {
    After,
    Before,
}

impl DateDirection {
    fn template(self) -> &'static str {
        match self {
            Self::After => DATE_AFTER_TEMPLATE,
            Self::Before => DATE_BEFORE_TEMPLATE,
        }
    }
}

/// Keep the first `min(len)` characters of `value` and fill the rest from `template`.
fn pad_to_template(value: &str, template: &str) -> String {
    let keep = value.chars().count().min(template.len());
    let mut padded: String = value.chars().take(keep).collect();
    padded.push_str(&template[keep..]);
    padded
}

/// Split a dotted version into integer components.
fn parse_semver(value: &str) -> Option<Vec<i64>> {
    value
        .split('.')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// Component-wise comparison deciding on the first differing component.
///
/// `wanted` is the ordering that makes the rule match (`Greater` for `>=`,
/// `Less` for `<=`). A value with fewer components than `version` fails.
fn compare_semver(parts: &[i64], version: &[i64], wanted: Ordering) -> bool {
    for (i, expected) in version.iter().enumerate() {
        let Some(actual) = parts.get(i) else {
            return false;
        };
        match actual.cmp(expected) {
            Ordering::Equal => continue,
            ordering => return ordering == wanted,
        }
    }
    true
}

/// Bucket a value into `[0, 1)` with a seeded xxHash32.
pub fn percentage(value: &str, seed: i64) -> f64 {
    let hash = xxh32(value.as_bytes(), seed as u32);
    let p = f64::from(hash) / f64::from(u32::MAX);
    if p == 1.0 { p - EPSILON } else { p }
}

fn compile_pattern(operator: Operator, value: Option<&Value>) -> Result<Option<Regex>, FlagError> {
    if operator != Operator::RegExp {
        return Ok(None);
    }
    let Some(pattern) = value.and_then(Value::as_str) else {
        return Ok(None);
    };
    Regex::new(pattern)
        .map(Some)
        .map_err(|e| FlagError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

// ============================================================================
// Wire format
// ============================================================================

/// Rule as it appears on the wire, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(alias = "Key")]
    key: String,
    #[serde(alias = "Operator")]
    operator: String,
    #[serde(default, alias = "Negate", deserialize_with = "null_as_default")]
    negate: bool,
    #[serde(default, alias = "Values", skip_serializing_if = "Option::is_none")]
    values: Option<Vec<String>>,
    #[serde(default, alias = "Value", skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, alias = "RangeStart", alias = "rangestart", skip_serializing_if = "Option::is_none")]
    range_start: Option<f64>,
    #[serde(default, alias = "RangeEnd", alias = "rangeend", skip_serializing_if = "Option::is_none")]
    range_end: Option<f64>,
    #[serde(default, alias = "Seed", skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    #[serde(default, alias = "Version", skip_serializing_if = "Option::is_none")]
    version: Option<Vec<i64>>,
    #[serde(default, alias = "Timestamp", skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
    #[serde(default, alias = "Iso", alias = "ISO", skip_serializing_if = "Option::is_none")]
    iso: Option<String>,
}

impl TryFrom<RawRule> for Rule {
    type Error = FlagError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let operator: Operator = raw.operator.parse()?;
        let value = raw.value.map(Value::from);
        let pattern = compile_pattern(operator, value.as_ref()).unwrap_or_else(|e| {
            warn!(target: TARGET_FLAGS, "Rule on '{}' will never match: {}", raw.key, e);
            None
        });

        Ok(Self {
            key: raw.key,
            operator,
            negate: raw.negate,
            values: raw.values,
            value,
            range_start: raw.range_start,
            range_end: raw.range_end,
            seed: raw.seed,
            version: raw.version,
            timestamp: raw.timestamp,
            iso: raw.iso,
            pattern,
        })
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        Self {
            key: rule.key,
            operator: rule.operator.as_str().to_string(),
            negate: rule.negate,
            values: rule.values,
            value: rule.value.map(serde_json::Value::from),
            range_start: rule.range_start,
            range_end: rule.range_end,
            seed: rule.seed,
            version: rule.version,
            timestamp: rule.timestamp,
            iso: rule.iso,
        }
    }
}

/// Treat an explicit `null` like an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
