//! Evaluation contexts.
//!
//! Anything that can answer "what is the value of property `key`?" can be
//! used to evaluate flags. String-keyed maps and JSON objects are looked up
//! directly; structured records go through [`SerializedContext`], which
//! captures their fields once via `serde`.

use crate::{FlagError, Value};
use serde::Serialize;
use serde::ser::SerializeMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A bag of named properties flags are evaluated against.
pub trait Context {
    /// Value of a property, or `None` when the context does not have it.
    fn get(&self, key: &str) -> Option<Value>;

    /// Every property of the context, in the context's own order.
    fn properties(&self) -> Vec<(String, Value)>;

    /// The context as a JSON object.
    fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.properties()
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::from(v)))
                .collect(),
        )
    }
}

impl<C: Context + ?Sized> Context for &C {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn properties(&self) -> Vec<(String, Value)> {
        (**self).properties()
    }
}

// ============================================================================
// EvaluationContext
// ============================================================================

/// Ordered property bag built fluently.
///
/// ```
/// use tggl_flags::{Context, EvaluationContext};
///
/// let context = EvaluationContext::new()
///     .with_user_id("user-123")
///     .with_attribute("plan", "pro")
///     .with_attribute("seats", 12);
///
/// assert_eq!(context.get("plan").unwrap().as_str(), Some("pro"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    attributes: Vec<(String, Value)>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(self, user_id: impl Into<String>) -> Self {
        self.with_attribute("userId", user_id.into())
    }

    /// Add or replace an attribute, keeping its first insertion position.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == "userId")
            .and_then(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Context for EvaluationContext {
    fn get(&self, key: &str) -> Option<Value> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.attributes.clone()
    }
}

impl Serialize for EvaluationContext {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (key, value) in iter {
            context.insert(key, value);
        }
        context
    }
}

// ============================================================================
// Maps and JSON
// ============================================================================

impl<V, S> Context for HashMap<String, V, S>
where
    V: Clone + Into<Value>,
    S: BuildHasher,
{
    fn get(&self, key: &str) -> Option<Value> {
        HashMap::get(self, key).map(|v| v.clone().into())
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone().into())).collect()
    }
}

impl<V> Context for BTreeMap<String, V>
where
    V: Clone + Into<Value>,
{
    fn get(&self, key: &str) -> Option<Value> {
        BTreeMap::get(self, key).map(|v| v.clone().into())
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone().into())).collect()
    }
}

impl Context for serde_json::Map<String, serde_json::Value> {
    fn get(&self, key: &str) -> Option<Value> {
        serde_json::Map::get(self, key).map(Value::from)
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect()
    }
}

/// JSON objects expose their members; any other JSON value has no properties.
impl Context for serde_json::Value {
    fn get(&self, key: &str) -> Option<Value> {
        self.as_object().and_then(|map| Context::get(map, key))
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.as_object().map(Context::properties).unwrap_or_default()
    }
}

// ============================================================================
// SerializedContext
// ============================================================================

/// A structured record captured as a property bag.
///
/// The record is serialized once with `serde`; its top-level fields become
/// the context properties under their serialized names, so `#[serde(rename)]`
/// and `#[serde(rename_all)]` control which keys rules can address.
///
/// ```
/// use serde::Serialize;
/// use tggl_flags::{Context, SerializedContext};
///
/// #[derive(Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct User {
///     user_id: String,
///     plan: String,
/// }
///
/// let user = User { user_id: "u1".into(), plan: "pro".into() };
/// let context = SerializedContext::new(&user).unwrap();
/// assert_eq!(context.get("userId").unwrap().as_str(), Some("u1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedContext {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl SerializedContext {
    pub fn new<T: Serialize + ?Sized>(record: &T) -> Result<Self, FlagError> {
        let fields = match serde_json::to_value(record)? {
            serde_json::Value::Object(fields) => fields,
            _ => serde_json::Map::new(),
        };
        Ok(Self { fields })
    }
}

impl Context for SerializedContext {
    fn get(&self, key: &str) -> Option<Value> {
        Context::get(&self.fields, key)
    }

    fn properties(&self) -> Vec<(String, Value)> {
        self.fields.properties()
    }
}
