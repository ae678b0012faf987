//! Report payload sent to the `/report` endpoint

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tggl_flags::Value;

/// One report request
///
/// Every section is optional; an empty section is left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// Flag usage per client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientReport>>,

    /// First and last time (epoch seconds) each context property was seen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_properties: Option<BTreeMap<String, [i64; 2]>>,

    /// Observed values per property, as `[value]` or `[value, label]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_values: Option<BTreeMap<String, Vec<Vec<String>>>>,
}

impl ReportPayload {
    pub fn is_empty(&self) -> bool {
        self.clients.is_none() && self.received_properties.is_none() && self.received_values.is_none()
    }

    /// Number of `(property, value[, label])` entries in this payload
    pub fn received_value_count(&self) -> usize {
        self.received_values
            .as_ref()
            .map_or(0, |values| values.values().map(Vec::len).sum())
    }
}

/// Flag usage of one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientReport {
    pub id: String,
    pub flags: BTreeMap<String, Vec<FlagReport>>,
}

/// Aggregated count of one evaluation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagReport {
    pub active: bool,
    pub value: Value,
    pub default: Value,
    pub count: u64,
}
