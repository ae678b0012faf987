//! Result of a remote evaluation

use std::collections::BTreeMap;
use tggl_flags::Value;
use tggl_reporting::{FlagUsage, Reporting};

/// Flags active for one context, as evaluated by the Tggl API
///
/// Flags absent from the response are inactive.
#[derive(Clone, Default)]
pub struct FlagsResponse {
    flags: BTreeMap<String, Value>,
    reporting: Option<Reporting>,
}

impl FlagsResponse {
    /// Response serving `flags`, without usage reporting
    pub fn new(flags: BTreeMap<String, Value>) -> Self {
        Self {
            flags,
            reporting: None,
        }
    }

    /// Response with every flag inactive
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn with_reporting(mut self, reporting: Reporting) -> Self {
        self.reporting = Some(reporting);
        self
    }

    /// Stop reporting usage of this response
    pub fn disable_reporting(&mut self) {
        self.reporting = None;
    }

    /// Whether the flag is active
    pub fn is_active(&self, slug: &str) -> bool {
        let value = self.flags.get(slug);
        self.report(slug, value.is_some(), value.cloned().unwrap_or_default(), Value::Null);
        value.is_some()
    }

    /// Value of the flag, or `default` when inactive
    pub fn get(&self, slug: &str, default: impl Into<Value>) -> Value {
        let default = default.into();
        let value = self.flags.get(slug).cloned().unwrap_or_else(|| default.clone());
        self.report(slug, !value.is_null(), value.clone(), default);
        value
    }

    /// Every active flag and its value
    pub fn all_active_flags(&self) -> &BTreeMap<String, Value> {
        &self.flags
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    fn report(&self, slug: &str, active: bool, value: Value, default: Value) {
        if let Some(reporting) = &self.reporting {
            reporting.report_flag(slug, FlagUsage::new(active, value, default));
        }
    }
}

impl std::fmt::Debug for FlagsResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagsResponse")
            .field("flags", &self.flags)
            .field("reporting", &self.reporting.is_some())
            .finish()
    }
}
