//! Usage aggregation

use crate::{ClientReport, FlagReport, ReportPayload};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::BTreeMap;
use tggl_flags::{Context, Value};

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new("([a-z])([A-Z])").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\W_]+").unwrap());

/// One evaluation outcome to count
#[derive(Debug, Clone, PartialEq)]
pub struct FlagUsage {
    pub active: bool,
    pub value: Value,
    pub default: Value,
    /// Occurrences to add, 1 when unset
    pub count: Option<u64>,
}

impl FlagUsage {
    pub fn new(active: bool, value: impl Into<Value>, default: impl Into<Value>) -> Self {
        Self {
            active,
            value: value.into(),
            default: default.into(),
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Outcomes sharing a key are counted together.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}{}{}",
            if self.active { "1" } else { "0" },
            self.value.stringify(),
            self.default.stringify()
        )
    }
}

type FlagCounters = BTreeMap<String, BTreeMap<String, BTreeMap<String, FlagReport>>>;
type ObservedValues = BTreeMap<String, BTreeMap<String, Option<String>>>;

/// Thread-safe usage collector
///
/// Holds flag counters, property first/last-seen windows and observed
/// property values, each behind its own lock. [`UsageCollector::drain`]
/// empties all three and turns them into report pages.
#[derive(Default)]
pub struct UsageCollector {
    flags: Mutex<FlagCounters>,
    properties: Mutex<BTreeMap<String, (i64, i64)>>,
    values: Mutex<ObservedValues>,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one evaluation outcome of `slug` for `client_id`.
    pub fn record_flag(&self, client_id: &str, slug: &str, usage: FlagUsage) {
        let key = usage.dedup_key();
        let mut flags = self.flags.lock();
        let report = flags
            .entry(client_id.to_string())
            .or_default()
            .entry(slug.to_string())
            .or_default()
            .entry(key)
            .or_insert_with(|| FlagReport {
                active: usage.active,
                value: usage.value.clone(),
                default: usage.default.clone(),
                count: 0,
            });
        report.count += usage.count.unwrap_or(1);
    }

    /// Record the string properties of a context seen now.
    pub fn record_context<C: Context + ?Sized>(&self, context: &C) {
        self.record_context_at(context, chrono::Utc::now().timestamp());
    }

    /// Record the string properties of a context seen at `now` (epoch seconds).
    ///
    /// Each non-empty string property extends its first/last-seen window and
    /// is stored as an observed value. A property whose constant-cased name
    /// ends in `_ID` is labelled by the string sibling named `..._NAME`.
    pub fn record_context_at<C: Context + ?Sized>(&self, context: &C, now: i64) {
        let properties = context.properties();
        let constant_names: Vec<String> = properties
            .iter()
            .map(|(name, _)| constant_case(name))
            .collect();

        let mut windows = self.properties.lock();
        let mut values = self.values.lock();

        for (name, value) in &properties {
            let Some(text) = value.as_str().filter(|s| !s.is_empty()) else {
                continue;
            };

            windows
                .entry(name.clone())
                .and_modify(|window| window.1 = now)
                .or_insert((now, now));

            let label = label_target(name).and_then(|target| {
                constant_names
                    .iter()
                    .position(|candidate| *candidate == target)
                    .and_then(|i| properties[i].1.as_str())
                    .map(str::to_string)
            });

            values
                .entry(name.clone())
                .or_default()
                .insert(text.to_string(), label);
        }
    }

    /// Whether nothing has been recorded since the last drain.
    pub fn is_empty(&self) -> bool {
        self.flags.lock().is_empty()
            && self.properties.lock().is_empty()
            && self.values.lock().is_empty()
    }

    /// Take everything recorded so far and split it into report pages.
    ///
    /// The first page carries flag counters, property windows and the first
    /// `page_size` observed values; each further page carries only observed
    /// values. Values and labels are cut to `max_value_length` characters.
    /// Returns no pages when nothing was recorded.
    pub fn drain(&self, page_size: usize, max_value_length: usize) -> Vec<ReportPayload> {
        let flags = std::mem::take(&mut *self.flags.lock());
        let properties = std::mem::take(&mut *self.properties.lock());
        let values = std::mem::take(&mut *self.values.lock());

        let mut first = ReportPayload::default();

        if !flags.is_empty() {
            first.clients = Some(
                flags
                    .into_iter()
                    .map(|(id, slugs)| ClientReport {
                        id,
                        flags: slugs
                            .into_iter()
                            .map(|(slug, outcomes)| (slug, outcomes.into_values().collect()))
                            .collect(),
                    })
                    .collect(),
            );
        }

        if !properties.is_empty() {
            first.received_properties = Some(
                properties
                    .into_iter()
                    .map(|(name, (first_seen, last_seen))| (name, [first_seen, last_seen]))
                    .collect(),
            );
        }

        let entries: Vec<(String, Vec<String>)> = values
            .into_iter()
            .flat_map(|(name, observed)| {
                observed.into_iter().map(move |(value, label)| {
                    let mut entry = vec![truncate(&value, max_value_length)];
                    if let Some(label) = label {
                        entry.push(truncate(&label, max_value_length));
                    }
                    (name.clone(), entry)
                })
            })
            .collect();

        let mut chunks = entries.chunks(page_size.max(1));
        if let Some(chunk) = chunks.next() {
            first.received_values = Some(group_values(chunk));
        }

        let mut pages = Vec::new();
        if !first.is_empty() {
            pages.push(first);
        }
        pages.extend(chunks.map(|chunk| ReportPayload {
            received_values: Some(group_values(chunk)),
            ..ReportPayload::default()
        }));
        pages
    }
}

fn group_values(chunk: &[(String, Vec<String>)]) -> BTreeMap<String, Vec<Vec<String>>> {
    let mut grouped: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    for (name, entry) in chunk {
        grouped.entry(name.clone()).or_default().push(entry.clone());
    }
    grouped
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// `userId` → `USER_ID`, `first-name` → `FIRST_NAME`.
pub fn constant_case(name: &str) -> String {
    let split = CAMEL_BOUNDARY.replace_all(name, "${1}_${2}");
    SEPARATORS.replace_all(&split, "_").to_uppercase()
}

/// Constant-cased name of the property labelling `name`, if it is an id.
fn label_target(name: &str) -> Option<String> {
    let mut constant = constant_case(name);
    if constant.ends_with("_I_D") {
        constant.truncate(constant.len() - "_I_D".len());
        constant.push_str("_ID");
    }
    constant
        .strip_suffix("_ID")
        .map(|stem| format!("{stem}_NAME"))
}
