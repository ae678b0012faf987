//! Decoding flag definitions from the wire.
//!
//! Field names are matched case-insensitively: `defaultVariation`,
//! `DefaultVariation` and `DEFAULTVARIATION` all decode the same field.
//! Values carried by variations are left untouched.

use crate::{Flag, Result};
use serde_json::{Map, Value as Json};

const FLAG_FIELDS: &[&str] = &["slug", "defaultVariation", "conditions"];
const CONDITION_FIELDS: &[&str] = &["rules", "variation"];
const VARIATION_FIELDS: &[&str] = &["active", "value"];
const RULE_FIELDS: &[&str] = &[
    "key",
    "operator",
    "negate",
    "values",
    "value",
    "rangeStart",
    "rangeEnd",
    "seed",
    "version",
    "timestamp",
    "iso",
];

/// Decode a JSON array of flag definitions.
pub fn decode_flags(json: &[u8]) -> Result<Vec<Flag>> {
    let mut raw: Json = serde_json::from_slice(json)?;
    normalize_flags(&mut raw);
    Ok(serde_json::from_value(raw)?)
}

/// Rewrite the field names of every flag to their canonical spelling.
pub fn normalize_flags(raw: &mut Json) {
    let Json::Array(flags) = raw else {
        return;
    };

    for flag in flags {
        let Some(flag) = canonicalize(flag, FLAG_FIELDS) else {
            continue;
        };
        if let Some(variation) = flag.get_mut("defaultVariation") {
            canonicalize(variation, VARIATION_FIELDS);
        }
        let Some(Json::Array(conditions)) = flag.get_mut("conditions") else {
            continue;
        };

        for condition in conditions {
            let Some(condition) = canonicalize(condition, CONDITION_FIELDS) else {
                continue;
            };
            if let Some(variation) = condition.get_mut("variation") {
                canonicalize(variation, VARIATION_FIELDS);
            }
            if let Some(Json::Array(rules)) = condition.get_mut("rules") {
                for rule in rules {
                    canonicalize(rule, RULE_FIELDS);
                }
            }
        }
    }
}

/// Rename keys matching one of `fields` regardless of case.
///
/// A key already spelled canonically wins over a differently cased duplicate.
fn canonicalize<'a>(value: &'a mut Json, fields: &[&'static str]) -> Option<&'a mut Map<String, Json>> {
    let Json::Object(map) = value else {
        return None;
    };

    let renames: Vec<(String, &'static str)> = map
        .keys()
        .filter_map(|key| {
            fields
                .iter()
                .find(|field| field.eq_ignore_ascii_case(key) && **field != key.as_str())
                .map(|field| (key.clone(), *field))
        })
        .collect();

    for (from, to) in renames {
        if let Some(field) = map.remove(&from) {
            map.entry(to).or_insert(field);
        }
    }

    Some(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EvaluationContext, Operator, Variation};
    use serde_json::json;

    #[test]
    fn test_any_casing_decodes() {
        let json = br#"[{
            "SLUG": "beta",
            "DEFAULTVARIATION": {"ACTIVE": true, "VALUE": "off"},
            "conditions": [{
                "RULES": [{"KEY": "userId", "OPERATOR": "PERCENTAGE", "rangestart": 0, "RANGEEND": 1, "SEED": 3}],
                "Variation": {"active": true, "value": "on"}
            }]
        }, {
            "slug": "lower",
            "defaultvariation": {"active": true, "value": 7}
        }]"#;

        let flags = decode_flags(json).unwrap();
        assert_eq!(flags[0].slug, "beta");
        assert_eq!(flags[0].default_variation, Variation::active("off"));

        let rule = &flags[0].conditions[0].rules[0];
        assert_eq!(rule.operator, Operator::Percentage);
        assert_eq!(rule.range_start, Some(0.0));
        assert_eq!(rule.range_end, Some(1.0));
        assert_eq!(rule.seed, Some(3));

        let context = EvaluationContext::new().with_user_id("u1");
        assert_eq!(flags[0].evaluate(&context), Variation::active("on"));
        assert_eq!(flags[1].default_variation, Variation::active(7));
    }

    #[test]
    fn test_values_are_not_rewritten() {
        let mut raw = json!([{
            "slug": "theme",
            "defaultVariation": {"active": true, "value": {"ACTIVE": 1, "Slug": "x"}}
        }]);
        normalize_flags(&mut raw);
        assert_eq!(raw[0]["defaultVariation"]["value"], json!({"ACTIVE": 1, "Slug": "x"}));
    }

    #[test]
    fn test_canonical_spelling_wins() {
        let mut raw = json!([{"slug": "a", "SLUG": "b"}]);
        normalize_flags(&mut raw);
        assert_eq!(raw, json!([{"slug": "a"}]));
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let mut raw = json!([{"slug": "a", "description": "kept"}]);
        normalize_flags(&mut raw);
        assert_eq!(raw[0]["description"], "kept");
    }

    #[test]
    fn test_not_an_array() {
        assert!(decode_flags(br#"{"slug": "a"}"#).is_err());
        assert!(decode_flags(b"not json").is_err());
    }
}
