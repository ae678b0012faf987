//! Integration tests for tggl-flags

use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tggl_flags::*;

const CONFIG: &str = r#"[
    {
        "slug": "beta",
        "defaultVariation": {"active": false, "value": "ignored"},
        "conditions": [
            {
                "rules": [{"key": "plan", "operator": "STR_EQUAL", "values": ["pro"]}],
                "variation": {"active": true, "value": "on"}
            }
        ]
    },
    {
        "slug": "millennium",
        "defaultVariation": {"active": false, "value": null},
        "conditions": [
            {
                "rules": [{"key": "createdAt", "operator": "DATE_AFTER", "timestamp": 946684800000, "iso": "2000-01-01T00:00:00"}],
                "variation": {"active": true, "value": true}
            }
        ]
    },
    {
        "slug": "new-editor",
        "defaultVariation": {"active": true, "value": {"theme": "legacy"}},
        "conditions": [
            {
                "rules": [
                    {"key": "appVersion", "operator": "SEMVER_GTE", "version": [2, 9]},
                    {"key": "email", "operator": "STR_ENDS_WITH", "values": ["@tggl.io"], "negate": true}
                ],
                "variation": {"active": true, "value": {"theme": "modern"}}
            }
        ]
    }
]"#;

fn snapshot() -> ConfigSnapshot {
    ConfigSnapshot::from_json(CONFIG).unwrap()
}

#[test]
fn test_scenario_plan_targeting() {
    let snapshot = snapshot();

    let pro = snapshot.evaluate(&json!({"plan": "pro"}), "beta");
    assert_eq!(pro, Variation::active("on"));

    let free = snapshot.evaluate(&json!({"plan": "free"}), "beta");
    assert!(!free.active);
    assert!(free.value.is_null());
}

#[test]
fn test_scenario_seconds_timestamp() {
    let snapshot = snapshot();

    let after = snapshot.evaluate(&json!({"createdAt": 946_684_801}), "millennium");
    assert_eq!(after, Variation::active(true));

    let before = snapshot.evaluate(&json!({"createdAt": 946_684_799}), "millennium");
    assert_eq!(before, Variation::inactive());
}

#[test]
fn test_multiple_rules_with_negate() {
    let snapshot = snapshot();

    let customer = EvaluationContext::new()
        .with_attribute("appVersion", "2.10.0")
        .with_attribute("email", "jane@acme.com");
    assert_eq!(
        snapshot.evaluate(&customer, "new-editor").value,
        Value::from(json!({"theme": "modern"}))
    );

    let staff = EvaluationContext::new()
        .with_attribute("appVersion", "2.10.0")
        .with_attribute("email", "bob@tggl.io");
    assert_eq!(
        snapshot.evaluate(&staff, "new-editor").value,
        Value::from(json!({"theme": "legacy"}))
    );

    let old_app = EvaluationContext::new()
        .with_attribute("appVersion", "2.8.9")
        .with_attribute("email", "jane@acme.com");
    assert_eq!(
        snapshot.evaluate(&old_app, "new-editor").value,
        Value::from(json!({"theme": "legacy"}))
    );
}

#[test]
fn test_missing_flag() {
    let snapshot = snapshot();
    assert_eq!(
        snapshot.evaluate(&json!({"plan": "pro"}), "does-not-exist"),
        Variation::inactive()
    );
}

#[test]
fn test_active_flags_for_context() {
    let snapshot = snapshot();
    let active = snapshot.active_flags(&json!({"plan": "pro", "appVersion": "1.0"}));

    assert_eq!(active.len(), 2);
    assert_eq!(active["beta"], Value::from("on"));
    assert_eq!(active["new-editor"], Value::from(json!({"theme": "legacy"})));
}

#[test]
fn test_context_kinds_agree() {
    #[derive(Serialize)]
    struct Account {
        plan: String,
    }

    let snapshot = snapshot();

    let mut map = HashMap::new();
    map.insert("plan".to_string(), "pro".to_string());
    let record = SerializedContext::new(&Account {
        plan: "pro".to_string(),
    })
    .unwrap();
    let bag = EvaluationContext::new().with_attribute("plan", "pro");
    let json = json!({"plan": "pro"});

    let expected = Variation::active("on");
    assert_eq!(snapshot.evaluate(&map, "beta"), expected);
    assert_eq!(snapshot.evaluate(&record, "beta"), expected);
    assert_eq!(snapshot.evaluate(&bag, "beta"), expected);
    assert_eq!(snapshot.evaluate(&json, "beta"), expected);
}

#[test]
fn test_unknown_operator_rejected() {
    let unknown = r#"[{"slug": "x", "conditions": [{"rules": [{"key": "a", "operator": "STR_SOUNDS_LIKE"}], "variation": {"active": true}}]}]"#;
    assert!(matches!(
        ConfigSnapshot::from_json(unknown),
        Err(FlagError::Serialization(_))
    ));

}

#[test]
fn test_bad_pattern_only_disables_its_rule() {
    let json = r#"[
        {"slug": "healthy", "defaultVariation": {"active": true, "value": "ok"}},
        {
            "slug": "staff",
            "defaultVariation": {"active": false},
            "conditions": [
                {"rules": [{"key": "email", "operator": "REGEXP", "value": "^(?!admin).*@corp\\.com$"}], "variation": {"active": true, "value": "regex"}},
                {"rules": [{"key": "email", "operator": "STR_ENDS_WITH", "values": ["@corp.com"]}], "variation": {"active": true, "value": "suffix"}}
            ]
        },
        {
            "slug": "negated",
            "defaultVariation": {"active": false},
            "conditions": [{"rules": [{"key": "email", "operator": "REGEXP", "negate": true, "value": "(("}], "variation": {"active": true}}]
        }
    ]"#;

    let snapshot = ConfigSnapshot::from_json(json).unwrap();
    assert_eq!(snapshot.len(), 3);

    let context = json!({"email": "bob@corp.com"});
    assert_eq!(snapshot.evaluate(&context, "healthy"), Variation::active("ok"));
    assert_eq!(snapshot.evaluate(&context, "staff"), Variation::active("suffix"));
    assert!(!snapshot.evaluate(&context, "negated").active);
}

#[test]
fn test_definitions_round_trip_through_json() {
    let original = snapshot();
    let flags: Vec<&Flag> = original.flags().collect();
    let encoded = serde_json::to_string(&flags).unwrap();
    let decoded = ConfigSnapshot::from_json(&encoded).unwrap();

    let context = json!({"plan": "pro", "createdAt": 2_000_000_000, "appVersion": "3.0", "email": "x@y.z"});
    assert_eq!(decoded.active_flags(&context), original.active_flags(&context));
}
