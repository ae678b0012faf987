//! Feature flag evaluation for Tggl
//!
//! Flag definitions, the rule evaluator and the snapshot store used by the
//! Tggl clients. Evaluation is pure and never performs I/O.
//!
//! # Features
//!
//! - **20 operators** - string, numeric, date, semver, array, regex and percentage rules
//! - **Deterministic rollout** - seeded xxHash32 bucketing
//! - **Tolerant decoding** - field names match in any casing, and a bad pattern only disables its rule
//! - **Lock-free reads** - snapshots are swapped atomically
//!
//! # Quick Start
//!
//! ```
//! use tggl_flags::*;
//!
//! let flag = Flag::new("beta", Variation::inactive()).with_condition(
//!     Condition::new(Variation::active("on"))
//!         .with_rule(Rule::new("plan", Operator::StrEqual).with_values(["pro"])),
//! );
//!
//! let context = EvaluationContext::new().with_attribute("plan", "pro");
//! assert_eq!(flag.evaluate(&context), Variation::active("on"));
//! ```
//!
//! # Gradual Rollout
//!
//! ```
//! use tggl_flags::*;
//!
//! // Serve the new checkout to 25% of users
//! let flag = Flag::new("new-checkout", Variation::inactive()).with_condition(
//!     Condition::new(Variation::active(true)).with_rule(
//!         Rule::new("userId", Operator::Percentage)
//!             .with_range(0.0, 0.25)
//!             .with_seed(1234),
//!     ),
//! );
//!
//! let context = EvaluationContext::new().with_user_id("user-42");
//! let first = flag.evaluate(&context);
//! assert_eq!(flag.evaluate(&context), first);
//! ```
//!
//! # Snapshots
//!
//! ```
//! use tggl_flags::*;
//!
//! let store = ConfigStore::new();
//! store.replace(ConfigSnapshot::from_json(r#"[{"slug": "a", "defaultVariation": {"active": true, "value": 1}}]"#).unwrap());
//!
//! let snapshot = store.read();
//! assert!(snapshot.evaluate(&EvaluationContext::new(), "a").active);
//! assert!(!snapshot.evaluate(&EvaluationContext::new(), "b").active);
//! ```

pub mod context;
pub mod decode;
pub mod error;
pub mod flag;
pub mod operator;
pub mod rule;
pub mod store;
pub mod value;

pub use context::{Context, EvaluationContext, SerializedContext};
pub use decode::decode_flags;
pub use error::{FlagError, Result};
pub use flag::{Condition, Flag, Variation};
pub use operator::Operator;
pub use rule::{Rule, percentage};
pub use store::{ConfigSnapshot, ConfigStore};
pub use value::Value;
