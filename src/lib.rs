// Tggl - Feature flag SDK for Rust
//
// Flags are evaluated locally against a snapshot refreshed in the background,
// or remotely through the Tggl API. Flag usage is reported in batches.

// Re-export the clients
pub use tggl_client::*;

// Re-export flag definitions and evaluation
pub use tggl_flags::{
    Condition, ConfigSnapshot, ConfigStore, Context, EvaluationContext, Flag, FlagError, Operator,
    Rule, SerializedContext, Value, Variation, decode_flags,
};

// Re-export the member crates
pub use tggl_client;
pub use tggl_flags;
pub use tggl_http_client;
pub use tggl_log;
pub use tggl_reporting;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ClientConfig,
        ClientError,
        ConfigSource,
        Context,
        EvaluationContext,
        Flag,
        FlagsResponse,
        LocalClient,
        RemoteClient,
        SerializedContext,
        Value,
        Variation,
    };
    pub use tggl_reporting::{Reporting, ReportingConfig};
}
