use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::utils::time::now_utc_rfc3339;

pub const ENVELOPE_SCHEMA_VERSION: &str = "bikecat.envelope.v1";

/// JSON wrapper printed by `--json` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub ok: bool,
    pub command: String,
    pub generated_at_utc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    pub meta: BTreeMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandEnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelopeError {
    pub code: String,
    pub message: String,
}

impl CommandEnvelope {
    #[must_use]
    pub fn ok(command: impl Into<String>, data: Value) -> Self {
        let mut envelope = Self::base(command, true);
        envelope.data = Some(data);
        envelope
    }

    #[must_use]
    pub fn error(
        command: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut envelope = Self::base(command, false);
        envelope.error = Some(CommandEnvelopeError {
            code: code.into(),
            message: message.into(),
        });
        envelope
    }

    fn base(command: impl Into<String>, ok: bool) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert("schema_version".to_string(), json!(ENVELOPE_SCHEMA_VERSION));

        Self {
            ok,
            command: command.into(),
            generated_at_utc: now_utc_rfc3339(),
            data: None,
            meta,
            error: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"ok\":{},\"command\":{}}}",
                self.ok,
                json!(self.command)
            )
        })
    }
}

/// Error carrying a failed envelope so `main` can print it and pick an exit code.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    envelope: CommandEnvelope,
}

impl CommandFailure {
    #[must_use]
    pub fn new(envelope: CommandEnvelope) -> Self {
        Self { envelope }
    }
}

impl Display for CommandFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.envelope.encode())
    }
}

impl std::error::Error for CommandFailure {}
