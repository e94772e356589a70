//! Job domain types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A unit of work claimed from the remote queue
///
/// The worker holds a job only for the duration of one pipeline execution.
/// It is never cached or retried locally.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawJob")]
pub struct Job {
    /// Queue-assigned identifier (wire field `id`, or `trace_id` on older queues)
    pub id: String,
    pub step: Option<String>,
    /// Job type as sent by the queue (wire field `type`)
    pub kind: Option<String>,
    pub payload: JobPayload,
}

/// Decoded job payload
///
/// Queues may send the payload as structured JSON or as a JSON document
/// encoded inside a string. A string that does not decode is kept verbatim
/// together with the decode error instead of failing the claim.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPayload {
    Decoded(JsonValue),
    Raw { text: String, error: String },
    Empty,
}

impl JobPayload {
    /// Builds a payload from the raw wire value
    pub fn from_wire(value: Option<JsonValue>) -> Self {
        match value {
            None | Some(JsonValue::Null) => Self::Empty,
            Some(JsonValue::String(text)) if text.trim().is_empty() => Self::Empty,
            Some(JsonValue::String(text)) => match serde_json::from_str::<JsonValue>(&text) {
                Ok(decoded) => Self::Decoded(decoded),
                Err(e) => Self::Raw {
                    text,
                    error: e.to_string(),
                },
            },
            Some(other) => Self::Decoded(other),
        }
    }

    /// Returns the decoded value, if any
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Decoded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Status reported back to the queue for a claimed job
///
/// `Done` and `Error` are terminal. `Hold` parks the job on the queue side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Done,
    Error,
    Hold,
}

impl JobStatus {
    /// Wire token of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Done => "DONE",
            Self::Error => "ERROR",
            Self::Hold => "HOLD",
        }
    }

    /// Lower-case step name understood by queues predating status tokens
    pub fn step(&self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Error => "error",
            Self::Hold => "hold",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job as it appears on the wire, before identifier and payload normalization
#[derive(Debug, Deserialize)]
struct RawJob {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    trace_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_text")]
    step: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "deserialize_opt_text")]
    kind: Option<String>,
    #[serde(default)]
    payload: Option<JsonValue>,
}

impl TryFrom<RawJob> for Job {
    type Error = String;

    fn try_from(raw: RawJob) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .or(raw.trace_id.filter(|id| !id.is_empty()))
            .ok_or_else(|| "job record has neither `id` nor `trace_id`".to_string())?;

        Ok(Self {
            id,
            step: raw.step,
            kind: raw.kind,
            payload: JobPayload::from_wire(raw.payload),
        })
    }
}

/// Accepts identifiers sent either as strings or as integers
fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<WireId>::deserialize(deserializer)?.map(|id| match id {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }),
    )
}

/// Accepts descriptive fields of any JSON type, rendering non-strings as JSON text
fn deserialize_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
