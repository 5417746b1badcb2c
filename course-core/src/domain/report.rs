use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Result;

/// `code` value the grading server uses for an accepted answer.
pub const SUCCESS_CODE: i64 = 0;

/// Reply of the report endpoint.
///
/// Only `code` and `message` are reliably present. Every field is decoded
/// leniently: numbers sent as strings are parsed, non-string hints are
/// stringified, and a missing `code` is kept as `None` (never accepted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Value,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl ReportResponse {
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn is_accepted(&self) -> bool {
        self.code == Some(SUCCESS_CODE)
    }

    /// The message as display text; objects and lists are rendered as JSON.
    pub fn message_text(&self) -> String {
        value_text(&self.message)
    }

    pub fn verdict(&self) -> Verdict {
        if self.is_accepted() {
            Verdict::Accepted {
                message: self.message_text(),
            }
        } else {
            Verdict::Rejected(Rejection {
                code: self.code,
                message: self.message_text(),
                raw_message: self.message.clone(),
                hint: self.hint.clone(),
                debug: self.debug.clone(),
            })
        }
    }
}

/// Outcome of one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted { message: String },
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// Diagnostic fields of a rejected submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub code: Option<i64>,
    pub message: String,
    pub raw_message: Value,
    pub hint: Option<String>,
    pub debug: Option<String>,
}

impl Rejection {
    /// The answer the server says it received, taken from `debug`
    /// (`"You sent: X"` or the bare text).
    pub fn sent_answer(&self) -> Option<String> {
        let debug = self.debug.as_deref()?.trim();
        if debug.is_empty() {
            return None;
        }
        let sent = debug.strip_prefix("You sent:").unwrap_or(debug).trim();
        Some(sent.to_string())
    }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn lenient_code<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(other) => Some(value_text(&other)),
    })
}
