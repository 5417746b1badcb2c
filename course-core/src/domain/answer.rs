use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::ids::ApiKey;
use crate::error::{CoreError, Result};

/// A value submitted to the report endpoint.
///
/// The grading server accepts strings, lists and objects. There is no variant
/// for `null`, which makes the "answer is never null" rule a property of the
/// type rather than a runtime check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl Answer {
    /// Convert an arbitrary JSON value. Scalars are stringified, `null` is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Err(CoreError::Validation(
                "answer cannot be null".to_string(),
            )),
            Value::String(s) => Ok(Answer::Text(s)),
            Value::Array(items) => Ok(Answer::List(items)),
            Value::Object(map) => Ok(Answer::Map(map)),
            other => Ok(Answer::Text(other.to_string())),
        }
    }

    /// Build an object answer from key/value pairs, keeping insertion order
    /// of the underlying map.
    pub fn map_of<K, V, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        V: Serialize,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key.into(), serde_json::to_value(value)?);
        }
        Ok(Answer::Map(map))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Answer::Text(s) => Value::String(s.clone()),
            Answer::List(items) => Value::Array(items.clone()),
            Answer::Map(map) => Value::Object(map.clone()),
        }
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Answer::Text(s)
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl From<Vec<String>> for Answer {
    fn from(items: Vec<String>) -> Self {
        Answer::List(items.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<Value>> for Answer {
    fn from(items: Vec<Value>) -> Self {
        Answer::List(items)
    }
}

impl From<Map<String, Value>> for Answer {
    fn from(map: Map<String, Value>) -> Self {
        Answer::Map(map)
    }
}

impl TryFrom<Value> for Answer {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self> {
        Answer::from_value(value)
    }
}

/// The body posted to `/report`: `{task, apikey, answer}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportEnvelope {
    #[validate(length(min = 1, max = 128))]
    pub task: String,
    pub apikey: ApiKey,
    pub answer: Answer,
}

impl ReportEnvelope {
    pub fn new(task: impl Into<String>, apikey: ApiKey, answer: impl Into<Answer>) -> Result<Self> {
        let envelope = Self {
            task: task.into().trim().to_string(),
            apikey,
            answer: answer.into(),
        };
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "task": self.task,
            "apikey": self.apikey.expose(),
            "answer": self.answer.to_value(),
        })
    }
}
