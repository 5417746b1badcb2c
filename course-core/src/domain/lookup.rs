//! Reply shapes of the lookup endpoints (`people`, `places`, `gps`, `apidb`).
//!
//! The `message` field of these endpoints is a string on one call, a list on
//! the next and an object on a third. Each endpoint gets its own sum type,
//! decoded once at the boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::report::value_text;

/// Envelope shared by the `people`, `places` and `gps` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupReply {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Value,
}

impl LookupReply {
    /// Lookup replies always carry `code`; a body without it is some other
    /// service speaking (gateway, auth layer).
    pub fn is_lookup_body(&self) -> bool {
        self.code.is_some()
    }
}

/// Decoded `message` of the `people` and `places` endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameList {
    /// Names (people) or place names, as sent by the server.
    Names(Vec<String>),
    /// The server withholds data for this key.
    Restricted(String),
    /// The key is unknown to the server.
    NotFound(String),
}

impl NameList {
    pub fn decode(message: &Value) -> Self {
        match message {
            Value::Array(items) => NameList::Names(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            ),
            Value::String(text) => Self::decode_text(text),
            Value::Null => NameList::NotFound(String::new()),
            other => Self::decode_text(&value_text(other)),
        }
    }

    fn decode_text(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("RESTRICTED") {
            return NameList::Restricted(text.to_string());
        }
        if upper.contains("NOT FOUND") || upper.contains("NO DATA") {
            return NameList::NotFound(text.to_string());
        }
        NameList::Names(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        match self {
            NameList::Names(names) => names,
            _ => &[],
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, NameList::Restricted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Decoded `message` of the `gps` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum GpsFix {
    Located(Coordinates),
    Unavailable(String),
}

impl GpsFix {
    pub fn decode(message: &Value) -> Self {
        if let Value::Object(map) = message {
            if let (Some(lat), Some(lon)) = (number(map.get("lat")), number(map.get("lon"))) {
                return GpsFix::Located(Coordinates { lat, lon });
            }
        }
        GpsFix::Unavailable(value_text(message))
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GpsFix::Located(c) => Some(*c),
            GpsFix::Unavailable(_) => None,
        }
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Reply of the `apidb` endpoint: `{"reply": [...], "error": "OK"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbReply {
    #[serde(default)]
    pub reply: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DbReply {
    /// Rows as column maps. Array rows are keyed by their position (`"0"`, `"1"`, ...).
    pub fn rows(&self) -> Vec<Map<String, Value>> {
        let Some(Value::Array(rows)) = &self.reply else {
            return Vec::new();
        };
        rows.iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map.clone()),
                Value::Array(cells) => Some(
                    cells
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| (i.to_string(), cell.clone()))
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    /// `reply` or `error` is present.
    pub fn is_db_body(&self) -> bool {
        self.reply.is_some() || self.error.is_some()
    }

    pub fn is_ok(&self) -> bool {
        match self.error.as_deref() {
            Some(error) => error.eq_ignore_ascii_case("ok"),
            None => self.reply.is_some(),
        }
    }
}

/// Read an integer cell; MySQL replies frequently carry numbers as strings.
pub fn cell_i64(row: &Map<String, Value>, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn cell_str(row: &Map<String, Value>, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        other => Some(value_text(other)),
    }
}
