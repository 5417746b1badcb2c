use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::answer::Answer;
use super::ids::QuestionId;
use super::report::value_text;
use crate::error::{CoreError, Result};

/// A batch of sub-questions graded together, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionSet(BTreeMap<QuestionId, String>);

impl QuestionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `{"01": "question text", ...}`. Non-string values are rendered as JSON.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(CoreError::Validation(
                "question file must be a JSON object".to_string(),
            ));
        };
        Ok(Self(
            map.iter()
                .map(|(id, text)| (QuestionId::new(id), value_text(text)))
                .collect(),
        ))
    }

    pub fn insert(&mut self, id: impl Into<QuestionId>, text: impl Into<String>) {
        self.0.insert(id.into(), text.into());
    }

    pub fn get(&self, id: &QuestionId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.0.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.0.iter().map(|(id, text)| (id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<QuestionId>, V: Into<String>> FromIterator<(K, V)> for QuestionSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Current answer for every question of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet(BTreeMap<QuestionId, String>);

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: QuestionId, answer: impl Into<String>) {
        self.0.insert(id, answer.into());
    }

    pub fn get(&self, id: &QuestionId) -> Option<&str> {
        self.0.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &str)> {
        self.0.iter().map(|(id, a)| (id, a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The object answer `{id: answer}` submitted for the whole batch.
    pub fn to_answer(&self) -> Answer {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(id, a)| (id.to_string(), Value::String(a.clone())))
            .collect();
        Answer::Map(map)
    }
}
