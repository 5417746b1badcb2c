//! Classification of grading rejections for batch tasks.
//!
//! The grading server reports batch failures either as an object keyed by
//! question id or, more often, as free text such as
//! `"Answer for question 03 is incorrect"` or
//! `"Answers for questions 01 and 03 are incorrect"`. Both are reduced here to a
//! [`FailureClass`] so that retry logic can match on the category.

use regex::Regex;
use serde_json::Value;

use crate::domain::{QuestionId, QuestionSet, Rejection};
use crate::error::{CoreError, Result};

/// Feedback aimed at one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFailure {
    pub id: QuestionId,
    pub message: String,
    pub sent_answer: Option<String>,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// The server sent a map of question id to error.
    Keyed(Vec<QuestionFailure>),
    /// Exactly one known question is named in the message.
    SingleQuestion(QuestionFailure),
    /// Several known questions are named; the culprit cannot be singled out.
    Ambiguous {
        candidates: Vec<QuestionId>,
        message: String,
        hint: Option<String>,
        debug: Option<String>,
    },
    /// No known question is named.
    General {
        message: String,
        hint: Option<String>,
        debug: Option<String>,
    },
}

impl FailureClass {
    pub fn category(&self) -> &'static str {
        match self {
            FailureClass::Keyed(_) => "keyed",
            FailureClass::SingleQuestion(_) => "single_question",
            FailureClass::Ambiguous { .. } => "ambiguous",
            FailureClass::General { .. } => "general",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    question_ref: Regex,
    number: Regex,
}

impl ErrorClassifier {
    pub fn new() -> Result<Self> {
        // "question 3", "questions 01, 02 and 03", "pytania nr 1 i 4"
        let question_ref = Regex::new(
            r"(?i)\b(?:questions?|pytani[aeu]|pytań)\s*(?:nr\.?\s*)?(\d+(?:\s*(?:,|&|\band\b|\bor\b|\bi\b|\boraz\b|\blub\b)\s*(?:nr\.?\s*)?\d+)*)",
        )
        .map_err(|e| CoreError::Configuration(e.to_string()))?;
        let number = Regex::new(r"\d+").map_err(|e| CoreError::Configuration(e.to_string()))?;
        Ok(Self {
            question_ref,
            number,
        })
    }

    /// Classify `rejection` against the ids of the batch that was submitted.
    /// An empty `questions` set accepts any id the server names.
    pub fn classify(&self, rejection: &Rejection, questions: &QuestionSet) -> FailureClass {
        if let Some(keyed) = self.keyed_failures(rejection, questions) {
            return FailureClass::Keyed(keyed);
        }

        let mut named: Vec<QuestionId> = Vec::new();
        for cap in self.question_ref.captures_iter(&rejection.message) {
            for number in self.number.find_iter(&cap[1]) {
                let id = QuestionId::new(number.as_str());
                if (questions.is_empty() || questions.contains(&id)) && !named.contains(&id) {
                    named.push(id);
                }
            }
        }

        match named.len() {
            0 => FailureClass::General {
                message: rejection.message.clone(),
                hint: rejection.hint.clone(),
                debug: rejection.debug.clone(),
            },
            1 => FailureClass::SingleQuestion(QuestionFailure {
                id: named.remove(0),
                message: rejection.message.clone(),
                sent_answer: rejection.sent_answer(),
                hint: rejection.hint.clone(),
            }),
            _ => FailureClass::Ambiguous {
                candidates: named,
                message: rejection.message.clone(),
                hint: rejection.hint.clone(),
                debug: rejection.debug.clone(),
            },
        }
    }

    fn keyed_failures(
        &self,
        rejection: &Rejection,
        questions: &QuestionSet,
    ) -> Option<Vec<QuestionFailure>> {
        let Value::Object(map) = &rejection.raw_message else {
            return None;
        };
        let failures: Vec<QuestionFailure> = map
            .iter()
            .map(|(key, value)| (QuestionId::new(key), value))
            .filter(|(id, _)| questions.is_empty() || questions.contains(id))
            .map(|(id, value)| QuestionFailure {
                id,
                message: match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                sent_answer: None,
                hint: rejection.hint.clone(),
            })
            .collect();
        if failures.is_empty() {
            None
        } else {
            Some(failures)
        }
    }
}
