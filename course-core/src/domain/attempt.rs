use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::ids::QuestionId;

/// One rejected answer and the server's feedback on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub round: u32,
    pub sent_answer: Option<String>,
    pub message: String,
    pub hint: Option<String>,
    /// Server diagnostics that could not be tied to one answer
    #[serde(default)]
    pub debug: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(round: u32, message: impl Into<String>) -> Self {
        Self {
            round,
            sent_answer: None,
            message: message.into(),
            hint: None,
            debug: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_sent_answer(mut self, answer: Option<String>) -> Self {
        self.sent_answer = answer.filter(|a| !a.trim().is_empty());
        self
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint.filter(|h| !h.trim().is_empty());
        self
    }

    pub fn with_debug(mut self, debug: Option<String>) -> Self {
        self.debug = debug.filter(|d| !d.trim().is_empty());
        self
    }

    fn render_into(&self, out: &mut String) {
        let _ = writeln!(out, "Round {}:", self.round);
        if let Some(answer) = &self.sent_answer {
            let _ = writeln!(out, "- Wrong answer: {}", answer);
        }
        let _ = writeln!(out, "- Error: {}", self.message);
        if let Some(hint) = &self.hint {
            let _ = writeln!(out, "- Hint: {}", hint);
        }
        if let Some(debug) = &self.debug {
            let _ = writeln!(out, "- Debug: {}", debug);
        }
    }
}

/// Feedback collected across the rounds of an attempt loop.
///
/// Records are only ever appended. Question-specific records stay with their
/// question; batch-level notes (feedback that names no question) are kept
/// apart and shown to every question as shared context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptLedger {
    per_question: BTreeMap<QuestionId, Vec<AttemptRecord>>,
    shared: Vec<AttemptRecord>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, id: QuestionId, record: AttemptRecord) {
        self.per_question.entry(id).or_default().push(record);
    }

    pub fn record_shared(&mut self, record: AttemptRecord) {
        self.shared.push(record);
    }

    pub fn records(&self, id: &QuestionId) -> &[AttemptRecord] {
        self.per_question.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn shared(&self) -> &[AttemptRecord] {
        &self.shared
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.per_question.values().all(Vec::is_empty)
    }

    /// Previous-attempt context for one question, or `None` when nothing was recorded.
    pub fn context_for(&self, id: &QuestionId) -> Option<String> {
        let own = self.records(id);
        if own.is_empty() && self.shared.is_empty() {
            return None;
        }

        let mut out = String::new();
        if !own.is_empty() {
            out.push_str("Previous wrong attempts for this question:\n");
            for record in own {
                record.render_into(&mut out);
            }
        }
        if !self.shared.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Feedback on the whole answer set:\n");
            for record in &self.shared {
                record.render_into(&mut out);
            }
        }
        Some(out.trim_end().to_string())
    }
}
