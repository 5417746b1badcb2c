use async_trait::async_trait;
use course_core::{Answer, CoreError, Result};
use course_sdk::ChatOptions;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{Task, TaskContext, TaskResult};

pub const SHORT_ANSWER_PROMPT: &str = "You are a helpful assistant. Answer the following question with ONLY the essential information. Be concise and direct. Just provide the factual answer with no explanation.";

/// Marker for a test question nobody has answered yet.
pub const OPEN_ANSWER: &str = "???";

#[derive(Debug, Clone)]
pub struct JsonFixTask {
    pub source_file: String,
    pub report_task: String,
}

impl Default for JsonFixTask {
    fn default() -> Self {
        Self {
            source_file: "json.txt".to_string(),
            report_task: "JSON".to_string(),
        }
    }
}

/// Parse a calibration file that may carry `\[`/`\]` escapes or text around the object.
pub fn repair_document(text: &str) -> Result<Value> {
    let cleaned = text.replace("\\[", "[").replace("\\]", "]");
    match serde_json::from_str(&cleaned) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(error = %e, "Document is not valid JSON, trying outermost object");
            let outer = Regex::new(r"(?s)(\{.*\})")
                .map_err(|e| CoreError::Configuration(e.to_string()))?;
            let candidate = outer
                .captures(&cleaned)
                .and_then(|c| c.get(1))
                .ok_or_else(|| CoreError::Extraction("no JSON object in document".to_string()))?;
            Ok(serde_json::from_str(candidate.as_str())?)
        }
    }
}

/// Recompute the answer of every `"a + b"` question. Returns how many changed.
pub fn fix_calculations(document: &mut Value) -> Result<usize> {
    let sum = Regex::new(r"^\s*(\d+)\s*\+\s*(\d+)")
        .map_err(|e| CoreError::Configuration(e.to_string()))?;
    let Some(items) = document.get_mut("test-data").and_then(Value::as_array_mut) else {
        return Err(CoreError::Validation("document has no test-data array".to_string()));
    };

    let mut fixed = 0;
    for item in items.iter_mut() {
        let Some(question) = item.get("question").and_then(Value::as_str) else {
            continue;
        };
        let Some(caps) = sum.captures(question) else {
            continue;
        };
        let (Ok(a), Ok(b)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) else {
            continue;
        };
        let correct = json!(a + b);
        if item.get("answer") != Some(&correct) {
            debug!(question, correct = a + b, "Fixed calculation");
            item["answer"] = correct;
            fixed += 1;
        }
    }
    Ok(fixed)
}

/// Index and text of every test question still marked `???`.
pub fn open_test_questions(document: &Value) -> Vec<(usize, String)> {
    document
        .get("test-data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    let test = item.get("test")?;
                    if test.get("a")?.as_str()? != OPEN_ANSWER {
                        return None;
                    }
                    Some((index, test.get("q")?.as_str()?.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Task for JsonFixTask {
    async fn execute(&self, context: &TaskContext) -> Result<TaskResult> {
        let text = context.course.data().text(&self.source_file).await?;
        let mut document = repair_document(&text)?;

        let fixed = fix_calculations(&mut document)?;
        info!(fixed, "Calculations fixed");

        let open = open_test_questions(&document);
        if !open.is_empty() {
            let llm = context.llm()?;
            for (index, question) in &open {
                let options = ChatOptions::default().with_max_tokens(50);
                match llm.complete(SHORT_ANSWER_PROMPT, question, options).await {
                    Ok(answer) => {
                        debug!(question = %question, answer = %answer, "Answered test question");
                        document["test-data"][*index]["test"]["a"] = Value::String(answer);
                    }
                    Err(e) => warn!(question = %question, error = %e, "Test question left open"),
                }
            }
        }

        let key = context.api_key()?;
        document["apikey"] = Value::String(key.expose().to_string());

        let answer = Answer::from_value(document)?;
        context
            .submit(
                &self.report_task,
                answer,
                json!({ "fixed_calculations": fixed, "test_questions": open.len() }),
            )
            .await
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repair_escaped_brackets() {
        let doc = repair_document(r#"{"test-data": \[{"question": "1 + 1", "answer": 2}\]}"#).unwrap();
        assert_eq!(doc["test-data"][0]["answer"], json!(2));
    }

    #[test]
    fn test_repair_with_surrounding_text() {
        let doc = repair_document("header\n{\"apikey\": \"x\"}\ntrailer").unwrap();
        assert_eq!(doc, json!({"apikey": "x"}));
        assert!(repair_document("no json here").is_err());
    }

    #[test]
    fn test_fix_calculations_and_open_questions() {
        let mut doc = json!({
            "apikey": "%PUT-YOUR-API-KEY-HERE%",
            "test-data": [
                {"question": "45 + 86", "answer": 131},
                {"question": "97 + 34", "answer": 130},
                {"question": "3 + 4", "answer": 7, "test": {"q": "What is the capital city of Poland?", "a": "???"}},
                {"question": "1 + 1", "answer": 2, "test": {"q": "done", "a": "yes"}}
            ]
        });

        assert_eq!(fix_calculations(&mut doc).unwrap(), 1);
        assert_eq!(doc["test-data"][1]["answer"], json!(131));
        assert_eq!(
            open_test_questions(&doc),
            vec![(2, "What is the capital city of Poland?".to_string())]
        );
    }

    #[test]
    fn test_missing_test_data() {
        assert!(fix_calculations(&mut json!({"apikey": "x"})).is_err());
        assert!(open_test_questions(&json!({})).is_empty());
    }
}
