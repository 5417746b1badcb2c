use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{CoreError, Result};

/// A prompt with `{{variable}}` placeholders, rendered fresh for every model call.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PromptTemplate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub template: String,
    pub variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        let variables = Self::extract_variables(&template)?;
        let prompt = Self {
            name: name.into(),
            template,
            variables,
        };
        prompt.validate()?;
        Ok(prompt)
    }

    fn placeholder() -> Result<Regex> {
        Regex::new(r"\{\{(\w+)\}\}").map_err(|e| CoreError::Configuration(e.to_string()))
    }

    fn extract_variables(template: &str) -> Result<Vec<String>> {
        let re = Self::placeholder()?;
        let mut variables: Vec<String> = Vec::new();
        for cap in re.captures_iter(template) {
            let name = cap[1].to_string();
            if !variables.contains(&name) {
                variables.push(name);
            }
        }
        Ok(variables)
    }

    /// Substitute every placeholder from `context` in a single pass, so
    /// substituted text is never scanned again. A missing variable is an error.
    pub fn render(&self, context: &Value) -> Result<String> {
        let missing = self
            .variables
            .iter()
            .find(|var| context.get(var.as_str()).is_none());
        if let Some(var) = missing {
            return Err(CoreError::Validation(format!("Missing variable: {}", var)));
        }

        let re = Self::placeholder()?;
        let rendered = re.replace_all(&self.template, |caps: &Captures| {
            match context.get(&caps[1]) {
                Some(Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        });
        Ok(rendered.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_template() {
        let prompt = PromptTemplate::new(
            "ask",
            "Dane: {{payload}}\nPytanie: {{question}} ({{payload}})",
        )
        .unwrap();
        assert_eq!(prompt.variables, vec!["payload", "question"]);

        let rendered = prompt
            .render(&json!({"payload": "tekst", "question": 3}))
            .unwrap();
        assert_eq!(rendered, "Dane: tekst\nPytanie: 3 (tekst)");
    }

    #[test]
    fn test_substituted_text_is_not_rendered_again() {
        let prompt = PromptTemplate::new("retry", "{{feedback}}\nPytanie: {{question}}").unwrap();
        let rendered = prompt
            .render(&json!({
                "feedback": "server said: {{question}} and {{context}}",
                "question": "Kiedy?"
            }))
            .unwrap();
        assert_eq!(rendered, "server said: {{question}} and {{context}}\nPytanie: Kiedy?");
    }

    #[test]
    fn test_missing_variable() {
        let prompt = PromptTemplate::new("p", "{{a}} {{b}}").unwrap();
        assert!(matches!(
            prompt.render(&json!({"a": "x"})),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_template_rejected() {
        assert!(PromptTemplate::new("p", "").is_err());
    }
}
