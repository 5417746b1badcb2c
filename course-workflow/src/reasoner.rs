//! Reasoners backed by the model API.

use async_trait::async_trait;
use course_core::{CoreError, PromptTemplate, Question, Reasoner, Result};
use course_sdk::{ChatOptions, LlmClient};
use serde_json::json;
use tracing::{debug, warn};

/// Default question prompt; `{{previous_attempts}}` renders empty on the first round.
pub const DEFAULT_QUESTION_TEMPLATE: &str = "{{previous_attempts}}

PYTANIE: {{question}}

KONTEKST:
{{context}}

INSTRUKCJE:
- Odpowiedz tylko konkretną informacją, bez dodatkowych słów
- Jeśli pytanie dotyczy daty, odpowiedz w formacie YYYY-MM-DD
- Unikaj odpowiedzi oznaczonych wcześniej jako błędne i weź pod uwagę podpowiedzi

ODPOWIEDŹ:";

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Jesteś ekspertem w analizie dokumentów. Odpowiadasz zwięźle i precyzyjnie na podstawie podanego kontekstu.";

/// Answers questions with one chat completion each.
#[derive(Debug, Clone)]
pub struct LlmReasoner {
    llm: LlmClient,
    system_prompt: String,
    template: PromptTemplate,
    options: ChatOptions,
    fallback: Option<String>,
}

impl LlmReasoner {
    pub fn new(llm: LlmClient) -> Result<Self> {
        Ok(Self {
            llm,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            template: PromptTemplate::new("question", DEFAULT_QUESTION_TEMPLATE)?,
            options: ChatOptions {
                temperature: Some(0.1),
                max_tokens: Some(100),
            },
            fallback: None,
        })
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Answer with `sentinel` instead of failing when the model API errors.
    pub fn with_fallback(mut self, sentinel: impl Into<String>) -> Self {
        self.fallback = Some(sentinel.into());
        self
    }

    pub fn prompt(&self, question: Question<'_>) -> Result<String> {
        let rendered = self.template.render(&json!({
            "question": question.text,
            "context": question.context,
            "previous_attempts": question.previous_attempts.unwrap_or_default(),
        }))?;
        Ok(rendered.trim().to_string())
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn answer(&self, question: Question<'_>) -> Result<String> {
        let prompt = self.prompt(question)?;
        debug!(chars = prompt.chars().count(), "Asking model");

        match self.llm.complete(&self.system_prompt, &prompt, self.options).await {
            Ok(answer) => Ok(answer),
            Err(e) => match &self.fallback {
                Some(sentinel) => {
                    warn!(error = %e, sentinel = %sentinel, "Model call failed, using fallback answer");
                    Ok(sentinel.clone())
                }
                None => Err(CoreError::from(e)),
            },
        }
    }
}
