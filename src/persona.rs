//! Persona chat: every user turn is wrapped in a fixed instruction template
//! and sent after the replayed conversation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::bot::{ChatBot, Exchange};
use crate::constants::{NUTRITIONIST_TEMPLATE, PERSONA_INPUT_VARIABLE, PERSONA_TEMPERATURE};
use crate::error::{ChatError, ChatResult};
use crate::llm_interaction::{ChatMessage, ChatModel};

/// Text with `{name}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, input_variables: &[&str]) -> ChatResult<Self> {
        let template = template.into();
        for name in input_variables {
            if !template.contains(&format!("{{{name}}}")) {
                return Err(ChatError::Template(format!(
                    "template has no {{{name}}} placeholder"
                )));
            }
        }
        Ok(Self {
            template,
            input_variables: input_variables.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Substitutes each declared slot with its raw value. Values are inserted
    /// as-is and never scanned for further slots.
    pub fn format(&self, values: &[(&str, &str)]) -> ChatResult<String> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        for name in &self.input_variables {
            if !values.contains_key(name.as_str()) {
                return Err(ChatError::Template(format!("missing value for {{{name}}}")));
            }
        }

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let slot = after
                .find('}')
                .map(|close| &after[..close])
                .filter(|name| self.input_variables.iter().any(|declared| declared.as_str() == *name));
            match slot {
                Some(name) => {
                    out.push_str(values[name]);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }
}

pub struct PersonaResponder {
    model: Arc<dyn ChatModel>,
    template: PromptTemplate,
    temperature: f32,
}

impl PersonaResponder {
    pub fn new(model: Arc<dyn ChatModel>, template: PromptTemplate, temperature: f32) -> Self {
        Self { model, template, temperature }
    }

    /// The registered dietitian persona.
    pub fn nutritionist(model: Arc<dyn ChatModel>) -> ChatResult<Self> {
        let template = PromptTemplate::new(NUTRITIONIST_TEMPLATE, &[PERSONA_INPUT_VARIABLE])?;
        Ok(Self::new(model, template, PERSONA_TEMPERATURE))
    }

    pub fn format_turn(&self, message: &str) -> ChatResult<String> {
        self.template.format(&[(PERSONA_INPUT_VARIABLE, message)])
    }

    /// Replayed history followed by the templated new turn.
    pub fn build_messages(&self, history: &[Exchange], message: &str) -> ChatResult<Vec<ChatMessage>> {
        let mut messages = Vec::with_capacity(history.len() * 2 + 1);
        for exchange in history {
            messages.push(ChatMessage::user(exchange.user.as_str()));
            messages.push(ChatMessage::assistant(exchange.assistant.as_str()));
        }
        messages.push(ChatMessage::user(self.format_turn(message)?));
        Ok(messages)
    }

    /// Does not touch `history`; the caller records the new exchange.
    #[instrument(skip_all, fields(history = history.len()))]
    pub async fn respond(&self, history: &[Exchange], message: &str) -> ChatResult<String> {
        let messages = self.build_messages(history, message)?;
        debug!(turns = messages.len(), "Sending persona conversation");
        self.model.complete(&messages, self.temperature).await
    }
}

#[async_trait]
impl ChatBot for PersonaResponder {
    async fn reply(&self, history: &[Exchange], message: &str) -> ChatResult<String> {
        self.respond(history, message).await
    }
}
