//! The two chat applications behind one interface.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::answerer::Answerer;
use crate::config::Settings;
use crate::constants::{CORPUS, DOCS_TITLE, NUTRITIONIST_TITLE};
use crate::document_store::DocumentStore;
use crate::embedding::OpenAiEmbedder;
use crate::error::ChatResult;
use crate::llm_interaction::OpenAiChatClient;
use crate::persona::PersonaResponder;

/// One user message and the reply it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self { user: user.into(), assistant: assistant.into() }
    }
}

#[async_trait]
pub trait ChatBot: Send + Sync {
    /// Produces the reply to `message`. Implementations never modify
    /// `history`; recording the exchange is up to the caller.
    async fn reply(&self, history: &[Exchange], message: &str) -> ChatResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AppKind {
    /// Question answering over the built-in company documents.
    Docs,
    /// Recipe suggestions from a dietitian persona.
    Nutritionist,
}

impl AppKind {
    pub fn title(self) -> &'static str {
        match self {
            AppKind::Docs => DOCS_TITLE,
            AppKind::Nutritionist => NUTRITIONIST_TITLE,
        }
    }
}

/// Wires the OpenAI clients for `kind`. For the document bot this embeds the
/// corpus, so it makes one network call before returning.
pub async fn build_bot(kind: AppKind, settings: &Settings) -> ChatResult<Arc<dyn ChatBot>> {
    let model = Arc::new(OpenAiChatClient::new(
        &settings.api_base,
        settings.api_key(),
        settings.chat_model.as_str(),
    ));
    info!(app = ?kind, model = model.model(), "Building chat bot");

    let bot: Arc<dyn ChatBot> = match kind {
        AppKind::Docs => {
            let embedder = Arc::new(OpenAiEmbedder::new(
                &settings.api_base,
                settings.api_key(),
                settings.embedding_model.as_str(),
            ));
            let store = DocumentStore::from_texts(CORPUS, embedder).await?;
            Arc::new(Answerer::new(store, model, settings.top_k, settings.combine))
        }
        AppKind::Nutritionist => Arc::new(PersonaResponder::nutritionist(model)?),
    };
    Ok(bot)
}
