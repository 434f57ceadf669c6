//! Retrieval-augmented answering for the document QA bot.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::bot::{ChatBot, Exchange};
use crate::constants::{ANSWER_TEMPERATURE, STUFF_DOCUMENT_SEPARATOR, STUFF_SYSTEM_TEMPLATE};
use crate::document_store::{Document, DocumentStore};
use crate::error::ChatResult;
use crate::llm_interaction::{ChatMessage, ChatModel};

/// How retrieved documents are combined into the model prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CombineStrategy {
    /// Every retrieved document goes into a single call. Nothing is chunked
    /// or summarized, so a large context can exceed the model's window.
    #[default]
    Stuff,
}

impl CombineStrategy {
    pub fn build_messages(self, documents: &[Document], question: &str) -> Vec<ChatMessage> {
        match self {
            CombineStrategy::Stuff => {
                let context = documents
                    .iter()
                    .map(|doc| doc.content.as_str())
                    .collect::<Vec<_>>()
                    .join(STUFF_DOCUMENT_SEPARATOR);
                vec![
                    ChatMessage::system(STUFF_SYSTEM_TEMPLATE.replace("{context}", &context)),
                    ChatMessage::user(question),
                ]
            }
        }
    }
}

pub struct Answerer {
    store: DocumentStore,
    model: Arc<dyn ChatModel>,
    top_k: NonZeroUsize,
    strategy: CombineStrategy,
}

impl Answerer {
    pub fn new(
        store: DocumentStore,
        model: Arc<dyn ChatModel>,
        top_k: NonZeroUsize,
        strategy: CombineStrategy,
    ) -> Self {
        Self { store, model, top_k, strategy }
    }

    /// Answers one question from the indexed documents. No memory of earlier
    /// questions is kept.
    #[instrument(skip(self, query))]
    pub async fn answer(&self, query: &str) -> ChatResult<String> {
        let documents = self.store.retrieve(query, self.top_k.get()).await?;
        info!(context_documents = documents.len(), "Answering from retrieved context");
        let messages = self.strategy.build_messages(&documents, query);
        self.model.complete(&messages, ANSWER_TEMPERATURE).await
    }
}

#[async_trait]
impl ChatBot for Answerer {
    // History is not part of the prompt: each question stands alone.
    async fn reply(&self, _history: &[Exchange], message: &str) -> ChatResult<String> {
        self.answer(message).await
    }
}
