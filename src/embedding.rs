//! Text embeddings for the document store.
//!
//! The store only needs two calls: embed a batch of documents once at startup
//! and embed each query. [`OpenAiEmbedder`] serves both from the OpenAI
//! `/embeddings` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error::{ChatError, ChatResult};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> ChatResult<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> ChatResult<Vec<f32>> {
        let mut vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| ChatError::MalformedResponse("no embedding returned for query".into()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_base: &str, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[instrument(skip_all, fields(inputs = texts.len()))]
    async fn embed_documents(&self, texts: &[String]) -> ChatResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.api_base);
        let payload = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|source| ChatError::Http { url: url.clone(), source })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Embedding request failed");
            return Err(ChatError::Api { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ChatError::Http { url, source })?;
        let mut parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedResponse(format!("embedding body: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(ChatError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // The API may return items out of order.
        parsed.data.sort_by_key(|item| item.index);
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|item| item.embedding).collect();
        debug!(dimension = vectors.first().map(Vec::len), "Received embeddings");
        Ok(vectors)
    }
}
