//! In-memory document index with exhaustive nearest-neighbour search.
//!
//! Vectors are compared by squared Euclidean distance, smallest first. Equal
//! distances keep insertion order, so results are stable for a deterministic
//! embedder.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::embedding::Embedder;
use crate::error::{ChatError, ChatResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

pub struct DocumentStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(Document, Vec<f32>)>,
}

impl DocumentStore {
    /// Embeds every text in one batch and indexes the results.
    pub async fn from_texts<I, S>(texts: I, embedder: Arc<dyn Embedder>) -> ChatResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(ChatError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        let entries: Vec<(Document, Vec<f32>)> = texts
            .into_iter()
            .map(Document::new)
            .zip(vectors)
            .collect();
        if let Some(dimension) = entries.first().map(|(_, v)| v.len()) {
            if let Some((_, bad)) = entries.iter().find(|(_, v)| v.len() != dimension) {
                return Err(ChatError::DimensionMismatch {
                    expected: dimension,
                    actual: bad.len(),
                });
            }
        }

        info!(documents = entries.len(), "Document store ready");
        Ok(Self { embedder, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns up to `k` documents nearest to `query`.
    #[instrument(skip(self, query))]
    pub async fn retrieve(&self, query: &str, k: usize) -> ChatResult<Vec<Document>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;
        let expected = self.entries[0].1.len();
        if query_vector.len() != expected {
            return Err(ChatError::DimensionMismatch {
                expected,
                actual: query_vector.len(),
            });
        }

        let mut ranked: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, squared_l2(&query_vector, vector)))
            .collect();
        // Stable sort keeps insertion order for equal distances.
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let hits: Vec<Document> = ranked
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].0.clone())
            .collect();
        debug!(hits = hits.len(), "Retrieved documents");
        Ok(hits)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps known texts to fixed vectors; anything else lands at the origin.
    pub(crate) struct TableEmbedder {
        table: Vec<(String, Vec<f32>)>,
        pub(crate) calls: AtomicUsize,
    }

    impl TableEmbedder {
        pub(crate) fn new(table: Vec<(&str, Vec<f32>)>) -> Self {
            Self {
                table: table
                    .into_iter()
                    .map(|(text, v)| (text.to_string(), v))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        async fn embed_documents(&self, texts: &[String]) -> ChatResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let dimension = self.table.first().map(|(_, v)| v.len()).unwrap_or(2);
            Ok(texts
                .iter()
                .map(|text| {
                    self.table
                        .iter()
                        .find(|(known, _)| known == text)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| vec![0.0; dimension])
                })
                .collect())
        }
    }

    pub(crate) fn corpus_embedder() -> TableEmbedder {
        TableEmbedder::new(vec![
            ("会社の新しい休暇ポリシーは、年間20日の有給休暇を提供します。", vec![1.0, 0.0, 0.0]),
            ("次の四半期の目標は、売上を10%増加させることです。", vec![0.0, 1.0, 0.0]),
            ("社内のITサポートチームへの連絡先は内線1234です。", vec![0.0, 0.0, 1.0]),
            ("有給休暇は何日ありますか？", vec![0.9, 0.2, 0.1]),
            ("ITサポートの内線番号は？", vec![0.1, 0.3, 0.8]),
        ])
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_orders_by_distance() {
        let store = DocumentStore::from_texts(crate::constants::CORPUS, Arc::new(corpus_embedder()))
            .await
            .unwrap();
        assert_eq!(store.len(), 3);

        let hits = store.retrieve("有給休暇は何日ありますか？", 4).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits[0].content.contains("休暇ポリシー"));
        assert!(hits[1].content.contains("四半期"));
        assert!(hits[2].content.contains("ITサポート"));

        let top = store.retrieve("ITサポートの内線番号は？", 1).await.unwrap();
        assert_eq!(top, vec![Document::new(crate::constants::CORPUS[2])]);
    }

    #[tokio::test]
    async fn test_retrieve_is_deterministic() {
        let store = DocumentStore::from_texts(crate::constants::CORPUS, Arc::new(corpus_embedder()))
            .await
            .unwrap();
        let first = store.retrieve("有給休暇は何日ありますか？", 4).await.unwrap();
        for _ in 0..5 {
            assert_eq!(store.retrieve("有給休暇は何日ありますか？", 4).await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        // Unknown texts all embed to the origin, so every distance is equal.
        let store = DocumentStore::from_texts(["a", "b", "c"], Arc::new(TableEmbedder::new(Vec::new())))
            .await
            .unwrap();
        let hits = store.retrieve("anything", 3).await.unwrap();
        let contents: Vec<&str> = hits.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_store_and_zero_k_return_nothing() {
        let embedder = Arc::new(corpus_embedder());
        let store = DocumentStore::from_texts(Vec::<String>::new(), embedder.clone())
            .await
            .unwrap();
        assert!(store.is_empty());
        assert!(store.retrieve("有給休暇は何日ありますか？", 4).await.unwrap().is_empty());

        let store = DocumentStore::from_texts(crate::constants::CORPUS, embedder.clone())
            .await
            .unwrap();
        let calls_before = embedder.calls.load(Ordering::SeqCst);
        assert!(store.retrieve("有給休暇は何日ありますか？", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let embedder = TableEmbedder::new(vec![("doc", vec![1.0, 0.0]), ("query", vec![1.0, 0.0, 0.0])]);
        let store = DocumentStore::from_texts(["doc"], Arc::new(embedder)).await.unwrap();
        let err = store.retrieve("query", 1).await.unwrap_err();
        assert!(matches!(err, ChatError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn test_mixed_dimension_corpus_is_rejected() {
        let embedder = TableEmbedder::new(vec![
            ("short", vec![1.0, 0.0]),
            ("long", vec![0.0, 1.0, 0.0]),
        ]);
        let err = DocumentStore::from_texts(["short", "long"], Arc::new(embedder))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ChatError::DimensionMismatch { expected: 2, actual: 3 }));
    }
}
