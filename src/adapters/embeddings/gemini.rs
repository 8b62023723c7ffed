//! Gemini embedding provider adapter.
//!
//! Stored text is embedded with task type `RETRIEVAL_DOCUMENT`, search text
//! with `RETRIEVAL_QUERY`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::EmbeddingsConfig;
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

pub struct GeminiEmbeddingProvider {
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

impl GeminiEmbeddingProvider {
    pub fn new(settings: &EmbeddingsConfig) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| DomainError::EmbeddingFailed(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings.model.clone(),
            dimension: settings.dimension,
            client,
        })
    }

    fn api_key(&self) -> DomainResult<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                DomainError::EmbeddingFailed(
                    "Gemini API key not set. Set GEMINI_API_KEY env var or configure embeddings.api_key."
                        .to_string(),
                )
            })
    }

    fn model_path(&self) -> String {
        format!("models/{}", self.model)
    }

    fn request<'a>(&self, text: &'a str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: self.model_path(),
            content: Content { parts: vec![Part { text }] },
            task_type,
            output_dimensionality: (self.dimension > 0).then_some(self.dimension),
        }
    }

    async fn post<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> DomainResult<R> {
        let api_key = self.api_key()?;
        let url = format!(
            "{}/{}:{}",
            self.base_url.trim_end_matches('/'),
            self.model_path(),
            method
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::EmbeddingFailed(format!("Embedding API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(DomainError::EmbeddingFailed(format!(
                "Embedding API returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| DomainError::SerializationError(format!("Failed to parse embedding response: {}", e)))
    }

    async fn embed_one(&self, text: &str, task_type: TaskType) -> DomainResult<Vec<f32>> {
        let response: EmbedContentResponse =
            self.post("embedContent", &self.request(text, task_type)).await?;
        Ok(response.embedding.values)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.embed_one(text, TaskType::RetrievalDocument).await
    }

    async fn embed_for_query(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.embed_one(text, TaskType::RetrievalQuery).await
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        let mut outputs = Vec::with_capacity(inputs.len());

        for chunk in inputs.chunks(MAX_BATCH) {
            let body = BatchEmbedRequest {
                requests: chunk
                    .iter()
                    .map(|input| self.request(&input.text, TaskType::RetrievalDocument))
                    .collect(),
            };
            let response: BatchEmbedResponse = self.post("batchEmbedContents", &body).await?;
            if response.embeddings.len() != chunk.len() {
                return Err(DomainError::EmbeddingFailed(format!(
                    "Embedding API returned {} vectors for {} inputs",
                    response.embeddings.len(),
                    chunk.len()
                )));
            }
            outputs.extend(chunk.iter().zip(response.embeddings).map(|(input, e)| EmbeddingOutput {
                id: input.id.clone(),
                vector: e.values,
            }));
        }

        Ok(outputs)
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: TaskType,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
