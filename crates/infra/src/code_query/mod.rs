//! Code Query Adapter (C9): a thin client over an opaque, externally-hosted
//! embedding + vector-store + retrieval service. This crate treats that
//! service as a black box reached by one HTTP call; it does no embedding
//! or vector-search work of its own.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tsic_core::ports::{CodeChunkSource, CodeQueryOptions, CodeQueryPort, CodeQueryResult, RepoRef};
use tsic_domain::{Result, TsicError};

use crate::http::HttpClient;

/// HTTP-backed [`CodeQueryPort`] implementation.
pub struct HttpCodeQueryAdapter {
    http: HttpClient,
    endpoint: String,
}

impl HttpCodeQueryAdapter {
    #[must_use]
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self { http, endpoint: endpoint.into() }
    }
}

#[async_trait::async_trait]
impl CodeQueryPort for HttpCodeQueryAdapter {
    async fn query_code(
        &self,
        question: &str,
        repo: &RepoRef,
        options: CodeQueryOptions,
    ) -> Result<CodeQueryResult> {
        let request = QueryRequest {
            question: question.to_string(),
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            search_limit: options.search_limit,
            min_similarity: options.min_similarity,
        };

        let response = self
            .http
            .send(self.http.request(Method::POST, &self.endpoint).json(&request))
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TsicError::ProviderTransient {
                provider: "code_query".into(),
                message: format!("code query service returned {status}: {body}"),
            });
        }

        let parsed: QueryResponse = response.json().await.map_err(|e| TsicError::ParseFailure {
            what: "code query response".into(),
            message: e.to_string(),
        })?;

        let sources = parsed
            .sources
            .into_iter()
            .filter(|s| s.similarity >= options.min_similarity)
            .take(options.search_limit)
            .map(CodeChunkSource::from)
            .collect();

        Ok(CodeQueryResult { answer: parsed.answer, sources, confidence: parsed.confidence })
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    question: String,
    owner: String,
    name: String,
    search_limit: usize,
    min_similarity: f64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: Option<String>,
    sources: Vec<SourceDto>,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct SourceDto {
    file_path: String,
    chunk_type: String,
    chunk_name: String,
    start_line: u32,
    similarity: f64,
    language: String,
}

impl From<SourceDto> for CodeChunkSource {
    fn from(value: SourceDto) -> Self {
        Self {
            file_path: value.file_path,
            chunk_type: value.chunk_type,
            chunk_name: value.chunk_name,
            start_line: value.start_line,
            similarity: value.similarity,
            language: value.language,
        }
    }
}
