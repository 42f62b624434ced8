//! Code Query Adapter port (C9): the boundary C8 delegates to for
//! embedding-backed retrieval over a repository's indexed chunks.

use async_trait::async_trait;
use tsic_domain::Result;

/// A repository identity, scoping a query to one codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

/// One retrieved code chunk. The field is named `sources` at the
/// [`CodeQueryResult`] level (not `chunks`) because upstream consumers
/// (C8's `sources[]` output) key on that name directly.
#[derive(Debug, Clone)]
pub struct CodeChunkSource {
    pub file_path: String,
    pub chunk_type: String,
    pub chunk_name: String,
    pub start_line: u32,
    pub similarity: f64,
    pub language: String,
}

/// Result of a `query_code` call.
#[derive(Debug, Clone)]
pub struct CodeQueryResult {
    /// A natural-language answer synthesized over the retrieved chunks, if
    /// the adapter produces one; `None` when it only does retrieval.
    pub answer: Option<String>,
    /// Authoritative retrieved-chunk list.
    pub sources: Vec<CodeChunkSource>,
    /// Adapter-reported confidence in `answer`, `0.0` when `answer` is `None`.
    pub confidence: f64,
}

/// Query parameters, defaulted per the context-assembly configuration.
#[derive(Debug, Clone, Copy)]
pub struct CodeQueryOptions {
    /// Max chunks to return.
    pub search_limit: usize,
    /// Chunks below this similarity are dropped.
    pub min_similarity: f64,
}

/// Code Query Adapter contract.
#[async_trait]
pub trait CodeQueryPort: Send + Sync {
    /// Retrieve (and optionally answer over) chunks from `repo` relevant to
    /// `question`.
    async fn query_code(
        &self,
        question: &str,
        repo: &RepoRef,
        options: CodeQueryOptions,
    ) -> Result<CodeQueryResult>;
}
