//! Context Assembly Engine (C8): filtered retrieval, code-query
//! delegation, and prompt construction with mechanically-derived source
//! attribution.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Mutex;
use tsic_domain::{ContextConfig, Meeting, Result, Update};

use crate::ports::{
    CodeQueryOptions, CodeQueryPort, LlmMessage, LlmPort, LlmRole, MeetingFilter, RepoRef,
    StorePort, UpdateFilter,
};

const SYSTEM_PROMPT: &str = "You have access to three context categories: meetings, issue-tracker \
tasks, and code from the repository. Distinguish strictly: issue tasks describe planned work, they \
are NOT evidence that code exists. Only code explicitly present under \"Codebase Information\" is \
evidence of implementation. If asked whether a feature described in a task is implemented, answer \
YES only when matching code is present under \"Codebase Information\"; otherwise answer NO and note \
that the task exists but no implementation is shown. Match response verbosity to question verbosity \
(greetings get brief replies).";

/// Explicit retrieval scope. When absent, retrieval falls back to the most
/// recent meetings/updates.
#[derive(Debug, Clone, Default)]
pub struct FilteredContext {
    pub meeting_ids: Vec<String>,
    pub task_ids: Vec<String>,
    pub repositories: Vec<RepoRef>,
}

/// Per-call options for `ask`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub filtered_context: Option<FilteredContext>,
    pub session_id: Option<String>,
}

/// One attributable source backing the answer, built from the retrieved
/// items directly rather than parsed out of the LLM's response.
#[derive(Debug, Clone)]
pub struct ContextSource {
    pub source_type: &'static str,
    pub id_or_path: String,
    pub title_or_name: String,
    pub similarity: Option<f64>,
}

/// Counts of items actually used to build the prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextUsed {
    pub meetings: usize,
    pub tasks: usize,
    pub code_chunks: usize,
}

#[derive(Debug, Clone)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<ContextSource>,
    pub context_used: ContextUsed,
}

struct ConversationTurn {
    question: String,
    answer: String,
}

/// C8: answers free-text questions using the user's own meeting, update,
/// and code context.
pub struct ContextAssemblyService {
    store: Arc<dyn StorePort>,
    code_query: Arc<dyn CodeQueryPort>,
    llm: Arc<dyn LlmPort>,
    config: ContextConfig,
    history: Mutex<HashMap<String, VecDeque<ConversationTurn>>>,
}

impl ContextAssemblyService {
    pub fn new(
        store: Arc<dyn StorePort>,
        code_query: Arc<dyn CodeQueryPort>,
        llm: Arc<dyn LlmPort>,
        config: ContextConfig,
    ) -> Self {
        Self { store, code_query, llm, config, history: Mutex::new(HashMap::new()) }
    }

    pub async fn ask(
        &self,
        user_id: &str,
        question: &str,
        options: AskOptions,
    ) -> Result<AskResponse> {
        let meeting_ids = options.filtered_context.as_ref().map(|f| f.meeting_ids.as_slice());
        let task_ids = options.filtered_context.as_ref().map(|f| f.task_ids.as_slice());
        let repositories = options.filtered_context.as_ref().map_or(&[][..], |f| f.repositories.as_slice());

        let meetings = self.retrieve_meetings(user_id, meeting_ids).await?;
        let updates = self.retrieve_updates(user_id, task_ids).await?;
        let (code_sections, code_sources) = self.retrieve_code(question, repositories).await?;

        let context_message = Self::build_context_message(&meetings, &updates, &code_sections);

        let mut messages = vec![LlmMessage { role: LlmRole::System, content: SYSTEM_PROMPT.to_string() }];
        if let Some(session_id) = &options.session_id {
            messages.extend(self.history_messages(session_id).await);
        }
        messages.push(LlmMessage { role: LlmRole::User, content: context_message });
        messages.push(LlmMessage { role: LlmRole::User, content: question.to_string() });

        let answer = self.llm.complete(messages).await?;

        if let Some(session_id) = &options.session_id {
            self.record_turn(session_id, question, &answer).await;
        }

        let mut sources: Vec<ContextSource> = meetings
            .iter()
            .map(|m| ContextSource {
                source_type: "meeting",
                id_or_path: m.external_meeting_id.clone(),
                title_or_name: m.title.clone(),
                similarity: None,
            })
            .collect();
        sources.extend(updates.iter().map(|u| ContextSource {
            source_type: "update",
            id_or_path: u.external_id.clone(),
            title_or_name: u.title.clone(),
            similarity: None,
        }));
        sources.extend(code_sources);

        let context_used = ContextUsed {
            meetings: meetings.len(),
            tasks: updates.len(),
            code_chunks: sources.iter().filter(|s| s.source_type == "code").count(),
        };

        Ok(AskResponse { answer, sources, context_used })
    }

    /// `None` (no `filtered_context` supplied) falls back to the most
    /// recent meetings. `Some(&[])` (caller explicitly scoped to nothing)
    /// retrieves nothing.
    async fn retrieve_meetings(&self, user_id: &str, meeting_ids: Option<&[String]>) -> Result<Vec<Meeting>> {
        let filter = match meeting_ids {
            None => MeetingFilter { limit: Some(self.config.fallback_meeting_count), ..Default::default() },
            Some(ids) => MeetingFilter { ids: Some(ids.to_vec()), ..Default::default() },
        };
        self.store.list_meetings(user_id, filter).await
    }

    /// Same `None` vs `Some(&[])` distinction as [`Self::retrieve_meetings`].
    async fn retrieve_updates(&self, user_id: &str, task_ids: Option<&[String]>) -> Result<Vec<Update>> {
        let filter = match task_ids {
            None => UpdateFilter { limit: Some(self.config.fallback_update_count), ..Default::default() },
            Some(ids) => UpdateFilter { ids: Some(ids.to_vec()), ..Default::default() },
        };
        self.store.list_updates(user_id, filter).await
    }

    async fn retrieve_code(
        &self,
        question: &str,
        repositories: &[RepoRef],
    ) -> Result<(Vec<String>, Vec<ContextSource>)> {
        let mut sections = Vec::new();
        let mut sources = Vec::new();

        let options = CodeQueryOptions {
            search_limit: self.config.code_query_limit,
            min_similarity: self.config.code_query_min_similarity,
        };

        for repo in repositories {
            let result = self.code_query.query_code(question, repo, options.clone()).await?;
            for chunk in result.sources {
                if chunk.similarity < self.config.code_query_min_similarity {
                    continue;
                }
                sections.push(format!(
                    "// {}:{} ({})\n{}",
                    chunk.file_path, chunk.start_line, chunk.chunk_name, chunk.language
                ));
                sources.push(ContextSource {
                    source_type: "code",
                    id_or_path: chunk.file_path,
                    title_or_name: chunk.chunk_name,
                    similarity: Some(chunk.similarity),
                });
            }
        }

        Ok((sections, sources))
    }

    fn build_context_message(meetings: &[Meeting], updates: &[Update], code_sections: &[String]) -> String {
        let mut out = String::from("Recent Meetings:\n");
        for meeting in meetings {
            let summary = meeting.ai_summary.as_deref().unwrap_or("");
            out.push_str(&format!(
                "- {} ({}) [Summary: {}]\n",
                meeting.title, meeting.start_time, summary
            ));
        }

        out.push_str("\nRecent Updates:\n");
        for update in updates {
            out.push_str(&format!("- [{}] {}\n", update.update_type.as_str(), update.title));
        }

        out.push_str("\nCodebase Information:\n");
        out.push_str(&code_sections.join("\n\n"));

        out
    }

    async fn history_messages(&self, session_id: &str) -> Vec<LlmMessage> {
        let history = self.history.lock().await;
        let Some(turns) = history.get(session_id) else {
            return Vec::new();
        };
        turns
            .iter()
            .flat_map(|turn| {
                [
                    LlmMessage { role: LlmRole::User, content: turn.question.clone() },
                    LlmMessage { role: LlmRole::Assistant, content: turn.answer.clone() },
                ]
            })
            .collect()
    }

    async fn record_turn(&self, session_id: &str, question: &str, answer: &str) {
        let mut history = self.history.lock().await;
        let ring = history.entry(session_id.to_string()).or_default();
        ring.push_back(ConversationTurn { question: question.to_string(), answer: answer.to_string() });
        while ring.len() > self.config.history_turns {
            ring.pop_front();
        }
    }
}
