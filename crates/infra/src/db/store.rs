//! SQLite implementation of [`tsic_core::StorePort`] (C1). Every call wraps
//! its synchronous `rusqlite` work in `tokio::task::spawn_blocking`, since
//! the pool has no async mode, following the repository pattern this crate
//! is grounded on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tsic_core::ports::{MeetingFilter, StorePort, UpdateFilter};
use tsic_domain::{
    ActionItem, Attendee, ContextReference, CredentialPayload, IntegrationCredential, Meeting,
    Result, TsicError, Update, UpdateType,
};

use super::manager::{DbManager, SharedDb};
use crate::errors::InfraError;

/// SQLite-backed [`StorePort`] implementation.
pub struct SqliteStore {
    db: SharedDb,
}

impl SqliteStore {
    #[must_use]
    pub fn new(db: SharedDb) -> Self {
        Self { db }
    }

    /// Open a database at `path`, run migrations, and wrap it.
    pub fn open<P: AsRef<std::path::Path>>(path: P, pool_size: u32) -> Result<Self> {
        let db = Arc::new(DbManager::new(path, pool_size)?);
        db.run_migrations()?;
        Ok(Self::new(db))
    }
}

fn sql_err(e: rusqlite::Error) -> TsicError {
    TsicError::from(InfraError::from(e))
}

fn join_err(e: tokio::task::JoinError) -> TsicError {
    TsicError::from(InfraError::from(e))
}

fn update_type_from_str(value: &str) -> Result<UpdateType> {
    match value {
        "issue_created" => Ok(UpdateType::IssueCreated),
        "issue_updated" => Ok(UpdateType::IssueUpdated),
        "issue_comment" => Ok(UpdateType::IssueComment),
        "code_pr" => Ok(UpdateType::CodePr),
        "code_commit" => Ok(UpdateType::CodeCommit),
        other => {
            Err(TsicError::ParseFailure { what: "update_type".into(), message: format!("unknown: {other}") })
        }
    }
}

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    let attendees_json: String = row.get("attendees_json")?;
    let key_decisions_json: String = row.get("key_decisions_json")?;
    let action_items_json: String = row.get("action_items_json")?;
    let metadata_json: String = row.get("metadata_json")?;
    let start_time: String = row.get("start_time")?;
    let end_time: String = row.get("end_time")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    let attendees: Vec<Attendee> = serde_json::from_str(&attendees_json).unwrap_or_default();
    let key_decisions: Vec<String> = serde_json::from_str(&key_decisions_json).unwrap_or_default();
    let action_items: Vec<ActionItem> = serde_json::from_str(&action_items_json).unwrap_or_default();
    let metadata = serde_json::from_str(&metadata_json).unwrap_or_default();

    Ok(Meeting {
        user_id: row.get("user_id")?,
        external_meeting_id: row.get("external_meeting_id")?,
        title: row.get("title")?,
        start_time: NaiveDateTime::parse_from_str(&start_time, "%Y-%m-%dT%H:%M:%S%.f")
            .unwrap_or_default(),
        end_time: NaiveDateTime::parse_from_str(&end_time, "%Y-%m-%dT%H:%M:%S%.f").unwrap_or_default(),
        start_timezone: row.get("start_timezone")?,
        end_timezone: row.get("end_timezone")?,
        location: row.get("location")?,
        url: row.get("url")?,
        attendees,
        is_important: row.get("is_important")?,
        importance_score: row.get("importance_score")?,
        manual_notes: row.get("manual_notes")?,
        ai_summary: row.get("ai_summary")?,
        key_decisions,
        action_items,
        copilot_notes: row.get("copilot_notes")?,
        metadata,
        created_at: parse_instant(&created_at),
        updated_at: parse_instant(&updated_at),
    })
}

fn parse_instant(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map(|d| d.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

fn update_from_row(row: &Row<'_>) -> rusqlite::Result<Update> {
    let update_type: String = row.get("update_type")?;
    let linked_keys_json: String = row.get("linked_external_keys_json")?;
    let metadata_json: String = row.get("metadata_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Update {
        user_id: row.get("user_id")?,
        update_type: update_type_from_str(&update_type).unwrap_or(UpdateType::IssueComment),
        external_id: row.get("external_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        content_text: row.get("content_text")?,
        author: row.get("author")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        project: row.get("project")?,
        linked_meeting_id: row.get("linked_meeting_id")?,
        linked_external_keys: serde_json::from_str(&linked_keys_json).unwrap_or_default(),
        url: row.get("url")?,
        metadata: serde_json::from_str(&metadata_json).unwrap_or_default(),
        created_at: parse_instant(&created_at),
        updated_at: parse_instant(&updated_at),
    })
}

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<IntegrationCredential> {
    let scopes_json: String = row.get("scopes_json")?;
    let metadata_json: String = row.get("metadata_json")?;
    let token_expires_at: String = row.get("token_expires_at")?;
    let connected_at: String = row.get("connected_at")?;

    let metadata: CredentialPayload =
        serde_json::from_str(&metadata_json).unwrap_or(CredentialPayload::PersonalToken);

    Ok(IntegrationCredential {
        user_id: row.get("user_id")?,
        service_name: row.get("service_name")?,
        access_token: row.get("access_token")?,
        refresh_token: row.get("refresh_token")?,
        token_expires_at: parse_instant(&token_expires_at),
        scopes: serde_json::from_str(&scopes_json).unwrap_or_default(),
        metadata,
        connected_at: parse_instant(&connected_at),
    })
}

#[async_trait]
impl StorePort for SqliteStore {
    async fn upsert_meeting(&self, user_id: &str, meeting: Meeting) -> Result<Meeting> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let existing = conn
                .query_row(
                    "SELECT * FROM meeting WHERE user_id = ?1 AND external_meeting_id = ?2",
                    params![user_id, meeting.external_meeting_id],
                    meeting_from_row,
                )
                .optional()
                .map_err(sql_err)?;

            let merged = match existing {
                None => meeting,
                Some(prev) => Meeting {
                    is_important: prev.is_important || meeting.is_important,
                    importance_score: prev.importance_score,
                    manual_notes: prev.manual_notes.or(meeting.manual_notes),
                    ai_summary: prev.ai_summary.or(meeting.ai_summary),
                    key_decisions: if prev.key_decisions.is_empty() {
                        meeting.key_decisions
                    } else {
                        prev.key_decisions
                    },
                    action_items: if prev.action_items.is_empty() {
                        meeting.action_items
                    } else {
                        prev.action_items
                    },
                    copilot_notes: prev.copilot_notes.or(meeting.copilot_notes),
                    created_at: prev.created_at,
                    metadata: merge_metadata(prev.metadata, meeting.metadata),
                    ..meeting
                },
            };

            let now = Utc::now();
            conn.execute(
                "INSERT INTO meeting (user_id, external_meeting_id, title, start_time, end_time, \
                 start_timezone, end_timezone, location, url, attendees_json, is_important, \
                 importance_score, manual_notes, ai_summary, key_decisions_json, action_items_json, \
                 copilot_notes, metadata_json, created_at, updated_at) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20) \
                 ON CONFLICT(user_id, external_meeting_id) DO UPDATE SET \
                 title=excluded.title, start_time=excluded.start_time, end_time=excluded.end_time, \
                 start_timezone=excluded.start_timezone, end_timezone=excluded.end_timezone, \
                 location=excluded.location, url=excluded.url, attendees_json=excluded.attendees_json, \
                 is_important=excluded.is_important, importance_score=excluded.importance_score, \
                 manual_notes=excluded.manual_notes, ai_summary=excluded.ai_summary, \
                 key_decisions_json=excluded.key_decisions_json, action_items_json=excluded.action_items_json, \
                 copilot_notes=excluded.copilot_notes, metadata_json=excluded.metadata_json, \
                 updated_at=excluded.updated_at",
                params![
                    merged.user_id,
                    merged.external_meeting_id,
                    merged.title,
                    merged.start_time.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                    merged.end_time.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                    merged.start_timezone,
                    merged.end_timezone,
                    merged.location,
                    merged.url,
                    serde_json::to_string(&merged.attendees).map_err(|e| sql_err_json(e))?,
                    merged.is_important,
                    merged.importance_score,
                    merged.manual_notes,
                    merged.ai_summary,
                    serde_json::to_string(&merged.key_decisions).map_err(|e| sql_err_json(e))?,
                    serde_json::to_string(&merged.action_items).map_err(|e| sql_err_json(e))?,
                    merged.copilot_notes,
                    serde_json::to_string(&merged.metadata).map_err(|e| sql_err_json(e))?,
                    merged.created_at.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;

            conn.query_row(
                "SELECT * FROM meeting WHERE user_id = ?1 AND external_meeting_id = ?2",
                params![merged.user_id, merged.external_meeting_id],
                meeting_from_row,
            )
            .map_err(sql_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn update_meeting_transcript(
        &self,
        user_id: &str,
        external_meeting_id: &str,
        transcript: &str,
        copilot_notes: Option<&str>,
        online_meeting_id: Option<&str>,
    ) -> Result<()> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let external_meeting_id = external_meeting_id.to_string();
        let transcript = transcript.to_string();
        let copilot_notes = copilot_notes.map(str::to_string);
        let online_meeting_id = online_meeting_id.map(str::to_string);

        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let metadata_json: Option<String> = conn
                .query_row(
                    "SELECT metadata_json FROM meeting WHERE user_id = ?1 AND external_meeting_id = ?2",
                    params![user_id, external_meeting_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;

            let Some(metadata_json) = metadata_json else {
                return Err(TsicError::InternalInvariantViolated {
                    message: format!("transcript write for unknown meeting {external_meeting_id}"),
                });
            };

            let mut metadata: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&metadata_json).unwrap_or_default();

            if !transcript.is_empty() {
                metadata.insert("transcript".into(), serde_json::Value::String(transcript));
                metadata.insert(
                    "transcript_fetched_at".into(),
                    serde_json::Value::String(Utc::now().to_rfc3339()),
                );
            }
            if let Some(notes) = copilot_notes {
                metadata.insert("copilot_notes".into(), serde_json::Value::String(notes));
            }
            if let Some(id) = online_meeting_id {
                metadata.insert("online_meeting_id".into(), serde_json::Value::String(id));
            }

            conn.execute(
                "UPDATE meeting SET metadata_json = ?1, updated_at = ?2 \
                 WHERE user_id = ?3 AND external_meeting_id = ?4",
                params![
                    serde_json::to_string(&metadata).map_err(|e| sql_err_json(e))?,
                    Utc::now().to_rfc3339(),
                    user_id,
                    external_meeting_id,
                ],
            )
            .map_err(sql_err)?;

            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn get_meeting(&self, user_id: &str, external_meeting_id: &str) -> Result<Option<Meeting>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let external_meeting_id = external_meeting_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT * FROM meeting WHERE user_id = ?1 AND external_meeting_id = ?2",
                params![user_id, external_meeting_id],
                meeting_from_row,
            )
            .optional()
            .map_err(sql_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn list_meetings(&self, user_id: &str, filter: MeetingFilter) -> Result<Vec<Meeting>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut sql = String::from("SELECT * FROM meeting WHERE user_id = ?1");
            let mut dyn_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

            if let Some(ids) = &filter.ids {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                sql.push_str(&format!(" AND external_meeting_id IN ({placeholders})"));
                for id in ids {
                    dyn_params.push(Box::new(id.clone()));
                }
            }
            if let Some((start, end)) = &filter.time_range {
                sql.push_str(&format!(" AND start_time >= ?{} AND start_time < ?{}", dyn_params.len() + 1, dyn_params.len() + 2));
                dyn_params.push(Box::new(start.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
                dyn_params.push(Box::new(end.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string()));
            }
            if let Some(is_important) = filter.is_important {
                sql.push_str(&format!(" AND is_important = ?{}", dyn_params.len() + 1));
                dyn_params.push(Box::new(is_important));
            }
            sql.push_str(" ORDER BY start_time DESC");
            if let Some(limit) = filter.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }

            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> = dyn_params.iter().map(AsRef::as_ref).collect();
            let rows = stmt
                .query_map(param_refs.as_slice(), meeting_from_row)
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err)?;
            Ok(rows)
        })
        .await
        .map_err(join_err)?
    }

    async fn upsert_update(&self, user_id: &str, mut update: Update) -> Result<Update> {
        update.user_id = user_id.to_string();
        update.regenerate_content_text();
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let existing_created_at: Option<String> = conn
                .query_row(
                    "SELECT created_at FROM update_entry WHERE user_id = ?1 AND update_type = ?2 AND external_id = ?3",
                    params![update.user_id, update.update_type.as_str(), update.external_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_err)?;

            let created_at =
                existing_created_at.map(|s| parse_instant(&s)).unwrap_or(update.created_at);

            conn.execute(
                "INSERT INTO update_entry (user_id, update_type, external_id, title, description, \
                 content_text, author, status, priority, project, linked_meeting_id, \
                 linked_external_keys_json, url, metadata_json, created_at, updated_at) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16) \
                 ON CONFLICT(user_id, update_type, external_id) DO UPDATE SET \
                 title=excluded.title, description=excluded.description, content_text=excluded.content_text, \
                 author=excluded.author, status=excluded.status, priority=excluded.priority, \
                 project=excluded.project, linked_meeting_id=excluded.linked_meeting_id, \
                 linked_external_keys_json=excluded.linked_external_keys_json, url=excluded.url, \
                 metadata_json=excluded.metadata_json, updated_at=excluded.updated_at",
                params![
                    update.user_id,
                    update.update_type.as_str(),
                    update.external_id,
                    update.title,
                    update.description,
                    update.content_text,
                    update.author,
                    update.status,
                    update.priority,
                    update.project,
                    update.linked_meeting_id,
                    serde_json::to_string(&update.linked_external_keys).map_err(|e| sql_err_json(e))?,
                    update.url,
                    serde_json::to_string(&update.metadata).map_err(|e| sql_err_json(e))?,
                    created_at.to_rfc3339(),
                    update.updated_at.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;

            conn.query_row(
                "SELECT * FROM update_entry WHERE user_id = ?1 AND update_type = ?2 AND external_id = ?3",
                params![update.user_id, update.update_type.as_str(), update.external_id],
                update_from_row,
            )
            .map_err(sql_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn delete_updates_missing_from(
        &self,
        user_id: &str,
        update_type: UpdateType,
        window_start: DateTime<Utc>,
        current_external_ids: &[String],
    ) -> Result<usize> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let current_external_ids = current_external_ids.to_vec();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;

            let total_in_window: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM update_entry WHERE user_id = ?1 AND update_type = ?2 AND updated_at >= ?3",
                    params![user_id, update_type.as_str(), window_start.to_rfc3339()],
                    |row| row.get(0),
                )
                .map_err(sql_err)?;

            let mut stmt = conn
                .prepare(
                    "SELECT external_id FROM update_entry WHERE user_id = ?1 AND update_type = ?2 AND updated_at >= ?3",
                )
                .map_err(sql_err)?;
            let candidates: Vec<String> = stmt
                .query_map(params![user_id, update_type.as_str(), window_start.to_rfc3339()], |row| row.get(0))
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err)?;

            let to_delete: Vec<&String> =
                candidates.iter().filter(|id| !current_external_ids.contains(id)).collect();

            if to_delete.is_empty() {
                return Ok(0);
            }

            if total_in_window > 0 {
                let fraction = to_delete.len() as f64 / total_in_window as f64;
                if fraction > tsic_domain::constants::RECONCILIATION_WARN_FRACTION {
                    tracing::warn!(
                        user_id,
                        update_type = update_type.as_str(),
                        fraction,
                        "deletion reconciliation removing a large fraction of rows in window"
                    );
                }
            }

            let placeholders = to_delete.iter().map(|_| "?").collect::<Vec<_>>().join(",");
            let sql = format!(
                "DELETE FROM update_entry WHERE user_id = ? AND update_type = ? AND external_id IN ({placeholders})"
            );
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> =
                vec![Box::new(user_id.clone()), Box::new(update_type.as_str().to_string())];
            for id in &to_delete {
                params_vec.push(Box::new((*id).clone()));
            }
            let param_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(AsRef::as_ref).collect();
            let deleted = conn.execute(&sql, param_refs.as_slice()).map_err(sql_err)?;
            Ok(deleted)
        })
        .await
        .map_err(join_err)?
    }

    async fn list_updates(&self, user_id: &str, filter: UpdateFilter) -> Result<Vec<Update>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            let mut sql = String::from("SELECT * FROM update_entry WHERE user_id = ?1");
            let mut dyn_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

            if let Some(ids) = &filter.ids {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                sql.push_str(&format!(" AND external_id IN ({placeholders})"));
                for id in ids {
                    dyn_params.push(Box::new(id.clone()));
                }
            }
            if let Some(types) = &filter.types {
                if !types.is_empty() {
                    let placeholders = types.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                    sql.push_str(&format!(" AND update_type IN ({placeholders})"));
                    for t in types {
                        dyn_params.push(Box::new(t.as_str().to_string()));
                    }
                }
            }
            if let Some((start, end)) = &filter.window {
                sql.push_str(&format!(" AND updated_at >= ?{} AND updated_at < ?{}", dyn_params.len() + 1, dyn_params.len() + 2));
                dyn_params.push(Box::new(start.to_rfc3339()));
                dyn_params.push(Box::new(end.to_rfc3339()));
            }
            if let Some(substr) = &filter.content_contains {
                sql.push_str(&format!(" AND content_text LIKE ?{}", dyn_params.len() + 1));
                dyn_params.push(Box::new(format!("%{substr}%")));
            }
            sql.push_str(" ORDER BY updated_at DESC");
            if let Some(limit) = filter.limit {
                sql.push_str(&format!(" LIMIT {limit}"));
            }

            let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> = dyn_params.iter().map(AsRef::as_ref).collect();
            let rows = stmt
                .query_map(param_refs.as_slice(), update_from_row)
                .map_err(sql_err)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_err)?;
            Ok(rows)
        })
        .await
        .map_err(join_err)?
    }

    async fn upsert_context_reference(&self, reference: ContextReference) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT OR REPLACE INTO context_reference \
                 (user_id, meeting_external_id, update_external_id, issue_key, created_at) \
                 VALUES (?1,?2,?3,?4,?5)",
                params![
                    reference.user_id,
                    reference.meeting_external_id,
                    reference.update_external_id,
                    reference.issue_key,
                    reference.created_at.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn get_credential(&self, user_id: &str, service: &str) -> Result<Option<IntegrationCredential>> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let service = service.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT * FROM integration_credential WHERE user_id = ?1 AND service_name = ?2",
                params![user_id, service],
                credential_from_row,
            )
            .optional()
            .map_err(sql_err)
        })
        .await
        .map_err(join_err)?
    }

    async fn put_credential(&self, credential: IntegrationCredential) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO integration_credential \
                 (user_id, service_name, access_token, refresh_token, token_expires_at, scopes_json, \
                 metadata_json, connected_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8) \
                 ON CONFLICT(user_id, service_name) DO UPDATE SET \
                 access_token=excluded.access_token, refresh_token=excluded.refresh_token, \
                 token_expires_at=excluded.token_expires_at, scopes_json=excluded.scopes_json, \
                 metadata_json=excluded.metadata_json",
                params![
                    credential.user_id,
                    credential.service_name,
                    credential.access_token,
                    credential.refresh_token,
                    credential.token_expires_at.to_rfc3339(),
                    serde_json::to_string(&credential.scopes).map_err(|e| sql_err_json(e))?,
                    serde_json::to_string(&credential.metadata).map_err(|e| sql_err_json(e))?,
                    credential.connected_at.to_rfc3339(),
                ],
            )
            .map_err(sql_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn delete_credential(&self, user_id: &str, service: &str) -> Result<()> {
        let db = self.db.clone();
        let user_id = user_id.to_string();
        let service = service.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM integration_credential WHERE user_id = ?1 AND service_name = ?2",
                params![user_id, service],
            )
            .map_err(sql_err)?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }
}

fn merge_metadata(
    prev: serde_json::Map<String, serde_json::Value>,
    incoming: serde_json::Map<String, serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut merged = incoming;
    for key in ["transcript", "transcript_id", "transcript_fetched_at", "online_meeting_id", "copilot_notes"] {
        if let Some(value) = prev.get(key) {
            merged.insert(key.to_string(), value.clone());
        }
    }
    merged
}

fn sql_err_json(e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}
