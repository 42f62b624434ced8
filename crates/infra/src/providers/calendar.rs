//! Calendar provider client (C3.1), backed by Microsoft Graph.
//!
//! Times are carried through exactly as Graph reports them: `dateTime` is
//! parsed as a naive timestamp and `timeZone` kept alongside, never
//! coerced to UTC here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tsic_core::ports::{
    CalendarAttendee, CalendarEvent, CalendarProviderPort, FileMetadata, OnlineMeetingRef,
    TranscriptHandle,
};
use tsic_core::CredentialService;
use tsic_domain::constants::SERVICE_CALENDAR;
use tsic_domain::{Result, TsicError};

use super::send_authorized;
use crate::http::HttpClient;

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Graph-backed implementation of [`CalendarProviderPort`].
pub struct GraphCalendarProvider {
    http: HttpClient,
    credential_service: Arc<CredentialService>,
}

impl GraphCalendarProvider {
    #[must_use]
    pub fn new(http: HttpClient, credential_service: Arc<CredentialService>) -> Self {
        Self { http, credential_service }
    }

    async fn send(
        &self,
        user_id: &str,
        build: impl Fn(&str) -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        send_authorized(&self.http, &self.credential_service, user_id, SERVICE_CALENDAR, build).await
    }
}

#[async_trait]
impl CalendarProviderPort for GraphCalendarProvider {
    async fn list_events(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let url = format!("{GRAPH_API_BASE}/me/calendarView");
        let params = [
            ("startDateTime", window_start.to_rfc3339()),
            ("endDateTime", window_end.to_rfc3339()),
            (
                "$select",
                "id,subject,start,end,location,webLink,attendees,isOnlineMeeting,onlineMeeting,seriesMasterId,type".to_string(),
            ),
            ("$orderby", "start/dateTime asc".to_string()),
        ];

        let response = self
            .send(user_id, |token| {
                self.http.request(Method::GET, &url).bearer_auth(token).query(&params)
            })
            .await?;

        let body: GraphEventsResponse = parse_json(response).await?;
        body.value.into_iter().map(convert_event).collect()
    }

    async fn get_event(&self, user_id: &str, event_id: &str) -> Result<CalendarEvent> {
        let url = format!("{GRAPH_API_BASE}/me/events/{event_id}");
        let response = self
            .send(user_id, |token| self.http.request(Method::GET, &url).bearer_auth(token))
            .await?;

        let raw: GraphEvent = parse_json(response).await?;
        convert_event(raw)
    }

    async fn list_transcripts(
        &self,
        user_id: &str,
        online_meeting_id: &str,
    ) -> Result<Vec<TranscriptHandle>> {
        let url = format!("{GRAPH_API_BASE}/me/onlineMeetings/{online_meeting_id}/transcripts");
        let response = self
            .send(user_id, |token| self.http.request(Method::GET, &url).bearer_auth(token))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let body: GraphTranscriptsResponse = parse_json(response).await?;
        body.value
            .into_iter()
            .map(|t| {
                Ok(TranscriptHandle {
                    transcript_id: t.id,
                    created_at: parse_graph_instant(&t.created_date_time)?,
                })
            })
            .collect()
    }

    async fn fetch_transcript_content(
        &self,
        user_id: &str,
        online_meeting_id: &str,
        transcript_id: &str,
        format: &str,
    ) -> Result<String> {
        let url = format!(
            "{GRAPH_API_BASE}/me/onlineMeetings/{online_meeting_id}/transcripts/{transcript_id}/content"
        );
        let response = self
            .send(user_id, |token| {
                self.http.request(Method::GET, &url).bearer_auth(token).query(&[("$format", format)])
            })
            .await?;

        response_text(response).await
    }

    async fn search_files(
        &self,
        user_id: &str,
        query: &str,
        folder: Option<&str>,
    ) -> Result<Vec<FileMetadata>> {
        let url = match folder {
            Some(folder) => format!("{GRAPH_API_BASE}/me/drive/root:/{folder}:/search(q='{query}')"),
            None => format!("{GRAPH_API_BASE}/me/drive/root/search(q='{query}')"),
        };

        let response = self
            .send(user_id, |token| self.http.request(Method::GET, &url).bearer_auth(token))
            .await?;

        let body: GraphDriveSearchResponse = parse_json(response).await?;
        body.value
            .into_iter()
            .map(|f| {
                Ok(FileMetadata {
                    file_id: f.id,
                    name: f.name,
                    created_at: parse_graph_instant(&f.created_date_time)?,
                })
            })
            .collect()
    }

    async fn download_file(&self, user_id: &str, file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{GRAPH_API_BASE}/me/drive/items/{file_id}/content");
        let response = self
            .send(user_id, |token| self.http.request(Method::GET, &url).bearer_auth(token))
            .await?;

        response.bytes().await.map(|b| b.to_vec()).map_err(|e| {
            let infra: crate::errors::InfraError = e.into();
            TsicError::from(infra)
        })
    }
}

async fn parse_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
    response.json().await.map_err(|e| TsicError::ParseFailure {
        what: "calendar provider response".into(),
        message: e.to_string(),
    })
}

async fn response_text(response: reqwest::Response) -> Result<String> {
    response.text().await.map_err(|e| TsicError::ParseFailure {
        what: "transcript content".into(),
        message: e.to_string(),
    })
}

fn parse_graph_instant(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)).map_err(|e| {
        TsicError::ParseFailure { what: "graph timestamp".into(), message: e.to_string() }
    })
}

fn convert_event(raw: GraphEvent) -> Result<CalendarEvent> {
    let start_naive = parse_graph_naive(&raw.start.date_time)?;
    let end_naive = parse_graph_naive(&raw.end.date_time)?;

    let online_meeting = raw.online_meeting.map(|m| OnlineMeetingRef {
        id: if raw.is_online_meeting.unwrap_or(false) { Some(raw.id.clone()) } else { None },
        join_url: m.join_url,
    });

    let attendees = raw
        .attendees
        .unwrap_or_default()
        .into_iter()
        .map(|a| CalendarAttendee {
            name: a.email_address.name,
            email: a.email_address.address,
        })
        .collect();

    Ok(CalendarEvent {
        id: raw.id,
        subject: raw.subject.unwrap_or_else(|| "Untitled Event".to_string()),
        start_naive,
        start_timezone: raw.start.time_zone,
        end_naive,
        end_timezone: raw.end.time_zone,
        location: raw.location.and_then(|l| l.display_name),
        url: raw.web_link,
        attendees,
        is_online_meeting: raw.is_online_meeting.unwrap_or(false),
        is_recurring: raw.series_master_id.is_some() || raw.event_type.as_deref() == Some("seriesMaster"),
        online_meeting,
    })
}

fn parse_graph_naive(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        TsicError::ParseFailure { what: "calendar event timestamp".into(), message: e.to_string() }
    })
}

#[derive(Debug, Deserialize)]
struct GraphEventsResponse {
    value: Vec<GraphEvent>,
}

#[derive(Debug, Deserialize)]
struct GraphEvent {
    id: String,
    subject: Option<String>,
    start: GraphDateTimeTz,
    end: GraphDateTimeTz,
    location: Option<GraphLocation>,
    #[serde(rename = "webLink")]
    web_link: Option<String>,
    attendees: Option<Vec<GraphAttendee>>,
    #[serde(rename = "isOnlineMeeting")]
    is_online_meeting: Option<bool>,
    #[serde(rename = "onlineMeeting")]
    online_meeting: Option<GraphOnlineMeeting>,
    #[serde(rename = "seriesMasterId")]
    series_master_id: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphDateTimeTz {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Debug, Deserialize)]
struct GraphLocation {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphAttendee {
    #[serde(rename = "emailAddress")]
    email_address: GraphEmailAddress,
}

#[derive(Debug, Deserialize)]
struct GraphEmailAddress {
    name: Option<String>,
    address: String,
}

#[derive(Debug, Deserialize)]
struct GraphOnlineMeeting {
    #[serde(rename = "joinUrl")]
    join_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphTranscriptsResponse {
    value: Vec<GraphTranscript>,
}

#[derive(Debug, Deserialize)]
struct GraphTranscript {
    id: String,
    #[serde(rename = "createdDateTime")]
    created_date_time: String,
}

#[derive(Debug, Deserialize)]
struct GraphDriveSearchResponse {
    value: Vec<GraphDriveItem>,
}

#[derive(Debug, Deserialize)]
struct GraphDriveItem {
    id: String,
    name: String,
    #[serde(rename = "createdDateTime")]
    created_date_time: String,
}
