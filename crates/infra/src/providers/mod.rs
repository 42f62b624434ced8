//! HTTP clients implementing the three provider ports (C3): calendar,
//! issues, and code host. Each client is a thin typed wrapper consuming
//! `CredentialService::get_access_token`, retrying once on 401 after
//! forcing a refresh.

pub mod calendar;
pub mod code_host;
pub mod issues;

pub use calendar::GraphCalendarProvider;
pub use code_host::GitHubCodeHostProvider;
pub use issues::JiraIssuesProvider;

use reqwest::{RequestBuilder, Response, StatusCode};
use tsic_core::CredentialService;
use tsic_domain::Result;

use crate::http::HttpClient;

/// Send `build_request(token)`, retrying once after forcing a credential
/// refresh if the first attempt comes back 401.
pub(crate) async fn send_authorized<F>(
    http: &HttpClient,
    credential_service: &CredentialService,
    user_id: &str,
    service: &str,
    build_request: F,
) -> Result<Response>
where
    F: Fn(&str) -> RequestBuilder,
{
    let token = credential_service.get_access_token(user_id, service).await?;
    let response = http.send(build_request(&token)).await?;

    if response.status() == StatusCode::UNAUTHORIZED {
        let token = credential_service.force_refresh_access_token(user_id, service).await?;
        return http.send(build_request(&token)).await;
    }

    Ok(response)
}
