//! Conversions from external infrastructure errors into the domain error
//! taxonomy. Every crate boundary (SQL driver, HTTP client, JSON) funnels
//! through `InfraError` before becoming a `TsicError`.

use rusqlite::Error as SqlError;
use tsic_domain::TsicError;

/// Error newtype that keeps conversion logic on the infrastructure side.
#[derive(Debug)]
pub struct InfraError(pub TsicError);

impl From<InfraError> for TsicError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<TsicError> for InfraError {
    fn from(value: TsicError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(sql_error_to_domain(&value))
    }
}

fn sql_error_to_domain(err: &SqlError) -> TsicError {
    match err {
        SqlError::QueryReturnedNoRows => {
            TsicError::StoreUnavailable { message: "query returned no rows".into() }
        }
        SqlError::SqliteFailure(inner, message) => TsicError::StoreUnavailable {
            message: format!(
                "sqlite failure {:?} (code {}): {}",
                inner.code,
                inner.extended_code,
                message.clone().unwrap_or_default()
            ),
        },
        other => TsicError::StoreUnavailable { message: other.to_string() },
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        let provider = value.url().map(|u| u.host_str().unwrap_or("unknown").to_string());
        let message = value.to_string();
        let err = if value.is_timeout() || value.is_connect() {
            TsicError::ProviderTransient {
                provider: provider.unwrap_or_else(|| "http".into()),
                message,
            }
        } else if let Some(status) = value.status() {
            match status.as_u16() {
                401 | 410 => TsicError::CredentialInvalidated {
                    service: provider.unwrap_or_else(|| "http".into()),
                },
                403 => TsicError::ProviderPermission {
                    provider: provider.unwrap_or_else(|| "http".into()),
                    resource: message,
                },
                404 => TsicError::ProviderNotFound {
                    provider: provider.unwrap_or_else(|| "http".into()),
                    resource: message,
                },
                500..=599 => TsicError::ProviderTransient {
                    provider: provider.unwrap_or_else(|| "http".into()),
                    message,
                },
                _ => TsicError::ProviderTransient {
                    provider: provider.unwrap_or_else(|| "http".into()),
                    message,
                },
            }
        } else {
            TsicError::ProviderTransient { provider: provider.unwrap_or_else(|| "http".into()), message }
        };
        InfraError(err)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(TsicError::ParseFailure { what: "json payload".into(), message: value.to_string() })
    }
}

impl From<tokio::task::JoinError> for InfraError {
    fn from(value: tokio::task::JoinError) -> Self {
        InfraError(TsicError::InternalInvariantViolated {
            message: format!("blocking task join failed: {value}"),
        })
    }
}
