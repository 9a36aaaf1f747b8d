//! REST client for the remote notes service.

use crate::config::ApiConfig;
use async_trait::async_trait;
use notehub_core::{
    FetchNotesParams, NewNote, Note, NoteId, NoteService, Page, ServiceError, ServiceResult,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// [`NoteService`] over HTTP.
///
/// `GET {base}/notes`, `POST {base}/notes`, `DELETE {base}/notes/{id}`.
#[derive(Clone)]
pub struct RestNoteService {
    client: reqwest::Client,
    base_url: Url,
    auth_header: HeaderMap,
}

impl RestNoteService {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ApiClientError::Config(format!("invalid base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::Config(format!(
                "base_url '{}' cannot carry a path",
                base_url
            )));
        }

        let auth_header = build_auth_headers(config.token.as_deref())?;
        Ok(Self {
            client,
            base_url,
            auth_header,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `segments` to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> ServiceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::transport(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl NoteService for RestNoteService {
    async fn fetch_notes(&self, params: &FetchNotesParams) -> ServiceResult<Page> {
        let url = self.endpoint(&["notes"])?;
        tracing::debug!(page = params.page, search = %params.search, "GET notes");
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response).await
    }

    async fn create_note(&self, note: &NewNote) -> ServiceResult<Note> {
        let url = self.endpoint(&["notes"])?;
        tracing::debug!(tag = %note.tag(), "POST notes");
        let response = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(note)
            .send()
            .await
            .map_err(transport_error)?;
        parse_response(response).await
    }

    async fn delete_note(&self, id: &NoteId) -> ServiceResult<()> {
        let url = self.endpoint(&["notes", id.as_str()])?;
        tracing::debug!(id = %id, "DELETE note");
        let response = self
            .client
            .delete(url)
            .headers(self.auth_header.clone())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.map_err(transport_error)?;
        Err(ServiceError::api(status.as_u16(), error_message(status, &text)))
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> ServiceResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::invalid_response(e.to_string()));
    }
    let text = response.text().await.map_err(transport_error)?;
    Err(ServiceError::api(status.as_u16(), error_message(status, &text)))
}

fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_decode() {
        ServiceError::invalid_response(err.to_string())
    } else {
        ServiceError::transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Message for a non-2xx response: the body's `message` field, the raw
/// body, or the status reason, in that order.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

fn build_auth_headers(token: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let value = format!("Bearer {}", token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
