//! REST client for the habits/tasks/journal backend.
//!
//! The backend authenticates with a session cookie set by `/login`. The
//! cookie lives in the client's jar; [`BackendClient::session_cookie`] and
//! [`BackendClient::restore_session`] carry it across processes. Every non-2xx
//! answer is turned into [`ApiError::Status`] carrying the backend's `error`
//! text.

mod auth;

pub use auth::{Account, AccountUpdate, Ack, Credentials, SignupForm};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::error::ApiError;
use crate::habits::{HabitDraft, HabitRecord, HabitStats, DATE_FORMAT};
use crate::journal::{JournalDraft, JournalEntry};
use crate::task::{Task, TaskDraft, TaskStats};
use crate::timer::TaskCounter;

/// Per-request limit for CRUD and account calls. The pomodoro increment
/// made on behalf of a session has no limit.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        let jar = Arc::new(Jar::default());
        let http = Client::builder().cookie_provider(jar.clone()).build()?;
        Ok(Self {
            http,
            base,
            jar,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Replace the per-request limit for CRUD and account calls.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Cookies the jar would send to the backend, as a `Cookie` header value.
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .filter(|v| !v.is_empty())
    }

    /// Seed the jar from a value previously returned by [`session_cookie`](Self::session_cookie).
    pub fn restore_session(&self, cookie_header: &str) {
        for pair in cookie_header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &self.base);
        }
    }

    // ── Habits ──

    pub async fn list_habits(&self) -> Result<Vec<HabitRecord>, ApiError> {
        self.fetch(Method::GET, &["habit"]).await
    }

    pub async fn habit_stats(&self) -> Result<HabitStats, ApiError> {
        self.fetch(Method::GET, &["habit", "stats"]).await
    }

    pub async fn create_habit(&self, draft: &HabitDraft) -> Result<HabitRecord, ApiError> {
        self.send_json(Method::POST, &["habit"], draft).await
    }

    pub async fn update_habit(&self, id: &str, draft: &HabitDraft) -> Result<HabitRecord, ApiError> {
        self.send_json(Method::PUT, &["habit", id], draft).await
    }

    pub async fn delete_habit(&self, id: &str) -> Result<(), ApiError> {
        self.discard(self.request(Method::DELETE, &["habit", id])?).await
    }

    /// Record one completion on `date`; returns the updated habit.
    pub async fn complete_habit(&self, id: &str, date: NaiveDate) -> Result<HabitRecord, ApiError> {
        let body = json!({ "date": date.format(DATE_FORMAT).to_string() });
        self.send_json(Method::POST, &["habit", id, "complete"], &body)
            .await
    }

    // ── Tasks ──

    pub async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.fetch(Method::GET, &["task"]).await
    }

    pub async fn task_stats(&self) -> Result<TaskStats, ApiError> {
        self.fetch(Method::GET, &["task", "stats"]).await
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.send_json(Method::POST, &["task"], draft).await
    }

    pub async fn update_task(&self, id: &str, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.send_json(Method::PUT, &["task", id], draft).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        self.discard(self.request(Method::DELETE, &["task", id])?).await
    }

    pub async fn toggle_task(&self, id: &str) -> Result<Task, ApiError> {
        self.fetch(Method::POST, &["task", id, "toggle"]).await
    }

    pub async fn increment_task_pomodoro(&self, id: &str) -> Result<Task, ApiError> {
        self.fetch(Method::POST, &["task", id, "pomodoro"]).await
    }

    // ── Journal ──

    pub async fn list_journals(&self) -> Result<Vec<JournalEntry>, ApiError> {
        self.fetch(Method::GET, &["journal"]).await
    }

    pub async fn create_journal(&self, draft: &JournalDraft) -> Result<JournalEntry, ApiError> {
        let mut body = draft.clone();
        body.id = None;
        self.send_json(Method::POST, &["journal"], &body).await
    }

    /// The journal endpoints address entries by an `id` in the body.
    pub async fn update_journal(
        &self,
        id: &str,
        draft: &JournalDraft,
    ) -> Result<JournalEntry, ApiError> {
        let mut body = draft.clone();
        body.id = Some(id.to_string());
        self.send_json(Method::PUT, &["journal"], &body).await
    }

    pub async fn delete_journal(&self, id: &str) -> Result<(), ApiError> {
        let req = self
            .request(Method::DELETE, &["journal"])?
            .json(&json!({ "id": id }));
        self.discard(req).await
    }

    pub async fn toggle_journal_favorite(&self, id: &str) -> Result<JournalEntry, ApiError> {
        self.send_json(Method::PUT, &["journal", "favorite"], &json!({ "id": id }))
            .await
    }

    // ── Account ──

    pub async fn login(&self, credentials: &Credentials) -> Result<Ack, ApiError> {
        self.send_json(Method::POST, &["login"], credentials).await
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<Ack, ApiError> {
        self.send_json(Method::POST, &["signup"], form).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.discard(self.request(Method::POST, &["logout"])?).await
    }

    /// Whether the current session cookie is accepted.
    pub async fn verify(&self) -> Result<bool, ApiError> {
        match self
            .fetch::<auth::Verification>(Method::POST, &["verify"])
            .await
        {
            Ok(v) => Ok(v.valid),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn account(&self) -> Result<Account, ApiError> {
        self.fetch(Method::GET, &["account"]).await
    }

    pub async fn update_account(&self, update: &AccountUpdate) -> Result<Ack, ApiError> {
        self.send_json(Method::PUT, &["account"], update).await
    }

    // ── Internal ──

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.untimed(method, segments)?.timeout(self.timeout))
    }

    fn untimed(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "backend request");
        Ok(self.http.request(method, url))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<T, ApiError> {
        self.decode(self.request(method, segments)?).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        self.decode(self.request(method, segments)?.json(body)).await
    }

    async fn decode<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let text = self.execute(req).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn discard(&self, req: RequestBuilder) -> Result<(), ApiError> {
        self.execute(req).await.map(|_| ())
    }

    async fn execute(&self, req: RequestBuilder) -> Result<String, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }
        let message = error_message(&text)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull the `error` (or `message`) field out of an error body, falling back
/// to the raw text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["error", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

/// Session side effect: runs to completion however slow the backend is.
#[async_trait]
impl TaskCounter for BackendClient {
    async fn increment_pomodoro(&self, task_id: &str) -> Result<Task, ApiError> {
        let req = self.untimed(Method::POST, &["task", task_id, "pomodoro"])?;
        self.decode(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_and_escapes_segments() {
        let client = BackendClient::new("http://localhost:3000/api/").unwrap();
        let url = client.endpoint(&["task", "a b/c", "toggle"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/task/a%20b%2Fc/toggle");

        let bare = BackendClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            bare.endpoint(&["habit", "stats"]).unwrap().as_str(),
            "http://localhost:3000/habit/stats"
        );
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(BackendClient::new("not a url").is_err());
        assert!(BackendClient::new("mailto:me@example.com").is_err());
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Not authorized", "message": "x"}"#).as_deref(),
            Some("Not authorized")
        );
        assert_eq!(error_message(r#"{"message": "Bad"}"#).as_deref(), Some("Bad"));
        assert_eq!(error_message("gateway down").as_deref(), Some("gateway down"));
        assert_eq!(error_message(r#"{"other": 1}"#), None);
        assert_eq!(error_message(""), None);
    }
}
