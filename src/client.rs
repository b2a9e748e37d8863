use crate::error::ClientError;
use crate::types::{
  BracketState, BracketView, CreateBracketForm, CreatedBracket, PaginatedBrackets,
  ReportResultInput,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{thread::sleep, time::Duration};
use tracing::{debug, warn};

const USER_AGENT: &str = "bracket-organiser";
const SEND_ATTEMPTS: u32 = 3;

/// Sort order for bracket listings, newest first by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
  Asc,
  Desc,
}

impl SortOrder {
  fn as_str(self) -> &'static str {
    match self {
      SortOrder::Asc => "ASC",
      SortOrder::Desc => "DESC",
    }
  }
}

/// Blocking client for the tournament backend. Authenticated calls ride on
/// a session cookie captured at login; everything else works logged out.
pub struct BackendClient {
  http: reqwest::blocking::Client,
  base_url: String,
  session_cookie: Option<String>,
}

impl BackendClient {
  pub fn new(base_url: &str) -> BackendClient {
    BackendClient {
      http: reqwest::blocking::Client::new(),
      base_url: base_url.trim_end_matches('/').to_string(),
      session_cookie: None,
    }
  }

  pub fn with_session_cookie(mut self, cookie: &str) -> BackendClient {
    self.session_cookie = Some(cookie.to_string());
    self
  }

  pub fn has_session(&self) -> bool {
    self.session_cookie.is_some()
  }

  // ── Endpoints ────────────────────────────────────────────────────────

  /// Create a bracket owned by the logged in user. The backend answers
  /// with just the assigned id.
  pub fn create_bracket(&self, form: &CreateBracketForm) -> Result<CreatedBracket, ClientError> {
    let url = format!("{}/brackets", self.base_url);
    self.send_json(self.http.post(&url).json(form))
  }

  /// Create an ephemeral guest bracket. No id is assigned; the backend
  /// answers with the full display payload instead.
  pub fn create_guest_bracket(
    &self,
    form: &CreateBracketForm,
  ) -> Result<BracketView, ClientError> {
    let url = format!("{}/guest/brackets", self.base_url);
    self.send_json(self.http.post(&url).json(form))
  }

  pub fn get_bracket(&self, id: &str) -> Result<BracketView, ClientError> {
    let url = format!("{}/brackets/{id}", self.base_url);
    self.send_json(self.http.get(&url))
  }

  /// Report against a persisted bracket, or dry run against the tree the
  /// caller ships in the input when no id exists yet.
  pub fn report_result(
    &self,
    bracket_id: Option<&str>,
    input: &ReportResultInput,
  ) -> Result<BracketView, ClientError> {
    let url = match bracket_id {
      Some(id) => format!("{}/brackets/{id}/report-result", self.base_url),
      None => format!("{}/report-result", self.base_url),
    };
    self.send_json(self.http.post(&url).json(input))
  }

  /// Persist a guest bracket by shipping its roster and ordered results
  /// for the backend to replay.
  pub fn save_bracket(&self, state: &BracketState) -> Result<CreatedBracket, ClientError> {
    let url = format!("{}/brackets/save", self.base_url);
    self.send_json(self.http.post(&url).json(state))
  }

  pub fn list_user_brackets(
    &self,
    user_id: &str,
    limit: u32,
    offset: u32,
    sort_order: SortOrder,
  ) -> Result<PaginatedBrackets, ClientError> {
    let url = format!("{}/user/{user_id}/brackets", self.base_url);
    self.send_json(self.http.get(&url).query(&[
      ("limit", limit.to_string()),
      ("offset", offset.to_string()),
      ("sort_order", sort_order.as_str().to_string()),
    ]))
  }

  // ── Transport ────────────────────────────────────────────────────────

  fn send_json<T: DeserializeOwned>(
    &self,
    request: reqwest::blocking::RequestBuilder,
  ) -> Result<T, ClientError> {
    let mut request = request.header(reqwest::header::USER_AGENT, USER_AGENT);
    if let Some(cookie) = &self.session_cookie {
      request = request.header(reqwest::header::COOKIE, cookie.clone());
    }

    let mut last_err = None;
    let mut response = None;
    for attempt in 0..SEND_ATTEMPTS {
      if attempt > 0 {
        sleep(Duration::from_millis(500 * u64::from(attempt)));
      }
      let Some(req) = request.try_clone() else { break };
      match req.send() {
        Ok(r) => {
          response = Some(r);
          break;
        }
        Err(e) => {
          warn!(attempt = attempt + 1, error = %e, "backend request failed");
          last_err = Some(e);
        }
      }
    }
    let response = match (response, last_err) {
      (Some(r), _) => r,
      (None, Some(e)) => return Err(ClientError::Transport(e)),
      (None, None) => return Err(ClientError::Decode("request not cloneable".to_string())),
    };

    let status = response.status();
    debug!(status = status.as_u16(), "backend response");
    if status == reqwest::StatusCode::UNAUTHORIZED {
      return Err(ClientError::Unauthorized);
    }
    let body = response.text()?;
    if !status.is_success() {
      return Err(ClientError::Backend {
        status: status.as_u16(),
        message: backend_message(&body),
      });
    }
    serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
  }
}

/// Error bodies are usually `{"message": "..."}` but not always.
fn backend_message(body: &str) -> String {
  match serde_json::from_str::<Value>(body) {
    Ok(value) => value
      .get("message")
      .and_then(Value::as_str)
      .map(str::to_string)
      .unwrap_or_else(|| body.to_string()),
    Err(_) => body.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn backend_message_prefers_the_message_field() {
    assert_eq!(
      backend_message(r#"{"message":"bracket not found"}"#),
      "bracket not found"
    );
  }

  #[test]
  fn backend_message_falls_back_to_the_raw_body() {
    assert_eq!(backend_message("plain text error"), "plain text error");
    assert_eq!(backend_message(r#"{"error":"other shape"}"#), r#"{"error":"other shape"}"#);
  }

  #[test]
  fn base_url_trailing_slash_is_dropped() {
    let client = BackendClient::new("http://localhost:3000/");
    assert_eq!(client.base_url, "http://localhost:3000");
  }

  #[test]
  fn sort_order_matches_the_query_contract() {
    assert_eq!(SortOrder::Asc.as_str(), "ASC");
    assert_eq!(SortOrder::Desc.as_str(), "DESC");
  }
}
