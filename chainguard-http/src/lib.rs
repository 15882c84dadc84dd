//! Per-project HTTP session manager (§4.8): logs into a target application,
//! extracts its CSRF token, and replays authenticated requests against it so
//! an agent can smoke-test endpoints it just changed.

use std::time::Duration;

use regex_lite::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use chainguard_core::cache::TtlLruCache;

pub const SESSION_CACHE_CAPACITY: usize = 50;
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Field names checked, in order, when scraping a login form for its CSRF
/// token (§4.8).
const CSRF_FIELD_NAMES: &[&str] = &["csrf_token", "_csrf", "_token", "authenticity_token"];

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no credentials stored for this session")]
    NoCredentials,
    #[error("no active session for this project")]
    NoSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login_path: String,
    pub username_field: String,
    pub password_field: String,
    pub username: String,
    pub password: String,
}

pub struct Session {
    client: Client,
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub logged_in: bool,
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointResult {
    pub status: u16,
    pub auth_required: bool,
    pub body_excerpt: String,
}

/// TTL-LRU of per-project sessions (cap 50, 24h, §4.8).
pub struct SessionManager {
    sessions: TtlLruCache<String, Session>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self { sessions: TtlLruCache::new(SESSION_CACHE_CAPACITY, SESSION_TTL) }
    }

    pub fn set_base_url(&mut self, project_id: &str, base_url: String) {
        let session = self.sessions.remove(&project_id.to_string()).unwrap_or_else(|| Session {
            client: Client::new(),
            base_url: base_url.clone(),
            csrf_token: None,
            logged_in: false,
            credentials: None,
        });
        let session = Session { base_url, ..session };
        self.sessions.put(project_id.to_string(), session);
    }

    pub fn clear_session(&mut self, project_id: &str) {
        self.sessions.remove(&project_id.to_string());
    }

    fn session_mut(&mut self, project_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(&project_id.to_string())
    }

    /// GETs the login page, extracts the CSRF token, then POSTs credentials
    /// (§4.8).
    pub async fn login(&mut self, project_id: &str, credentials: Credentials) -> Result<(), HttpError> {
        let base_url = self
            .sessions
            .remove(&project_id.to_string())
            .map(|s| s.base_url)
            .unwrap_or_default();
        let client = Client::builder().cookie_store(true).build()?;

        let login_url = format!("{}{}", base_url.trim_end_matches('/'), credentials.login_path);
        let page = client.get(&login_url).send().await?.text().await?;
        let csrf_token = extract_csrf_token(&page);

        let mut form = vec![
            (credentials.username_field.clone(), credentials.username.clone()),
            (credentials.password_field.clone(), credentials.password.clone()),
        ];
        if let Some(token) = &csrf_token {
            form.push(("csrf_token".to_string(), token.clone()));
        }

        let response = client.post(&login_url).form(&form).send().await?;
        let logged_in = !looks_unauthenticated(response.status().as_u16(), "");

        self.sessions.put(
            project_id.to_string(),
            Session { client, base_url, csrf_token, logged_in, credentials: Some(credentials) },
        );
        Ok(())
    }

    /// Performs a request with the current session, attempting a silent
    /// re-login first if the last probe suggested the session had expired
    /// (§4.8 `ensure_session`).
    pub async fn test_endpoint(&mut self, project_id: &str, path: &str, method: &str) -> Result<EndpointResult, HttpError> {
        self.ensure_session(project_id).await?;

        let (client, base_url) = {
            let session = self.session_mut(project_id).ok_or(HttpError::NoSession)?;
            (session.client.clone(), session.base_url.clone())
        };

        let url = format!("{}{}", base_url.trim_end_matches('/'), path);
        let request = client.request(method.parse().unwrap_or(reqwest::Method::GET), &url);
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let auth_required = looks_unauthenticated(status, &body);

        if let Some(session) = self.session_mut(project_id) {
            if auth_required {
                session.logged_in = false;
            }
        }

        Ok(EndpointResult { status, auth_required, body_excerpt: body.chars().take(500).collect() })
    }

    /// Re-logs in from stored credentials if the session claims to be
    /// logged in but will not be trusted by the next probe.
    pub async fn ensure_session(&mut self, project_id: &str) -> Result<(), HttpError> {
        let needs_relogin = self
            .session_mut(project_id)
            .map(|s| !s.logged_in && s.credentials.is_some())
            .unwrap_or(false);

        if needs_relogin {
            let credentials = self.session_mut(project_id).and_then(|s| s.credentials.clone());
            if let Some(credentials) = credentials {
                self.login(project_id, credentials).await?;
            }
        }
        Ok(())
    }
}

/// Detects an auth-needed response: 401/403, a 3xx redirect whose body (if
/// captured) mentions "login", or a 200 body containing both "login" and
/// "form" (§4.8).
fn looks_unauthenticated(status: u16, body: &str) -> bool {
    if status == 401 || status == 403 {
        return true;
    }
    let lower = body.to_lowercase();
    if (300..400).contains(&status) && lower.contains("login") {
        return true;
    }
    status == 200 && lower.contains("login") && lower.contains("form")
}

fn extract_csrf_token(html: &str) -> Option<String> {
    for name in CSRF_FIELD_NAMES {
        let pattern = format!(
            r#"name=["']{name}["']\s+(?:[a-zA-Z-]+=["'][^"']*["']\s+)*value=["']([^"']+)["']"#
        );
        if let Ok(re) = Regex::new(&pattern) {
            if let Some(caps) = re.captures(html) {
                if let Some(m) = caps.get(1) {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csrf_token_from_hidden_field() {
        let html = r#"<form><input type="hidden" name="_token" value="abc123"></form>"#;
        assert_eq!(extract_csrf_token(html), Some("abc123".to_string()));
    }

    #[test]
    fn no_csrf_field_returns_none() {
        let html = r#"<form><input type="text" name="email"></form>"#;
        assert_eq!(extract_csrf_token(html), None);
    }

    #[test]
    fn detects_unauthenticated_on_401() {
        assert!(looks_unauthenticated(401, ""));
    }

    #[test]
    fn detects_unauthenticated_login_form_body() {
        assert!(looks_unauthenticated(200, "<html><form>please login</form></html>"));
    }

    #[test]
    fn authenticated_dashboard_is_not_flagged() {
        assert!(!looks_unauthenticated(200, "<html>welcome back</html>"));
    }

    #[tokio::test]
    async fn set_base_url_then_clear_session_leaves_no_session() {
        let mut manager = SessionManager::new();
        manager.set_base_url("proj1", "https://example.test".to_string());
        manager.clear_session("proj1");
        assert!(manager.session_mut("proj1").is_none());
    }
}
