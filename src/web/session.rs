//! Per-request auth session backed by the record store's users collection.
//!
//! The browser keeps a `pb_auth` cookie holding the URL-encoded JSON auth
//! state. Every request refreshes it against the record store and the
//! resulting state is written back on the response.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::AppState;
use crate::backend::{RawRecord, RecordStore, USERS_COLLECTION};

/// Cookie carrying the auth state.
pub const AUTH_COOKIE: &str = "pb_auth";
/// Auth cookie lifetime (7 days).
pub const COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;
/// `last_login` is only rewritten when older than this.
const LAST_LOGIN_REFRESH_HOURS: i64 = 12;

/// Auth state for one request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<RawRecord>,
    pub is_admin: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct CookieState {
    #[serde(default)]
    token: String,
}

fn percent_decode(raw: &str) -> String {
    url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, value)| {
            if value.is_empty() {
                key.into_owned()
            } else {
                format!("{}={}", key, value)
            }
        })
        .unwrap_or_default()
}

/// Token from the auth cookie, if present and well formed.
pub fn auth_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE)
        .and_then(|(_, value)| serde_json::from_str::<CookieState>(&percent_decode(value)).ok())
        .map(|state| state.token)
        .filter(|token| !token.is_empty())
}

/// Admin if `role` is admin, `roles` lists admin, or an expanded role is named admin.
pub fn is_admin(user: &RawRecord) -> bool {
    let role = user.get("role").and_then(Value::as_str) == Some("admin");
    let roles = user
        .get("roles")
        .and_then(Value::as_array)
        .is_some_and(|roles| roles.iter().any(|r| r.as_str() == Some("admin")));
    let expanded = user
        .get("expand")
        .and_then(|e| e.get("roles"))
        .and_then(Value::as_array)
        .is_some_and(|roles| {
            roles
                .iter()
                .any(|r| r.get("name").and_then(Value::as_str) == Some("admin"))
        });
    role || roles || expanded
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether `last_login` is missing or older than twelve hours.
///
/// Unparseable timestamps are left alone.
pub fn needs_last_login_touch(user: &RawRecord, now: DateTime<Utc>) -> bool {
    match user.get("last_login").and_then(Value::as_str) {
        None | Some("") => true,
        Some(s) => parse_timestamp(s)
            .is_some_and(|last| last < now - ChronoDuration::hours(LAST_LOGIN_REFRESH_HOURS)),
    }
}

/// Load the session for a request. Failures leave the request unauthenticated.
pub async fn resolve(store: &dyn RecordStore, headers: &HeaderMap, now: DateTime<Utc>) -> Session {
    let Some(token) = auth_token(headers) else {
        return Session::default();
    };

    let auth = match store.auth_refresh(&token).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::debug!("Auth refresh failed, clearing session: {}", e);
            return Session::default();
        }
    };

    let mut user = auth.record;
    if needs_last_login_touch(&user, now) {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let id = user.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        let mut patch = Map::new();
        patch.insert("last_login".to_string(), Value::String(stamp.clone()));
        if let Err(e) = store
            .update_record(Some(&auth.token), USERS_COLLECTION, &id, &patch)
            .await
        {
            tracing::warn!("Failed to update last_login for {}, clearing session: {}", id, e);
            return Session::default();
        }
        user.insert("last_login".to_string(), Value::String(stamp));
    }

    Session {
        is_admin: is_admin(&user),
        token: Some(auth.token),
        user: Some(user),
    }
}

/// `Set-Cookie` value exporting the session's auth state.
pub fn auth_cookie(session: &Session, secure: bool) -> String {
    let (value, max_age) = match (&session.token, &session.user) {
        (Some(token), Some(user)) => {
            let state = json!({ "token": token, "record": user }).to_string();
            let encoded: String = url::form_urlencoded::byte_serialize(state.as_bytes()).collect();
            (encoded, COOKIE_MAX_AGE_SECS)
        }
        _ => (String::new(), 0),
    };

    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        AUTH_COOKIE, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Middleware attaching a [`Session`] to the request and the refreshed cookie to the response.
pub async fn load_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let session = resolve(state.store.as_ref(), req.headers(), Utc::now()).await;
    let cookie = auth_cookie(&session, state.config.secure_cookies);
    req.extensions_mut().insert(session);

    let mut response = next.run(req).await;
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("Could not encode auth cookie: {}", e),
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use chrono::TimeZone;

    fn user(v: Value) -> RawRecord {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 13, 15, 0, 0).unwrap()
    }

    fn cookie_header(token: &str) -> HeaderMap {
        let state = json!({"token": token, "record": {"id": "u1"}}).to_string();
        let encoded: String = url::form_urlencoded::byte_serialize(state.as_bytes()).collect();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", AUTH_COOKIE, encoded)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_auth_token_from_cookie() {
        assert_eq!(auth_token(&cookie_header("abc.def")).as_deref(), Some("abc.def"));
        assert_eq!(auth_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("pb_auth=not-json"));
        assert_eq!(auth_token(&headers), None);
    }

    #[test]
    fn test_is_admin_variants() {
        assert!(is_admin(&user(json!({"role": "admin"}))));
        assert!(is_admin(&user(json!({"roles": ["viewer", "admin"]}))));
        assert!(is_admin(&user(json!({"expand": {"roles": [{"name": "admin"}]}}))));
        assert!(!is_admin(&user(json!({"role": "viewer", "roles": ["viewer"]}))));
        assert!(!is_admin(&user(json!({}))));
    }

    #[test]
    fn test_last_login_touch() {
        assert!(needs_last_login_touch(&user(json!({})), now()));
        assert!(needs_last_login_touch(
            &user(json!({"last_login": "2025-08-12 15:00:00.000Z"})),
            now()
        ));
        assert!(!needs_last_login_touch(
            &user(json!({"last_login": "2025-08-13T10:00:00Z"})),
            now()
        ));
        assert!(!needs_last_login_touch(
            &user(json!({"last_login": "yesterday"})),
            now()
        ));
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let anonymous = auth_cookie(&Session::default(), false);
        assert_eq!(anonymous, "pb_auth=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");

        let session = Session {
            token: Some("t".to_string()),
            user: Some(user(json!({"id": "u1"}))),
            is_admin: false,
        };
        let cookie = auth_cookie(&session, true);
        assert!(cookie.starts_with("pb_auth=%7B"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_resolve_refreshes_and_touches_last_login() {
        let store = MemoryStore::new().with_user("tok", json!({"id": "u1", "role": "admin"}));
        let session = resolve(&store, &cookie_header("tok"), now()).await;

        assert!(session.is_authenticated());
        assert!(session.is_admin);
        assert_eq!(session.token(), Some("tok-refreshed"));
        assert_eq!(
            session.user.as_ref().unwrap()["last_login"],
            "2025-08-13T15:00:00.000Z"
        );

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "users");
        assert_eq!(updates[0].1, "u1");
    }

    #[tokio::test]
    async fn test_failed_last_login_update_clears_session() {
        let store = MemoryStore::new()
            .with_user("tok", json!({"id": "u1"}))
            .failing(USERS_COLLECTION);
        let session = resolve(&store, &cookie_header("tok"), now()).await;

        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_recent_last_login_skips_update() {
        let store = MemoryStore::new()
            .with_user("tok", json!({"id": "u1", "last_login": "2025-08-13T14:00:00Z"}))
            .failing(USERS_COLLECTION);
        let session = resolve(&store, &cookie_header("tok"), now()).await;

        assert!(session.is_authenticated());
        assert!(store.updates().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_rejected_token_is_anonymous() {
        let store = MemoryStore::new();
        let session = resolve(&store, &cookie_header("stale"), now()).await;
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }
}
