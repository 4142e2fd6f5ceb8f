use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Role;
use crate::services::api::SalonApi;

pub const TOKEN_KEY: &str = "salonbook.auth.token";
pub const PROFILE_KEY: &str = "salonbook.auth.profile";
const AUTH_PREFIX: &str = "salonbook.auth.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sub: Option<Value>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, alias = "is_active")]
    is_active: Option<bool>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default, alias = "tenant_id")]
    tenant_id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Reads the claims of a JWT. The signature is the backend's business;
    /// the apps only need the payload.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| AppError::Token("malformed token".to_string()))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| AppError::Token(format!("invalid payload encoding: {e}")))?;
        let claims: Claims = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Token(format!("invalid claims: {e}")))?;

        let user_id = claims
            .id
            .or(claims.sub)
            .and_then(value_to_string)
            .ok_or_else(|| AppError::Token("token has no subject".to_string()))?;

        let expires_at = match claims.exp {
            Some(exp) => Some(
                DateTime::from_timestamp(exp, 0)
                    .ok_or_else(|| AppError::Token(format!("invalid exp: {exp}")))?,
            ),
            None => None,
        };

        Ok(Self {
            token: token.to_string(),
            user_id,
            email: claims.email.unwrap_or_default(),
            name: claims.name,
            role: Role::from_backend(claims.role.as_deref().unwrap_or_default()),
            is_active: claims.is_active.unwrap_or(true),
            tenant_id: claims.tenant_id.and_then(value_to_string),
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Holds the logged-in session and mirrors it to local storage.
#[derive(Debug, Default)]
pub struct AuthStore {
    session: Option<Session>,
}

impl AuthStore {
    /// Loads the persisted session. Expired or unreadable tokens are wiped.
    pub fn restore(conn: &Connection, now: DateTime<Utc>) -> anyhow::Result<Self> {
        let Some(token) = queries::get_item(conn, TOKEN_KEY)? else {
            return Ok(Self::default());
        };

        let mut session = match Session::from_token(&token) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored token");
                queries::remove_prefix(conn, AUTH_PREFIX)?;
                return Ok(Self::default());
            }
        };

        if session.is_expired(now) {
            tracing::info!(user_id = %session.user_id, "stored session expired");
            queries::remove_prefix(conn, AUTH_PREFIX)?;
            return Ok(Self::default());
        }

        // Profile refreshes survive restarts
        if let Some(profile) = queries::load_json::<Session>(conn, PROFILE_KEY)? {
            if profile.token == session.token {
                session = profile;
            }
        }

        Ok(Self {
            session: Some(session),
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.session.as_ref().map(|s| &s.role)
    }

    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        self.session
            .as_ref()
            .map(|s| !s.is_expired(now))
            .unwrap_or(false)
    }

    /// Pushes the current token (and tenant, when the token carries one and
    /// none is configured) to the API client.
    pub fn attach(&self, api: &dyn SalonApi, configured_tenant: Option<&str>) {
        api.set_token(self.session.as_ref().map(|s| s.token.clone()));
        let tenant = configured_tenant
            .map(str::to_string)
            .or_else(|| self.session.as_ref().and_then(|s| s.tenant_id.clone()));
        api.set_tenant(tenant);
    }

    pub async fn login(
        &mut self,
        api: &dyn SalonApi,
        email: &str,
        password: &str,
    ) -> Result<&Session, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("Informe e-mail e senha.".to_string()));
        }

        let response = api.login(email.trim(), password).await?;
        let mut session = Session::from_token(&response.token)?;

        if let Some(user) = response.user {
            session.role = user.role();
            session.name = user.name.or(session.name);
            session.is_active = user.is_active;
            if session.email.is_empty() {
                session.email = user.email;
            }
            if session.tenant_id.is_none() {
                session.tenant_id = user.tenant_id;
            }
        }

        if !session.is_active {
            return Err(AppError::Validation(
                "Usuário inativo. Procure o gestor do salão.".to_string(),
            ));
        }

        tracing::info!(user_id = %session.user_id, role = %session.role, "logged in");
        api.set_token(Some(session.token.clone()));
        Ok(self.session.insert(session))
    }

    /// Updates name and role from `/users/me`. Failures other than 401 are
    /// logged and ignored.
    pub async fn refresh_profile(&mut self, api: &dyn SalonApi) -> Result<(), AppError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        match api.current_user().await {
            Ok(user) => {
                session.role = user.role();
                session.name = user.name.clone().or(session.name.take());
                session.is_active = user.is_active;
                if !user.email.is_empty() {
                    session.email = user.email;
                }
                Ok(())
            }
            Err(AppError::Unauthorized) => Err(AppError::Unauthorized),
            Err(e) => {
                tracing::warn!(error = %e, "profile refresh failed");
                Ok(())
            }
        }
    }

    pub fn persist(&self, conn: &Connection) -> anyhow::Result<()> {
        match &self.session {
            Some(session) => {
                queries::set_item(conn, TOKEN_KEY, &session.token)?;
                queries::save_json(conn, PROFILE_KEY, session)?;
            }
            None => {
                queries::remove_prefix(conn, AUTH_PREFIX)?;
            }
        }
        Ok(())
    }

    pub fn logout(&mut self, api: &dyn SalonApi, conn: &Connection) -> anyhow::Result<()> {
        if let Some(session) = self.session.take() {
            tracing::info!(user_id = %session.user_id, "logged out");
        }
        api.set_token(None);
        self.persist(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::TimeZone;
    use serde_json::json;

    fn make_token(claims: Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    fn at(ts: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn test_decode_claims() {
        let token = make_token(json!({
            "id": 17,
            "email": "gestor@salao.com",
            "role": "manager",
            "isActive": true,
            "exp": 1_900_000_000,
            "tenantId": "t-1"
        }));
        let session = Session::from_token(&token).unwrap();
        assert_eq!(session.user_id, "17");
        assert_eq!(session.role, Role::Gestor);
        assert_eq!(session.tenant_id.as_deref(), Some("t-1"));
        assert!(!session.is_expired(at(1_800_000_000)));
        assert!(session.is_expired(at(1_900_000_000)));
    }

    #[test]
    fn test_decode_sub_fallback_and_unknown_role() {
        let token = make_token(json!({"sub": "u-9", "role": "owner"}));
        let session = Session::from_token(&token).unwrap();
        assert_eq!(session.user_id, "u-9");
        assert_eq!(session.role, Role::Other("owner".to_string()));
        assert!(session.is_active);
        assert!(session.expires_at.is_none());
    }

    #[test]
    fn test_malformed_tokens() {
        assert!(matches!(Session::from_token("garbage"), Err(AppError::Token(_))));
        assert!(matches!(Session::from_token("a.!!!.c"), Err(AppError::Token(_))));
        let no_subject = make_token(json!({"email": "x@y.z"}));
        assert!(matches!(Session::from_token(&no_subject), Err(AppError::Token(_))));
    }

    #[test]
    fn test_restore_roundtrip_and_expiry() {
        let conn = db::init_db(":memory:").unwrap();
        let token = make_token(json!({"id": "u1", "role": "receptionist", "exp": 2_000_000_000}));
        queries::set_item(&conn, TOKEN_KEY, &token).unwrap();

        let store = AuthStore::restore(&conn, at(1_700_000_000)).unwrap();
        assert_eq!(store.role(), Some(&Role::Atendente));
        assert!(store.is_authenticated(at(1_700_000_000)));

        let expired = AuthStore::restore(&conn, at(2_100_000_000)).unwrap();
        assert!(expired.session().is_none());
        assert!(queries::get_item(&conn, TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_restore_discards_garbage() {
        let conn = db::init_db(":memory:").unwrap();
        queries::set_item(&conn, TOKEN_KEY, "not-a-jwt").unwrap();
        let store = AuthStore::restore(&conn, Utc::now()).unwrap();
        assert!(store.session().is_none());
        assert!(queries::get_item(&conn, TOKEN_KEY).unwrap().is_none());
    }
}
