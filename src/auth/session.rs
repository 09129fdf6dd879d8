use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::{
    auth::{
        claims::Claims,
        repo,
        repo_types::{Session, User},
    },
    config::SessionConfig,
    cookies,
    state::AppState,
};

pub const COOKIE: &str = "session";

/// Signing material and lifetimes for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub remember_ttl: Duration,
    pub cookie_secure: bool,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
            remember_ttl_days,
            cookie_secure,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::minutes(ttl_minutes),
            remember_ttl: Duration::days(remember_ttl_days),
            cookie_secure,
        }
    }
}

impl SessionKeys {
    pub fn lifetime(&self, remember: bool) -> Duration {
        if remember {
            self.remember_ttl
        } else {
            self.ttl
        }
    }

    pub fn sign(&self, session: &Session) -> anyhow::Result<String> {
        let claims = Claims {
            sub: session.user_id,
            sid: session.id,
            iat: session.created_at.unix_timestamp() as usize,
            exp: session.expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = session.user_id, session_id = %session.id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `Set-Cookie` for a fresh session; remembered sessions outlive the browser.
    pub fn cookie(&self, token: &str, session: &Session) -> String {
        let max_age = session
            .remember
            .then(|| self.remember_ttl.whole_seconds());
        cookies::build(COOKIE, token, max_age, self.cookie_secure)
    }
}

/// Persist a session row and return the `Set-Cookie` value carrying its token.
pub async fn start(state: &AppState, user_id: i64, remember: bool) -> anyhow::Result<String> {
    let keys = SessionKeys::from_ref(state);
    let now = OffsetDateTime::now_utc();
    let purged = repo::purge_expired_sessions(&state.db, now)
        .await
        .context("purge expired sessions")?;
    if purged > 0 {
        debug!(purged, "expired sessions removed");
    }
    let expires_at = now + keys.lifetime(remember);
    let session = repo::create_session(&state.db, user_id, remember, expires_at)
        .await
        .context("create session")?;
    let token = keys.sign(&session)?;
    info!(user_id, session_id = %session.id, remember, "session started");
    Ok(keys.cookie(&token, &session))
}

/// Delete the session the token refers to. Unverifiable tokens are ignored.
pub async fn end(state: &AppState, token: &str) -> anyhow::Result<()> {
    let keys = SessionKeys::from_ref(state);
    if let Ok(claims) = keys.verify(token) {
        repo::delete_session(&state.db, claims.sid)
            .await
            .context("delete session")?;
        info!(user_id = claims.sub, session_id = %claims.sid, "session ended");
    }
    Ok(())
}

/// Session and user behind a token, if the token verifies and the session is live.
pub async fn resolve(state: &AppState, token: &str) -> anyhow::Result<Option<(Session, User)>> {
    let keys = SessionKeys::from_ref(state);
    let Ok(claims) = keys.verify(token) else {
        debug!("session token rejected");
        return Ok(None);
    };
    let Some(session) = repo::find_session(&state.db, claims.sid)
        .await
        .context("find session")?
    else {
        return Ok(None);
    };
    if session.user_id != claims.sub {
        return Ok(None);
    }
    if !session.is_live(OffsetDateTime::now_utc()) {
        repo::delete_session(&state.db, session.id)
            .await
            .context("delete expired session")?;
        debug!(session_id = %session.id, "expired session removed");
        return Ok(None);
    }
    let user = repo::find_by_id(&state.db, session.user_id)
        .await
        .context("load session user")?;
    Ok(user.map(|u| (session, u)))
}
