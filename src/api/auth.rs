use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::upload::FormFields;
use crate::db::{Session, StoreError, User};
use crate::ui::{render_template, IndexTemplate};
use crate::AppState;

/// Session token cookie name
pub const SESSION_COOKIE: &str = "cookbooks_session";

const REGISTER_FAILED_ERROR: &str = "Failed register :( !";
const LOGIN_FAILED_ERROR: &str = "Failed login :( !";

/// Identity of the logged-in caller, resolved once per request by
/// `auth_middleware` and handed to handlers as an extractor.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub user: User,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Non-empty username and password from a login or registration form
fn credentials(fields: &FormFields) -> Option<(String, String)> {
    let username = fields.text("username").filter(|u| !u.is_empty())?;
    let password = fields.text("password").filter(|p| !p.is_empty())?;
    Some((username, password))
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Create a server-side session for `user` and attach its cookie to `jar`
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<CookieJar, sqlx::Error> {
    let token = generate_token();
    let ttl = chrono::Duration::hours(state.config.auth.session_ttl_hours);
    Session::create(&state.db, &user.id, &hash_token(&token), ttl).await?;
    Ok(jar.add(session_cookie(token)))
}

/// Resolve the session cookie to the logged-in user, if any
pub async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<SessionContext>, sqlx::Error> {
    let token = match jar.get(SESSION_COOKIE) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_string(),
        _ => return Ok(None),
    };

    let session = match Session::find_active(&state.db, &hash_token(&token)).await? {
        Some(session) => session,
        None => return Ok(None),
    };

    let user = User::get_by_id(&state.db, &session.user_id).await?;
    Ok(user.map(|user| SessionContext {
        session_id: session.id,
        user,
    }))
}

/// Gate for protected routes: callers without a valid session go back to `/`
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match resolve_session(&state, &jar).await {
        Ok(Some(context)) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Ok(None) => Redirect::to("/").into_response(),
        Err(e) => {
            error!("Failed to resolve session: {}", e);
            Redirect::to("/").into_response()
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| Redirect::to("/"))
    }
}

/// Landing page with the login and registration forms
pub async fn index() -> Response {
    render_template(IndexTemplate { error: None })
}

pub async fn register_failed() -> Response {
    render_template(IndexTemplate {
        error: Some(REGISTER_FAILED_ERROR.to_string()),
    })
}

pub async fn login_failed() -> Response {
    render_template(IndexTemplate {
        error: Some(LOGIN_FAILED_ERROR.to_string()),
    })
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let fields = FormFields::from_pairs(pairs);
    let (username, password) = match credentials(&fields) {
        Some(c) => c,
        None => return Redirect::to("/registerFailed").into_response(),
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return Redirect::to("/registerFailed").into_response();
        }
    };

    let user = match User::create(&state.db, &username, &password_hash).await {
        Ok(user) => user,
        Err(StoreError::DuplicateUsername) => {
            warn!(username = %username, "Registration rejected, username taken");
            return Redirect::to("/registerFailed").into_response();
        }
        Err(e) => {
            error!(username = %username, "Failed to create user: {}", e);
            return Redirect::to("/registerFailed").into_response();
        }
    };

    info!(username = %user.username, "Registered new user");

    match start_session(&state, jar, &user).await {
        Ok(jar) => (jar, Redirect::to("/home")).into_response(),
        Err(e) => {
            error!("Failed to create session: {}", e);
            Redirect::to("/registerFailed").into_response()
        }
    }
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let fields = FormFields::from_pairs(pairs);
    let (username, password) = match credentials(&fields) {
        Some(c) => c,
        None => return Redirect::to("/loginFailed").into_response(),
    };

    let user = match User::find_by_username(&state.db, &username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(username = %username, "Login failed, unknown username");
            return Redirect::to("/loginFailed").into_response();
        }
        Err(e) => {
            error!("Failed to look up user: {}", e);
            return Redirect::to("/loginFailed").into_response();
        }
    };

    if !verify_password(&password, &user.password_hash) {
        warn!(username = %username, "Login failed, incorrect password");
        return Redirect::to("/loginFailed").into_response();
    }

    if let Err(e) = Session::delete_expired(&state.db).await {
        warn!("Failed to prune expired sessions: {}", e);
    }

    match start_session(&state, jar, &user).await {
        Ok(jar) => {
            info!(username = %user.username, "User logged in");
            (jar, Redirect::to("/home")).into_response()
        }
        Err(e) => {
            error!("Failed to create session: {}", e);
            Redirect::to("/loginFailed").into_response()
        }
    }
}

/// GET /logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    jar: CookieJar,
) -> Response {
    if let Err(e) = Session::delete(&state.db, &session.session_id).await {
        error!("Failed to delete session: {}", e);
    }
    info!(username = %session.user.username, "User logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();

        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password_with_malformed_hash() {
        assert!(!verify_password("secret", "not-a-phc-string"));
        assert!(!verify_password("secret", ""));
    }

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_ne!(token, generate_token());

        let hashed = hash_token(&token);
        assert_eq!(hashed.len(), 64);
        assert_ne!(hashed, token);
        assert_eq!(hashed, hash_token(&token));
    }

    #[test]
    fn test_credentials_require_both_fields() {
        let fields = FormFields::from_pairs(vec![
            ("username".to_string(), "alice".to_string()),
            ("password".to_string(), "".to_string()),
        ]);
        assert!(credentials(&fields).is_none());

        let fields = FormFields::from_pairs(vec![
            ("username".to_string(), "alice".to_string()),
            ("password".to_string(), "pw".to_string()),
        ]);
        assert_eq!(
            credentials(&fields),
            Some(("alice".to_string(), "pw".to_string()))
        );
    }
}
