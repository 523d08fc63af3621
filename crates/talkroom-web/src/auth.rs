use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};
use uuid::Uuid;

use talkroom_db::Database;
use talkroom_types::forms::{LoginForm, NextQuery, SignupForm};

use crate::error::WebError;
use crate::middleware::current_user;
use crate::pages;
use crate::session::{self, SessionSettings};
use crate::validation::{self, FormErrors, LOGIN_INVALID, USERNAME_TAKEN};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub session: SessionSettings,
}

/// Run blocking database work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, WebError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let value = tokio::task::spawn_blocking(move || f(&state.db)).await??;
    Ok(value)
}

/// Argon2id hash of `password`, computed on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String, WebError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
    })
    .await??;
    Ok(hash)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, WebError> {
    let (password, password_hash) = (password.to_string(), password_hash.to_string());
    let matches = tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;
        Ok::<_, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await??;
    Ok(matches)
}

/// Log a user in: the returned jar carries a fresh session cookie.
pub fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: Uuid,
    username: &str,
    password_hash: &str,
) -> Result<CookieJar, WebError> {
    let token = session::create_token(&state.jwt_secret, &state.session, user_id, username, password_hash)?;
    Ok(jar.add(session::session_cookie(token, &state.session)))
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Html<String>, WebError> {
    let me = current_user(&state, &jar).await?;
    Ok(Html(pages::index_page(me.as_ref().map(|m| m.user.username.as_str()))))
}

pub async fn signup_form() -> Html<String> {
    Html(pages::signup_page("", "", &FormErrors::default()))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    let rerender = |errors: &FormErrors| {
        Html(pages::signup_page(form.username.trim(), form.email.trim(), errors)).into_response()
    };

    let (clean, mut errors) = match validation::clean_signup(&form) {
        Ok(clean) => (Some(clean), FormErrors::default()),
        Err(errors) => (None, errors),
    };
    if !errors.has("username") {
        let username = form.username.trim().to_string();
        if with_db(&state, move |db| db.get_user_by_username(&username)).await?.is_some() {
            errors.add("username", USERNAME_TAKEN);
        }
    }
    let Some(clean) = clean.filter(|_| errors.is_empty()) else {
        return Ok(rerender(&errors));
    };

    let password_hash = hash_password(&clean.password).await?;
    let user_id = Uuid::new_v4();

    let created = {
        let (id, username, email, hash) =
            (user_id.to_string(), clean.username.clone(), clean.email.clone(), password_hash.clone());
        with_db(&state, move |db| db.create_user(&id, &username, &email, &hash)).await?
    };
    if !created {
        // Lost a race with a concurrent signup for the same name.
        errors.add("username", USERNAME_TAKEN);
        return Ok(rerender(&errors));
    }

    info!("New user '{}' signed up", clean.username);
    let jar = start_session(&state, jar, user_id, &clean.username, &password_hash)?;
    Ok((jar, Redirect::to("/")).into_response())
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Html<String> {
    Html(pages::login_page("", query.next.as_deref(), None))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let next = form.next.as_deref().filter(|n| !n.is_empty());
    let username = form.username.trim().to_string();
    let rejected = || Html(pages::login_page(&username, next, Some(LOGIN_INVALID))).into_response();

    if username.is_empty() || form.password.is_empty() {
        return Ok(rejected());
    }

    let lookup = username.clone();
    let Some(user) = with_db(&state, move |db| db.get_user_by_username(&lookup)).await? else {
        warn!("Login attempt for unknown user '{}'", username);
        return Ok(rejected());
    };

    if !verify_password(&form.password, &user.password).await? {
        warn!("Wrong password for '{}'", user.username);
        return Ok(rejected());
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    info!("User '{}' logged in", user.username);
    let jar = start_session(&state, jar, user_id, &user.username, &user.password)?;
    Ok((jar, Redirect::to(validation::safe_next(next))).into_response())
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(session::removal_cookie()), Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_password_hash_verifies() {
        let hash = hash_password("tulip-sky-42").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("tulip-sky-42", &hash).await.unwrap());
        assert!(!verify_password("tulip-sky-43", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").await.is_err());
    }
}
