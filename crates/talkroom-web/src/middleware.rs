use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use talkroom_types::models::User;

use crate::auth::{AppState, with_db};
use crate::convert::user_from_row;
use crate::error::WebError;
use crate::session::{self, COOKIE_NAME};

/// The authenticated requester, inserted into request extensions by
/// [`require_auth`]. Holds the password hash for re-authentication flows.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub password_hash: String,
}

/// Resolve the session cookie to a live user. A token whose user is gone or
/// whose password has changed since it was issued counts as no session.
pub async fn current_user(state: &AppState, jar: &CookieJar) -> Result<Option<CurrentUser>, WebError> {
    let Some(token) = jar.get(COOKIE_NAME).map(|c| c.value().to_string()) else {
        return Ok(None);
    };
    let Some(claims) = session::decode_token(&state.jwt_secret, &token) else {
        debug!("Rejected invalid or expired session token");
        return Ok(None);
    };

    let id = claims.sub.to_string();
    let Some(row) = with_db(state, move |db| db.get_user_by_id(&id)).await? else {
        return Ok(None);
    };

    if session::session_auth_hash(&state.jwt_secret, &row.password) != claims.auth {
        debug!("Session for {} predates a password change", row.username);
        return Ok(None);
    }

    Ok(Some(CurrentUser {
        password_hash: row.password.clone(),
        user: user_from_row(row),
    }))
}

/// Gate for views that need a logged-in user; everyone else is sent to the
/// login page with the original path as `next`.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match current_user(&state, &jar).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => {
            let target = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            let jar = if jar.get(COOKIE_NAME).is_some() {
                jar.remove(session::removal_cookie())
            } else {
                jar
            };
            (jar, Redirect::to(&login_url(target))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/login?{}", query),
        Err(_) => "/login".to_string(),
    }
}
