//! HTTP surface of Talkroom: signup and login, the user directory, talk
//! rooms between two users, and the account settings flows.

pub mod auth;
pub mod convert;
pub mod error;
pub mod friends;
pub mod middleware;
pub mod pages;
pub mod session;
pub mod settings;
pub mod talks;
pub mod validation;

use axum::{Router, middleware::from_fn_with_state, routing::{get, post}};

use crate::auth::AppState;
use crate::error::WebError;

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(auth::index))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/friends", get(friends::list_friends))
        .route("/talk_room/{user_id}", get(talks::talk_room).post(talks::send_talk))
        .route("/settings", get(settings::settings))
        .route(
            "/username_change",
            get(settings::username_change_form).post(settings::username_change),
        )
        .route("/username_change/done", get(settings::username_change_done))
        .route(
            "/email_change",
            get(settings::email_change_form).post(settings::email_change),
        )
        .route("/email_change/done", get(settings::email_change_done))
        .route(
            "/password_change",
            get(settings::password_change_form).post(settings::password_change),
        )
        .route("/password_change/done", get(settings::password_change_done))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> WebError {
    WebError::NotFound
}
