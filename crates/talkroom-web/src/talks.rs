use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::info;
use uuid::Uuid;

use talkroom_types::forms::TalkForm;
use talkroom_types::models::{Talk, User};

use crate::auth::{AppState, with_db};
use crate::convert::{talk_from_row, user_from_row};
use crate::error::WebError;
use crate::middleware::CurrentUser;
use crate::pages;
use crate::validation::{self, FormErrors};

/// Resolve the other side of a talk room. Unknown or malformed ids are 404s.
async fn load_friend(state: &AppState, me: &CurrentUser, raw_id: &str) -> Result<User, WebError> {
    let friend_id: Uuid = raw_id.parse().map_err(|_| WebError::NotFound)?;
    if friend_id == me.user.id {
        return Err(WebError::BadRequest("You cannot open a talk room with yourself."));
    }

    let id = friend_id.to_string();
    let row = with_db(state, move |db| db.get_user_by_id(&id))
        .await?
        .ok_or(WebError::NotFound)?;
    Ok(user_from_row(row))
}

async fn load_talks(state: &AppState, me: Uuid, friend: Uuid) -> Result<Vec<Talk>, WebError> {
    let (a, b) = (me.to_string(), friend.to_string());
    let rows = with_db(state, move |db| db.get_talks_between(&a, &b)).await?;

    Ok(rows.into_iter().map(talk_from_row).collect())
}

pub async fn talk_room(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(me): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let friend = load_friend(&state, &me, &user_id).await?;
    let talks = load_talks(&state, me.user.id, friend.id).await?;
    Ok(Html(pages::talk_room_page(&me.user, &friend, &talks, "", &FormErrors::default())))
}

pub async fn send_talk(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Extension(me): Extension<CurrentUser>,
    Form(form): Form<TalkForm>,
) -> Result<Response, WebError> {
    let friend = load_friend(&state, &me, &user_id).await?;

    let message = match validation::clean_message(&form.message) {
        Ok(message) => message,
        Err(errors) => {
            let talks = load_talks(&state, me.user.id, friend.id).await?;
            let page = pages::talk_room_page(&me.user, &friend, &talks, &form.message, &errors);
            return Ok(Html(page).into_response());
        }
    };

    let talk_id = Uuid::new_v4().to_string();
    let (sender, receiver) = (me.user.id.to_string(), friend.id.to_string());
    let now = chrono::Utc::now();
    with_db(&state, move |db| db.insert_talk(&talk_id, &sender, &receiver, &message, now)).await?;

    info!("{} sent a message to {}", me.user.username, friend.username);
    Ok(Redirect::to(&pages::talk_room_path(friend.id)).into_response())
}
