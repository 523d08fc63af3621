use axum::{Extension, extract::State, response::Html};

use crate::auth::{AppState, with_db};
use crate::convert::user_from_row;
use crate::error::WebError;
use crate::middleware::CurrentUser;
use crate::pages;

/// Every registered user is listed; there is no friendship model to filter on.
pub async fn list_friends(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
) -> Result<Html<String>, WebError> {
    let rows = with_db(&state, |db| db.list_users()).await?;
    let friends: Vec<_> = rows.into_iter().map(user_from_row).collect();
    Ok(Html(pages::friends_page(&me.user, &friends)))
}
