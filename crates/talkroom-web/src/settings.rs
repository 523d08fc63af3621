use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use talkroom_types::forms::{EmailChangeForm, PasswordChangeForm, UsernameChangeForm};

use crate::auth::{AppState, hash_password, start_session, verify_password, with_db};
use crate::error::WebError;
use crate::middleware::CurrentUser;
use crate::pages;
use crate::validation::{self, FormErrors, PASSWORD_INCORRECT, USERNAME_TAKEN};

pub async fn settings(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::settings_page(&me.user))
}

// -- Username --

pub async fn username_change_form(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::username_change_page(&me.user, &me.user.username, &FormErrors::default()))
}

pub async fn username_change(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<UsernameChangeForm>,
) -> Result<Response, WebError> {
    let mut errors = FormErrors::default();
    let username = validation::check_username(&form.username, &mut errors);

    if errors.is_empty() {
        let (id, new_name) = (me.user.id.to_string(), username.clone());
        let updated = with_db(&state, move |db| db.update_username(&id, &new_name)).await?;
        if !updated {
            errors.add("username", USERNAME_TAKEN);
        }
    }
    if !errors.is_empty() {
        return Ok(Html(pages::username_change_page(&me.user, &username, &errors)).into_response());
    }

    info!("User '{}' is now '{}'", me.user.username, username);
    let jar = start_session(&state, jar, me.user.id, &username, &me.password_hash)?;
    Ok((jar, Redirect::to("/username_change/done")).into_response())
}

pub async fn username_change_done(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::done_page(&me.user, "Username changed", "Your username has been changed."))
}

// -- Email --

pub async fn email_change_form(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::email_change_page(&me.user, &me.user.email, &FormErrors::default()))
}

pub async fn email_change(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    Form(form): Form<EmailChangeForm>,
) -> Result<Response, WebError> {
    let mut errors = FormErrors::default();
    let email = validation::check_email(&form.email, &mut errors);
    if !errors.is_empty() {
        return Ok(Html(pages::email_change_page(&me.user, &email, &errors)).into_response());
    }

    let (id, new_email) = (me.user.id.to_string(), email);
    with_db(&state, move |db| db.update_email(&id, &new_email)).await?;

    info!("User '{}' changed their email address", me.user.username);
    Ok(Redirect::to("/email_change/done").into_response())
}

pub async fn email_change_done(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::done_page(&me.user, "Email address changed", "Your email address has been changed."))
}

// -- Password --

pub async fn password_change_form(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::password_change_page(&me.user, &FormErrors::default()))
}

/// Replaces the password hash and re-issues this session. Sessions issued
/// under the old hash stop validating.
pub async fn password_change(
    State(state): State<AppState>,
    Extension(me): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<PasswordChangeForm>,
) -> Result<Response, WebError> {
    let (new_password, mut errors) = match validation::clean_new_password(&form, &me.user.username) {
        Ok(password) => (Some(password), FormErrors::default()),
        Err(errors) => (None, errors),
    };
    if !errors.has("old_password") && !verify_password(&form.old_password, &me.password_hash).await? {
        errors.add("old_password", PASSWORD_INCORRECT);
    }
    let Some(new_password) = new_password.filter(|_| errors.is_empty()) else {
        return Ok(Html(pages::password_change_page(&me.user, &errors)).into_response());
    };

    let password_hash = hash_password(&new_password).await?;
    {
        let (id, hash) = (me.user.id.to_string(), password_hash.clone());
        with_db(&state, move |db| db.update_password(&id, &hash)).await?;
    }

    info!("User '{}' changed their password", me.user.username);
    let jar = start_session(&state, jar, me.user.id, &me.user.username, &password_hash)?;
    Ok((jar, Redirect::to("/password_change/done")).into_response())
}

pub async fn password_change_done(Extension(me): Extension<CurrentUser>) -> Html<String> {
    Html(pages::done_page(&me.user, "Password changed", "Your password has been changed."))
}
