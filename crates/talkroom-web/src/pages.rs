//! Server-rendered HTML. Every piece of user-provided text goes through
//! [`escape`] before it reaches the page.

use std::fmt::Write;

use axum::http::StatusCode;
use talkroom_types::models::{Talk, User};
use uuid::Uuid;

use crate::validation::FormErrors;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, username: Option<&str>, body: &str) -> String {
    let nav = match username {
        Some(name) => format!(
            r#"<a href="/friends">Friends</a> <a href="/settings">Settings</a>
<form class="inline" method="post" action="/logout"><button type="submit">Log out</button></form>
<span class="who">{}</span>"#,
            escape(name)
        ),
        None => r#"<a href="/login">Log in</a> <a href="/signup">Sign up</a>"#.to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · Talkroom</title>
</head>
<body>
<header><a href="/">Talkroom</a> <nav>{nav}</nav></header>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav,
        body = body,
    )
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    let mut out = String::new();
    for message in errors.for_field(field) {
        let _ = write!(out, r#"<p class="error">{}</p>"#, escape(message));
    }
    out
}

fn input(errors: &FormErrors, kind: &str, name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label>
<input type="{kind}" name="{name}" id="id_{name}" value="{value}">{errors}</p>
"#,
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
        errors = field_errors(errors, name),
    )
}

fn form(action: &str, fields: &str, submit: &str) -> String {
    format!(
        r#"<form method="post" action="{}">
{}<button type="submit">{}</button>
</form>"#,
        escape(action),
        fields,
        escape(submit)
    )
}

// -- Public pages --

pub fn index_page(username: Option<&str>) -> String {
    let body = match username {
        Some(name) => format!(
            r#"<p>Welcome back, {}.</p><p><a href="/friends">Pick a friend to talk to</a>.</p>"#,
            escape(name)
        ),
        None => r#"<p>Talk with your friends. <a href="/signup">Create an account</a> or <a href="/login">log in</a>.</p>"#
            .to_string(),
    };
    layout("Home", username, &body)
}

pub fn signup_page(username: &str, email: &str, errors: &FormErrors) -> String {
    let fields = [
        input(errors, "text", "username", "Username", username),
        input(errors, "email", "email", "Email address", email),
        input(errors, "password", "password1", "Password", ""),
        input(errors, "password", "password2", "Password confirmation", ""),
    ]
    .concat();
    layout("Sign up", None, &form("/signup", &fields, "Sign up"))
}

pub fn login_page(username: &str, next: Option<&str>, error: Option<&str>) -> String {
    let mut fields = String::new();
    if let Some(error) = error {
        let _ = write!(fields, r#"<p class="error">{}</p>"#, escape(error));
    }
    let none = FormErrors::default();
    fields.push_str(&input(&none, "text", "username", "Username", username));
    fields.push_str(&input(&none, "password", "password", "Password", ""));
    if let Some(next) = next {
        let _ = writeln!(fields, r#"<input type="hidden" name="next" value="{}">"#, escape(next));
    }
    layout("Log in", None, &form("/login", &fields, "Log in"))
}

// -- Friends and talks --

pub fn friends_page(me: &User, friends: &[User]) -> String {
    let mut list = String::from("<ul class=\"friends\">\n");
    for friend in friends {
        if friend.id == me.id {
            let _ = writeln!(list, "<li>{} (you)</li>", escape(&friend.username));
        } else {
            let _ = writeln!(
                list,
                r#"<li><a href="/talk_room/{}">{}</a></li>"#,
                friend.id,
                escape(&friend.username)
            );
        }
    }
    list.push_str("</ul>");
    layout("Friends", Some(&me.username), &list)
}

pub fn talk_room_page(
    me: &User,
    friend: &User,
    talks: &[Talk],
    draft: &str,
    errors: &FormErrors,
) -> String {
    let mut body = String::from("<ol class=\"talks\">\n");
    if talks.is_empty() {
        body.push_str("<li class=\"empty\">No messages yet.</li>\n");
    }
    for talk in talks {
        let side = if talk.sender_id == me.id { "mine" } else { "theirs" };
        let _ = writeln!(
            body,
            r#"<li class="talk {side}"><span class="sender">{sender}</span> <time datetime="{iso}">{shown}</time><p class="message">{message}</p></li>"#,
            side = side,
            sender = escape(&talk.sender_username),
            iso = talk.time.to_rfc3339(),
            shown = talk.time.format("%Y-%m-%d %H:%M"),
            message = escape(&talk.message),
        );
    }
    body.push_str("</ol>\n");

    let fields = format!(
        r#"<p><textarea name="message" id="id_message" rows="3" maxlength="{max}">{draft}</textarea>{errors}</p>
"#,
        max = crate::validation::MESSAGE_MAX_LEN,
        draft = escape(draft),
        errors = field_errors(errors, "message"),
    );
    body.push_str(&form(&talk_room_path(friend.id), &fields, "Send"));

    layout(&format!("Talk with {}", friend.username), Some(&me.username), &body)
}

pub fn talk_room_path(friend_id: Uuid) -> String {
    format!("/talk_room/{}", friend_id)
}

// -- Settings --

pub fn settings_page(me: &User) -> String {
    let body = r#"<ul>
<li><a href="/username_change">Change username</a></li>
<li><a href="/email_change">Change email address</a></li>
<li><a href="/password_change">Change password</a></li>
</ul>"#;
    layout("Settings", Some(&me.username), body)
}

pub fn username_change_page(me: &User, value: &str, errors: &FormErrors) -> String {
    let fields = input(errors, "text", "username", "New username", value);
    layout("Change username", Some(&me.username), &form("/username_change", &fields, "Save"))
}

pub fn email_change_page(me: &User, value: &str, errors: &FormErrors) -> String {
    let fields = input(errors, "email", "email", "New email address", value);
    layout("Change email address", Some(&me.username), &form("/email_change", &fields, "Save"))
}

pub fn password_change_page(me: &User, errors: &FormErrors) -> String {
    let fields = [
        input(errors, "password", "old_password", "Old password", ""),
        input(errors, "password", "new_password1", "New password", ""),
        input(errors, "password", "new_password2", "New password confirmation", ""),
    ]
    .concat();
    layout("Change password", Some(&me.username), &form("/password_change", &fields, "Change my password"))
}

pub fn done_page(me: &User, title: &str, message: &str) -> String {
    let body = format!(
        r#"<p>{}</p><p><a href="/settings">Back to settings</a></p>"#,
        escape(message)
    );
    layout(title, Some(&me.username), &body)
}

pub fn error_page(status: StatusCode, detail: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    layout(&title, None, &format!("<p>{}</p>", escape(detail)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_talk_room_escapes_messages() {
        let alice = user("alice");
        let bob = user("<bob>");
        let talk = Talk {
            id: Uuid::new_v4(),
            sender_id: bob.id,
            sender_username: bob.username.clone(),
            receiver_id: alice.id,
            message: "<b>hi</b>".to_string(),
            time: Utc::now(),
        };

        let html = talk_room_page(&alice, &bob, &[talk], "", &FormErrors::default());
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("Talk with &lt;bob&gt;"));
        assert!(!html.contains("<b>hi</b>"));
        assert!(html.contains(&format!(r#"action="/talk_room/{}""#, bob.id)));
    }

    #[test]
    fn test_friends_page_marks_self() {
        let alice = user("alice");
        let bob = user("bob");
        let html = friends_page(&alice, &[alice.clone(), bob.clone()]);
        assert!(html.contains("<li>alice (you)</li>"));
        assert!(html.contains(&format!(r#"<a href="/talk_room/{}">bob</a>"#, bob.id)));
        assert!(!html.contains(&format!("/talk_room/{}", alice.id)));
    }

    #[test]
    fn test_field_errors_render_next_to_input() {
        let mut errors = FormErrors::default();
        errors.add("username", "taken");
        let html = username_change_page(&user("alice"), "bob", &errors);
        assert!(html.contains(r#"value="bob""#));
        assert!(html.contains(r#"<p class="error">taken</p>"#));
    }
}
