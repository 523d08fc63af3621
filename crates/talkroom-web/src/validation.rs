//! Form cleaning. Each `clean_*` function either returns the normalised
//! values or the full set of field errors to show on the re-rendered page.

use talkroom_types::forms::{PasswordChangeForm, SignupForm};

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const MESSAGE_MAX_LEN: usize = 1000;
pub const PASSWORD_MIN_LEN: usize = 8;

pub const REQUIRED: &str = "This field is required.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const EMAIL_INVALID: &str = "Enter a valid email address.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn’t match.";
pub const PASSWORD_INCORRECT: &str = "Your old password was entered incorrectly. Please enter it again.";
pub const LOGIN_INVALID: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

const COMMON_PASSWORDS: &[&str] = &[
    "123456789", "12345678", "password", "password1", "password123", "qwertyuiop",
    "qwerty123", "1q2w3e4r", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "letmein1", "abc12345", "trustno1", "superman",
    "starwars", "whatever", "passw0rd", "11111111", "00000000", "asdfghjkl",
];

/// Field-keyed validation messages, in the order they were raised.
#[derive(Debug, Default, Clone)]
pub struct FormErrors {
    fields: Vec<(&'static str, String)>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.iter().any(|(f, _)| *f == field)
    }

    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn too_long(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {} characters (it has {}).", max, actual)
}

/// Trim and check a username. Uniqueness is the caller's job.
pub fn check_username(raw: &str, errors: &mut FormErrors) -> String {
    let username = raw.trim().to_string();
    let len = username.chars().count();

    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if len > USERNAME_MAX_LEN {
        errors.add("username", too_long(USERNAME_MAX_LEN, len));
    } else if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add("username", USERNAME_INVALID);
    }

    username
}

pub fn check_email(raw: &str, errors: &mut FormErrors) -> String {
    let email = raw.trim().to_string();
    let len = email.chars().count();

    if email.is_empty() {
        errors.add("email", REQUIRED);
        return email;
    }
    if len > EMAIL_MAX_LEN {
        errors.add("email", too_long(EMAIL_MAX_LEN, len));
        return email;
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, rest)| !host.is_empty() && !rest.is_empty())
                && !domain.ends_with('.')
                && !domain.contains("..")
        }
        None => false,
    };
    if !valid {
        errors.add("email", EMAIL_INVALID);
    }

    email
}

/// Strength rules for a new password. Passwords are never trimmed.
pub fn check_password(field: &'static str, password: &str, username: &str, errors: &mut FormErrors) {
    if password.is_empty() {
        errors.add(field, REQUIRED);
        return;
    }

    let lowered = password.to_lowercase();
    let user = username.trim().to_lowercase();
    if user.chars().count() >= 3 && (lowered.contains(&user) || user.contains(&lowered)) {
        errors.add(field, "The password is too similar to the username.");
    }
    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add(
            field,
            format!(
                "This password is too short. It must contain at least {} characters.",
                PASSWORD_MIN_LEN
            ),
        );
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        errors.add(field, "This password is too common.");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        errors.add(field, "This password is entirely numeric.");
    }
}

pub struct CleanSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub fn clean_signup(form: &SignupForm) -> Result<CleanSignup, FormErrors> {
    let mut errors = FormErrors::default();
    let username = check_username(&form.username, &mut errors);
    let email = check_email(&form.email, &mut errors);

    if form.password1.is_empty() {
        errors.add("password1", REQUIRED);
    }
    if form.password2.is_empty() {
        errors.add("password2", REQUIRED);
    } else if !form.password1.is_empty() && form.password1 != form.password2 {
        errors.add("password2", PASSWORD_MISMATCH);
    }
    if !errors.has("password1") && !errors.has("password2") {
        check_password("password2", &form.password2, &username, &mut errors);
    }

    errors.into_result(CleanSignup {
        username,
        email,
        password: form.password1.clone(),
    })
}

/// Everything except the old-password check, which needs the stored hash.
pub fn clean_new_password(form: &PasswordChangeForm, username: &str) -> Result<String, FormErrors> {
    let mut errors = FormErrors::default();

    if form.old_password.is_empty() {
        errors.add("old_password", REQUIRED);
    }
    if form.new_password1.is_empty() {
        errors.add("new_password1", REQUIRED);
    }
    if form.new_password2.is_empty() {
        errors.add("new_password2", REQUIRED);
    } else if !form.new_password1.is_empty() && form.new_password1 != form.new_password2 {
        errors.add("new_password2", PASSWORD_MISMATCH);
    }
    if !errors.has("new_password1") && !errors.has("new_password2") {
        check_password("new_password2", &form.new_password2, username, &mut errors);
    }

    errors.into_result(form.new_password1.clone())
}

pub fn clean_message(raw: &str) -> Result<String, FormErrors> {
    let mut errors = FormErrors::default();
    let message = raw.trim().to_string();
    let len = message.chars().count();

    if message.is_empty() {
        errors.add("message", REQUIRED);
    } else if len > MESSAGE_MAX_LEN {
        errors.add("message", too_long(MESSAGE_MAX_LEN, len));
    }

    errors.into_result(message)
}

/// Only same-site absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/",
    }
}
