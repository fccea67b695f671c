//! Client-side form checks run before any request is sent.

use std::collections::BTreeMap;
use std::fmt;

pub const MIN_PASSWORD_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Email,
    Password,
    RepeatPassword,
    Title,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
            Field::RepeatPassword => "repeatPassword",
            Field::Title => "title",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field name to message. Empty means the form is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, &'static str>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: &'static str) {
        self.0.insert(field, message);
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Loose `\S+@\S+\.\S+` check, matched anywhere in the input.
pub fn is_valid_email(email: &str) -> bool {
    email.split_whitespace().any(|word| {
        word.char_indices().any(|(at, c)| {
            c == '@'
                && at > 0
                && word[at + 1..]
                    .char_indices()
                    .any(|(dot, d)| d == '.' && dot > 0 && at + dot + 2 < word.len())
        })
    })
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !is_valid_email(email) {
        errors.insert(Field::Email, "Invalid email format");
    }
}

pub fn validate_sign_in(email: &str, password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.insert(Field::Password, "Password is required");
    }
    errors
}

pub fn validate_sign_up(email: &str, password: &str, repeat_password: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    check_email(&mut errors, email);

    if password.is_empty() {
        errors.insert(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(Field::Password, "Password must contain at least 3 characters");
    }

    if repeat_password.is_empty() {
        errors.insert(Field::RepeatPassword, "Password confirmation is required");
    } else if password != repeat_password {
        errors.insert(Field::RepeatPassword, "Passwords do not match");
    }

    errors
}

pub fn validate_title(title: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if title.trim().is_empty() {
        errors.insert(Field::Title, "Title is required");
    }
    errors
}
