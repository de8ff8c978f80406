//! Client-side checks applied to user input before it is sent.

use std::fmt;

use chrono::NaiveDate;
use shared::{
    domain::Gender,
    protocol::{LoginRequest, RegisterRequest, UpdateMe},
};
use thiserror::Error;

/// Mail providers accepted at sign-in.
pub const ALLOWED_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "aol.com",
    "outlook.com",
    "icloud.com",
    "mail.com",
    "protonmail.com",
    "yandex.com",
    "zoho.com",
    "yandex.ru",
    "mail.ru",
    "rambler.ru",
    "inbox.ru",
];

pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const MAX_PROFILE_PIC_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn render(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn check_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min {
        errors.push(field, format!("must contain at least {min} characters"));
    } else if len > max {
        errors.push(field, format!("must contain at most {max} characters"));
    }
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !domain.ends_with('.')
}

fn check_email(errors: &mut ValidationErrors, field: &'static str, email: &str, min: usize) {
    if !is_valid_email(email) {
        errors.push(field, "invalid e-mail address");
        return;
    }
    check_length(errors, field, email, min, 50);
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&mut errors, "email", &self.email, 2);
        if is_valid_email(&self.email) {
            let domain = self
                .email
                .rsplit_once('@')
                .map(|(_, domain)| domain.to_ascii_lowercase())
                .unwrap_or_default();
            if !ALLOWED_EMAIL_DOMAINS.contains(&domain.as_str()) {
                errors.push("email", "e-mail domain is not allowed");
            }
        }
        check_length(&mut errors, "password", &self.password, 8, 50);
        errors.into_result(|| LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    /// `male` or `female`
    pub gender: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_length(&mut errors, "first_name", &self.first_name, 2, 50);
        check_length(&mut errors, "last_name", &self.last_name, 2, 50);
        check_email(&mut errors, "email", &self.email, 2);
        check_length(&mut errors, "password", &self.password, 8, 50);
        check_length(&mut errors, "confirm_password", &self.confirm_password, 8, 50);
        if self.password != self.confirm_password {
            errors.push("confirm_password", "passwords do not match");
        }

        let birth_date = parse_birth_date(&self.birth_date);
        if birth_date.is_none() {
            errors.push("birth_date", "birth date must use the YYYY-MM-DD format");
        }
        let gender = parse_gender(&self.gender);
        if gender.is_none() {
            errors.push("gender", "gender must be either male or female");
        }

        match (birth_date, gender) {
            (Some(birth_date), Some(gender)) if errors.is_empty() => Ok(RegisterRequest {
                first_name: self.first_name.clone(),
                last_name: self.last_name.clone(),
                email: self.email.clone(),
                password: self.password.clone(),
                birth_date,
                gender,
            }),
            _ => Err(errors),
        }
    }
}

fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    let shaped = raw.len() == 10
        && raw
            .char_indices()
            .all(|(idx, c)| if idx == 4 || idx == 7 { c == '-' } else { c.is_ascii_digit() });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_gender(raw: &str) -> Option<Gender> {
    match raw {
        "male" => Some(Gender::Male),
        "female" => Some(Gender::Female),
        _ => None,
    }
}

/// Name/e-mail edits from the profile page. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<UpdateMe, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(first_name) = &self.first_name {
            check_length(&mut errors, "first_name", first_name, 2, 50);
        }
        if let Some(last_name) = &self.last_name {
            check_length(&mut errors, "last_name", last_name, 2, 50);
        }
        if let Some(email) = &self.email {
            if email.trim() != email {
                errors.push("email", "e-mail must not start or end with whitespace");
            } else {
                check_email(&mut errors, "email", email, 5);
            }
        }
        errors.into_result(|| UpdateMe {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            ..UpdateMe::default()
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordChangeForm {
    pub current_password: String,
    pub password: String,
    pub password_again: String,
}

impl PasswordChangeForm {
    pub fn validate(&self) -> Result<UpdateMe, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.current_password.is_empty() {
            errors.push("current_password", "current password is required");
        }
        check_length(&mut errors, "password", &self.password, 8, 100);
        let pw = &self.password;
        if !pw.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push("password", "must contain an uppercase letter");
        }
        if !pw.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push("password", "must contain a lowercase letter");
        }
        if !pw.chars().any(|c| c.is_ascii_digit()) {
            errors.push("password", "must contain a digit");
        }
        if !pw.chars().any(|c| !c.is_ascii_alphanumeric()) {
            errors.push("password", "must contain a special character");
        }
        if self.password != self.password_again {
            errors.push("password_again", "passwords do not match");
        }
        errors.into_result(|| UpdateMe {
            current_password: Some(self.current_password.clone()),
            new_password: Some(self.password.clone()),
            ..UpdateMe::default()
        })
    }
}

pub fn validate_profile_pic(mime_type: &str, size: usize) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !ACCEPTED_IMAGE_TYPES.contains(&mime_type) {
        errors.push("image", "only JPEG, PNG or WEBP images are accepted");
    }
    if size == 0 {
        errors.push("image", "select a file");
    } else if size > MAX_PROFILE_PIC_BYTES {
        errors.push("image", "file must not exceed 5MB");
    }
    errors.into_result(|| ())
}
