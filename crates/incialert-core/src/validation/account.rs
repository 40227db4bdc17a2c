use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationErrors;
use crate::models::{ProfileUpdate, RegisterRequest, ResetPasswordRequest};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+]?[1-9][\d]{0,15}$").expect("valid phone regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Draft of the registration form, including the password confirmation.
#[derive(Clone, Default, PartialEq)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .finish_non_exhaustive()
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        } else if self.username.chars().count() < MIN_USERNAME_LENGTH {
            errors.add("username", "Username must be at least 3 characters");
        }

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&self.email) {
            errors.add("email", "Please enter a valid email address");
        }

        check_password(&mut errors, &self.password);

        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        if self.first_name.trim().is_empty() {
            errors.add("first_name", "First name is required");
        }

        if self.last_name.trim().is_empty() {
            errors.add("last_name", "Last name is required");
        }

        if !self.phone.is_empty() && !is_valid_phone(&self.phone) {
            errors.add("phone", "Please enter a valid phone number");
        }

        errors.into_result()
    }

    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            phone: non_empty(&self.phone),
        }
    }
}

/// Draft of the reset-password form; `token` comes from the emailed link.
#[derive(Clone, Default, PartialEq)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for ResetPasswordForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordForm").finish_non_exhaustive()
    }
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.token.trim().is_empty() {
            errors.add("token", "The password reset link is invalid or has expired.");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add("password", "Password must be at least 6 characters long");
        }

        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "Please confirm your password");
        } else if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.into_result()
    }

    pub fn to_request(&self) -> ResetPasswordRequest {
        ResetPasswordRequest {
            token: self.token.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

pub fn validate_forgot_password(email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email.trim()) {
        errors.add("email", "Please enter a valid email address");
    }
    errors.into_result()
}

pub fn validate_profile_update(update: &ProfileUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Some(phone) = update.phone.as_deref().filter(|p| !p.is_empty()) {
        if !is_valid_phone(phone) {
            errors.add("phone", "Please enter a valid phone number");
        }
    }
    errors.into_result()
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add("password", "Password must be at least 6 characters");
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
