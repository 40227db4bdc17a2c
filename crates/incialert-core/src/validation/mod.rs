//! Validation modules
//!
//! Client-side form checks run before any request is sent. Each validator
//! returns every failing field at once in [`ValidationErrors`](crate::ValidationErrors).

pub mod account;
pub mod report;

pub use account::{
    is_valid_email, is_valid_phone, validate_forgot_password, validate_profile_update,
    RegisterForm, ResetPasswordForm, MIN_PASSWORD_LENGTH, MIN_USERNAME_LENGTH,
};
pub use report::{validate_media_size, ReportForm};
