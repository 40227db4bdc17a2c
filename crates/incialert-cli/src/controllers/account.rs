//! Sign-in, registration, profile and password-reset screens.

use incialert_api_client::ApiClient;
use incialert_core::models::{AuthResponse, Credentials, MessageResponse, ProfileUpdate, User};
use incialert_core::validation::{
    validate_forgot_password, validate_profile_update, RegisterForm, ResetPasswordForm,
};
use incialert_core::ValidationErrors;

use super::{FormError, Notification};

/// What the profile screen can show.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileView {
    /// No session, or the stored one was rejected and has been cleared.
    SignedOut,
    SignedIn(User),
}

pub async fn login(
    client: &ApiClient,
    username: &str,
    password: &str,
) -> Result<AuthResponse, FormError> {
    let mut errors = ValidationErrors::new();
    if username.trim().is_empty() {
        errors.add("username", "Username is required");
    }
    if password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()?;

    let credentials = Credentials {
        username: username.trim().to_string(),
        password: password.to_string(),
    };
    Ok(client.login(&credentials).await?)
}

pub async fn register(client: &ApiClient, form: &RegisterForm) -> Result<AuthResponse, FormError> {
    form.validate()?;
    Ok(client.register(&form.to_request()).await?)
}

pub fn welcome_notification(response: &AuthResponse) -> Notification {
    Notification::success(
        "Welcome",
        format!(
            "Welcome to Inci-Alert, {}! You are now logged in.",
            response.user.display_name()
        ),
    )
}

/// Sign out locally whatever the server says.
pub async fn logout(client: &ApiClient) -> Notification {
    match client.logout().await {
        Ok(()) => Notification::info("Signed out", "Your session has ended."),
        Err(e) => {
            tracing::warn!(error = %e, "Logout request failed; local session cleared");
            Notification::info(
                "Signed out",
                format!("Local session cleared, but the server could not be reached: {}", e),
            )
        }
    }
}

/// Load the profile screen. A rejected token is cleared and reported once.
pub async fn load_profile(client: &ApiClient) -> (ProfileView, Option<Notification>) {
    if !client.is_authenticated() {
        return (ProfileView::SignedOut, None);
    }
    match client.current_user().await {
        Some(user) => (ProfileView::SignedIn(user), None),
        None => (
            ProfileView::SignedOut,
            Some(Notification::error(
                "Session expired",
                "Please log in again to view your profile.",
            )),
        ),
    }
}

pub async fn update_profile(client: &ApiClient, update: &ProfileUpdate) -> Result<User, FormError> {
    validate_profile_update(update)?;
    Ok(client.update_profile(update).await?.user)
}

pub async fn forgot_password(client: &ApiClient, email: &str) -> Result<MessageResponse, FormError> {
    validate_forgot_password(email)?;
    Ok(client.request_password_reset(email.trim()).await?)
}

pub async fn reset_password(
    client: &ApiClient,
    form: &ResetPasswordForm,
) -> Result<MessageResponse, FormError> {
    form.validate()?;
    Ok(client.reset_password(&form.to_request()).await?)
}
