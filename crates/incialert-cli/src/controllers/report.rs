//! Incident reporting screen.

use incialert_api_client::{ApiClient, MediaUpload};
use incialert_core::models::Incident;
use incialert_core::validation::{validate_media_size, ReportForm};

use super::{FormError, Notification};

/// Validate the form and attachments, then submit. Attachments switch the request
/// to multipart encoding; without them the report is sent as JSON.
pub async fn submit_report(
    client: &ApiClient,
    form: &ReportForm,
    media: Vec<MediaUpload>,
) -> Result<Incident, FormError> {
    form.validate()?;
    for upload in &media {
        validate_media_size(&upload.file_name, upload.size()).map_err(FormError::Media)?;
    }

    let incident = client
        .create_incident_with_media(&form.to_new_incident(), media)
        .await?;
    tracing::info!(id = incident.id, category = %incident.category, "Incident reported");
    Ok(incident)
}

/// Toast for the outcome of [`submit_report`].
pub fn report_notification(result: &Result<Incident, FormError>) -> Notification {
    match result {
        Ok(_) => Notification::success(
            "Incident Reported Successfully",
            "Emergency services have been notified and will respond accordingly.",
        ),
        Err(FormError::Invalid(errors)) => {
            Notification::error("Please fix the highlighted fields", errors.to_string())
        }
        Err(FormError::Media(message)) => Notification::error("File Too Large", message.clone()),
        Err(FormError::Client(e)) => Notification::error(
            "Error Reporting Incident",
            format!(
                "{}. Please try again or contact emergency services directly.",
                e
            ),
        ),
    }
}
