use crate::constants::{MAX_MEDIA_FILE_BYTES, REPORT_CATEGORIES};
use crate::error::ValidationErrors;
use crate::models::NewIncident;

/// Draft of the "report incident" form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportForm {
    pub title: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub coordinates: Option<(f64, f64)>,
}

impl ReportForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "Incident title is required");
        }

        if self.category.is_empty() {
            errors.add("category", "Incident type is required");
        } else if !REPORT_CATEGORIES
            .iter()
            .any(|(value, _)| *value == self.category)
        {
            errors.add("category", format!("Unknown incident type: {}", self.category));
        }

        if self.location.trim().is_empty() {
            errors.add("location", "Location is required");
        }

        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }

        if let Some((lat, lng)) = self.coordinates {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                errors.add("coordinates", "Coordinates are out of range");
            }
        }

        errors.into_result()
    }

    /// Request body for a validated form. Text fields are sent trimmed.
    pub fn to_new_incident(&self) -> NewIncident {
        NewIncident {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.clone(),
            location: self.location.trim().to_string(),
            latitude: self.coordinates.map(|(lat, _)| lat),
            longitude: self.coordinates.map(|(_, lng)| lng),
        }
    }
}

/// Attachments larger than 10 MiB are refused before upload.
pub fn validate_media_size(file_name: &str, size: u64) -> Result<(), String> {
    if size > MAX_MEDIA_FILE_BYTES {
        return Err(format!(
            "File too large: {}. Please select a file smaller than 10MB.",
            file_name
        ));
    }
    Ok(())
}
