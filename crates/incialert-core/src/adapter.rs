//! Incident -> Alert mapping for the live-alerts view.
//!
//! Pure functions. The category table is a literal enumeration: categories not
//! listed (including several the report form offers) fall through to `Info`.

use crate::models::{Alert, AlertMedia, AlertStatus, AlertType, Incident, IncidentStatus};

const CRITICAL_CATEGORIES: &[&str] = &["fire", "medical", "crime", "hazmat"];
const WARNING_CATEGORIES: &[&str] = &["accident", "natural_disaster", "security"];

/// Finished incidents are `Success` whatever their category.
pub fn alert_type(category: &str, status: IncidentStatus) -> AlertType {
    if status.is_finished() {
        AlertType::Success
    } else if CRITICAL_CATEGORIES.contains(&category) {
        AlertType::Critical
    } else if WARNING_CATEGORIES.contains(&category) {
        AlertType::Warning
    } else {
        AlertType::Info
    }
}

pub fn alert_status(status: IncidentStatus) -> AlertStatus {
    match status {
        IncidentStatus::Reported => AlertStatus::Active,
        IncidentStatus::Confirmed => AlertStatus::Investigating,
        _ => AlertStatus::Resolved,
    }
}

pub fn to_alert(incident: &Incident) -> Alert {
    let timestamp = incident
        .published_at
        .as_ref()
        .or(incident.created_at.as_ref())
        .cloned()
        .unwrap_or_default();

    let description = Some(incident.description.clone()).filter(|d| !d.is_empty());

    let media = if incident.media.is_empty() {
        None
    } else {
        Some(
            incident
                .media
                .iter()
                .map(|m| AlertMedia {
                    id: m.id,
                    media_type: m.media_type.clone(),
                    thumbnail_url: m.thumbnail_url.clone(),
                    file_url: m.file_url.clone(),
                    mime_type: m.mime_type.clone(),
                })
                .collect(),
        )
    };

    Alert {
        id: incident.id.to_string(),
        title: incident.title.clone(),
        alert_type: alert_type(&incident.category, incident.status),
        location: incident.location.clone(),
        timestamp,
        description,
        status: Some(alert_status(incident.status)),
        media,
    }
}

pub fn to_alerts(incidents: &[Incident]) -> Vec<Alert> {
    incidents.iter().map(to_alert).collect()
}
