//! Domain models
//!
//! Server-owned records (incidents, media, users, stats) as they arrive over the
//! wire, request bodies sent to the API, and the client-side [`Alert`] view-model.

pub mod alert;
pub mod incident;
pub mod media;
pub mod stats;
pub mod user;

use serde::{Deserialize, Deserializer};

pub use alert::{parse_timestamp, Alert, AlertMedia, AlertStatus, AlertType};
pub use incident::{Incident, IncidentQuery, IncidentStatus, IncidentUpdate, NewIncident};
pub use media::MediaFile;
pub use stats::{
    CategoryCount, CategoryStat, CategoryStats, DateCount, LocationStat, LocationStats,
    OverviewStats, StatusCount, TimelinePeriod, TimelineStats,
};
pub use user::{
    AuthResponse, Credentials, ForgotPasswordRequest, MessageResponse, ProfileResponse,
    ProfileUpdate, RegisterRequest, ResetPasswordRequest, User,
};

/// Treat an explicit JSON `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
