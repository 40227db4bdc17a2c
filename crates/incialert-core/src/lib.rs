//! Inci-Alert Core Library
//!
//! This crate provides the domain models, the incident-to-alert adapter, alert list
//! filtering, form validation and client configuration shared by the API client and
//! the terminal dashboard.

pub mod adapter;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use adapter::{alert_status, alert_type, to_alert, to_alerts};
pub use config::ClientConfig;
pub use error::{ConfigError, ValidationErrors};
pub use filter::{AlertFilter, AlertTypeCounts, TypeFilter};
pub use models::{
    Alert, AlertMedia, AlertStatus, AlertType, Incident, IncidentStatus, MediaFile, User,
};
