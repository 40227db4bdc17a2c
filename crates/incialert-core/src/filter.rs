//! Live-alerts list filtering, per-type counts and "new" markers.

use std::collections::HashSet;
use std::str::FromStr;

use crate::models::{Alert, AlertType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    #[default]
    All,
    Only(AlertType),
}

impl TypeFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => alert.alert_type == *t,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(TypeFilter::All);
        }
        AlertType::parse(s).map(TypeFilter::Only).ok_or_else(|| {
            format!(
                "Invalid alert type '{}'. Must be: all, critical, warning, info, or success",
                s
            )
        })
    }
}

/// Type selector plus free-text search, as on the live-alerts screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    pub type_filter: TypeFilter,
    pub search: String,
}

impl AlertFilter {
    pub fn new(type_filter: TypeFilter, search: impl Into<String>) -> Self {
        Self {
            type_filter,
            search: search.into(),
        }
    }

    /// Case-insensitive substring match over title, location and description.
    pub fn matches(&self, alert: &Alert) -> bool {
        if !self.type_filter.matches(alert) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        alert.title.to_lowercase().contains(&needle)
            || alert.location.to_lowercase().contains(&needle)
            || alert
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }

    pub fn apply<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| self.matches(a)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertTypeCounts {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub success: usize,
}

impl AlertTypeCounts {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let mut counts = Self {
            total: alerts.len(),
            ..Self::default()
        };
        for alert in alerts {
            match alert.alert_type {
                AlertType::Critical => counts.critical += 1,
                AlertType::Warning => counts.warning += 1,
                AlertType::Info => counts.info += 1,
                AlertType::Success => counts.success += 1,
            }
        }
        counts
    }

    pub fn get(&self, alert_type: AlertType) -> usize {
        match alert_type {
            AlertType::Critical => self.critical,
            AlertType::Warning => self.warning,
            AlertType::Info => self.info,
            AlertType::Success => self.success,
        }
    }
}

/// Ids present in `current` but absent from `previous`.
pub fn new_alert_ids(previous: &[Alert], current: &[Alert]) -> HashSet<String> {
    let seen: HashSet<&str> = previous.iter().map(|a| a.id.as_str()).collect();
    current
        .iter()
        .filter(|a| !seen.contains(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect()
}
