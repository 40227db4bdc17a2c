//! Statistics screen: four independent panels loaded concurrently.

use incialert_api_client::ApiClient;
use incialert_core::models::{
    CategoryStats, LocationStats, OverviewStats, TimelinePeriod, TimelineStats,
};

use super::Notification;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsRequest {
    pub days: Option<u32>,
    pub period: TimelinePeriod,
    pub category: Option<String>,
}

/// A panel that failed to load is `None` and contributes one notification.
#[derive(Debug, Clone, Default)]
pub struct StatisticsDashboard {
    pub overview: Option<OverviewStats>,
    pub categories: Option<CategoryStats>,
    pub locations: Option<LocationStats>,
    pub timeline: Option<TimelineStats>,
    pub notifications: Vec<Notification>,
}

impl StatisticsDashboard {
    pub async fn load(client: &ApiClient, request: &StatsRequest) -> Self {
        let (overview, categories, locations, timeline) = tokio::join!(
            client.get_overview_stats(),
            client.get_category_stats(request.days),
            client.get_location_stats(),
            client.get_timeline_stats(request.period, request.category.as_deref()),
        );

        let mut dashboard = Self::default();
        dashboard.overview = dashboard.keep("overview", overview);
        dashboard.categories = dashboard.keep("category", categories);
        dashboard.locations = dashboard.keep("location", locations);
        dashboard.timeline = dashboard.keep("timeline", timeline);
        dashboard
    }

    fn keep<T, E: std::fmt::Display>(&mut self, panel: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(panel, error = %e, "Failed to load statistics");
                self.notifications.push(Notification::error(
                    format!("Failed to load {} statistics", panel),
                    e.to_string(),
                ));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overview.is_none()
            && self.categories.is_none()
            && self.locations.is_none()
            && self.timeline.is_none()
    }
}
