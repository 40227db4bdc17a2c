use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

/// `GET /stats/overview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_incidents: u64,
    pub recent_incidents_24h: u64,
    #[serde(default)]
    pub status_breakdown: Vec<StatusCount>,
    #[serde(default)]
    pub category_breakdown: Vec<CategoryCount>,
    #[serde(default)]
    pub weekly_trend: Vec<DateCount>,
}

impl OverviewStats {
    pub fn count_for_status(&self, status: &str) -> u64 {
        self.status_breakdown
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.count)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub category: String,
    pub total_count: u64,
    pub resolved_count: u64,
    pub open_count: u64,
    pub resolution_rate: f64,
}

/// `GET /stats/category?days=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub period_days: u32,
    #[serde(default)]
    pub categories: Vec<CategoryStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStat {
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub location: String,
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_longitude: Option<f64>,
}

/// `GET /stats/location`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    #[serde(default)]
    pub locations: Vec<LocationStat>,
}

/// `GET /stats/timeline?period=&category=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStats {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub timeline: Vec<DateCount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelinePeriod {
    #[default]
    Week,
    Month,
    Year,
}

impl TimelinePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelinePeriod::Week => "week",
            TimelinePeriod::Month => "month",
            TimelinePeriod::Year => "year",
        }
    }
}

impl fmt::Display for TimelinePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimelinePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(TimelinePeriod::Week),
            "month" => Ok(TimelinePeriod::Month),
            "year" => Ok(TimelinePeriod::Year),
            other => Err(format!(
                "Invalid period '{}'. Must be: week, month, or year",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_sums_status_counts() {
        let stats: OverviewStats = serde_json::from_str(
            r#"{
                "total_incidents": 12,
                "recent_incidents_24h": 3,
                "status_breakdown": [
                    {"status": "reported", "count": 5},
                    {"status": "resolved", "count": 7}
                ],
                "category_breakdown": [],
                "weekly_trend": []
            }"#,
        )
        .unwrap();
        assert_eq!(stats.count_for_status("resolved"), 7);
        assert_eq!(stats.count_for_status("closed"), 0);
    }

    #[test]
    fn null_location_and_category_groups_deserialize() {
        let locations: LocationStats = serde_json::from_str(
            r#"{"locations": [{"location": null, "count": 4}, {"location": "Dock", "count": 2}]}"#,
        )
        .unwrap();
        assert_eq!(locations.locations[0].location, "");
        assert_eq!(locations.locations[1].count, 2);

        let overview: OverviewStats = serde_json::from_str(
            r#"{"total_incidents": 4, "recent_incidents_24h": 0,
                "category_breakdown": [{"category": null, "count": 4}]}"#,
        )
        .unwrap();
        assert_eq!(overview.category_breakdown[0].category, "");
    }

    #[test]
    fn timeline_period_parses() {
        assert_eq!("month".parse::<TimelinePeriod>(), Ok(TimelinePeriod::Month));
        assert!("decade".parse::<TimelinePeriod>().is_err());
    }
}
