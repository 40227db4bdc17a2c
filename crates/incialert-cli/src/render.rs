//! Terminal renderers: stateless formatting of already-shaped data.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use incialert_core::models::{
    parse_timestamp, Alert, AlertType, CategoryStats, Incident, LocationStats, OverviewStats,
    TimelineStats, User,
};
use incialert_core::{AlertTypeCounts, TypeFilter};

use crate::controllers::live_alerts::{AlertFeed, FeedPhase};
use crate::controllers::{Notification, Severity};
use crate::truncate_string;

/// "just now", "5m ago", "3h ago", "2d ago"; the raw value when it cannot be parsed.
pub fn relative_time(timestamp: &str, now: DateTime<Utc>) -> String {
    let Some(at) = parse_timestamp(timestamp) else {
        return timestamp.to_string();
    };
    let minutes = (now - at).num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

pub fn alert_card(alert: &Alert, is_new: bool, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "[{}] {}",
        alert.alert_type.as_str().to_uppercase(),
        alert.title
    );
    if is_new {
        out.push_str("  (NEW)");
    }

    let _ = write!(
        out,
        "\n    {} | {}",
        alert.location,
        relative_time(&alert.timestamp, now)
    );
    if let Some(status) = alert.status {
        let _ = write!(out, " | {}", status);
    }
    if let Some(description) = &alert.description {
        let _ = write!(out, "\n    {}", truncate_string(description, 100));
    }
    if let Some(media) = alert.media.as_ref().filter(|m| !m.is_empty()) {
        let images = media.iter().filter(|m| m.mime_type.starts_with("image/")).count();
        let videos = media.iter().filter(|m| m.mime_type.starts_with("video/")).count();
        let _ = write!(out, "\n    media: {} image(s), {} video(s)", images, videos);
    }
    out
}

/// Filter badge row, e.g. `*All Alerts (5)*  Critical (2)  ...`.
pub fn type_badges(counts: &AlertTypeCounts, selected: TypeFilter) -> String {
    let mut badges = vec![badge("All Alerts", counts.total, selected == TypeFilter::All)];
    for t in AlertType::ALL {
        badges.push(badge(t.label(), counts.get(t), selected == TypeFilter::Only(t)));
    }
    badges.join("  ")
}

fn badge(label: &str, count: usize, selected: bool) -> String {
    if selected {
        format!("*{} ({})*", label, count)
    } else {
        format!("{} ({})", label, count)
    }
}

/// The whole live-alerts screen for one snapshot.
pub fn live_alerts_screen(
    feed: &AlertFeed,
    visible: &[&Alert],
    selected: TypeFilter,
    now: DateTime<Utc>,
) -> String {
    let mut out = String::from("Live Alerts\n");
    match feed.phase {
        FeedPhase::Loading => {
            out.push_str("Loading alerts...\n");
            return out;
        }
        FeedPhase::Ready => {}
        FeedPhase::Error => {
            let _ = writeln!(
                out,
                "! Last refresh failed: {} (showing previous data)",
                feed.last_error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if let Some(updated) = feed.last_updated {
        let _ = writeln!(out, "Updated {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let _ = writeln!(out, "{}\n", type_badges(&feed.counts(), selected));

    if visible.is_empty() {
        out.push_str("No alerts match your current filters\n");
    } else {
        for alert in visible {
            let _ = writeln!(out, "{}\n", alert_card(alert, feed.is_new(alert), now));
        }
    }
    out
}

pub fn incident_table(incidents: &[Incident]) -> String {
    let mut out = format!(
        "{:<6} {:<32} {:<14} {:<10} {:<24}\n",
        "ID", "TITLE", "CATEGORY", "STATUS", "LOCATION"
    );
    for incident in incidents {
        let _ = writeln!(
            out,
            "{:<6} {:<32} {:<14} {:<10} {:<24}",
            incident.id,
            truncate_string(&incident.title, 32),
            truncate_string(&incident.category, 14),
            incident.status.as_str(),
            truncate_string(&incident.location, 24),
        );
    }
    let _ = write!(out, "{} incident(s)", incidents.len());
    out
}

pub fn incident_detail(incident: &Incident) -> String {
    let mut out = format!("#{} {}\n", incident.id, incident.title);
    let _ = writeln!(out, "  category: {}", incident.category);
    let _ = writeln!(out, "  status:   {}", incident.status);
    let _ = writeln!(out, "  location: {}", incident.location);
    if let Some((lat, lng)) = incident.coordinates() {
        let _ = writeln!(out, "  coords:   {:.5}, {:.5}", lat, lng);
    }
    let _ = writeln!(out, "  source:   {}", incident.source);
    if let Some(created) = &incident.created_at {
        let _ = writeln!(out, "  created:  {}", created);
    }
    if !incident.description.is_empty() {
        let _ = writeln!(out, "\n  {}", incident.description);
    }
    for media in &incident.media {
        let _ = writeln!(
            out,
            "  [{}] {} ({} bytes) {}",
            media.media_type, media.original_filename, media.file_size, media.file_url
        );
    }
    out
}

pub fn user_profile(user: &User) -> String {
    let mut out = format!("{} (@{})\n", user.display_name(), user.username);
    let _ = writeln!(out, "  email:    {}", user.email);
    if let Some(phone) = &user.phone {
        let _ = writeln!(out, "  phone:    {}", phone);
    }
    let _ = writeln!(out, "  role:     {}", user.role);
    let _ = writeln!(
        out,
        "  status:   {}{}",
        if user.is_active { "active" } else { "inactive" },
        if user.is_verified { ", verified" } else { "" }
    );
    if let Some(last_login) = &user.last_login {
        let _ = writeln!(out, "  last login: {}", last_login);
    }
    out
}

pub fn overview_panel(stats: &OverviewStats) -> String {
    let mut out = String::from("Overview\n");
    let _ = writeln!(out, "  Total incidents:     {}", stats.total_incidents);
    let _ = writeln!(out, "  Last 24 hours:       {}", stats.recent_incidents_24h);
    let _ = writeln!(
        out,
        "  Resolved:            {}",
        stats.count_for_status("resolved")
    );
    for entry in &stats.category_breakdown {
        let _ = writeln!(out, "  {:<20} {}", entry.category, entry.count);
    }
    out
}

pub fn category_panel(stats: &CategoryStats) -> String {
    let mut out = format!("Categories (last {} days)\n", stats.period_days);
    for c in &stats.categories {
        let _ = writeln!(
            out,
            "  {:<18} total {:>4}  open {:>4}  resolved {:>4}  ({:.1}%)",
            c.category, c.total_count, c.open_count, c.resolved_count, c.resolution_rate
        );
    }
    out
}

pub fn location_panel(stats: &LocationStats) -> String {
    let mut out = String::from("Locations\n");
    for l in &stats.locations {
        let _ = writeln!(out, "  {:<28} {}", truncate_string(&l.location, 28), l.count);
    }
    out
}

pub fn timeline_panel(stats: &TimelineStats) -> String {
    let mut out = match &stats.category {
        Some(category) => format!("Timeline ({}, {})\n", stats.period, category),
        None => format!("Timeline ({})\n", stats.period),
    };
    let peak = stats.timeline.iter().map(|d| d.count).max().unwrap_or(0);
    for point in &stats.timeline {
        let width = if peak == 0 {
            0
        } else {
            (point.count * 40 / peak) as usize
        };
        let _ = writeln!(out, "  {:<12} {:>5} {}", point.date, point.count, "#".repeat(width));
    }
    out
}

pub fn notification(note: &Notification) -> String {
    let marker = match note.severity {
        Severity::Info => "i",
        Severity::Success => "+",
        Severity::Error => "!",
    };
    format!("[{}] {}: {}", marker, note.title, note.description)
}
