//! Live alerts: a polled, filterable list of incidents shown as alerts.
//!
//! The poller fetches once immediately, then unconditionally every interval.
//! Each fetch runs as its own task, so a slow request can overlap the next tick
//! and whichever response lands last wins. A failed fetch keeps whatever alerts
//! were already shown and raises one notification. Stopping the poller stops the
//! timer only; fetches already in flight still complete.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use incialert_api_client::IncidentSource;
use incialert_core::filter::new_alert_ids;
use incialert_core::models::{Alert, Incident, IncidentQuery};
use incialert_core::{to_alerts, AlertFilter, AlertTypeCounts};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Notification;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    /// First fetch in flight, nothing to show yet.
    Loading,
    /// Data present; a background refresh may be running.
    Ready,
    /// The most recent fetch failed. Earlier alerts, if any, are still shown.
    Error,
}

/// Snapshot of the live-alerts screen.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    pub phase: FeedPhase,
    pub alerts: Vec<Alert>,
    /// Alerts that appeared in the latest refresh and were absent before it.
    pub new_ids: HashSet<String>,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    loaded_once: bool,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self {
            phase: FeedPhase::Loading,
            alerts: Vec::new(),
            new_ids: HashSet::new(),
            last_error: None,
            last_updated: None,
            loaded_once: false,
        }
    }
}

impl AlertFeed {
    pub fn apply_success(&mut self, incidents: &[Incident], now: DateTime<Utc>) {
        let alerts = to_alerts(incidents);
        self.new_ids = if self.loaded_once {
            new_alert_ids(&self.alerts, &alerts)
        } else {
            HashSet::new()
        };
        self.alerts = alerts;
        self.phase = FeedPhase::Ready;
        self.last_error = None;
        self.last_updated = Some(now);
        self.loaded_once = true;
    }

    pub fn apply_failure(&mut self, message: impl Into<String>) {
        self.phase = FeedPhase::Error;
        self.last_error = Some(message.into());
        self.new_ids.clear();
    }

    pub fn is_new(&self, alert: &Alert) -> bool {
        self.new_ids.contains(&alert.id)
    }

    pub fn counts(&self) -> AlertTypeCounts {
        AlertTypeCounts::from_alerts(&self.alerts)
    }

    pub fn visible(&self, filter: &AlertFilter) -> Vec<&Alert> {
        filter.apply(&self.alerts)
    }
}

/// Single fetch with no timer. A failure yields an empty `Error` feed and its notification.
pub async fn load_alerts_once(
    source: &dyn IncidentSource,
    query: &IncidentQuery,
) -> (AlertFeed, Option<Notification>) {
    let mut feed = AlertFeed::default();
    match source.fetch_incidents(query).await {
        Ok(incidents) => {
            feed.apply_success(&incidents, Utc::now());
            (feed, None)
        }
        Err(e) => {
            let message = e.to_string();
            tracing::warn!(error = %message, "Loading alerts failed");
            feed.apply_failure(message.clone());
            (feed, Some(Notification::error("Failed to load alerts", message)))
        }
    }
}

/// Configuration for a polling session; [`spawn`](Self::spawn) starts it.
pub struct LiveAlertsPoller {
    source: Arc<dyn IncidentSource>,
    query: IncidentQuery,
    interval: Duration,
}

impl LiveAlertsPoller {
    pub fn new(source: Arc<dyn IncidentSource>, interval: Duration) -> Self {
        Self {
            source,
            query: IncidentQuery::default(),
            interval,
        }
    }

    pub fn with_query(mut self, query: IncidentQuery) -> Self {
        self.query = query;
        self
    }

    /// Start the timer on the current tokio runtime.
    pub fn spawn(self) -> LiveAlertsHandle {
        let (feed_tx, feed_rx) = watch::channel(AlertFeed::default());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<()>();

        let feed_tx = Arc::new(feed_tx);
        let source = self.source;
        let query = Arc::new(self.query);
        let interval = self.interval;

        let timer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    msg = refresh_rx.recv() => {
                        if msg.is_none() {
                            break;
                        }
                    }
                }
                spawn_fetch(
                    Arc::clone(&source),
                    Arc::clone(&query),
                    Arc::clone(&feed_tx),
                    notify_tx.clone(),
                );
            }
        });

        LiveAlertsHandle {
            feed: feed_rx,
            notifications: Some(notify_rx),
            refresh_tx,
            timer,
        }
    }
}

fn spawn_fetch(
    source: Arc<dyn IncidentSource>,
    query: Arc<IncidentQuery>,
    feed: Arc<watch::Sender<AlertFeed>>,
    notify: mpsc::UnboundedSender<Notification>,
) {
    tokio::spawn(async move {
        match source.fetch_incidents(&query).await {
            Ok(incidents) => {
                tracing::debug!(count = incidents.len(), "Live alerts refreshed");
                feed.send_modify(|f| f.apply_success(&incidents, Utc::now()));
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Live alerts refresh failed");
                feed.send_modify(|f| f.apply_failure(message.clone()));
                // Receiver gone means nobody is watching anymore.
                let _ = notify.send(Notification::error("Failed to load alerts", message));
            }
        }
    });
}

/// Running poller. Dropping it stops the timer.
pub struct LiveAlertsHandle {
    feed: watch::Receiver<AlertFeed>,
    notifications: Option<mpsc::UnboundedReceiver<Notification>>,
    refresh_tx: mpsc::UnboundedSender<()>,
    timer: JoinHandle<()>,
}

impl LiveAlertsHandle {
    /// Current snapshot.
    pub fn feed(&self) -> AlertFeed {
        self.feed.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertFeed> {
        self.feed.clone()
    }

    /// The notification stream; yields one item per failed fetch. Can be taken once.
    pub fn take_notifications(&mut self) -> Option<mpsc::UnboundedReceiver<Notification>> {
        self.notifications.take()
    }

    /// Fetch now, outside the regular schedule.
    pub fn refresh(&self) {
        if self.refresh_tx.send(()).is_err() {
            tracing::debug!("Refresh requested after the poller stopped");
        }
    }

    pub fn stop(&self) {
        self.timer.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.timer.is_finished()
    }
}

impl Drop for LiveAlertsHandle {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use incialert_api_client::{ClientError, ClientResult};
    use incialert_core::models::{AlertType, IncidentStatus};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    const NEVER: Duration = Duration::from_secs(3600);
    const WAIT: Duration = Duration::from_secs(5);

    /// Answers fetches from a script, then with empty lists.
    struct ScriptedSource {
        script: Mutex<VecDeque<ClientResult<Vec<Incident>>>>,
        calls: Mutex<Vec<IncidentQuery>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<ClientResult<Vec<Incident>>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl IncidentSource for ScriptedSource {
        async fn fetch_incidents(&self, query: &IncidentQuery) -> ClientResult<Vec<Incident>> {
            self.calls.lock().unwrap().push(query.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// The first fetch blocks until `gate` is opened, then returns `slow`.
    /// Later fetches answer immediately from `fast`.
    struct GatedSource {
        gate: Notify,
        slow: Mutex<Vec<Incident>>,
        fast: Mutex<VecDeque<Vec<Incident>>>,
        calls: AtomicUsize,
    }

    impl GatedSource {
        fn new(slow: Vec<Incident>, fast: Vec<Vec<Incident>>) -> Arc<Self> {
            Arc::new(Self {
                gate: Notify::new(),
                slow: Mutex::new(slow),
                fast: Mutex::new(fast.into()),
                calls: AtomicUsize::new(0),
            })
        }

        async fn wait_for_calls(&self, n: usize) {
            tokio::time::timeout(WAIT, async {
                while self.calls.load(Ordering::SeqCst) < n {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("source was not called");
        }
    }

    #[async_trait]
    impl IncidentSource for GatedSource {
        async fn fetch_incidents(&self, _query: &IncidentQuery) -> ClientResult<Vec<Incident>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
                let slow = std::mem::take(&mut *self.slow.lock().unwrap());
                return Ok(slow);
            }
            Ok(self.fast.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn incident(id: i64, category: &str, status: IncidentStatus) -> Incident {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Incident {}", id),
            "category": category,
            "location": "Dock",
            "status": status,
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap()
    }

    fn unavailable() -> ClientError {
        ClientError::Api {
            status: 503,
            message: "HTTP 503".into(),
        }
    }

    async fn wait_for_phase(rx: &mut watch::Receiver<AlertFeed>, phase: FeedPhase) -> AlertFeed {
        tokio::time::timeout(WAIT, rx.wait_for(|f| f.phase == phase))
            .await
            .expect("feed did not reach expected phase")
            .expect("poller dropped")
            .clone()
    }

    #[test]
    fn feed_starts_loading_and_keeps_data_on_failure() {
        let mut feed = AlertFeed::default();
        assert_eq!(feed.phase, FeedPhase::Loading);

        let incidents = vec![
            incident(1, "fire", IncidentStatus::Reported),
            incident(2, "accident", IncidentStatus::Confirmed),
        ];
        feed.apply_success(&incidents, Utc::now());
        assert_eq!(feed.phase, FeedPhase::Ready);
        assert!(feed.new_ids.is_empty());

        feed.apply_failure("HTTP 503");
        assert_eq!(feed.phase, FeedPhase::Error);
        assert_eq!(feed.alerts.len(), 2);
        assert_eq!(feed.last_error.as_deref(), Some("HTTP 503"));
        assert!(feed.last_updated.is_some());
    }

    #[test]
    fn feed_marks_alerts_new_after_first_load() {
        let mut feed = AlertFeed::default();
        feed.apply_success(&[incident(1, "fire", IncidentStatus::Reported)], Utc::now());
        feed.apply_success(
            &[
                incident(2, "medical", IncidentStatus::Reported),
                incident(1, "fire", IncidentStatus::Reported),
            ],
            Utc::now(),
        );
        assert!(feed.is_new(&feed.alerts[0]));
        assert!(!feed.is_new(&feed.alerts[1]));
        assert_eq!(feed.counts().get(AlertType::Critical), 2);
    }

    #[tokio::test]
    async fn one_shot_load_failure_gives_empty_error_feed() {
        let source = ScriptedSource::new(vec![Err(unavailable())]);
        let (feed, note) = load_alerts_once(&*source, &IncidentQuery::default()).await;
        assert_eq!(feed.phase, FeedPhase::Error);
        assert!(feed.alerts.is_empty());
        let note = note.unwrap();
        assert_eq!(note.title, "Failed to load alerts");
        assert_eq!(note.description, "HTTP 503");
    }

    #[tokio::test]
    async fn one_shot_load_success() {
        let source = ScriptedSource::new(vec![Ok(vec![incident(
            5,
            "fire",
            IncidentStatus::Reported,
        )])]);
        let (feed, note) = load_alerts_once(&*source, &IncidentQuery::default()).await;
        assert!(note.is_none());
        assert_eq!(feed.phase, FeedPhase::Ready);
        assert_eq!(feed.alerts[0].id, "5");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_alerts() {
        let source = ScriptedSource::new(vec![
            Ok(vec![
                incident(1, "fire", IncidentStatus::Reported),
                incident(2, "medical", IncidentStatus::Resolved),
                incident(3, "other", IncidentStatus::Confirmed),
            ]),
            Err(unavailable()),
        ]);
        let mut handle = LiveAlertsPoller::new(source.clone(), NEVER).spawn();
        let mut notifications = handle.take_notifications().unwrap();
        let mut rx = handle.subscribe();

        let ready = wait_for_phase(&mut rx, FeedPhase::Ready).await;
        assert_eq!(ready.alerts.len(), 3);

        handle.refresh();
        let failed = wait_for_phase(&mut rx, FeedPhase::Error).await;
        assert_eq!(failed.alerts.len(), 3);
        assert_eq!(failed.last_error.as_deref(), Some("HTTP 503"));

        let note = tokio::time::timeout(WAIT, notifications.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(note.description, "HTTP 503");
        assert!(notifications.try_recv().is_err());

        assert_eq!(source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn initial_failure_then_recovery() {
        let source = ScriptedSource::new(vec![
            Err(unavailable()),
            Ok(vec![incident(9, "crime", IncidentStatus::Reported)]),
        ]);
        let handle = LiveAlertsPoller::new(source, NEVER).spawn();
        let mut rx = handle.subscribe();

        let failed = wait_for_phase(&mut rx, FeedPhase::Error).await;
        assert!(failed.alerts.is_empty());

        handle.refresh();
        let ready = wait_for_phase(&mut rx, FeedPhase::Ready).await;
        assert_eq!(ready.alerts[0].id, "9");
        assert!(ready.last_error.is_none());
        // First data ever loaded is not flagged as new.
        assert!(ready.new_ids.is_empty());
    }

    #[tokio::test]
    async fn passes_query_to_source() {
        let source = ScriptedSource::new(vec![Ok(vec![])]);
        let query = IncidentQuery {
            source: Some("news".into()),
            limit: Some(20),
            ..Default::default()
        };
        let handle = LiveAlertsPoller::new(source.clone(), NEVER)
            .with_query(query.clone())
            .spawn();
        let mut rx = handle.subscribe();
        wait_for_phase(&mut rx, FeedPhase::Ready).await;
        assert_eq!(source.calls.lock().unwrap()[0], query);
    }

    #[tokio::test]
    async fn interval_triggers_repeated_fetches() {
        let source = ScriptedSource::new(vec![]);
        let handle = LiveAlertsPoller::new(source.clone(), Duration::from_millis(20)).spawn();
        tokio::time::timeout(WAIT, async {
            while source.calls.lock().unwrap().len() < 3 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("poller did not tick");

        handle.stop();
        tokio::time::timeout(WAIT, async {
            while !handle.is_stopped() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        // Let a fetch spawned by the last tick start before counting.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls = source.calls.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(source.calls.lock().unwrap().len(), calls);
    }

    async fn wait_for_first_id(rx: &mut watch::Receiver<AlertFeed>, id: &str) -> AlertFeed {
        tokio::time::timeout(
            WAIT,
            rx.wait_for(|f| f.alerts.first().is_some_and(|a| a.id == id)),
        )
        .await
        .expect("feed never showed the expected alert")
        .expect("poller dropped")
        .clone()
    }

    #[tokio::test]
    async fn slower_overlapping_fetch_lands_last_and_wins() {
        let source = GatedSource::new(
            vec![incident(1, "fire", IncidentStatus::Reported)],
            vec![vec![incident(2, "medical", IncidentStatus::Reported)]],
        );
        let handle = LiveAlertsPoller::new(source.clone(), NEVER).spawn();
        let mut rx = handle.subscribe();

        // Initial fetch is parked; a manual refresh overtakes it.
        source.wait_for_calls(1).await;
        handle.refresh();
        let overtaken = wait_for_first_id(&mut rx, "2").await;
        assert_eq!(overtaken.alerts.len(), 1);

        source.gate.notify_one();
        let landed = wait_for_first_id(&mut rx, "1").await;
        assert_eq!(landed.alerts.len(), 1);
        assert_eq!(landed.phase, FeedPhase::Ready);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stopping_does_not_cancel_fetch_in_flight() {
        let source = GatedSource::new(
            vec![incident(4, "hazmat", IncidentStatus::Confirmed)],
            Vec::new(),
        );
        let handle = LiveAlertsPoller::new(source.clone(), Duration::from_millis(20)).spawn();
        let mut rx = handle.subscribe();

        source.wait_for_calls(1).await;
        handle.stop();
        drop(handle);
        // Ticks that fired before the stop may have spawned more fetches.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let calls = source.calls.load(Ordering::SeqCst);

        source.gate.notify_one();
        let feed = wait_for_first_id(&mut rx, "4").await;
        assert_eq!(feed.phase, FeedPhase::Ready);
        assert_eq!(feed.alerts[0].alert_type, AlertType::Critical);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }
}
