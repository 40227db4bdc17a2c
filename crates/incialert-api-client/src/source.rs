//! Where the live-alerts poller gets incidents from.

use async_trait::async_trait;
use incialert_core::models::{Incident, IncidentQuery};

use crate::error::ClientResult;
use crate::ApiClient;

#[async_trait]
pub trait IncidentSource: Send + Sync {
    async fn fetch_incidents(&self, query: &IncidentQuery) -> ClientResult<Vec<Incident>>;
}

#[async_trait]
impl IncidentSource for ApiClient {
    async fn fetch_incidents(&self, query: &IncidentQuery) -> ClientResult<Vec<Incident>> {
        self.get_incidents(query).await
    }
}
