use async_trait::async_trait;
use motog_core::{EventPublisher, RepositoryError, RepositoryResult};
use motog_shared::models::events::BoostEvent;
use tracing::info;

/// Writes boost lifecycle events to the `motog::events` tracing target as JSON
#[derive(Clone, Default)]
pub struct LogEventPublisher;

impl LogEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, event: &BoostEvent) -> RepositoryResult<()> {
        let payload = serde_json::to_string(event).map_err(RepositoryError::backend)?;

        info!(
            target: "motog::events",
            event_type = event.event_type(),
            purchase_id = %event.purchase_id(),
            payload = %payload,
            "boost event"
        );
        Ok(())
    }
}
