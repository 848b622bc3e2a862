use async_trait::async_trait;
use motog_shared::models::events::BoostEvent;

use crate::repository::RepositoryResult;

/// Sink for boost lifecycle events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &BoostEvent) -> RepositoryResult<()>;
}

/// Publisher that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &BoostEvent) -> RepositoryResult<()> {
        tracing::trace!(event_type = event.event_type(), "Dropping boost event");
        Ok(())
    }
}
