//! Event publishers that do not leave the process

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::ports::EventPublisher;

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), OrderError> {
        debug!(event_type = event.event_type(), order_id = %event.order_id(), "Dropping event");
        Ok(())
    }
}

/// Keeps published events for inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<RwLock<Vec<OrderEvent>>>,
    failing: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails after recording the attempt
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub async fn events(&self) -> Vec<OrderEvent> {
        self.events.read().await.clone()
    }

    pub async fn event_types(&self) -> Vec<&'static str> {
        self.events.read().await.iter().map(OrderEvent::event_type).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &OrderEvent) -> Result<(), OrderError> {
        self.events.write().await.push(event.clone());
        if self.failing {
            return Err(OrderError::storage(format!("publisher unavailable for {}", event.subject())));
        }
        Ok(())
    }
}
