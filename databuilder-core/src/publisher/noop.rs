use async_trait::async_trait;
use tracing::info;

use crate::config::ScopedConfig;
use crate::context::RunContext;
use crate::error::{ConfigError, PublishError};
use crate::pipeline::{PublishReport, Publisher};

/// Leaves the loader's output where it is.
#[derive(Debug, Default)]
pub struct NoopPublisher;

impl NoopPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for NoopPublisher {
    fn scope(&self) -> &str {
        "publisher.noop"
    }

    fn init(&mut self, _config: &ScopedConfig, _ctx: &RunContext) -> Result<(), ConfigError> {
        Ok(())
    }

    async fn publish(&mut self) -> Result<PublishReport, PublishError> {
        info!("Nothing to publish");
        Ok(PublishReport::default())
    }
}
