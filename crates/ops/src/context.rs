//! Operations context for dependency injection

use crate::pattern::DeprecatedRevisionMatcher;
use migsweep_config::{CleanupConfig, Config};
use migsweep_errors::{Error, OpsError};
use migsweep_events::{EventEmitter, EventSender};
use migsweep_repository::HostingClient;
use std::sync::Arc;

/// Operations context providing access to the hosting client, configuration
/// and event channel
pub struct OpsCtx {
    /// Hosting service client
    pub host: Arc<dyn HostingClient>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Run configuration
    pub config: Config,
    /// Matcher compiled from `config.cleanup`
    pub matcher: DeprecatedRevisionMatcher,
}

impl OpsCtx {
    #[must_use]
    pub fn cleanup(&self) -> &CleanupConfig {
        &self.config.cleanup
    }

    #[must_use]
    pub fn host(&self) -> &dyn HostingClient {
        self.host.as_ref()
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    host: Option<Arc<dyn HostingClient>>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set hosting client
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostingClient>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if a required component is missing, the configuration
    /// is invalid, or the cleanup configuration does not yield a valid matcher.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let host = self.host.ok_or_else(|| OpsError::MissingComponent {
            component: "host".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;

        // Overrides applied after loading are checked here as well
        config.validate()?;
        let matcher = DeprecatedRevisionMatcher::new(&config.cleanup)?;

        Ok(OpsCtx {
            host,
            tx,
            config,
            matcher,
        })
    }
}
