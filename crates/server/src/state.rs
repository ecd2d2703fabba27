//! Application State
//!
//! Shared state across all handlers.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

use lead_scoring_config::{load_settings, Settings};
use lead_scoring_core::{Clock, ConversationStore, LeadStore, SystemClock};
use lead_scoring_engine::{ScoringEngine, ScoringService};
use lead_scoring_persistence::{InMemoryConversationStore, InMemoryLeadStore};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for hot-reload support
    pub config: Arc<RwLock<Settings>>,
    pub scoring: Arc<ScoringService>,
    /// Flipped to `true` on shutdown; running batches stop between leads
    shutdown: watch::Sender<bool>,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    /// In-memory stores and the system clock
    pub fn new(config: Settings, engine: Arc<ScoringEngine>) -> Self {
        Self::with_stores(
            config,
            engine,
            Arc::new(InMemoryLeadStore::new()),
            Arc::new(InMemoryConversationStore::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_stores(
        config: Settings,
        engine: Arc<ScoringEngine>,
        leads: Arc<dyn LeadStore>,
        conversations: Arc<dyn ConversationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let scoring = ScoringService::new(leads, conversations, clock, engine, config.engine.clone());
        let (shutdown, _) = watch::channel(false);
        Self {
            config: Arc::new(RwLock::new(config)),
            scoring: Arc::new(scoring),
            shutdown,
            env: None,
        }
    }

    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Reload settings from files. Engine limits are fixed at startup.
    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| format!("Failed to reload config: {}", e))?;

        let mut config = self.config.write();
        *config = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }

    pub fn get_config(&self) -> parking_lot::RwLockReadGuard<'_, Settings> {
        self.config.read()
    }

    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Signal running batches to stop
    pub fn begin_shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
