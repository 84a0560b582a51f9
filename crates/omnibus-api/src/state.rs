//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use omnibus_chat::ChatLoop;
use omnibus_core::config::OmnibusConfig;
use omnibus_gateway::SessionGateway;

/// Shared application state.
///
/// The chat loop sits behind an async mutex, so questions are answered one
/// at a time in arrival order.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<OmnibusConfig>,
    /// The single process-wide conversation.
    pub chat: Arc<Mutex<ChatLoop>>,
    /// Live session, when running against the real services.
    pub gateway: Option<Arc<SessionGateway>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: OmnibusConfig, chat: ChatLoop) -> Self {
        Self {
            config: Arc::new(config),
            chat: Arc::new(Mutex::new(chat)),
            gateway: None,
            start_time: Instant::now(),
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<SessionGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }
}
