use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::feed::FeedHub;

#[derive(Clone)]
pub struct GatewayState {
    pub hub: FeedHub,
    pub instance_id: String,
    /// Ends open SSE streams on shutdown
    pub cancel: CancellationToken,
}

impl GatewayState {
    pub fn new(config: &AppConfig, hub: FeedHub, cancel: CancellationToken) -> Self {
        Self {
            hub,
            cancel,
            instance_id: config.server.instance_id.clone(),
        }
    }
}
