//! HTTP API
//!
//! Stateless handlers over a shared, read-only [`AppState`].

pub mod handlers;
pub mod server;
pub mod types;

use std::sync::Arc;

use crate::bitcoin::{Broadcaster, EsploraBroadcaster};
use crate::config::RecoveryConfig;
use crate::error::RecoveryError;
use crate::recovery::{RecoveryAnalyzer, RecoveryConstants};
use crate::upstream::{RpcClient, UtxoSource};

/// Shared by all requests. Holds no recovery state.
pub struct AppState {
    pub config: RecoveryConfig,
    pub source: Arc<dyn UtxoSource>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub analyzer: RecoveryAnalyzer,
}

impl AppState {
    pub fn from_config(config: RecoveryConfig) -> Result<Self, RecoveryError> {
        let source = Arc::new(RpcClient::new(&config)?);
        let broadcaster = Arc::new(EsploraBroadcaster::new(
            &config.broadcast_url,
            config.request_timeout,
        )?);

        Ok(Self {
            config,
            source,
            broadcaster,
            analyzer: RecoveryAnalyzer::new(RecoveryConstants::default()),
        })
    }
}
