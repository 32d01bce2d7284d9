//! Core service façade and bootstrap helpers.
//!
//! This crate is the composition root for the playback core. The host builds
//! a [`CoreConfig`] around its native audio engine, calls
//! [`CoreService::bootstrap`] once at startup and keeps the returned service
//! for the lifetime of the application. Every UI surface talks to the same
//! [`PlaybackEngine`] through [`CoreService::playback`].
//!
//! ```ignore
//! use core_service::{CoreConfig, CoreService, EngineConfig};
//!
//! let config = CoreConfig::builder()
//!     .player(Arc::new(NativePlayer::new()))
//!     .logging(LoggingConfig::default())
//!     .build()?;
//!
//! let core = CoreService::bootstrap(config, EngineConfig::default())?;
//! core.playback().init_playlist_from(tracks).await;
//! ```

pub mod error;

pub use core_playback::{EngineConfig, PlaybackEngine};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder};
pub use core_runtime::logging::{LogFormat, LoggingConfig};
pub use error::{CoreError, Result};

use core_runtime::logging::init_logging;
use tracing::info;

/// Primary façade exposed to host applications.
#[derive(Clone, Debug)]
pub struct CoreService {
    playback: PlaybackEngine,
}

impl CoreService {
    /// Build and configure the playback engine.
    ///
    /// Must be called from within a Tokio runtime. Installs the global
    /// `tracing` subscriber when `config.logging` is set.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InitializationFailed`] outside a Tokio runtime
    /// - [`CoreError::Runtime`] if logging cannot be installed
    /// - [`CoreError::Playback`] if `engine_config` is invalid or no runtime
    ///   is available
    pub fn bootstrap(config: CoreConfig, engine_config: EngineConfig) -> Result<Self> {
        // Checked before logging so a failed call leaves no global state.
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(CoreError::InitializationFailed(
                "CoreService::bootstrap must run inside a Tokio runtime".to_string(),
            ));
        }

        if let Some(logging) = config.logging {
            init_logging(logging)?;
        }

        let playback = PlaybackEngine::new(config.player, engine_config)?;
        playback.configure()?;

        info!("Core service started");
        Ok(Self { playback })
    }

    /// The process-wide playback engine.
    pub fn playback(&self) -> &PlaybackEngine {
        &self.playback
    }

    /// Dispose the playback engine. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.playback.dispose().await;
        info!("Core service stopped");
    }
}
