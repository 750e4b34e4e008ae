//! Log sink setup with per-category runtime toggles

use parking_lot::Mutex;
use sp0256_core::{LogCategory, TARGET_SYSTEM};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

use crate::LogConfig;

/// Live handle on the installed filter
pub struct LogHandle {
    config: Mutex<LogConfig>,
    reload: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber
///
/// `RUST_LOG`, if set, is appended to the category directives. Installing
/// twice keeps the first subscriber; the returned handle then has no effect.
pub fn init_logging(config: LogConfig) -> LogHandle {
    let (filter, reload) = reload::Layer::new(build_filter(&config));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(target: TARGET_SYSTEM, directives = %config.directives(), "logging initialized");
    }

    LogHandle {
        config: Mutex::new(config),
        reload,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let mut directives = config.directives();
    if let Ok(extra) = std::env::var(EnvFilter::DEFAULT_ENV) {
        if !extra.trim().is_empty() {
            directives.push(',');
            directives.push_str(extra.trim());
        }
    }
    EnvFilter::new(directives)
}

impl LogHandle {
    pub fn config(&self) -> LogConfig {
        *self.config.lock()
    }

    /// Flip a category; returns whether it is now enabled
    pub fn toggle(&self, category: LogCategory) -> bool {
        let (enabled, config) = {
            let mut config = self.config.lock();
            (config.toggle(category), *config)
        };
        self.apply(&config);
        enabled
    }

    /// Flip verbose mode; returns the new state
    pub fn toggle_verbose(&self) -> bool {
        let config = {
            let mut config = self.config.lock();
            config.verbose = !config.verbose;
            *config
        };
        self.apply(&config);
        config.verbose
    }

    fn apply(&self, config: &LogConfig) {
        if let Err(e) = self.reload.reload(build_filter(config)) {
            tracing::warn!(target: TARGET_SYSTEM, "log filter not updated: {}", e);
        }
    }
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("config", &self.config())
            .finish()
    }
}
