//! Emulator configuration

use std::path::PathBuf;
use std::time::Duration;

use sp0256_core::{LogCategory, Sp0256Result};
use sp0256_store::WaveformStore;

/// Runtime configuration
#[derive(Clone, Debug)]
pub struct EmulatorConfig {
    /// Minimum spacing between accepted strobe edges
    pub debounce: Duration,
    /// Idle time between strobe polls
    pub poll_interval: Duration,
    /// How long the control surface waits for the real-time thread
    pub startup_timeout: Duration,
    /// PWM carrier frequency
    pub pwm_frequency_hz: u32,
    /// Pending control requests before senders wait
    pub request_capacity: usize,
    /// Ask the OS for SCHED_FIFO and CPU pinning
    pub realtime_isolation: bool,
    pub realtime_priority: i32,
    pub realtime_cpu: Option<usize>,
    /// Compressed container image
    pub container_path: Option<PathBuf>,
    /// Directory of `<id>.raw` files
    pub raw_dir: Option<PathBuf>,
    pub log: LogConfig,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            debounce: Duration::from_millis(1),
            poll_interval: Duration::from_micros(10),
            startup_timeout: Duration::from_secs(5),
            pwm_frequency_hz: 125_000,
            request_capacity: 16,
            realtime_isolation: true,
            realtime_priority: 80,
            realtime_cpu: Some(1),
            container_path: Some(PathBuf::from("allophones.dat")),
            raw_dir: None,
            log: LogConfig::default(),
        }
    }
}

impl EmulatorConfig {
    /// Host simulation: no isolation, no files, short startup timeout
    pub fn simulation() -> Self {
        EmulatorConfig {
            startup_timeout: Duration::from_secs(1),
            realtime_isolation: false,
            realtime_cpu: None,
            container_path: None,
            ..Default::default()
        }
    }

    pub fn debounce_us(&self) -> u64 {
        self.debounce.as_micros() as u64
    }

    /// Build the store from the configured paths
    ///
    /// A missing container is not an error. An unreadable raw directory is.
    pub fn open_store(&self) -> Sp0256Result<WaveformStore> {
        let mut builder = WaveformStore::builder();
        if let Some(path) = &self.container_path {
            builder = builder.container_file(path);
        }
        if let Some(dir) = &self.raw_dir {
            builder = builder.raw_dir(dir)?;
        }
        Ok(builder.build())
    }
}

/// Which log categories are on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub system: bool,
    pub gpio: bool,
    pub audio: bool,
    pub timing: bool,
    pub interface: bool,
    /// Raise enabled categories to TRACE
    pub verbose: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            system: true,
            gpio: true,
            audio: true,
            timing: true,
            interface: true,
            verbose: false,
        }
    }
}

impl LogConfig {
    /// Only system messages
    pub fn quiet() -> Self {
        LogConfig {
            system: true,
            gpio: false,
            audio: false,
            timing: false,
            interface: false,
            verbose: false,
        }
    }

    pub fn is_enabled(&self, category: LogCategory) -> bool {
        *self.flag(category)
    }

    pub fn set(&mut self, category: LogCategory, enabled: bool) {
        *self.flag_mut(category) = enabled;
    }

    /// Flip a category, returning its new state
    pub fn toggle(&mut self, category: LogCategory) -> bool {
        let flag = self.flag_mut(category);
        *flag = !*flag;
        *flag
    }

    /// `EnvFilter` directives for this configuration
    pub fn directives(&self) -> String {
        let level = if self.verbose { "trace" } else { "debug" };
        let mut directives = String::from("warn");
        for category in LogCategory::ALL {
            let level = if self.is_enabled(category) { level } else { "off" };
            directives.push_str(&format!(",{}={}", category.target(), level));
        }
        directives
    }

    fn flag(&self, category: LogCategory) -> &bool {
        match category {
            LogCategory::System => &self.system,
            LogCategory::Gpio => &self.gpio,
            LogCategory::Audio => &self.audio,
            LogCategory::Timing => &self.timing,
            LogCategory::Interface => &self.interface,
        }
    }

    fn flag_mut(&mut self, category: LogCategory) -> &mut bool {
        match category {
            LogCategory::System => &mut self.system,
            LogCategory::Gpio => &mut self.gpio,
            LogCategory::Audio => &mut self.audio,
            LogCategory::Timing => &mut self.timing,
            LogCategory::Interface => &mut self.interface,
        }
    }
}
