//! Engine configuration structures and loaders.
use std::env;
use std::time::Duration;

use game_core::Cadence;

/// Configuration shared by the dispatcher and the runners it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Time between two catalog polls.
    pub poll_interval: Duration,
    /// How long `stop` waits for a runner task before finalizing anyway.
    pub stop_timeout: Duration,
    /// Upper bound for a single catalog call.
    pub status_write_timeout: Duration,
    pub command_buffer_size: usize,
    /// Capacity of each broadcast group channel.
    pub event_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            status_write_timeout: Duration::from_secs(2),
            command_buffer_size: 64,
            event_buffer_size: 256,
        }
    }
}

impl EngineConfig {
    /// Construct configuration from process environment variables.
    ///
    /// - `ENGINE_POLL_SECONDS`
    /// - `ENGINE_STOP_TIMEOUT_SECS`
    /// - `ENGINE_STATUS_WRITE_TIMEOUT_SECS`
    /// - `ENGINE_COMMAND_BUFFER`
    /// - `ENGINE_EVENT_BUFFER`
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(interval) = read_secs("ENGINE_POLL_SECONDS") {
            config.poll_interval = interval;
        }

        if let Some(timeout) = read_secs("ENGINE_STOP_TIMEOUT_SECS") {
            config.stop_timeout = timeout;
        }

        if let Some(timeout) = read_secs("ENGINE_STATUS_WRITE_TIMEOUT_SECS") {
            config.status_write_timeout = timeout;
        }

        if let Some(capacity) = read_env::<usize>("ENGINE_COMMAND_BUFFER") {
            config.command_buffer_size = capacity.max(1);
        }

        if let Some(capacity) = read_env::<usize>("ENGINE_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        config
    }

    /// Runner settings for a session ticking at `cadence`.
    pub fn runner_config(&self, cadence: Cadence) -> RunnerConfig {
        RunnerConfig {
            cadence,
            stop_timeout: self.stop_timeout,
            status_write_timeout: self.status_write_timeout,
        }
    }
}

/// Per-session runner settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunnerConfig {
    pub cadence: Cadence,
    pub stop_timeout: Duration,
    pub status_write_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        EngineConfig::default().runner_config(Cadence::default())
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}

fn read_secs(key: &str) -> Option<Duration> {
    let secs = read_env::<f64>(key)?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|duration| !duration.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.stop_timeout, Duration::from_secs(5));

        let runner = config.runner_config(Cadence::default());
        assert_eq!(runner.status_write_timeout, Duration::from_secs(2));
    }

    #[test]
    fn unset_variables_keep_defaults() {
        assert_eq!(read_secs("ENGINE_TEST_UNSET_VARIABLE"), None);
        assert_eq!(read_env::<usize>("ENGINE_TEST_UNSET_VARIABLE"), None);
    }
}
