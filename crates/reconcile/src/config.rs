//! Runner configuration, read once at startup from `TGRUN_*` env vars.

use std::time::Duration;

/// Image the runner workload executes when no override is configured.
pub const DEFAULT_RUNNER_IMAGE: &str = "ubuntu:22.04";

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default)
}

/// Knobs for the workload the engine creates and for its requeue policy.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Container image for the runner pod.
    pub image: String,
    /// Seconds the placeholder command sleeps after printing the path.
    pub sleep_secs: u64,
    /// Delay before the pass scheduled after a successful workload creation.
    pub requeue: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_RUNNER_IMAGE.to_string(),
            sleep_secs: 3600,
            requeue: Duration::from_secs(60),
        }
    }
}

impl RunnerConfig {
    pub fn from_env() -> Self {
        let image = std::env::var("TGRUN_RUNNER_IMAGE")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_RUNNER_IMAGE.to_string());
        Self {
            image,
            sleep_secs: env_u64("TGRUN_SLEEP_SECS", 3600),
            requeue: Duration::from_secs(env_u64("TGRUN_REQUEUE_SECS", 60)),
        }
    }
}
