/*!
 * Engine Configuration
 * Defaults from `core::limits`, overridable by builder methods or environment
 *
 * Environment variables:
 * - TELEMETRY_TOTAL_KIB: simulated capacity
 * - TELEMETRY_INITIAL_USED_KIB: starting usage
 * - TELEMETRY_TICK_SECS: tick cadence in whole seconds
 * - TELEMETRY_COMMAND_POLICY: `interleave` or `reject`
 * - TELEMETRY_SEED: fixed seed for reproducible runs
 */

use super::errors::{TelemetryError, TelemetryResult};
use super::limits::*;
use super::random::{RandomSource, SeededRandom};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// How overlapping commands are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPolicy {
    /// Every command applies immediately, even while an earlier result is pending
    #[default]
    Interleave,
    /// A command issued before the previous result was delivered is rejected
    RejectWhileBusy,
}

impl FromStr for CommandPolicy {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interleave" => Ok(CommandPolicy::Interleave),
            "reject" | "reject_while_busy" => Ok(CommandPolicy::RejectWhileBusy),
            other => Err(TelemetryError::InvalidConfig(format!(
                "unknown command policy '{}' (expected interleave or reject)",
                other
            ))),
        }
    }
}

/// Construction parameters for a telemetry engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub total_kib: u64,
    pub initial_used_kib: u64,
    pub initial_fragmentation: f64,
    pub initial_cpu_impact: f64,
    pub tick_interval: Duration,
    pub command_policy: CommandPolicy,
    /// Fixed seed; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            total_kib: DEFAULT_TOTAL_KIB,
            initial_used_kib: DEFAULT_INITIAL_USED_KIB,
            initial_fragmentation: DEFAULT_INITIAL_FRAGMENTATION,
            initial_cpu_impact: DEFAULT_INITIAL_CPU_IMPACT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            command_policy: CommandPolicy::default(),
            seed: None,
        }
    }
}

impl TelemetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by any TELEMETRY_* variables that are set
    pub fn from_env() -> TelemetryResult<Self> {
        let mut config = Self::default();

        if let Some(total) = env_parse::<u64>("TELEMETRY_TOTAL_KIB")? {
            config.total_kib = total;
        }
        if let Some(used) = env_parse::<u64>("TELEMETRY_INITIAL_USED_KIB")? {
            config.initial_used_kib = used;
        }
        if let Some(secs) = env_parse::<u64>("TELEMETRY_TICK_SECS")? {
            config.tick_interval = Duration::from_secs(secs);
        }
        if let Some(policy) = env_parse::<CommandPolicy>("TELEMETRY_COMMAND_POLICY")? {
            config.command_policy = policy;
        }
        if let Some(seed) = env_parse::<u64>("TELEMETRY_SEED")? {
            config.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_total_kib(mut self, total_kib: u64) -> Self {
        self.total_kib = total_kib;
        self
    }

    pub fn with_initial_used_kib(mut self, used_kib: u64) -> Self {
        self.initial_used_kib = used_kib;
        self
    }

    pub fn with_initial_fragmentation(mut self, percentage: f64) -> Self {
        self.initial_fragmentation = percentage;
        self
    }

    pub fn with_initial_cpu_impact(mut self, percentage: f64) -> Self {
        self.initial_cpu_impact = percentage;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_command_policy(mut self, policy: CommandPolicy) -> Self {
        self.command_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> TelemetryResult<()> {
        let min_total = BLOCK_COUNT as u64 * MIN_BLOCK_KIB;
        if self.total_kib < min_total {
            return Err(TelemetryError::InvalidConfig(format!(
                "total_kib {} cannot hold {} blocks of {} KiB",
                self.total_kib, BLOCK_COUNT, MIN_BLOCK_KIB
            )));
        }
        if self.initial_used_kib > self.total_kib {
            return Err(TelemetryError::InvalidConfig(format!(
                "initial_used_kib {} exceeds total_kib {}",
                self.initial_used_kib, self.total_kib
            )));
        }
        if !is_percentage(self.initial_fragmentation) {
            return Err(TelemetryError::InvalidConfig(format!(
                "initial_fragmentation {} outside 0..=100",
                self.initial_fragmentation
            )));
        }
        if !is_percentage(self.initial_cpu_impact) {
            return Err(TelemetryError::InvalidConfig(format!(
                "initial_cpu_impact {} outside 0..=100",
                self.initial_cpu_impact
            )));
        }
        let secs = self.tick_interval.as_secs();
        if secs == 0 || secs > MAX_TIME_INTERVAL_SECS {
            return Err(TelemetryError::InvalidConfig(format!(
                "tick interval {:?} outside 1..={}s",
                self.tick_interval, MAX_TIME_INTERVAL_SECS
            )));
        }
        if self.tick_interval.subsec_nanos() != 0 {
            return Err(TelemetryError::InvalidConfig(format!(
                "tick interval {:?} must be whole seconds",
                self.tick_interval
            )));
        }
        Ok(())
    }

    /// Random source for ticks and commands, matching the configured seed
    pub fn random_source(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(SeededRandom::from_entropy()),
        }
    }

    /// Separate source for blocks and chart series
    ///
    /// Kept apart from `random_source` so reads never shift the draws a
    /// seeded run's commands see.
    pub fn chart_random_source(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(SeededRandom::new(seed ^ CHART_SEED_SALT)),
            None => Box::new(SeededRandom::from_entropy()),
        }
    }
}

/// Mixed into the seed of the chart source
const CHART_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

fn is_percentage(value: f64) -> bool {
    value.is_finite() && (0.0..=100.0).contains(&value)
}

fn env_parse<T>(key: &str) -> TelemetryResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| TelemetryError::InvalidConfig(format!("{}='{}': {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
