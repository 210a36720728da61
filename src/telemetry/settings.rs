/*!
 * Collector Settings
 * Current settings plus the validated partial update merged into them
 */

use super::catalog::DEFAULT_ALGORITHM_ID;
use super::types::Algorithm;
use crate::core::errors::{TelemetryError, TelemetryResult};
use crate::core::limits::{MAX_PERCENT, MAX_TIME_INTERVAL_SECS};
use serde::{Deserialize, Serialize};

/// What a collection should favour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionPriority {
    #[default]
    Balanced,
    Speed,
    Memory,
}

/// Collector settings
///
/// Only `auto_collection`, `memory_threshold` and `time_interval` drive
/// behavior; the remaining fields are stored for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub auto_collection: bool,
    /// Usage percentage above which a tick triggers a collection
    pub memory_threshold: u32,
    /// Tick cadence, seconds
    pub time_interval: u64,
    pub background_collection: bool,
    pub cpu_limit: u32,
    pub collection_priority: CollectionPriority,
    /// Catalog id
    pub default_algorithm: u32,
    pub memory_compaction: bool,
    pub detailed_logging: bool,
    pub enable_notifications: bool,
}

impl Settings {
    /// Defaults with the given tick cadence
    pub fn with_time_interval(time_interval: u64) -> Self {
        Self {
            auto_collection: true,
            memory_threshold: 75,
            time_interval,
            background_collection: true,
            cpu_limit: 20,
            collection_priority: CollectionPriority::Balanced,
            default_algorithm: DEFAULT_ALGORITHM_ID,
            memory_compaction: false,
            detailed_logging: false,
            enable_notifications: true,
        }
    }

    /// Validate `update` and return the merged settings
    ///
    /// Nothing is merged when any present field is out of its domain.
    pub fn merged(&self, update: &SettingsUpdate, catalog: &[Algorithm]) -> TelemetryResult<Self> {
        let numbers = update.checked(catalog)?;

        let mut merged = self.clone();
        if let Some(v) = update.auto_collection {
            merged.auto_collection = v;
        }
        if let Some(v) = numbers.memory_threshold {
            merged.memory_threshold = v;
        }
        if let Some(v) = numbers.time_interval {
            merged.time_interval = v;
        }
        if let Some(v) = update.background_collection {
            merged.background_collection = v;
        }
        if let Some(v) = numbers.cpu_limit {
            merged.cpu_limit = v;
        }
        if let Some(v) = update.collection_priority {
            merged.collection_priority = v;
        }
        if let Some(v) = numbers.default_algorithm {
            merged.default_algorithm = v;
        }
        if let Some(v) = update.memory_compaction {
            merged.memory_compaction = v;
        }
        if let Some(v) = update.detailed_logging {
            merged.detailed_logging = v;
        }
        if let Some(v) = update.enable_notifications {
            merged.enable_notifications = v;
        }
        Ok(merged)
    }
}

/// Partial settings; absent fields keep their current value
///
/// Numeric fields are signed so that a negative value from a client reaches
/// `validate` and is reported as an invalid setting rather than a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_collection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_collection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_priority: Option<CollectionPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_algorithm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_compaction: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_logging: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_notifications: Option<bool>,
}

/// Numeric fields of an update, converted after their domain checks
struct CheckedNumbers {
    memory_threshold: Option<u32>,
    time_interval: Option<u64>,
    cpu_limit: Option<u32>,
    default_algorithm: Option<u32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check every present field against its documented domain
    pub fn validate(&self, catalog: &[Algorithm]) -> TelemetryResult<()> {
        self.checked(catalog).map(|_| ())
    }

    fn checked(&self, catalog: &[Algorithm]) -> TelemetryResult<CheckedNumbers> {
        let percent = MAX_PERCENT as i64;

        let memory_threshold = self
            .memory_threshold
            .map(|v| bounded("memoryThreshold", v, 0, percent, "a percentage in 0..=100"))
            .transpose()?
            .map(|v| v as u32);

        let max_secs = MAX_TIME_INTERVAL_SECS as i64;
        let time_interval = self
            .time_interval
            .map(|v| {
                bounded(
                    "timeInterval",
                    v,
                    1,
                    max_secs,
                    &format!("seconds in 1..={}", MAX_TIME_INTERVAL_SECS),
                )
            })
            .transpose()?;

        let cpu_limit = self
            .cpu_limit
            .map(|v| bounded("cpuLimit", v, 1, percent, "a percentage in 1..=100"))
            .transpose()?
            .map(|v| v as u32);

        let default_algorithm = match self.default_algorithm {
            Some(id) => match catalog.iter().find(|a| i64::from(a.id) == id) {
                Some(algorithm) => Some(algorithm.id),
                None => {
                    let ids: Vec<String> = catalog.iter().map(|a| a.id.to_string()).collect();
                    return Err(TelemetryError::invalid_setting(
                        "defaultAlgorithm",
                        id,
                        format!("a catalog id ({})", ids.join(", ")),
                    ));
                }
            },
            None => None,
        };

        Ok(CheckedNumbers {
            memory_threshold,
            time_interval,
            cpu_limit,
            default_algorithm,
        })
    }
}

/// `value` inside `[low, high]`, as unsigned
fn bounded(field: &str, value: i64, low: i64, high: i64, expected: &str) -> TelemetryResult<u64> {
    if (low..=high).contains(&value) {
        Ok(value.unsigned_abs())
    } else {
        Err(TelemetryError::invalid_setting(field, value, expected))
    }
}
