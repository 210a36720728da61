/*!
 * Telemetry
 * Simulated memory-management metrics, commands and the tick loop
 */

pub mod blocks;
pub mod catalog;
pub mod deferred;
pub mod engine;
pub mod history;
pub mod settings;
pub mod state;
pub mod task;
pub mod traits;
pub mod types;

pub use catalog::{default_catalog, DEFAULT_ALGORITHM_ID};
pub use deferred::Deferred;
pub use engine::TelemetryEngine;
pub use settings::{CollectionPriority, Settings, SettingsUpdate};
pub use state::{TelemetryState, TickReport};
pub use task::{TickCommand, TickTask};
pub use traits::{TelemetryBackend, TelemetryCommands, TelemetryQuery};
pub use types::*;
