/*!
 * Memory Telemetry Library
 * Simulated garbage-collector and memory-manager telemetry for a monitoring UI
 */

pub mod core;
pub mod monitoring;
pub mod protocol;
pub mod telemetry;

// Re-exports
pub use crate::core::{
    CommandPolicy, RandomSource, ScriptedRandom, SeededRandom, SerializableError,
    TelemetryConfig, TelemetryError, TelemetryResult,
};
pub use monitoring::{init_tracing, OperationSpan};
pub use protocol::{dispatch, handle_command, ClientCommand, CommandRunner, ServerReply};
pub use telemetry::{
    Deferred, Settings, SettingsUpdate, TelemetryBackend, TelemetryCommands, TelemetryEngine,
    TelemetryQuery, TelemetrySnapshot, TickReport, TickTask,
};
