/*!
 * Core Module
 * Configuration, limits, randomness and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod random;

// Re-export for convenience
pub use config::{CommandPolicy, TelemetryConfig};
pub use errors::*;
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
