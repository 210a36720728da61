/*!
 * Monitoring
 * Tracing setup and operation spans
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, OperationSpan};
