//! Journal entry workflow: draft promotion and void/reversal.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (WorkflowAction)
//! - `service` - State transition logic
//! - `reversal` - Void and reversing entry creation

pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use reversal::ReversalService;
pub use service::WorkflowService;
pub use types::WorkflowAction;
