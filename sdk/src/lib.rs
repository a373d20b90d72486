//! Roundtable SDK
//!
//! Shared contracts for the Roundtable orchestrator. This crate holds the
//! conversation data model and the two collaborator traits the engine drives,
//! so agent backends and policy classifiers can be implemented without
//! depending on the engine itself.

/// Agent invoker and policy evaluator traits
pub mod collaborator;

/// Error types and handling
pub mod errors;

/// Conversation message types
pub mod types;

// Re-export commonly used types
pub use collaborator::{AgentInvoker, Criterion, Decision, PolicyEvaluator};
pub use errors::{EngineError, InvocationError, PolicyError, RoundtableErrorExt};
pub use types::{Message, ParticipantId, Speaker, SYSTEM_LABEL, USER_LABEL};
