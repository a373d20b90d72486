//! Roundtable Engine Library
//!
//! This library provides the collaboration orchestrator and everything it is
//! wired to in production. It is used by both the main binary and integration
//! tests.

/// Configuration management module
pub mod config;

/// Participant roster and stage order
pub mod participants;

/// Message log and history reducer
pub mod conversation;

/// Turn selection and termination policies
pub mod policy;

/// LLM provider abstraction layer
pub mod llm;

/// LLM-backed agent invoker
pub mod agent;

/// Collaboration orchestration loop
pub mod orchestrator;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

pub use orchestrator::{
    CollaborationError, CollaborationOutcome, CollaborationSettings, Orchestrator, RunStatus,
};
pub use participants::{Participant, ParticipantSet};
