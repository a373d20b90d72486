//! Agent invocation
//!
//! [`LlmAgentInvoker`] is the production [`AgentInvoker`](sdk::AgentInvoker):
//! every participant is played by the same LLM provider, differentiated only by
//! its persona instructions.

pub mod llm_agent;

pub use llm_agent::LlmAgentInvoker;
