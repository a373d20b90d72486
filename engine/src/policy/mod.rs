//! Turn-taking and termination policies
//!
//! Both policies delegate their decision to a [`PolicyEvaluator`](sdk::PolicyEvaluator)
//! and treat its output as untrusted:
//!
//! - [`TurnSelectionPolicy`] resolves the decision to a participant and rejects
//!   unknown names and self-succession.
//! - [`TerminationPolicy`] only consults the evaluator once the approver has
//!   spoken after a full cycle, and only accepts the exact approval token.
//!
//! Two evaluators are provided: [`RuleEvaluator`] (deterministic stage rules)
//! and [`LlmPolicyEvaluator`] (classification prompts sent to an LLM).

pub mod prompt;
pub mod rules;
pub mod selection;
pub mod termination;

pub use prompt::LlmPolicyEvaluator;
pub use rules::RuleEvaluator;
pub use selection::{SelectionError, TurnSelectionPolicy};
pub use termination::{CycleProgress, TerminationPolicy};

/// Decision returned by [`RuleEvaluator`] when the approver has not signed off
pub const CONTINUE_DECISION: &str = "continue";
