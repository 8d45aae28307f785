//! The reasoning loop for agromie.
//!
//! Given one farmer utterance, the [`Orchestrator`] alternates between the
//! language model and the tool catalog:
//!
//! 1. **Send** the transcript and the tool definitions to the provider
//! 2. **If tool calls**: execute them in order, append each result, loop
//! 3. **If text only**: the run is complete
//!
//! The loop also stops when the iteration cap is reached or the model call
//! fails. Tool failures never stop it; they are fed back to the model.

pub mod orchestrator;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{DEFAULT_MAX_ITERATIONS, Orchestrator, OrchestratorResult, RunState};
pub use prompt::SYSTEM_PROMPT;
