// Post generation engine.
// Implements: parameter validation, prompt building, model invocation,
// post assembly, metrics and the per-request orchestrator.
// All model calls go through llm_client::CompletionModel; no direct HTTP here.

pub mod assembler;
pub mod catalog;
pub mod handlers;
pub mod invoker;
pub mod metrics;
pub mod orchestrator;
pub mod prompt_builder;
pub mod prompts;
pub mod validator;
