// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that forbids chatter around the requested output.
pub const NO_PREAMBLE_SYSTEM: &str = "Respond with the requested sections only. \
    Do NOT greet the reader or introduce your answer. \
    Do NOT add notes, explanations or apologies after the last section. \
    Do NOT use markdown code fences.";

/// Instruction appended to every generation prompt so the model does not
/// fabricate sources.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    Do NOT invent statistics, quotes, names or sources. \
    If you use a number, present it as an illustration rather than a cited fact.";
