// Shared prompt fragments used by more than one prompt builder.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Instruction appended to any prompt whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps a role-playing model from breaking the fourth wall.
pub const STAY_IN_CHARACTER_INSTRUCTION: &str = "\
    You are a REAL PERSON, not an AI. \
    Stay completely in character and never mention that you are an AI, a language model, \
    or an automated system, even if asked directly.";
