//! Prompt Composer — deterministic assembly of the messages sent to the model.
//!
//! Turn-response mode replays the FULL transcript every turn; nothing is truncated.
//! Feedback mode condenses only the most recent turns into a single user instruction.

use crate::interview::persona::Persona;
use crate::interview::prompts::{
    FEEDBACK_PROMPT_TEMPLATE, PERSONA_SYSTEM_TEMPLATE, STYLE_DIRECTIVES,
};
use crate::interview::transcript::Turn;
use crate::interview::InterviewError;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, STAY_IN_CHARACTER_INSTRUCTION};
use crate::llm_client::ChatMessage;

/// Number of most recent turns included in the feedback condensation.
pub const FEEDBACK_WINDOW_TURNS: usize = 10;
/// Per-turn character cap inside the feedback condensation.
pub const FEEDBACK_EXCERPT_CHARS: usize = 200;
pub const TRUNCATION_MARKER: &str = "...";

/// Builds the persona system instruction: identity, verbatim script, style directives.
pub fn persona_instruction(persona: &Persona) -> String {
    PERSONA_SYSTEM_TEMPLATE
        .replace("{name}", persona.name)
        .replace("{title}", persona.title)
        .replace("{organization}", persona.organization)
        .replace("{stay_in_character}", STAY_IN_CHARACTER_INSTRUCTION)
        .replace("{style_directives}", STYLE_DIRECTIVES)
        // script last: it is free text and may itself contain braces
        .replace("{script}", persona.script)
}

/// `[system instruction] + transcript`. The caller has already appended the new user turn.
pub fn compose_turn_messages(persona: &Persona, transcript: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(ChatMessage::system(persona_instruction(persona)));
    messages.extend(transcript.iter().map(Turn::to_message));
    messages
}

/// A single user-role message asking for the structured evaluation.
pub fn compose_feedback_messages(
    persona: &Persona,
    transcript: &[Turn],
) -> Result<Vec<ChatMessage>, InterviewError> {
    if transcript.is_empty() {
        return Err(InterviewError::EmptyTranscript);
    }

    let prompt = FEEDBACK_PROMPT_TEMPLATE
        .replace("{category}", persona.category.as_str())
        .replace("{organization}", persona.organization)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        // transcript last: candidate text must not be scanned for placeholders
        .replace("{transcript}", &condense_transcript(transcript));

    Ok(vec![ChatMessage::user(prompt)])
}

/// Renders the last `FEEDBACK_WINDOW_TURNS` turns as `ROLE: content`, one per line.
pub fn condense_transcript(transcript: &[Turn]) -> String {
    let start = transcript.len().saturating_sub(FEEDBACK_WINDOW_TURNS);
    transcript[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), excerpt(&turn.content)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Caps `text` at `FEEDBACK_EXCERPT_CHARS` characters (not bytes), marking any cut.
fn excerpt(text: &str) -> String {
    match text.char_indices().nth(FEEDBACK_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}
