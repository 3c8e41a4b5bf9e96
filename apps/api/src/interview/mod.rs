// Interview engine: persona catalog, prompt composition, session state machine.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod composer;
pub mod feedback;
pub mod handlers;
pub mod persona;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod transcript;

use thiserror::Error;

use crate::llm_client::CompletionError;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Interview already started")]
    AlreadyStarted,

    #[error("Interview is not active")]
    NotActive,

    #[error("No interview data available")]
    EmptyTranscript,

    #[error("No unanswered message to retry")]
    NoPendingTurn,

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
