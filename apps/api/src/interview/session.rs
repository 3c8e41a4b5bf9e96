//! Interview Session — the per-candidate state machine.
//!
//! ```text
//! NotStarted --begin--> Active --end--> Ended
//!                        |  ^
//!                        respond / retry_pending
//! ```
//!
//! PRECONDITION: at most one operation in flight per session. Every mutating
//! operation takes `&mut self`; callers sharing a session across tasks must
//! serialize access themselves (the registry wraps each session in a mutex).
//!
//! A completion failure during `respond` leaves the user turn in the transcript
//! as a pending marker. `retry_pending` re-sends it; a new `respond` supersedes it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::interview::composer::{compose_feedback_messages, compose_turn_messages};
use crate::interview::feedback::{parse_feedback, Feedback};
use crate::interview::persona::{Persona, PersonaCatalog, PersonaSummary};
use crate::interview::transcript::{Turn, TurnRole};
use crate::interview::InterviewError;
use crate::llm_client::{CompletionClient, FEEDBACK_PARAMS, TURN_RESPONSE_PARAMS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Active,
    Ended,
}

/// What `end` hands back to the boundary layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub persona: PersonaSummary,
    pub feedback: Feedback,
    pub duration: Duration,
    /// Transcript length (user and assistant turns).
    pub turn_count: usize,
    /// Answered user turns.
    pub exchange_count: usize,
}

pub struct InterviewSession {
    catalog: Arc<PersonaCatalog>,
    client: Arc<dyn CompletionClient>,
    state: SessionState,
    persona: Option<Arc<Persona>>,
    transcript: Vec<Turn>,
    started_at: Option<DateTime<Utc>>,
}

impl InterviewSession {
    pub fn new(catalog: Arc<PersonaCatalog>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            catalog,
            client,
            state: SessionState::NotStarted,
            persona: None,
            transcript: Vec::new(),
            started_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn persona(&self) -> Option<&Persona> {
        self.persona.as_deref()
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// True when the transcript ends in a user turn whose completion failed.
    pub fn has_pending_turn(&self) -> bool {
        matches!(self.transcript.last(), Some(t) if t.role == TurnRole::User)
    }

    pub fn exchange_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|t| t.role == TurnRole::Assistant)
            .count()
    }

    /// Starts the interview and returns the persona's fixed opening line.
    ///
    /// The opening line is static persona data: no completion call is made and it
    /// is not recorded in the transcript.
    pub fn begin(&mut self, persona_id: &str) -> Result<&'static str, InterviewError> {
        if self.state != SessionState::NotStarted {
            return Err(InterviewError::AlreadyStarted);
        }

        let persona = self.catalog.lookup(persona_id)?;
        let opening_line = persona.opening_line;

        info!("Interview started with persona '{}'", persona.id);

        self.transcript.clear();
        self.persona = Some(persona);
        self.started_at = Some(Utc::now());
        self.state = SessionState::Active;

        Ok(opening_line)
    }

    /// Sends one candidate utterance and returns the interviewer's reply.
    ///
    /// On success the transcript grows by exactly `[user, assistant]`.
    pub async fn respond(&mut self, user_text: &str) -> Result<String, InterviewError> {
        let persona = self.active_persona()?;

        if self.has_pending_turn() {
            warn!("Discarding unanswered user turn superseded by a new message");
            self.transcript.pop();
        }

        self.transcript.push(Turn::user(user_text));
        self.complete_pending(&persona).await
    }

    /// Re-sends the pending user turn left behind by a failed `respond`.
    pub async fn retry_pending(&mut self) -> Result<String, InterviewError> {
        let persona = self.active_persona()?;
        if !self.has_pending_turn() {
            return Err(InterviewError::NoPendingTurn);
        }
        info!("Retrying pending user turn");
        self.complete_pending(&persona).await
    }

    /// Produces the evaluation and closes the session.
    ///
    /// Any failure (empty transcript, completion error) leaves the session `Active`,
    /// so the caller may try again.
    pub async fn end(&mut self) -> Result<SessionReport, InterviewError> {
        let persona = self.active_persona()?;
        let started_at = self.started_at.ok_or(InterviewError::NotActive)?;

        let answered_len = if self.has_pending_turn() {
            self.transcript.len() - 1
        } else {
            self.transcript.len()
        };

        let messages = compose_feedback_messages(&persona, &self.transcript[..answered_len])?;
        let text = self.client.complete(&messages, FEEDBACK_PARAMS).await?;
        let feedback = parse_feedback(&text);

        if answered_len < self.transcript.len() {
            debug!("Dropping pending user turn at session end");
            self.transcript.truncate(answered_len);
        }
        self.state = SessionState::Ended;

        let duration = (Utc::now() - started_at).to_std().unwrap_or_default();
        let report = SessionReport {
            persona: persona.summary(),
            feedback,
            duration,
            turn_count: self.transcript.len(),
            exchange_count: self.exchange_count(),
        };

        info!(
            "Interview ended: persona='{}', turns={}, duration={}s, structured_feedback={}",
            persona.id,
            report.turn_count,
            report.duration.as_secs(),
            report.feedback.is_structured()
        );

        Ok(report)
    }

    fn active_persona(&self) -> Result<Arc<Persona>, InterviewError> {
        match (&self.state, &self.persona) {
            (SessionState::Active, Some(persona)) => Ok(Arc::clone(persona)),
            _ => Err(InterviewError::NotActive),
        }
    }

    /// Answers the trailing user turn. On failure the turn stays pending.
    async fn complete_pending(&mut self, persona: &Persona) -> Result<String, InterviewError> {
        let messages = compose_turn_messages(persona, &self.transcript);
        let reply = self.client.complete(&messages, TURN_RESPONSE_PARAMS).await?;

        self.transcript.push(Turn::assistant(reply.clone()));
        debug!(
            "Turn answered: transcript_len={}, reply_chars={}",
            self.transcript.len(),
            reply.chars().count()
        );

        Ok(reply)
    }
}
