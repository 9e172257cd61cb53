//! Conversation state and the submit/regenerate flow.
//!
//! A session owns the ordered turns, the single live artifact and the last
//! instruction. At most one provider call is in flight per session; callers
//! that race get [`Outcome::Busy`] instead of a second request.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::credential::CredentialStore;
use crate::errors::GenerationError;
use crate::prompt::{GenerationRequest, PromptShape};
use crate::provider::DynProvider;

pub const GENERATED_ACK: &str = "I've generated a website based on your request. Open the preview with /preview or view the code with /code. Let me know if you want to make any improvements!";

pub const REGENERATED_ACK: &str = "I've regenerated the website with some variations. How does this look?";

pub const QUOTA_TURN: &str = "I'm sorry, but it looks like the Gemini API quota has been exceeded. This typically happens with free tier accounts that have limited requests per minute or day. You can try again later when the quota resets, or consider upgrading your Gemini API plan for additional capacity.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), at: Utc::now() }
    }
}

/// Transient, user-facing message. Never stored in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn new(title: &str, description: &str) -> Self {
        Self { title: title.into(), description: description.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank instruction; nothing happened.
    Ignored,
    /// Another call is still outstanding.
    Busy,
    /// No API key; nothing was appended.
    CredentialRequired,
    Generated,
    Regenerated,
    /// Quota turn appended, artifact untouched.
    QuotaNotice,
    /// Rejected before any call was made.
    Rejected(Notice),
    Failed(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

#[derive(Default)]
struct Conversation {
    turns: Vec<Turn>,
    artifact: Option<String>,
    last_instruction: Option<String>,
}

/// Clears the busy flag however the call ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session {
    provider: DynProvider,
    credentials: CredentialStore,
    convo: Mutex<Conversation>,
    busy: AtomicBool,
}

impl Session {
    pub fn new(provider: DynProvider, credentials: CredentialStore) -> Self {
        Self {
            provider,
            credentials,
            convo: Mutex::new(Conversation::default()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn state(&self) -> SessionState {
        if self.busy.load(Ordering::Acquire) {
            SessionState::Sending
        } else {
            SessionState::Idle
        }
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.convo.lock().turns.clone()
    }

    pub fn artifact(&self) -> Option<String> {
        self.convo.lock().artifact.clone()
    }

    pub async fn submit(&self, instruction: &str) -> Outcome {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Outcome::Ignored;
        }
        let Some(_guard) = InFlight::acquire(&self.busy) else {
            return Outcome::Busy;
        };
        let api_key = self.credentials.get();
        if api_key.is_empty() {
            return Outcome::CredentialRequired;
        }

        let req = {
            let mut convo = self.convo.lock();
            let shape = PromptShape::select(convo.artifact.is_some(), convo.turns.len());
            let req = match (shape, &convo.artifact) {
                (PromptShape::Refine, Some(artifact)) => GenerationRequest::refine(artifact, instruction),
                _ => GenerationRequest::fresh(instruction),
            };
            convo.turns.push(Turn::new(Role::User, instruction));
            convo.last_instruction = Some(instruction.to_string());
            req
        };
        tracing::info!(shape = req.shape().as_str(), "sending instruction");

        let result = self.provider.send(&api_key, &req).await;
        self.settle(
            result,
            GENERATED_ACK,
            Outcome::Generated,
            Notice::new(
                "Error",
                "Failed to generate website. Please check your API key and try again.",
            ),
        )
    }

    /// Re-runs the last instruction as a fresh generation, never as a refinement.
    pub async fn regenerate(&self) -> Outcome {
        let Some(_guard) = InFlight::acquire(&self.busy) else {
            return Outcome::Busy;
        };
        let Some(instruction) = self.convo.lock().last_instruction.clone() else {
            return Outcome::Rejected(Notice::new(
                "No prompt",
                "Please enter a prompt first to generate a website.",
            ));
        };
        let api_key = self.credentials.get();
        if api_key.is_empty() {
            return Outcome::CredentialRequired;
        }

        tracing::info!("regenerating from last instruction");
        let result = self.provider.send(&api_key, &GenerationRequest::fresh(&instruction)).await;
        self.settle(
            result,
            REGENERATED_ACK,
            Outcome::Regenerated,
            Notice::new("Error", "Failed to regenerate website."),
        )
    }

    fn settle(
        &self,
        result: Result<String, GenerationError>,
        ack: &str,
        success: Outcome,
        failure: Notice,
    ) -> Outcome {
        let mut convo = self.convo.lock();
        match result {
            Ok(html) => {
                tracing::info!(bytes = html.len(), "artifact replaced");
                convo.artifact = Some(html);
                convo.turns.push(Turn::new(Role::Assistant, ack));
                success
            }
            Err(e) if e.is_quota() => {
                tracing::warn!(error = %e, "quota exceeded");
                convo.turns.push(Turn::new(Role::Assistant, QUOTA_TURN));
                Outcome::QuotaNotice
            }
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                Outcome::Failed(failure)
            }
        }
    }
}
