//! The composition cycle as a pure state machine.
//!
//! [`CompositionState`] never performs I/O. [`CompositionState::submit`] and
//! [`CompositionState::advance`] hand back the next [`StepRequest`] a driver
//! must perform, and the driver reports the result as a [`StepOutcome`].
//!
//! ```text
//! Idle --submit--> AwaitingUserImage --image--> AwaitingAiStanza
//!      <--image-- AwaitingAiImage <--stanza--/
//! any awaiting phase --failed--> Idle (error set)
//! ```

use shared::domain::StanzaEntry;
use tracing::warn;

pub const SUBMIT_FAILED: &str = "Something went wrong. Please try again.";
pub const CLEAR_FAILED: &str = "Failed to clear the poem. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingUserImage {
        user_text: String,
    },
    AwaitingAiStanza {
        user_text: String,
    },
    AwaitingAiImage {
        stanza: String,
    },
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    pub fn progress_message(&self) -> Option<&'static str> {
        match self {
            Phase::Idle => None,
            Phase::AwaitingUserImage { .. } => Some("Illustrating your line..."),
            Phase::AwaitingAiStanza { .. } => Some("Writing the next stanza..."),
            Phase::AwaitingAiImage { .. } => Some("Illustrating the new stanza..."),
        }
    }
}

/// Remote call the driver must make next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRequest {
    Image { stanza: String },
    Stanza { user_contribution: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    ImageReady(String),
    StanzaReady(String),
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct CompositionState {
    phase: Phase,
    draft: String,
    error: Option<String>,
    poem: Vec<StanzaEntry>,
}

impl CompositionState {
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn poem(&self) -> &[StanzaEntry] {
        &self.poem
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn progress(&self) -> Option<&'static str> {
        self.phase.progress_message()
    }

    pub fn awaiting_stanza(&self) -> bool {
        matches!(self.phase, Phase::AwaitingAiStanza { .. })
    }

    pub fn awaiting_image(&self) -> bool {
        matches!(
            self.phase,
            Phase::AwaitingUserImage { .. } | Phase::AwaitingAiImage { .. }
        )
    }

    pub fn is_busy(&self) -> bool {
        !self.phase.is_idle()
    }

    /// Starts a cycle for the current draft. Blank drafts and submits while a
    /// cycle is in flight are ignored.
    pub fn submit(&mut self) -> Option<StepRequest> {
        if self.is_busy() || self.draft.trim().is_empty() {
            return None;
        }
        self.error = None;
        let user_text = self.draft.clone();
        self.phase = Phase::AwaitingUserImage {
            user_text: user_text.clone(),
        };
        Some(StepRequest::Image { stanza: user_text })
    }

    pub fn advance(&mut self, outcome: StepOutcome) -> Option<StepRequest> {
        let phase = std::mem::take(&mut self.phase);
        match (phase, outcome) {
            (Phase::AwaitingUserImage { user_text }, StepOutcome::ImageReady(url)) => {
                self.poem
                    .push(StanzaEntry::illustrated(user_text.clone(), url));
                self.draft.clear();
                self.phase = Phase::AwaitingAiStanza {
                    user_text: user_text.clone(),
                };
                Some(StepRequest::Stanza {
                    user_contribution: user_text,
                })
            }
            (Phase::AwaitingAiStanza { .. }, StepOutcome::StanzaReady(stanza)) => {
                self.phase = Phase::AwaitingAiImage {
                    stanza: stanza.clone(),
                };
                Some(StepRequest::Image { stanza })
            }
            (Phase::AwaitingAiImage { stanza }, StepOutcome::ImageReady(url)) => {
                self.poem.push(StanzaEntry::illustrated(stanza, url));
                None
            }
            (Phase::Idle, outcome) => {
                warn!(?outcome, "step outcome arrived while idle; ignoring");
                None
            }
            (phase, outcome) => {
                if outcome != StepOutcome::Failed {
                    warn!(?phase, ?outcome, "step outcome does not match phase");
                }
                self.error = Some(SUBMIT_FAILED.to_string());
                None
            }
        }
    }

    pub fn can_clear(&self) -> bool {
        self.phase.is_idle()
    }

    pub fn finish_clear(&mut self, succeeded: bool) {
        if succeeded {
            self.poem.clear();
            self.draft.clear();
        } else {
            self.error = Some(CLEAR_FAILED.to_string());
        }
    }

    /// Replaces the local view wholesale with the server's poem.
    pub fn replace_poem(&mut self, poem: Vec<StanzaEntry>) {
        self.poem = poem;
    }
}

#[cfg(test)]
#[path = "tests/composition_tests.rs"]
mod tests;
