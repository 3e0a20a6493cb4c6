use shared::domain::StanzaEntry;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    composition::{CompositionState, StepOutcome, StepRequest},
    PoemApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerEvent {
    PoemLoaded(Vec<StanzaEntry>),
    Progress(String),
    /// `number` is the 1-based position of the entry in the poem.
    EntryAdded { number: usize, entry: StanzaEntry },
    Failed(String),
    Cleared,
}

/// Runs composition cycles against a [`PoemApi`], one step at a time.
pub struct Composer<A: PoemApi> {
    api: A,
    state: CompositionState,
    events: broadcast::Sender<ComposerEvent>,
}

impl<A: PoemApi> Composer<A> {
    pub fn new(api: A) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            state: CompositionState::default(),
            events,
        }
    }

    pub fn state(&self) -> &CompositionState {
        &self.state
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.state.set_draft(draft);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ComposerEvent> {
        self.events.subscribe()
    }

    /// Fetches the server's poem once and replaces the local view with it.
    pub async fn load(&mut self) {
        match self.api.fetch_poem().await {
            Ok(poem) => {
                info!(entries = poem.len(), "loaded poem");
                self.state.replace_poem(poem.clone());
                self.emit(ComposerEvent::PoemLoaded(poem));
            }
            Err(error) => warn!(%error, "failed to load poem"),
        }
    }

    /// Runs one full cycle for the current draft. Returns `false` when the
    /// submit was ignored (blank draft or cycle already running).
    pub async fn submit(&mut self) -> bool {
        let Some(mut request) = self.state.submit() else {
            return false;
        };

        loop {
            if let Some(progress) = self.state.progress() {
                self.emit(ComposerEvent::Progress(progress.to_string()));
            }

            let outcome = self.perform(&request).await;
            let before = self.state.poem().len();
            let next = self.state.advance(outcome);

            if let Some(entry) = self.state.poem().get(before).cloned() {
                self.emit(ComposerEvent::EntryAdded {
                    number: before + 1,
                    entry,
                });
            }
            if let Some(error) = self.state.last_error() {
                self.emit(ComposerEvent::Failed(error.to_string()));
            }

            match next {
                Some(step) => request = step,
                None => return true,
            }
        }
    }

    pub async fn clear(&mut self) {
        if !self.state.can_clear() {
            return;
        }
        match self.api.clear_poem().await {
            Ok(()) => {
                self.state.finish_clear(true);
                self.emit(ComposerEvent::Cleared);
            }
            Err(error) => {
                warn!(%error, "failed to clear poem");
                self.state.finish_clear(false);
                if let Some(message) = self.state.last_error() {
                    self.emit(ComposerEvent::Failed(message.to_string()));
                }
            }
        }
    }

    async fn perform(&self, request: &StepRequest) -> StepOutcome {
        let result = match request {
            StepRequest::Image { stanza } => self
                .api
                .generate_image(stanza)
                .await
                .map(StepOutcome::ImageReady),
            StepRequest::Stanza { user_contribution } => self
                .api
                .generate_stanza(user_contribution)
                .await
                .map(StepOutcome::StanzaReady),
        };
        result.unwrap_or_else(|error| {
            warn!(%error, ?request, "composition step failed");
            StepOutcome::Failed
        })
    }

    fn emit(&self, event: ComposerEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/composer_tests.rs"]
mod tests;
