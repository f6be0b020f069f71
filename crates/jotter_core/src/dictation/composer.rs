//! New-note composer state machine.
//!
//! # Responsibility
//! - Drive the creation form through idle, listening and editing states.
//! - Turn transcript events into an editable draft.
//! - Submit drafts through the note store.
//!
//! # Invariants
//! - Transcript events only change state while `Listening`.
//! - A dictation failure auto-stops capture and keeps the last transcript.
//! - A rejected submit leaves the draft untouched.

use super::stream::{
    DictationError, DictationRequest, DictationSession, SpeechRecognizer, TranscriptEvent,
};
use crate::model::note::Note;
use crate::service::note_store::{NoteStore, StoreResult};
use crate::storage::KeyValueStorage;
use log::{debug, info, warn};

/// Creation form state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ComposerState {
    /// Prompt offering dictation or typing.
    #[default]
    Idle,
    /// Capture in progress; holds the latest delivered transcript.
    Listening { transcript: String },
    /// Manual text entry, or a dictated draft ready for review.
    Editing { draft: String },
}

/// State machine behind the "new note" card.
#[derive(Debug, Clone, Default)]
pub struct NoteComposer {
    state: ComposerState,
    request: DictationRequest,
}

impl NoteComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `request` for every capture started by this composer.
    pub fn with_request(request: DictationRequest) -> Self {
        Self {
            state: ComposerState::Idle,
            request,
        }
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    /// Current text: the editing draft or the live transcript.
    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            ComposerState::Idle => None,
            ComposerState::Listening { transcript } => Some(transcript),
            ComposerState::Editing { draft } => Some(draft),
        }
    }

    /// Idle -> Editing with an empty draft. Returns whether the state changed.
    pub fn start_typing(&mut self) -> bool {
        if self.state != ComposerState::Idle {
            return false;
        }
        self.state = ComposerState::Editing {
            draft: String::new(),
        };
        true
    }

    /// Idle -> Listening.
    ///
    /// # Errors
    /// - `Busy` while listening or editing a draft.
    /// - Recognizer start errors; the composer stays idle and the error is
    ///   logged.
    pub fn start_listening<R>(
        &mut self,
        recognizer: &mut R,
    ) -> Result<DictationSession, DictationError>
    where
        R: SpeechRecognizer + ?Sized,
    {
        if self.state != ComposerState::Idle {
            return Err(DictationError::Busy);
        }

        match recognizer.start(&self.request) {
            Ok(session) => {
                info!(
                    "event=dictation_start module=dictation status=ok language={} interim={}",
                    self.request.language, self.request.interim_results
                );
                self.state = ComposerState::Listening {
                    transcript: String::new(),
                };
                Ok(session)
            }
            Err(err) => {
                warn!("event=dictation_start module=dictation status=error error={err}");
                Err(err)
            }
        }
    }

    /// Applies one transcript event.
    pub fn apply(&mut self, event: TranscriptEvent) {
        let ComposerState::Listening { transcript } = &mut self.state else {
            debug!("event=dictation_event module=dictation status=ignored");
            return;
        };

        match event {
            TranscriptEvent::Interim(text) => *transcript = text,
            TranscriptEvent::Final(text) => {
                self.state = ComposerState::Editing { draft: text };
                debug!("event=dictation_final module=dictation status=ok");
            }
            TranscriptEvent::Ended => {
                let draft = std::mem::take(transcript);
                self.state = ComposerState::Editing { draft };
                debug!("event=dictation_end module=dictation status=ok");
            }
            TranscriptEvent::Failed(err) => {
                warn!("event=dictation_event module=dictation status=error error={err}");
                let draft = std::mem::take(transcript);
                self.state = ComposerState::Editing { draft };
            }
        }
    }

    /// Applies every pending event from `session` without blocking.
    ///
    /// Stops the session once the composer leaves `Listening`. Returns the
    /// number of events applied.
    pub fn pump(&mut self, session: &DictationSession) -> usize {
        let mut applied = 0;
        while matches!(self.state, ComposerState::Listening { .. }) {
            let Some(event) = session.try_next() else {
                break;
            };
            self.apply(event);
            applied += 1;
        }
        if !matches!(self.state, ComposerState::Listening { .. }) {
            session.stop();
        }
        applied
    }

    /// Listening -> Editing with the last delivered transcript.
    ///
    /// Events queued before the stop are applied first, so a transcript the
    /// recognizer already delivered is never lost.
    pub fn stop_listening(&mut self, session: &DictationSession) {
        session.stop();
        for event in session.drain() {
            self.apply(event);
        }
        if let ComposerState::Listening { transcript } = &mut self.state {
            let draft = std::mem::take(transcript);
            self.state = ComposerState::Editing { draft };
            info!("event=dictation_stop module=dictation status=ok");
        }
    }

    /// Replaces the editing draft. Clearing it returns to the idle prompt.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        if !matches!(self.state, ComposerState::Editing { .. }) {
            return;
        }
        let text = text.into();
        self.state = if text.is_empty() {
            ComposerState::Idle
        } else {
            ComposerState::Editing { draft: text }
        };
    }

    /// Creates a note from the current draft.
    ///
    /// Outside `Editing` the draft is empty and the store rejects it.
    pub fn submit<S: KeyValueStorage>(&mut self, store: &mut NoteStore<S>) -> StoreResult<Note> {
        let content = match &self.state {
            ComposerState::Editing { draft } => draft.clone(),
            _ => String::new(),
        };
        let note = store.create(content)?;
        self.state = ComposerState::Idle;
        Ok(note)
    }

    /// Discards any draft and returns to the idle prompt.
    pub fn cancel(&mut self) {
        self.state = ComposerState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{ComposerState, NoteComposer};
    use crate::dictation::stream::{DictationError, TranscriptEvent};

    fn listening() -> NoteComposer {
        let mut composer = NoteComposer::new();
        composer.state = ComposerState::Listening {
            transcript: String::new(),
        };
        composer
    }

    #[test]
    fn interim_events_replace_transcript() {
        let mut composer = listening();
        composer.apply(TranscriptEvent::Interim("buy".to_string()));
        composer.apply(TranscriptEvent::Interim("buy milk".to_string()));
        assert_eq!(
            composer.state(),
            &ComposerState::Listening {
                transcript: "buy milk".to_string()
            }
        );
    }

    #[test]
    fn failure_auto_stops_into_editing() {
        let mut composer = listening();
        composer.apply(TranscriptEvent::Interim("walk the".to_string()));
        composer.apply(TranscriptEvent::Failed(DictationError::Recognizer(
            "no-speech".to_string(),
        )));
        assert_eq!(composer.draft(), Some("walk the"));
        assert!(matches!(composer.state(), ComposerState::Editing { .. }));
    }

    #[test]
    fn events_outside_listening_are_ignored() {
        let mut composer = NoteComposer::new();
        composer.apply(TranscriptEvent::Final("late".to_string()));
        assert_eq!(composer.state(), &ComposerState::Idle);
    }

    #[test]
    fn clearing_draft_returns_to_idle() {
        let mut composer = NoteComposer::new();
        assert!(composer.start_typing());
        composer.set_draft("x");
        assert_eq!(composer.draft(), Some("x"));
        composer.set_draft("");
        assert_eq!(composer.state(), &ComposerState::Idle);
    }
}
