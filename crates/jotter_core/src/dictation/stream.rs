//! Push-based, cancellable transcript stream.
//!
//! # Responsibility
//! - Carry transcript updates from a speech recognizer to the composer.
//! - Let the consumer stop delivery at any time.
//!
//! # Invariants
//! - Every transcript event carries the full transcript so far; the last
//!   delivered one wins.
//! - Once a session is stopped, senders observe cancellation and the
//!   session yields no further events.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// BCP 47 tag used when the caller does not pick one.
pub const DEFAULT_LANGUAGE: &str = "pt-BR";

/// Parameters handed to the recognizer when capture starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictationRequest {
    /// BCP 47 language tag.
    pub language: String,
    /// Deliver partial transcripts while the user is speaking.
    pub interim_results: bool,
    /// Keep capturing across pauses until explicitly stopped.
    pub continuous: bool,
}

impl DictationRequest {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }
}

impl Default for DictationRequest {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            interim_results: true,
            continuous: true,
        }
    }
}

/// Dictation capability errors. Logged, never shown as user-facing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationError {
    /// The platform has no speech recognition capability.
    Unsupported,
    /// The composer is not idle: a capture or a draft is in progress.
    Busy,
    /// Recognizer reported a failure.
    Recognizer(String),
}

impl Display for DictationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "speech recognition is not supported"),
            Self::Busy => write!(f, "a dictation session is already active"),
            Self::Recognizer(message) => write!(f, "speech recognizer failed: {message}"),
        }
    }
}

impl Error for DictationError {}

/// Discrete update delivered by a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Partial transcript; later events may revise it.
    Interim(String),
    /// Final transcript for this capture.
    Final(String),
    /// Recognizer failure.
    Failed(DictationError),
    /// Recognizer stopped on its own without a final transcript.
    Ended,
}

/// Producer half held by the recognizer.
#[derive(Debug, Clone)]
pub struct TranscriptSender {
    tx: Sender<TranscriptEvent>,
    cancelled: Arc<AtomicBool>,
}

impl TranscriptSender {
    /// Delivers `event`. Returns `false` once the session was stopped or
    /// dropped; producers should stop capturing then.
    pub fn send(&self, event: TranscriptEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    pub fn interim(&self, transcript: impl Into<String>) -> bool {
        self.send(TranscriptEvent::Interim(transcript.into()))
    }

    pub fn finish(&self, transcript: impl Into<String>) -> bool {
        self.send(TranscriptEvent::Final(transcript.into()))
    }

    pub fn fail(&self, error: DictationError) -> bool {
        self.send(TranscriptEvent::Failed(error))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Consumer half: one active capture.
#[derive(Debug)]
pub struct DictationSession {
    rx: Receiver<TranscriptEvent>,
    cancelled: Arc<AtomicBool>,
}

impl DictationSession {
    /// Cancels delivery. Idempotent.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Returns the next pending event without blocking.
    pub fn try_next(&self) -> Option<TranscriptEvent> {
        if self.is_stopped() {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Takes every event already queued, even after `stop`.
    ///
    /// A stopped session still owes the consumer whatever senders delivered
    /// before cancellation.
    pub fn drain(&self) -> Vec<TranscriptEvent> {
        self.rx.try_iter().collect()
    }

    /// Blocks for the next event.
    ///
    /// Returns `None` when the session is stopped or every sender is gone.
    pub fn next_event(&self) -> Option<TranscriptEvent> {
        if self.is_stopped() {
            return None;
        }
        let event = self.rx.recv().ok()?;
        (!self.is_stopped()).then_some(event)
    }
}

/// Creates a connected sender/session pair.
pub fn transcript_channel() -> (TranscriptSender, DictationSession) {
    let (tx, rx) = mpsc::channel();
    let cancelled = Arc::new(AtomicBool::new(false));
    (
        TranscriptSender {
            tx,
            cancelled: Arc::clone(&cancelled),
        },
        DictationSession { rx, cancelled },
    )
}

/// External speech-to-text capability.
pub trait SpeechRecognizer {
    /// Starts capture and returns the session delivering transcripts.
    fn start(&mut self, request: &DictationRequest) -> Result<DictationSession, DictationError>;
}

#[cfg(test)]
mod tests {
    use super::{transcript_channel, DictationRequest, TranscriptEvent};
    use std::thread;

    #[test]
    fn default_request_streams_interim_results_in_portuguese() {
        let request = DictationRequest::default();
        assert_eq!(request.language, "pt-BR");
        assert!(request.interim_results);
        assert!(request.continuous);
    }

    #[test]
    fn events_arrive_in_send_order_across_threads() {
        let (sender, session) = transcript_channel();
        let producer = thread::spawn(move || {
            sender.interim("buy");
            sender.interim("buy milk");
            sender.finish("buy milk today");
        });
        producer.join().unwrap();

        assert_eq!(
            session.next_event(),
            Some(TranscriptEvent::Interim("buy".to_string()))
        );
        assert_eq!(
            session.next_event(),
            Some(TranscriptEvent::Interim("buy milk".to_string()))
        );
        assert_eq!(
            session.next_event(),
            Some(TranscriptEvent::Final("buy milk today".to_string()))
        );
        assert_eq!(session.next_event(), None);
    }

    #[test]
    fn stop_cancels_senders_and_hides_buffered_events() {
        let (sender, session) = transcript_channel();
        assert!(sender.interim("hello"));

        session.stop();
        assert!(sender.is_cancelled());
        assert!(!sender.interim("hello again"));
        assert_eq!(session.try_next(), None);
    }

    #[test]
    fn drain_returns_events_delivered_before_stop() {
        let (sender, session) = transcript_channel();
        assert!(sender.interim("walk"));
        assert!(sender.interim("walk the dog"));

        session.stop();
        assert_eq!(
            session.drain(),
            vec![
                TranscriptEvent::Interim("walk".to_string()),
                TranscriptEvent::Interim("walk the dog".to_string()),
            ]
        );
        assert!(session.drain().is_empty());
    }

    #[test]
    fn dropping_session_makes_send_fail() {
        let (sender, session) = transcript_channel();
        drop(session);
        assert!(!sender.interim("anyone?"));
    }
}
