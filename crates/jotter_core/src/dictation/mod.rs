//! Speech-to-text dictation for note drafts.
//!
//! # Responsibility
//! - Model recognizer output as a cancellable stream of transcript events.
//! - Drive the new-note form state from those events.
//!
//! The recognizer itself is an external capability behind
//! [`stream::SpeechRecognizer`].

pub mod composer;
pub mod stream;
