//! Stdin-backed speech recognizer stand-in.
//!
//! Each input line extends the transcript and is delivered as an interim
//! result; end of input delivers the final transcript.

use jotter_core::{
    transcript_channel, DictationError, DictationRequest, DictationSession, SpeechRecognizer,
    TranscriptSender,
};
use log::{debug, warn};
use std::io::{BufRead, BufReader, Read};
use std::thread;

/// Recognizer reading "spoken" text line by line from a reader.
pub struct LineRecognizer<R> {
    source: Option<R>,
}

impl<R: Read + Send + 'static> LineRecognizer<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: Some(source),
        }
    }
}

impl<R: Read + Send + 'static> SpeechRecognizer for LineRecognizer<R> {
    fn start(&mut self, request: &DictationRequest) -> Result<DictationSession, DictationError> {
        let source = self
            .source
            .take()
            .ok_or_else(|| DictationError::Recognizer("input already consumed".to_string()))?;
        let (sender, session) = transcript_channel();
        debug!(
            "event=recognizer_start module=cli status=ok language={}",
            request.language
        );

        thread::Builder::new()
            .name("jotter-dictation".to_string())
            .spawn(move || deliver_lines(BufReader::new(source), &sender))
            .map_err(|err| DictationError::Recognizer(err.to_string()))?;
        Ok(session)
    }
}

fn deliver_lines(reader: impl BufRead, sender: &TranscriptSender) {
    let mut transcript = String::new();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("event=recognizer_read module=cli status=error error={err}");
                sender.fail(DictationError::Recognizer(err.to_string()));
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !transcript.is_empty() {
            transcript.push(' ');
        }
        transcript.push_str(line);
        if !sender.interim(transcript.as_str()) {
            return;
        }
    }
    sender.finish(transcript);
}
