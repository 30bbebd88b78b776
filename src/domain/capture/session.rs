//! Capture session entity

use super::state::{CaptureState, InvalidStateTransition};
use crate::domain::audio::{AudioData, AudioMimeType, CapturedAudio};

/// One recording attempt: its state, the chunks buffered so far and,
/// once completed, the assembled payload.
///
/// State machine:
///   IDLE -> RECORDING (begin_recording)
///   RECORDING -> FINALIZING (begin_finalizing)
///   FINALIZING -> COMPLETED (complete)
///   IDLE | RECORDING | FINALIZING -> FAILED (fail)
///
/// Chunks are accepted while the device is held, which includes the final
/// flush the platform delivers after the stop signal.
#[derive(Debug, Default)]
pub struct CaptureSession {
    state: CaptureState,
    chunks: Vec<Vec<u8>>,
    chunk_count: usize,
    buffered_bytes: usize,
    result: Option<CapturedAudio>,
    failure: Option<String>,
}

impl CaptureSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Chunks still buffered (emptied once the payload is assembled)
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Total chunks received over the session's life
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Total bytes received over the session's life
    pub fn buffered_bytes(&self) -> usize {
        self.buffered_bytes
    }

    pub fn result(&self) -> Option<&CapturedAudio> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Transition from IDLE to RECORDING
    pub fn begin_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(CaptureState::Idle, "start recording")?;
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Buffer a chunk in arrival order
    pub fn append_chunk(&mut self, chunk: Vec<u8>) -> Result<(), InvalidStateTransition> {
        if !self.state.holds_device() {
            return Err(self.invalid("append chunk"));
        }
        self.chunk_count += 1;
        self.buffered_bytes += chunk.len();
        self.chunks.push(chunk);
        Ok(())
    }

    /// Transition from RECORDING to FINALIZING
    pub fn begin_finalizing(&mut self) -> Result<(), InvalidStateTransition> {
        self.require(CaptureState::Recording, "finalize")?;
        self.state = CaptureState::Finalizing;
        Ok(())
    }

    /// Transition from FINALIZING to COMPLETED.
    ///
    /// Concatenates every buffered chunk into the payload. The payload is
    /// set here and only here.
    pub fn complete(
        &mut self,
        mime_type: AudioMimeType,
        filename: Option<&str>,
    ) -> Result<&CapturedAudio, InvalidStateTransition> {
        self.require(CaptureState::Finalizing, "complete")?;

        let bytes = std::mem::take(&mut self.chunks).concat();
        let audio = AudioData::new(bytes, mime_type);
        self.state = CaptureState::Completed;
        let result = self
            .result
            .insert(CapturedAudio::with_optional_filename(audio, filename));
        Ok(&*result)
    }

    /// Transition to FAILED, dropping anything buffered
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidStateTransition> {
        if self.state.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.chunks.clear();
        self.failure = Some(reason.into());
        self.state = CaptureState::Failed;
        Ok(())
    }

    fn require(&self, required: CaptureState, action: &str) -> Result<(), InvalidStateTransition> {
        if self.state != required {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current_state: self.state,
            action: action.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_session() -> CaptureSession {
        let mut session = CaptureSession::new();
        session.begin_recording().unwrap();
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = CaptureSession::new();
        assert_eq!(session.state(), CaptureState::Idle);
        assert!(session.chunks().is_empty());
        assert!(session.result().is_none());
    }

    #[test]
    fn begin_recording_from_recording_fails() {
        let mut session = recording_session();
        let err = session.begin_recording().unwrap_err();
        assert_eq!(err.current_state, CaptureState::Recording);
    }

    #[test]
    fn append_chunk_while_idle_fails() {
        let mut session = CaptureSession::new();
        assert!(session.append_chunk(vec![1, 2]).is_err());
        assert!(session.chunks().is_empty());
    }

    #[test]
    fn chunks_keep_arrival_order() {
        let mut session = recording_session();
        session.append_chunk(vec![1]).unwrap();
        session.append_chunk(vec![2, 3]).unwrap();
        assert_eq!(session.chunks(), &[vec![1], vec![2, 3]]);
        assert_eq!(session.buffered_bytes(), 3);
    }

    #[test]
    fn flush_chunk_accepted_while_finalizing() {
        let mut session = recording_session();
        session.append_chunk(vec![1]).unwrap();
        session.begin_finalizing().unwrap();
        session.append_chunk(vec![2]).unwrap();
        assert_eq!(session.chunk_count(), 2);
    }

    #[test]
    fn complete_concatenates_chunks() {
        let mut session = recording_session();
        session.append_chunk(vec![1, 2]).unwrap();
        session.append_chunk(vec![3]).unwrap();
        session.begin_finalizing().unwrap();

        let result = session.complete(AudioMimeType::Webm, None).unwrap();
        assert_eq!(result.data(), &[1, 2, 3]);
        assert_eq!(result.filename(), "recording.webm");
        assert_eq!(session.state(), CaptureState::Completed);
        assert!(session.chunks().is_empty());
        assert_eq!(session.chunk_count(), 2);
    }

    #[test]
    fn complete_from_recording_fails() {
        let mut session = recording_session();
        let err = session.complete(AudioMimeType::Webm, None).unwrap_err();
        assert_eq!(err.current_state, CaptureState::Recording);
    }

    #[test]
    fn result_is_set_once() {
        let mut session = recording_session();
        session.append_chunk(vec![9]).unwrap();
        session.begin_finalizing().unwrap();
        session.complete(AudioMimeType::Webm, Some("a.webm")).unwrap();

        assert!(session.complete(AudioMimeType::Wav, Some("b.wav")).is_err());
        assert!(session.append_chunk(vec![0]).is_err());
        assert!(session.fail("late").is_err());

        let result = session.result().unwrap();
        assert_eq!(result.filename(), "a.webm");
        assert_eq!(result.data(), &[9]);
    }

    #[test]
    fn fail_from_idle() {
        let mut session = CaptureSession::new();
        session.fail("denied").unwrap();
        assert_eq!(session.state(), CaptureState::Failed);
        assert_eq!(session.failure(), Some("denied"));
    }

    #[test]
    fn fail_drops_buffered_chunks() {
        let mut session = recording_session();
        session.append_chunk(vec![1, 2, 3]).unwrap();
        session.fail("stream died").unwrap();
        assert!(session.chunks().is_empty());
        assert!(session.result().is_none());
    }
}
