//! Audio capture use case
//!
//! Drives one microphone stream at a time through
//! `Idle -> Recording -> Finalizing -> Completed` (or `Failed`) and hands
//! back the assembled payload.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::ports::{CaptureError, GrantedStream, Microphone, MicrophoneStream, StreamEvent};
use crate::domain::audio::CapturedAudio;
use crate::domain::capture::{CaptureSession, CaptureState};

/// Callback invoked with the new state after every transition
pub type StateObserver = Arc<dyn Fn(CaptureState) + Send + Sync>;

/// Options for payload assembly
#[derive(Debug, Clone, Default)]
pub struct CaptureOptions {
    /// Filename for the payload; `recording.<ext>` when absent
    pub filename: Option<String>,
}

/// Result of `start()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new session is recording
    Started,
    /// A session was already recording; nothing changed
    AlreadyRecording,
}

/// Holds the stream control handle; dropping it stops every track.
struct DeviceGuard {
    control: Box<dyn MicrophoneStream>,
}

impl DeviceGuard {
    fn request_finalize(&mut self) {
        self.control.request_finalize();
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.control.stop_tracks();
        debug!("Microphone tracks stopped");
    }
}

struct LiveStream {
    events: mpsc::UnboundedReceiver<StreamEvent>,
    device: DeviceGuard,
    /// `Closed` already seen; nothing more will arrive
    closed: bool,
}

impl From<GrantedStream> for LiveStream {
    fn from(granted: GrantedStream) -> Self {
        Self {
            events: granted.events,
            device: DeviceGuard {
                control: granted.control,
            },
            closed: false,
        }
    }
}

/// Microphone capture state machine
pub struct AudioCapture<M: Microphone> {
    microphone: M,
    options: CaptureOptions,
    session: Option<CaptureSession>,
    live: Option<LiveStream>,
    last_result: Option<CapturedAudio>,
    observers: Vec<StateObserver>,
}

impl<M: Microphone> AudioCapture<M> {
    pub fn new(microphone: M) -> Self {
        Self::with_options(microphone, CaptureOptions::default())
    }

    pub fn with_options(microphone: M, options: CaptureOptions) -> Self {
        Self {
            microphone,
            options,
            session: None,
            live: None,
            last_result: None,
            observers: Vec::new(),
        }
    }

    /// Register a state observer
    pub fn on_state_change(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    /// State of the current session, `Idle` before the first start
    pub fn state(&self) -> CaptureState {
        self.session
            .as_ref()
            .map(CaptureSession::state)
            .unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        self.state() == CaptureState::Recording
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    /// Payload of the most recent completed session
    pub fn last_result(&self) -> Option<&CapturedAudio> {
        self.last_result.as_ref()
    }

    /// Start a new session.
    ///
    /// While a session is recording this only warns; the device is not
    /// requested a second time.
    pub async fn start(&mut self) -> Result<StartOutcome, CaptureError> {
        if self.is_recording() {
            warn!("Recording is already in progress");
            return Ok(StartOutcome::AlreadyRecording);
        }

        // release anything still held by the previous session
        self.live = None;
        let mut session = CaptureSession::new();

        match self.microphone.request_access().await {
            Ok(granted) => {
                session.begin_recording()?;
                self.live = Some(LiveStream::from(granted));
                self.session = Some(session);
                info!("Recording started");
                notify(&self.observers, CaptureState::Recording);
                Ok(StartOutcome::Started)
            }
            Err(e) => {
                warn!("Microphone access failed: {}", e);
                session.fail(e.to_string())?;
                self.session = Some(session);
                notify(&self.observers, CaptureState::Failed);
                Err(e)
            }
        }
    }

    /// Finalize the recording and return its payload.
    ///
    /// Waits until the platform has flushed its last chunk and confirmed
    /// the stream closed. Returns `Ok(None)` when nothing is recording.
    pub async fn stop(&mut self) -> Result<Option<CapturedAudio>, CaptureError> {
        if !self.is_recording() {
            debug!("Recording is not active");
            return Ok(None);
        }
        let (Some(session), Some(mut live)) = (self.session.as_mut(), self.live.take()) else {
            return Ok(None);
        };

        session.begin_finalizing()?;
        notify(&self.observers, CaptureState::Finalizing);
        live.device.request_finalize();

        while !live.closed {
            let Some(event) = live.events.recv().await else {
                break;
            };
            match event {
                StreamEvent::Chunk(bytes) => session.append_chunk(bytes)?,
                StreamEvent::Failed(reason) => {
                    drop(live);
                    session.fail(reason.clone())?;
                    warn!("Audio stream failed while finalizing: {}", reason);
                    notify(&self.observers, CaptureState::Failed);
                    return Err(CaptureError::StreamFailed(reason));
                }
                StreamEvent::Closed => live.closed = true,
            }
        }
        drop(live);

        let container = self.microphone.container();
        let payload = session
            .complete(container, self.options.filename.as_deref())?
            .clone();
        info!(
            "Recording complete: {} chunks, {} ({})",
            session.chunk_count(),
            payload.audio().human_readable_size(),
            payload.filename()
        );
        self.last_result = Some(payload.clone());
        notify(&self.observers, CaptureState::Completed);

        Ok(Some(payload))
    }

    /// Move chunks that have already arrived into the session without
    /// waiting. Returns how many were moved.
    pub fn drain_pending(&mut self) -> Result<usize, CaptureError> {
        let (Some(session), Some(live)) = (self.session.as_mut(), self.live.as_mut()) else {
            return Ok(0);
        };
        if !session.is_recording() {
            return Ok(0);
        }

        let mut moved = 0;
        loop {
            match live.events.try_recv() {
                Ok(StreamEvent::Chunk(bytes)) => {
                    session.append_chunk(bytes)?;
                    moved += 1;
                }
                Ok(StreamEvent::Failed(reason)) => {
                    self.live = None;
                    session.fail(reason.clone())?;
                    warn!("Audio stream failed while recording: {}", reason);
                    notify(&self.observers, CaptureState::Failed);
                    return Err(CaptureError::StreamFailed(reason));
                }
                Ok(StreamEvent::Closed) => {
                    debug!("Stream closed before stop was requested");
                    live.closed = true;
                    break;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(moved)
    }
}

fn notify(observers: &[StateObserver], state: CaptureState) {
    for observer in observers {
        observer(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioMimeType;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Grants a stream that already holds `chunks` and closes on finalize
    struct PrefilledMicrophone {
        chunks: Vec<Vec<u8>>,
    }

    struct ClosingStream {
        tx: Option<mpsc::UnboundedSender<StreamEvent>>,
    }

    impl MicrophoneStream for ClosingStream {
        fn request_finalize(&mut self) {
            if let Some(tx) = self.tx.take() {
                let _ = tx.send(StreamEvent::Closed);
            }
        }

        fn stop_tracks(&mut self) {
            self.tx = None;
        }
    }

    #[async_trait]
    impl Microphone for PrefilledMicrophone {
        async fn request_access(&self) -> Result<GrantedStream, CaptureError> {
            let (tx, rx) = mpsc::unbounded_channel();
            for chunk in &self.chunks {
                tx.send(StreamEvent::Chunk(chunk.clone())).unwrap();
            }
            Ok(GrantedStream::new(rx, ClosingStream { tx: Some(tx) }))
        }

        fn container(&self) -> AudioMimeType {
            AudioMimeType::Webm
        }
    }

    fn capture(chunks: Vec<Vec<u8>>) -> AudioCapture<PrefilledMicrophone> {
        AudioCapture::new(PrefilledMicrophone { chunks })
    }

    #[tokio::test]
    async fn observers_see_every_transition() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut capture = capture(vec![vec![1, 2]]);
        capture.on_state_change(Arc::new(move |state| sink.lock().unwrap().push(state)));

        capture.start().await.unwrap();
        capture.stop().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                CaptureState::Recording,
                CaptureState::Finalizing,
                CaptureState::Completed
            ]
        );
    }

    #[tokio::test]
    async fn drain_pending_moves_arrived_chunks() {
        let mut capture = capture(vec![vec![1], vec![2, 3]]);
        capture.start().await.unwrap();

        assert_eq!(capture.drain_pending().unwrap(), 2);
        assert_eq!(capture.session().unwrap().buffered_bytes(), 3);
        assert_eq!(capture.drain_pending().unwrap(), 0);

        let payload = capture.stop().await.unwrap().unwrap();
        assert_eq!(payload.data(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn drain_pending_without_session_is_zero() {
        let mut capture = capture(vec![]);
        assert_eq!(capture.drain_pending().unwrap(), 0);
    }

    #[tokio::test]
    async fn filename_option_overrides_default() {
        let mut capture = AudioCapture::with_options(
            PrefilledMicrophone { chunks: vec![vec![5]] },
            CaptureOptions {
                filename: Some("memo.webm".to_string()),
            },
        );
        capture.start().await.unwrap();
        let payload = capture.stop().await.unwrap().unwrap();
        assert_eq!(payload.filename(), "memo.webm");
    }

    #[tokio::test]
    async fn restart_after_completion_opens_new_session() {
        let mut capture = capture(vec![vec![1]]);
        capture.start().await.unwrap();
        capture.stop().await.unwrap();

        assert_eq!(capture.start().await.unwrap(), StartOutcome::Started);
        assert_eq!(capture.state(), CaptureState::Recording);
        assert_eq!(capture.session().unwrap().chunk_count(), 0);
        assert!(capture.last_result().is_some());
    }
}
