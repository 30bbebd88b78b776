//! Stop triggers for a live recording

use std::future::Future;
use std::io::BufRead;

use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What ended the recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// Enter pressed on the terminal
    Enter,
    /// Ctrl+C
    Interrupt,
}

/// Waits for Enter on stdin or Ctrl+C, whichever comes first.
///
/// When stdin is closed (piped, detached) only Ctrl+C stops the recording.
pub struct StopTrigger {
    enter: oneshot::Receiver<()>,
}

impl StopTrigger {
    /// Start listening on stdin
    pub fn listen() -> Self {
        let (tx, rx) = oneshot::channel();

        // a detached thread, so a pending read never holds up runtime shutdown
        std::thread::spawn(move || {
            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(n) if n > 0 => {
                    let _ = tx.send(());
                }
                _ => debug!("stdin closed; waiting for Ctrl+C only"),
            }
        });

        Self { enter: rx }
    }

    /// Resolve once a stop was requested
    pub async fn wait(self) -> StopRequest {
        let enter = async {
            if self.enter.await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = enter => StopRequest::Enter,
            _ = ctrl_c() => StopRequest::Interrupt,
        }
    }
}

/// Ctrl+C arrived before the work finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Run `work` to completion unless Ctrl+C comes first.
///
/// Once a Ctrl+C listener is installed the default SIGINT action no longer
/// applies, so every await after the recording loop goes through here.
pub async fn interruptible<F: Future>(work: F) -> Result<F::Output, Interrupted> {
    race_interrupt(work, ctrl_c()).await
}

async fn race_interrupt<F, I>(work: F, interrupt: I) -> Result<F::Output, Interrupted>
where
    F: Future,
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        output = work => Ok(output),
        _ = interrupt => Err(Interrupted),
    }
}

/// Resolves on Ctrl+C; never resolves if no handler can be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
