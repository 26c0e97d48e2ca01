//! Read-aloud narration on top of a [`Speech`] engine.
//!
//! Only one narration runs at a time: a new request aborts the one in
//! flight. Each narration is bounded by a timeout after which the engine is
//! cancelled and the narration counts as finished, so a speech engine that
//! never reports completion cannot hang the reader.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::Speech;

pub struct Narrator {
    speech: Arc<dyn Speech>,
    timeout: Duration,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl Narrator {
    pub fn new(speech: Arc<dyn Speech>, timeout: Duration) -> Self {
        Self {
            speech,
            timeout,
            in_flight: Mutex::new(None),
        }
    }

    /// Start narrating `text` in the background, replacing any narration in flight.
    ///
    /// The returned receiver resolves when this narration ends, whether it
    /// finished, failed, timed out or was replaced. Returns `None` when called
    /// outside a tokio runtime; nothing is spoken then.
    pub fn narrate(&self, text: impl Into<String>) -> Option<oneshot::Receiver<()>> {
        let Ok(runtime) = Handle::try_current() else {
            log::warn!("Narration skipped: no async runtime");
            return None;
        };

        self.stop();

        let speech = Arc::clone(&self.speech);
        let text = text.into();
        let limit = self.timeout;
        let (done_tx, done_rx) = oneshot::channel();
        let task = runtime.spawn(async move {
            speak_bounded(speech, text, limit).await;
            let _ = done_tx.send(());
        });

        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
        Some(done_rx)
    }

    /// Narrate `text` and wait until it finishes, fails, times out or is replaced.
    pub async fn speak(&self, text: impl Into<String>) {
        if let Some(done) = self.narrate(text) {
            // A replaced narration drops its sender, which also ends the wait
            let _ = done.await;
        }
    }

    /// Abort the narration in flight, if any.
    pub fn stop(&self) {
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(task) = previous {
            if !task.is_finished() {
                log::debug!("Narration replaced");
                task.abort();
                self.speech.cancel();
            }
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Narrator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("timeout", &self.timeout)
            .field("speaking", &self.is_speaking())
            .finish()
    }
}

async fn speak_bounded(speech: Arc<dyn Speech>, text: String, limit: Duration) {
    match tokio::time::timeout(limit, speech.speak(&text)).await {
        Ok(Ok(())) => log::debug!("Narration finished"),
        Ok(Err(e)) => log::warn!("Narration failed: {e}"),
        Err(_) => {
            log::warn!("Narration timed out after {limit:?}");
            speech.cancel();
        }
    }
}
