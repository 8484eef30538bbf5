//! Cooperative shutdown flag. The signal handler only sets the flag; the
//! monitor loop observes it at the top of each cycle and during the interval
//! sleep — never mid-dispatch.

use tokio::sync::watch;

/// Clonable shutdown signal backed by a watch channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Request shutdown. Idempotent.
    pub fn request(&self) {
        self.tx.send(true).ok();
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested. Used inside `select!` to
    /// make the interval sleep interruptible.
    pub async fn recv(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        // Sender lives inside self, so changed() only errs if self is gone.
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
