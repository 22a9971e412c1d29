// Stop signal shared by the daemon's trigger loops

use tokio::sync::watch;

/// Read side, cloned into every trigger loop
///
/// A loop looks at it only between two cycles. A cycle that already took
/// the maintenance lock runs to the end and releases it.
#[derive(Clone)]
pub struct ShutdownToken {
    stopping: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.stopping.borrow()
    }

    /// Resolve once a stop is requested, at once if it already was
    ///
    /// A dropped sender also resolves it, so an orphaned loop cannot hang.
    pub async fn wait(&mut self) {
        let _ = self.stopping.wait_for(|stopping| *stopping).await;
    }
}

/// Write side, kept by the code that watches for Ctrl+C
pub struct ShutdownSender {
    stopping: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask every trigger loop to stop after its current cycle
    pub fn shutdown(&self) {
        self.stopping.send_replace(true);
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (stopping_tx, stopping_rx) = watch::channel(false);
    (
        ShutdownSender {
            stopping: stopping_tx,
        },
        ShutdownToken {
            stopping: stopping_rx,
        },
    )
}
