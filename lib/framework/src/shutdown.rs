use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;
use tracing::warn;

/// Broadcasts a single shutdown signal to every subscriber on ctrl-c or SIGTERM.
pub struct Shutdown {
    sender: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Shutdown { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    pub fn listen(self) {
        tokio::spawn(async move {
            wait_for_signal().await;
            info!("received shutdown signal");
            if self.sender.send(()).is_err() {
                warn!("no subscriber to receive shutdown signal");
            }
        });
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut terminate = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(err) => {
            warn!("failed to listen to SIGTERM, error={err}");
            if let Err(err) = signal::ctrl_c().await {
                warn!("failed to listen to ctrl-c, error={err}");
            }
            return;
        }
    };
    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                warn!("failed to listen to ctrl-c, error={err}");
            }
        }
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!("failed to listen to ctrl-c, error={err}");
    }
}
