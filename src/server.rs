use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::config::Configuration;
use crate::gate::ConnectionGate;
use crate::session::Session;

/// Pause after a failed accept (EMFILE and friends) before trying again.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop for the dreamer port.
pub struct DreamerServer {
    listener: TcpListener,
    gate: Arc<ConnectionGate>,
    secret: Arc<str>,
    idle_timeout: Option<Duration>,
}

impl DreamerServer {
    pub async fn bind(config: &Configuration) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen).await?;
        let gate = Arc::new(ConnectionGate::new(config.block_window));
        Ok(Self::new(listener, gate, config))
    }

    pub fn new(listener: TcpListener, gate: Arc<ConnectionGate>, config: &Configuration) -> Self {
        Self {
            listener,
            gate,
            secret: Arc::from(config.secret.as_str()),
            idle_timeout: config.idle_timeout,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn listen(self) -> std::io::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        loop {
            let (socket, peer) = retry_accept(|| self.listener.accept()).await;
            info!(
                "Connection r[{}] l[{}]",
                peer,
                socket
                    .local_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_default()
            );

            let ip = ConnectionGate::key(&peer);
            if self.gate.is_blocked(&ip) {
                let count = self
                    .gate
                    .entry(&ip)
                    .map(|entry| entry.count)
                    .unwrap_or_default();
                warn!("{} is blocked after {} failure(s)", ip, count);
                drop(socket);
                continue;
            }

            tokio::spawn(Self::handle_connection(
                socket,
                ip,
                self.secret.clone(),
                self.gate.clone(),
                self.idle_timeout,
            ));
        }
    }

    async fn handle_connection(
        socket: TcpStream,
        ip: String,
        secret: Arc<str>,
        gate: Arc<ConnectionGate>,
        idle_timeout: Option<Duration>,
    ) {
        let session =
            Session::new(socket, ip.clone(), secret, gate).with_idle_timeout(idle_timeout);

        match session.run().await {
            Ok(end) => info!("{} session ended: {:?}", ip, end),
            Err(e) => error!("{} session failed: {}", ip, e),
        }
    }
}

/// Keeps calling `accept` until it succeeds; accept errors never end the loop.
async fn retry_accept<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                error!("accept failed: {}", e);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
