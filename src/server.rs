//! TCP server for handling WebSocket echo connections.
//!
//! Binds the listening socket, accepts connections and hands each one to
//! its own task running the echo handler.

use crate::config::Config;
use crate::echo;
use crate::error::{Error, Result};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, trace};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Server instance
#[derive(Debug)]
pub struct Server {
    config: Config,
    listener: TcpListener,
    local_addr: SocketAddr,
    connection_limit: Arc<Semaphore>,
}

impl Server {
    /// Bind the listening socket described by `config`.
    ///
    /// Fails with [`Error::Bind`] when the port is taken or not permitted.
    pub async fn bind(config: Config) -> Result<Self> {
        let listen = config.listen_addr();
        let addr = tokio::net::lookup_host(listen.as_str())
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| Error::InvalidAddress(listen.clone()))?;

        let listener = create_listener(addr, config.backlog)
            .and_then(TcpListener::from_std)
            .map_err(|source| Error::Bind {
                addr: listen.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        debug!(address = %local_addr, "Listener bound");

        Ok(Server {
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            config,
            listener,
            local_addr,
        })
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already being served are left to finish on their own.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(address = %self.local_addr, "server is listening");

        loop {
            // Wait for a connection slot
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = Arc::clone(&self.connection_limit).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let accepted = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    debug!(peer = %peer, "New connection");

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %peer, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let ws_config = echo::websocket_config(
                        self.config.max_message_size,
                        self.config.max_frame_size,
                    );

                    tokio::spawn(async move {
                        if let Err(e) = echo::handle_connection(stream, peer, ws_config).await {
                            if e.is_disconnect() {
                                trace!(peer = %peer, error = %e, "Peer went away");
                            } else {
                                debug!(peer = %peer, error = %e, "Connection error");
                            }
                        }
                        drop(permit);
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    drop(permit);
                    if let Some(pause) = accept_backoff(&e) {
                        tokio::select! {
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(pause) => {}
                        }
                    }
                }
            }
        }

        info!(address = %self.local_addr, "Server stopped");
        Ok(())
    }
}

/// How long to wait before accepting again after `err`.
///
/// Errors tied to one aborted handshake are retried at once; anything else
/// (fd or memory exhaustion) is likely to repeat and gets a pause.
fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted => None,
        _ => Some(ACCEPT_ERROR_BACKOFF),
    }
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Create a non-blocking TCP listener.
///
/// SO_REUSEPORT stays off so a second instance on the same port fails to bind.
fn create_listener(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(socket.into())
}
