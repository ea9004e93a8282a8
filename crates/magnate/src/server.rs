//! `MagnateServer` builder and accept loop.
//!
//! Ties the layers together: transport → session gateway → engine. Each
//! accepted connection gets its own handler task; all game state lives
//! behind the gateway.

use std::sync::Arc;

use magnate_engine::{MatchHistory, TraceHistory};
use magnate_session::{Gateway, GatewayConfig};
use magnate_transport::WsListener;

use crate::MagnateError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use magnate::MagnateServer;
///
/// # async fn run() -> Result<(), magnate::MagnateError> {
/// let server = MagnateServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct MagnateServerBuilder {
    bind_addr: String,
    config: GatewayConfig,
    history: Arc<dyn MatchHistory>,
}

impl MagnateServerBuilder {
    /// A builder with defaults: localhost, default gateway tunables, and
    /// match history logged through `tracing`.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            config: GatewayConfig::default(),
            history: Arc::new(TraceHistory),
        }
    }

    /// Sets the address to listen on.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the gateway configuration.
    pub fn gateway_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Plugs in a match-history collaborator.
    pub fn history(mut self, history: Arc<dyn MatchHistory>) -> Self {
        self.history = history;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<MagnateServer, MagnateError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let gateway = Gateway::new(self.config, self.history);
        Ok(MagnateServer { listener, gateway })
    }
}

impl Default for MagnateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound, ready-to-run game server.
pub struct MagnateServer {
    listener: WsListener,
    gateway: Arc<Gateway>,
}

impl MagnateServer {
    /// Starts a builder.
    pub fn builder() -> MagnateServerBuilder {
        MagnateServerBuilder::new()
    }

    /// The bound local address.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), MagnateError> {
        let _sweeper = self.gateway.spawn_sweeper();
        tracing::info!("Magnate server running");

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let gateway = Arc::clone(&self.gateway);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, gateway).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
