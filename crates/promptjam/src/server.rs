//! `PromptJamServer` builder and server loop.
//!
//! This is the entry point for running a PromptJam server. It ties
//! together all the layers: gateway → protocol → registry → rooms.

use std::sync::Arc;

use promptjam_gateway::{Gateway, WebSocketGateway};
use promptjam_judge::Judge;
use promptjam_protocol::JsonCodec;
use promptjam_room::{LevelCatalog, RoomConfig, RoomRegistry, RoomSignal};
use tokio::sync::{mpsc, Mutex};

use crate::handler::handle_connection;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry sits behind a `Mutex`; room actors run unlocked in their own
/// tasks, so the lock only covers bookkeeping, never gameplay.
pub(crate) struct ServerState<J: Judge> {
    pub(crate) registry: Mutex<RoomRegistry<J>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a PromptJam server.
///
/// # Example
///
/// ```rust,ignore
/// let server = PromptJamServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(catalog, judge)
///     .await?;
/// server.run().await
/// ```
pub struct PromptJamServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl PromptJamServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds and starts the server with the given level catalog and
    /// judge.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind.
    pub async fn build<J: Judge>(
        self,
        catalog: Arc<LevelCatalog>,
        judge: J,
    ) -> Result<PromptJamServer<J>, ServerError> {
        let gateway = WebSocketGateway::bind(&self.bind_addr).await?;

        let (registry, signals) =
            RoomRegistry::new(catalog, Arc::new(judge), self.room_config);
        let state = Arc::new(ServerState {
            registry: Mutex::new(registry),
            codec: JsonCodec,
        });

        Ok(PromptJamServer {
            gateway,
            state,
            signals,
        })
    }
}

impl Default for PromptJamServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running PromptJam server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PromptJamServer<J: Judge> {
    gateway: WebSocketGateway,
    state: Arc<ServerState<J>>,
    signals: mpsc::UnboundedReceiver<RoomSignal>,
}

impl<J: Judge> PromptJamServer<J> {
    /// Creates a new builder.
    pub fn builder() -> PromptJamServerBuilder {
        PromptJamServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    ///
    /// # Errors
    /// Returns an error if the listener socket is gone.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.gateway.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each,
    /// plus one task draining room signals. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("PromptJam server running");

        // Room actors can't call into the registry themselves (the
        // registry may be locked by the very call awaiting them), so
        // their signals loop through this task.
        let state = Arc::clone(&self.state);
        let mut signals = self.signals;
        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                let mut registry = state.registry.lock().await;
                match signal {
                    RoomSignal::ListingChanged => {
                        registry.broadcast_lists().await;
                    }
                    RoomSignal::Expired(room_id) => {
                        registry.delete_room(room_id).await;
                    }
                }
            }
        });

        loop {
            match self.gateway.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
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
