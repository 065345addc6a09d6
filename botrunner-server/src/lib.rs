//! botrunner-server - web shell for the bot lifecycle manager
//!
//! This crate wraps a shared [`botrunner_core::BotManager`] in a small axum
//! application: a control page, form endpoints that redirect back to it, a JSON
//! control API and a WebSocket that streams lifecycle events.

pub mod http;
mod state;
pub mod ws;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use botrunner_core::BotManager;
use tokio::net::TcpListener;

pub use http::create_router;
pub use state::AppState;

/// Why the web shell could not start or keep serving
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind the web shell to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed after the listener was up
    #[error("web shell on {addr} stopped serving: {source}")]
    Serve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// The botrunner web server
pub struct BotRunnerServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl BotRunnerServer {
    /// Create a server around an existing bot manager
    pub fn new(config: ServerConfig, bot: Arc<BotManager>) -> Self {
        Self::with_state(config, Arc::new(AppState::new(bot)))
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.run_with_listener(listener).await
    }

    /// Bind the configured address without serving yet
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind { addr, source: e })
    }

    /// Serve on an already bound listener until the process ends
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.run_until(listener, std::future::pending()).await
    }

    /// Serve on `listener` until `shutdown` resolves
    ///
    /// The managed bot is left as it is; callers that own the process should
    /// stop it afterwards.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map(|local| local.to_string())
            .unwrap_or_else(|_| self.config.addr());
        tracing::info!("botrunner server listening on {}", addr);

        let router = create_router(self.state);
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ServerError::Serve { addr, source })?;

        tracing::info!("botrunner server stopped");
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "127.0.0.1:5000")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
