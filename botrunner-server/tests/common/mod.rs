//! Shared test utilities for botrunner-server integration tests

pub mod client;

use std::net::SocketAddr;
use std::sync::Arc;

use botrunner_commands::CommandTable;
use botrunner_core::{BotManager, MockConnector};
use botrunner_server::{AppState, BotRunnerServer, ServerConfig};
use tokio::net::TcpListener;

#[allow(dead_code)]
pub const TOKEN: &str = "MTA5ODc2NTQzMjEwOTg3NjU0.GxYzAb.abcdefghijklmnopqrstuvwxyz0123456789";

/// Creates a test server backed by a scripted gateway
#[allow(dead_code)]
pub async fn create_test_server() -> (Arc<AppState>, Arc<MockConnector>, SocketAddr) {
    create_test_server_with(MockConnector::new()).await
}

/// Creates a test server around a custom scripted gateway
pub async fn create_test_server_with(
    connector: MockConnector,
) -> (Arc<AppState>, Arc<MockConnector>, SocketAddr) {
    let connector = Arc::new(connector);
    let commands = Arc::new(CommandTable::with_builtins("!").unwrap());
    let bot = Arc::new(BotManager::new(connector.clone(), commands));
    let state = Arc::new(AppState::new(bot));

    let server = BotRunnerServer::with_state(ServerConfig::default(), Arc::clone(&state));
    let addr = spawn_server(server).await;

    (state, connector, addr)
}

/// Spawns server in background task, returns bound address
async fn spawn_server(server: BotRunnerServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}
