//! Start/stop/status scenarios against a scripted gateway

use std::sync::Arc;
use std::time::Duration;

use botrunner_commands::{CommandTable, UserProfile};
use botrunner_core::gateway::mock::{ApiCall, guild_message};
use botrunner_core::{
    BotIdentity, BotManager, BotPhase, BotToken, Connection, Connector, GatewayError,
    GatewayEvent, LifecycleError, ManagerConfig, MockConnector, Stopped,
};

const TOKEN: &str = "MTA5ODc2NTQzMjEwOTg3NjU0.GxYzAb.abcdefghijklmnopqrstuvwxyz0123456789";

fn manager_with(connector: Arc<MockConnector>) -> BotManager {
    BotManager::new(connector, Arc::new(CommandTable::with_builtins("!").unwrap()))
}

async fn wait_until_not_running(manager: &BotManager) {
    for _ in 0..200 {
        if !manager.status().running {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("bot still running: {:?}", manager.status());
}

#[tokio::test]
async fn short_token_is_rejected_without_spawning() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());

    assert_eq!(manager.start("short").await, Err(LifecycleError::InvalidToken));
    let status = manager.status();
    assert!(!status.running);
    assert!(!status.has_token);
    assert_eq!(connector.connect_count(), 0);
}

#[tokio::test]
async fn stop_on_idle_manager_is_not_running() {
    let manager = manager_with(Arc::new(MockConnector::new()));
    let before = manager.status();

    assert_eq!(manager.stop().await, Err(LifecycleError::NotRunning));
    assert_eq!(manager.stop().await, Err(LifecycleError::NotRunning));
    assert_eq!(manager.status(), before);
}

#[tokio::test]
async fn second_start_is_already_running() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());

    let first = manager.start(TOKEN).await.unwrap();
    assert_eq!(manager.start(TOKEN).await, Err(LifecycleError::AlreadyRunning));

    assert_eq!(connector.connect_count(), 1);
    assert_eq!(manager.session_id(), Some(first.session_id));
    assert!(manager.status().running);
}

#[tokio::test(start_paused = true)]
async fn pending_handshake_runs_past_probe_then_stops() {
    let connector = Arc::new(MockConnector::new().hanging());
    let manager = manager_with(connector);

    let started = manager.start(TOKEN).await.unwrap();
    assert!(!started.handshake_complete);

    // Alive but not yet authenticated: running with no identity
    let status = manager.status();
    assert!(status.running);
    assert!(status.has_token);
    assert_eq!(status.info, None);
    assert_eq!(status.phase, BotPhase::Starting);

    assert_eq!(manager.stop().await, Ok(Stopped { graceful: true }));
    let status = manager.status();
    assert!(!status.running);
    assert!(!status.has_token);
    assert_eq!(status.info, None);
}

#[tokio::test]
async fn stop_right_after_start_clears_everything() {
    let manager = manager_with(Arc::new(MockConnector::new()));
    manager.start(TOKEN).await.unwrap();
    manager.stop().await.unwrap();

    let status = manager.status();
    assert!(!status.running);
    assert_eq!(status.info, None);
    assert!(!status.has_token);
    assert_eq!(status.phase, BotPhase::Idle);
    assert!(manager.session_id().is_none());
}

#[tokio::test(start_paused = true)]
async fn rejected_handshake_is_connect_failed() {
    let connector = Arc::new(
        MockConnector::new()
            .with_handshake_delay(Duration::from_millis(300))
            .failing(GatewayError::AuthenticationFailed),
    );
    let manager = manager_with(connector);

    let err = manager.start(TOKEN).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ConnectFailed(_)));
    assert_eq!(err.code(), "connect_failed");

    let status = manager.status();
    assert!(!status.running);
    assert!(!status.has_token);
    assert!(status.last_error.unwrap().starts_with("Failed to start bot"));

    // Nothing left to stop
    assert_eq!(manager.stop().await, Err(LifecycleError::NotRunning));
}

#[tokio::test(start_paused = true)]
async fn slow_stop_is_abandoned_after_timeout() {
    let connector = Arc::new(MockConnector::new().with_close_delay(Duration::from_secs(60)));
    let manager = manager_with(connector);
    manager.start(TOKEN).await.unwrap();

    let stopped = manager.stop().await.unwrap();
    assert!(!stopped.graceful);
    let status = manager.status();
    assert!(!status.running);
    assert!(!status.has_token);
}

#[tokio::test]
async fn unexpected_disconnect_keeps_token_until_stop() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());
    manager.start(TOKEN).await.unwrap();

    connector.drop_connection();
    wait_until_not_running(&manager).await;

    let status = manager.status();
    assert_eq!(status.info, None);
    assert!(status.has_token);
    assert_eq!(status.phase, BotPhase::Idle);
    assert!(status.last_error.unwrap().starts_with("Bot disconnected unexpectedly"));

    assert_eq!(manager.stop().await, Ok(Stopped { graceful: true }));
    assert!(!manager.status().has_token);
    assert_eq!(manager.stop().await, Err(LifecycleError::NotRunning));
}

#[tokio::test]
async fn restart_after_disconnect_uses_fresh_session() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());
    let first = manager.start(TOKEN).await.unwrap();

    connector.fail_connection(GatewayError::Zombied);
    wait_until_not_running(&manager).await;

    let second = manager.start(TOKEN).await.unwrap();
    assert_ne!(first.session_id, second.session_id);
    assert_eq!(connector.connect_count(), 2);
    assert!(manager.status().running);
    assert_eq!(manager.status().last_error, None);
}

#[tokio::test]
async fn manager_is_reusable_across_cycles() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());

    for _ in 0..3 {
        manager.start(TOKEN).await.unwrap();
        assert!(manager.status().running);
        manager.stop().await.unwrap();
        assert!(!manager.status().running);
    }
    assert_eq!(connector.connect_count(), 3);
}

#[tokio::test]
async fn unknown_command_gets_standard_reply() {
    let connector = Arc::new(MockConnector::new());
    let manager = manager_with(connector.clone());
    manager.start(TOKEN).await.unwrap();

    connector.inject(GatewayEvent::Message(guild_message(
        UserProfile::new("88", "carol"),
        "!teleport mars",
    )));

    let calls = connector.api().wait_for_calls(1, Duration::from_secs(2)).await;
    let Some(ApiCall::Send { channel_id, reply }) = calls.first() else {
        panic!("expected a reply, got {:?}", calls);
    };
    assert_eq!(channel_id, "500");
    let embed = reply.embed.as_ref().unwrap();
    assert_eq!(embed.title.as_deref(), Some("❌ Command Not Found"));

    // The session survives and keeps serving
    assert!(manager.status().running);
    manager.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn long_timer_does_not_block_other_commands() {
    let connector = Arc::new(MockConnector::new());
    let manager = BotManager::with_config(
        connector.clone(),
        Arc::new(CommandTable::with_builtins("!").unwrap()),
        ManagerConfig::default(),
    );
    manager.start(TOKEN).await.unwrap();
    let api = connector.api();

    connector.inject(GatewayEvent::Message(guild_message(
        UserProfile::new("88", "carol"),
        "!timer 600",
    )));
    connector.inject(GatewayEvent::Message(guild_message(
        UserProfile::new("99", "dave"),
        "!ping",
    )));

    let calls = api.wait_for_calls(2, Duration::from_secs(5)).await;
    assert_eq!(calls.len(), 2, "timer start and ping reply expected: {:?}", calls);
    let titles: Vec<_> = api
        .sent()
        .iter()
        .filter_map(|r| r.embed.as_ref().and_then(|e| e.title.clone()))
        .collect();
    assert!(titles.iter().any(|t| t == "🏓 Pong!"), "titles: {:?}", titles);

    manager.stop().await.unwrap();
}

/// Connector whose handshake outlives the start probe and then panics
struct PanicsAfterProbe;

#[async_trait::async_trait]
impl Connector for PanicsAfterProbe {
    async fn connect(
        &self,
        _token: &BotToken,
    ) -> Result<(Box<dyn Connection>, BotIdentity), GatewayError> {
        tokio::time::sleep(Duration::from_secs(3)).await;
        panic!("gateway handshake blew up");
    }
}

#[tokio::test(start_paused = true)]
async fn crashed_session_task_is_released() {
    let manager = BotManager::new(
        Arc::new(PanicsAfterProbe),
        Arc::new(CommandTable::with_builtins("!").unwrap()),
    );

    let started = manager.start(TOKEN).await.unwrap();
    assert!(!started.handshake_complete);
    assert!(manager.status().running);

    // Past the handshake delay; the task unwinds without reporting back
    tokio::time::sleep(Duration::from_secs(5)).await;

    let status = manager.status();
    assert!(!status.running);
    assert_eq!(status.phase, BotPhase::Idle);
    assert_eq!(status.info, None);
    assert!(status.has_token);
    assert!(status.last_error.unwrap().contains("session task ended"));

    assert_eq!(manager.stop().await, Ok(Stopped { graceful: true }));
    assert!(!manager.status().has_token);
    assert_eq!(manager.stop().await, Err(LifecycleError::NotRunning));
}
