//! Concurrency tests for BotManager
//!
//! These tests validate the single-session invariant under concurrent callers:
//! - Racing starts produce exactly one session
//! - A start racing a stop never leaves a second session behind
//! - status() stays responsive while start() is probing

use std::sync::Arc;
use std::time::Duration;

use botrunner_commands::CommandTable;
use botrunner_core::{BotManager, LifecycleError, MockConnector};

const TOKEN: &str = "MTA5ODc2NTQzMjEwOTg3NjU0.GxYzAb.abcdefghijklmnopqrstuvwxyz0123456789";

fn create_test_manager(connector: Arc<MockConnector>) -> Arc<BotManager> {
    Arc::new(BotManager::new(
        connector,
        Arc::new(CommandTable::with_builtins("!").unwrap()),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_starts_spawn_one_session() {
    let connector = Arc::new(MockConnector::new().with_handshake_delay(Duration::from_millis(20)));
    let manager = create_test_manager(connector.clone());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let m = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { m.start(TOKEN).await }));
    }

    let mut started = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => started += 1,
            Err(e) => assert_eq!(e, LifecycleError::AlreadyRunning),
        }
    }

    assert_eq!(started, 1, "exactly one start should win");
    assert_eq!(connector.connect_count(), 1);
    assert!(manager.status().running);
    manager.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stops_release_once() {
    let connector = Arc::new(MockConnector::new().with_close_delay(Duration::from_millis(50)));
    let manager = create_test_manager(connector);
    manager.start(TOKEN).await.unwrap();

    let m1 = Arc::clone(&manager);
    let m2 = Arc::clone(&manager);
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { m1.stop().await }),
        tokio::spawn(async move { m2.stop().await }),
    );
    let results = [r1.unwrap(), r2.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.contains(&Err(LifecycleError::NotRunning)));
    assert!(!manager.status().running);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn start_during_stop_sees_already_running() {
    let connector = Arc::new(MockConnector::new().with_close_delay(Duration::from_millis(200)));
    let manager = create_test_manager(connector.clone());
    manager.start(TOKEN).await.unwrap();

    let stopper = {
        let m = Arc::clone(&manager);
        tokio::spawn(async move { m.stop().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Ownership is kept until the old session is gone
    assert_eq!(manager.start(TOKEN).await, Err(LifecycleError::AlreadyRunning));
    stopper.await.unwrap().unwrap();

    manager.start(TOKEN).await.unwrap();
    assert_eq!(connector.connect_count(), 2);
    manager.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_is_not_blocked_by_probe() {
    let connector = Arc::new(MockConnector::new().hanging());
    let manager = create_test_manager(connector);

    let starter = {
        let m = Arc::clone(&manager);
        tokio::spawn(async move { m.start(TOKEN).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let begin = std::time::Instant::now();
    let status = manager.status();
    assert!(begin.elapsed() < Duration::from_millis(50));
    assert!(status.running);
    assert_eq!(status.info, None);

    assert!(!starter.await.unwrap().unwrap().handshake_complete);
    manager.stop().await.unwrap();
}
