//! Lifecycle events streamed over /ws/events

mod common;

use common::TOKEN;
use common::client::EventsClient;

#[tokio::test]
async fn snapshot_on_connect_reflects_idle_bot() {
    let (_state, _connector, addr) = common::create_test_server().await;

    let (_client, snapshot) = EventsClient::connect(addr).await;
    assert_eq!(snapshot["status"]["running"], false);
    assert_eq!(snapshot["status"]["has_token"], false);
}

#[tokio::test]
async fn start_and_stop_are_streamed() {
    let (state, _connector, addr) = common::create_test_server().await;
    let (mut client, _) = EventsClient::connect(addr).await;

    state.bot.start(TOKEN).await.unwrap();
    let starting = client.recv_event("starting").await;
    assert!(starting["session_id"].is_string());
    let connected = client.recv_event("connected").await;
    assert_eq!(connected["name"], "MockBot#0001");
    assert_eq!(connected["guilds"], 2);

    state.bot.stop().await.unwrap();
    let stopped = client.recv_event("stopped").await;
    assert_eq!(stopped["graceful"], true);
}

#[tokio::test]
async fn every_event_is_followed_by_a_snapshot() {
    let (state, _connector, addr) = common::create_test_server().await;
    let (mut client, _) = EventsClient::connect(addr).await;

    state.bot.start(TOKEN).await.unwrap();
    let first = client.recv().await;
    assert_eq!(first["type"], "event");
    let second = client.recv().await;
    assert_eq!(second["type"], "status");

    state.bot.stop().await.unwrap();
}

#[tokio::test]
async fn token_never_appears_in_stream() {
    let (state, _connector, addr) = common::create_test_server().await;
    let (mut client, _) = EventsClient::connect(addr).await;

    state.bot.start(TOKEN).await.unwrap();
    state.bot.stop().await.unwrap();

    loop {
        let message = client.recv().await;
        assert!(!message.to_string().contains(TOKEN));
        if message["type"] == "event" && message["event"]["type"] == "stopped" {
            break;
        }
    }
}
