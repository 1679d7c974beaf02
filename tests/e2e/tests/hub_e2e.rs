//! End-to-end hub tests over a real socket.

use pulse_e2e_tests::{start_test_hub, WsClient};
use pulse_hub::SignalStore;
use serde_json::json;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const QUIET_TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn connect_subscribe_and_receive_status() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    let mut client = WsClient::connect(harness.addr).await;

    let greeting = client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    assert_eq!(greeting["data"]["message"], "connected");

    client
        .send(json!({"type": "subscribe", "symbols": ["AAPL"]}))
        .await;
    let reply = client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    assert!(reply["data"]["message"]
        .as_str()
        .unwrap()
        .contains("subscribed to 1"));

    harness.hub.stop().await;
}

#[tokio::test]
async fn broadcast_respects_symbol_subscription() {
    let harness = start_test_hub(&["AAPL", "TSLA"], 82.0).await;

    let mut aapl_client = WsClient::connect(harness.addr).await;
    aapl_client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    aapl_client
        .send(json!({"type": "subscribe", "symbols": ["AAPL"]}))
        .await;
    aapl_client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();

    harness.hub.run_generation_cycle().await;

    // The subscribed client sees its AAPL signal...
    let message = aapl_client.wait_for_kind("signal", RECV_TIMEOUT).await.unwrap();
    assert_eq!(message["data"]["symbol"], "AAPL");

    // ...and never a TSLA one, even though the hub generated it.
    while let Some(extra) = aapl_client.next_json(QUIET_TIMEOUT).await {
        if extra["type"] == "signal" {
            assert_eq!(extra["data"]["symbol"], "AAPL");
        }
    }

    let persisted = harness.store.recent_signals(10).await.unwrap();
    assert!(persisted.iter().any(|s| s.symbol == "TSLA"));

    harness.hub.stop().await;
}

#[tokio::test]
async fn broadcast_respects_min_confidence_filter() {
    // Generator produces 60%-confidence alerts; the filtered client wants 80+.
    let harness = start_test_hub(&["AAPL"], 60.0).await;

    let mut picky = WsClient::connect(harness.addr).await;
    picky.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    picky.send(json!({"type": "filter", "min_confidence": 80.0})).await;
    picky.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();

    let mut lenient = WsClient::connect(harness.addr).await;
    lenient.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();

    harness.hub.run_generation_cycle().await;

    // The unfiltered client receives the alert envelope.
    let message = lenient.wait_for_kind("alert", RECV_TIMEOUT).await.unwrap();
    assert_eq!(message["data"]["symbol"], "AAPL");

    // The filtered client stays quiet.
    while let Some(extra) = picky.next_json(QUIET_TIMEOUT).await {
        assert_ne!(extra["type"], "alert");
        assert_ne!(extra["type"], "signal");
    }

    harness.hub.stop().await;
}

#[tokio::test]
async fn request_signals_replays_active_history() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    harness.hub.run_generation_cycle().await;

    let mut client = WsClient::connect(harness.addr).await;
    client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    client.send(json!({"type": "request_signals"})).await;

    let message = client.wait_for_kind("signal", RECV_TIMEOUT).await.unwrap();
    assert_eq!(message["data"]["symbol"], "AAPL");
    assert_eq!(message["data"]["is_active"], true);

    harness.hub.stop().await;
}

#[tokio::test]
async fn on_demand_prediction_round_trip() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    let mut client = WsClient::connect(harness.addr).await;
    client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();

    client
        .send(json!({"type": "generate_prediction", "symbol": "AAPL", "horizon_days": 5}))
        .await;
    let message = client.wait_for_kind("prediction", RECV_TIMEOUT).await.unwrap();
    assert_eq!(message["data"]["symbol"], "AAPL");
    assert_eq!(message["data"]["prediction"]["direction"], "up");

    harness.hub.stop().await;
}

#[tokio::test]
async fn second_start_is_a_noop_and_clients_still_connect() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    let again = harness.hub.start().await.unwrap();
    assert_eq!(again, harness.addr);

    let mut client = WsClient::connect(harness.addr).await;
    assert!(client.wait_for_kind("status", RECV_TIMEOUT).await.is_some());

    harness.hub.stop().await;
}

#[tokio::test]
async fn stop_closes_connected_clients() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    let mut client = WsClient::connect(harness.addr).await;
    client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();

    harness.hub.stop().await;
    assert!(client.expect_close(RECV_TIMEOUT).await);
}

#[tokio::test]
async fn watchlist_message_extends_generation_set() {
    let harness = start_test_hub(&["AAPL"], 82.0).await;
    pulse_e2e_tests::seed_bars(&harness.store, &["NVDA"]).await;

    let mut client = WsClient::connect(harness.addr).await;
    client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    client
        .send(json!({"type": "watchlist", "symbols": ["NVDA"]}))
        .await;
    let reply = client.wait_for_kind("status", RECV_TIMEOUT).await.unwrap();
    assert!(reply["data"]["message"]
        .as_str()
        .unwrap()
        .contains("watch-list now 2"));

    harness.hub.run_generation_cycle().await;
    let persisted = harness.store.recent_signals(10).await.unwrap();
    assert!(persisted.iter().any(|s| s.symbol == "NVDA"));

    harness.hub.stop().await;
}
