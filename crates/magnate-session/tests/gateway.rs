//! Integration tests for the gateway: dispatch, rate limiting at the
//! boundary, and the grace-window teardown.
//!
//! Timer behavior runs under `start_paused` so `tokio::time` advances
//! instantly and deterministically — no real sleeping.

use std::sync::Arc;
use std::time::Duration;

use magnate_engine::{ClientEvent, ConnId, NoopHistory, ServerEvent};
use magnate_session::{Gateway, GatewayConfig};

fn config() -> GatewayConfig {
    GatewayConfig {
        reconnect_grace: Duration::from_secs(120),
        ..GatewayConfig::default()
    }
}

async fn create_room(gateway: &Arc<Gateway>, conn: u64, name: &str) -> String {
    gateway
        .dispatch(ConnId(conn), ClientEvent::CreateRoom { name: name.into() })
        .await;
    gateway
        .with_hub(|hub| hub.room_of(ConnId(conn)).cloned())
        .await
        .expect("creator is seated")
        .0
}

#[tokio::test]
async fn test_dispatch_routes_snapshots_to_members() {
    let gateway = Gateway::new(config(), Arc::new(NoopHistory));
    let mut alice = gateway.register(ConnId(1)).await;
    let mut bob = gateway.register(ConnId(2)).await;

    let code = create_room(&gateway, 1, "Alice").await;
    assert!(matches!(alice.recv().await, Some(ServerEvent::RoomUpdate { .. })));

    gateway
        .dispatch(ConnId(2), ClientEvent::JoinRoom { code, name: "Bob".into() })
        .await;
    // Both members get the join snapshot.
    assert!(matches!(alice.recv().await, Some(ServerEvent::RoomUpdate { .. })));
    assert!(matches!(bob.recv().await, Some(ServerEvent::RoomUpdate { .. })));
}

#[tokio::test]
async fn test_error_events_reach_only_the_caller() {
    let gateway = Gateway::new(config(), Arc::new(NoopHistory));
    let mut alice = gateway.register(ConnId(1)).await;

    gateway
        .dispatch(ConnId(1), ClientEvent::JoinRoom { code: "NOPE99".into(), name: "A".into() })
        .await;
    assert!(matches!(alice.recv().await, Some(ServerEvent::ErrorMsg { .. })));
}

#[tokio::test]
async fn test_rate_limit_drops_excess_events_silently() {
    let gateway = Gateway::new(config(), Arc::new(NoopHistory));
    let mut alice = gateway.register(ConnId(1)).await;

    // The create-room quota is 2 per window; the third is dropped before
    // it reaches the hub.
    for _ in 0..3 {
        gateway
            .dispatch(ConnId(1), ClientEvent::CreateRoom { name: "A".into() })
            .await;
    }
    let rooms = gateway.with_hub(|hub| hub.room_count()).await;
    assert_eq!(rooms, 1, "two creates (second leaves the first room empty), third dropped");

    // No error event was surfaced for the dropped create.
    let mut updates = 0;
    while let Ok(event) = alice.try_recv() {
        assert!(matches!(event, ServerEvent::RoomUpdate { .. }));
        updates += 1;
    }
    assert_eq!(updates, 2);
}

#[tokio::test(start_paused = true)]
async fn test_grace_window_tears_down_abandoned_room() {
    let gateway = Gateway::new(config(), Arc::new(NoopHistory));
    let _alice = gateway.register(ConnId(1)).await;
    let _bob = gateway.register(ConnId(2)).await;

    let code = create_room(&gateway, 1, "Alice").await;
    gateway
        .dispatch(ConnId(2), ClientEvent::JoinRoom { code, name: "Bob".into() })
        .await;
    gateway.dispatch(ConnId(1), ClientEvent::StartGame).await;

    gateway.disconnect(ConnId(1)).await;
    gateway.disconnect(ConnId(2)).await;
    assert_eq!(gateway.with_hub(|hub| hub.room_count()).await, 1);

    // Short of the grace window: still there.
    tokio::time::sleep(Duration::from_secs(119)).await;
    assert_eq!(gateway.with_hub(|hub| hub.room_count()).await, 1);

    // Past it: gone.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(gateway.with_hub(|hub| hub.room_count()).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_cancels_the_pending_teardown() {
    let gateway = Gateway::new(config(), Arc::new(NoopHistory));
    let _alice = gateway.register(ConnId(1)).await;
    let _bob = gateway.register(ConnId(2)).await;
    let _carol = gateway.register(ConnId(3)).await;

    let code = create_room(&gateway, 1, "Alice").await;
    gateway
        .dispatch(ConnId(2), ClientEvent::JoinRoom { code: code.clone(), name: "Bob".into() })
        .await;
    gateway
        .dispatch(ConnId(3), ClientEvent::JoinRoom { code: code.clone(), name: "Carol".into() })
        .await;
    gateway.dispatch(ConnId(1), ClientEvent::StartGame).await;

    gateway.disconnect(ConnId(1)).await;
    gateway.disconnect(ConnId(2)).await;
    gateway.disconnect(ConnId(3)).await;

    // Alice reconnects inside the window on a fresh connection.
    tokio::time::sleep(Duration::from_secs(60)).await;
    let _alice2 = gateway.register(ConnId(9)).await;
    gateway
        .dispatch(ConnId(9), ClientEvent::JoinRoom { code, name: "Alice".into() })
        .await;

    // The original timer fires into a bumped epoch and must no-op.
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(gateway.with_hub(|hub| hub.room_count()).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_is_a_safety_net() {
    let mut config = config();
    config.sweep_interval = Duration::from_secs(30);
    let gateway = Gateway::new(config, Arc::new(NoopHistory));
    let sweeper = gateway.spawn_sweeper();

    let _alice = gateway.register(ConnId(1)).await;
    let _bob = gateway.register(ConnId(2)).await;
    let code = create_room(&gateway, 1, "Alice").await;
    gateway
        .dispatch(ConnId(2), ClientEvent::JoinRoom { code: code.clone(), name: "Bob".into() })
        .await;
    gateway.dispatch(ConnId(1), ClientEvent::StartGame).await;

    // Simulate missed disconnects: seats go dark without leave events,
    // so no teardown timer was ever armed.
    let code = magnate_engine::RoomCode(code.clone());
    gateway
        .with_hub_mut(|hub| {
            for p in &mut hub.room_mut(&code).unwrap().players {
                p.presence = magnate_engine::Presence::Disconnected;
            }
        })
        .await;

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(gateway.with_hub(|hub| hub.room_count()).await, 0);
    sweeper.abort();
}
