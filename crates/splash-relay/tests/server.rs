//! End-to-end tests over real websocket connections.
//!
//! A relay bound to an ephemeral port talks to raw `tokio-tungstenite`
//! clients, exercising the upgrade path, codec edge, and room routing.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use splash_protocol::{ActionKind, ClientMessage, GameAction, GameState, Identity, ServerMessage};
use splash_relay::RelayServer;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_relay() -> SocketAddr {
    let server = RelayServer::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: SocketAddr, query: &str) -> Socket {
    let (ws, _) = connect_async(format!("ws://{addr}/?{query}"))
        .await
        .expect("websocket upgrade failed");
    ws
}

async fn send(ws: &mut Socket, msg: &ClientMessage) {
    let text = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(text.into())).await.unwrap();
}

async fn recv(ws: &mut Socket) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        match frame {
            Message::Binary(data) => return serde_json::from_slice(&data).unwrap(),
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

fn join(id: &str, name: &str) -> ClientMessage {
    ClientMessage::Join {
        id: id.into(),
        name: name.into(),
    }
}

#[tokio::test]
async fn test_upgrade_without_room_code_is_rejected() {
    let addr = spawn_relay().await;
    let result = connect_async(format!("ws://{addr}/")).await;
    assert!(result.is_err(), "upgrade should fail with HTTP 400");
}

#[tokio::test]
async fn test_room_codes_are_case_insensitive() {
    let addr = spawn_relay().await;
    let mut a = connect(addr, "room=beach").await;
    let mut b = connect(addr, "room=BEACH").await;

    send(&mut a, &join("tok-a", "ana")).await;
    assert!(matches!(recv(&mut a).await, ServerMessage::Welcome { seat: 0 }));
    let _ = recv(&mut a).await; // players

    send(&mut b, &join("tok-b", "bo")).await;
    assert!(matches!(recv(&mut b).await, ServerMessage::Welcome { seat: 1 }));
    match recv(&mut b).await {
        ServerMessage::Players { players } => {
            assert_eq!(players.len(), 2, "both casings landed in one room");
        }
        other => panic!("expected players, got {other:?}"),
    }
}

#[tokio::test]
async fn test_distinct_rooms_are_isolated() {
    let addr = spawn_relay().await;
    let mut a = connect(addr, "room=cove").await;
    let mut b = connect(addr, "room=reef").await;

    send(&mut a, &join("tok-a", "ana")).await;
    assert!(matches!(recv(&mut a).await, ServerMessage::Welcome { seat: 0 }));

    send(&mut b, &join("tok-b", "bo")).await;
    // Seat 0 again: a fresh roster, untouched by the other room.
    assert!(matches!(recv(&mut b).await, ServerMessage::Welcome { seat: 0 }));
}

#[tokio::test]
async fn test_malformed_frame_is_discarded_without_dropping_socket() {
    let addr = spawn_relay().await;
    let mut ws = connect(addr, "room=beach").await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    ws.send(Message::Binary(vec![0x00, 0xff].into()))
        .await
        .unwrap();

    // The connection survives and still answers pings.
    send(&mut ws, &ClientMessage::Ping).await;
    assert!(matches!(recv(&mut ws).await, ServerMessage::Pong));
}

#[tokio::test]
async fn test_snapshot_fanned_out_over_the_wire() {
    let addr = spawn_relay().await;
    let mut host = connect(addr, "room=tide").await;
    let mut guest = connect(addr, "room=tide").await;

    send(&mut host, &join("tok-host", "ana")).await;
    let _ = recv(&mut host).await; // welcome
    let _ = recv(&mut host).await; // players

    send(&mut guest, &join("tok-guest", "bo")).await;
    let _ = recv(&mut guest).await; // welcome
    let _ = recv(&mut guest).await; // players
    let _ = recv(&mut host).await; // players

    let roster = vec![
        Identity {
            id: "tok-host".into(),
            name: "ana".into(),
            seat: 0,
        },
        Identity {
            id: "tok-guest".into(),
            name: "bo".into(),
            seat: 1,
        },
    ];
    let state = GameState::skeleton(&roster);
    send(
        &mut host,
        &ClientMessage::Action {
            action: GameAction {
                kind: ActionKind::Start,
                state: state.clone(),
            },
        },
    )
    .await;

    for ws in [&mut host, &mut guest] {
        match recv(ws).await {
            ServerMessage::State { payload } => assert_eq!(payload.state, state),
            other => panic!("expected state, got {other:?}"),
        }
    }
}
