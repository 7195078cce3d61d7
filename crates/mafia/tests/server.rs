//! End-to-end tests: real WebSocket clients against a running server.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mafia::{MafiaServer, RoomConfig};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = MafiaServer::builder()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            night_phase: Duration::from_millis(200),
            day_phase: Duration::from_millis(200),
            ..RoomConfig::default()
        })
        .seed(42)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// A connected client that has already read its `welcome`.
struct Client {
    ws: ClientWs,
    id: u64,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        let mut client = Self { ws, id: 0 };
        let welcome = client.next_event().await;
        assert_eq!(welcome["event"], "welcome");
        client.id = welcome["data"]["playerId"].as_u64().expect("numeric player id");
        client
    }

    async fn send(&mut self, frame: Value) {
        self.ws
            .send(Message::Text(frame.to_string().into()))
            .await
            .expect("send");
    }

    async fn next_event(&mut self) -> Value {
        let msg = tokio::time::timeout(Duration::from_secs(2), self.ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("read error");
        serde_json::from_str(msg.to_text().expect("text frame")).expect("json event")
    }

    /// Skips events until one named `name` arrives.
    async fn expect_event(&mut self, name: &str) -> Value {
        loop {
            let event = self.next_event().await;
            if event["event"] == name {
                return event;
            }
        }
    }

    /// Creates a room and returns its code.
    async fn create_room(&mut self, username: &str) -> String {
        self.send(json!({"event": "createRoom", "data": {"username": username}}))
            .await;
        let created = self.next_event().await;
        assert_eq!(created["event"], "roomCreated");
        created["data"]["roomCode"].as_str().expect("code").to_string()
    }

    async fn join_room(&mut self, username: &str, code: &str) {
        self.send(json!({
            "event": "joinRoom",
            "data": {"username": username, "roomCode": code}
        }))
        .await;
        let joined = self.next_event().await;
        assert_eq!(joined["event"], "joinedRoom", "got {joined}");
    }
}

/// A host plus `guests` joined players, all past their join acks.
async fn table(addr: &str, guests: usize) -> (String, Vec<Client>) {
    let mut host = Client::connect(addr).await;
    let code = host.create_room("host").await;
    host.expect_event("lobbyState").await;

    let mut clients = vec![host];
    for n in 0..guests {
        let mut guest = Client::connect(addr).await;
        guest.join_room(&format!("guest{n}"), &code).await;
        guest.expect_event("updatePlayers").await;
        clients.push(guest);
    }
    (code, clients)
}

// =========================================================================
// Connection
// =========================================================================

#[tokio::test]
async fn test_welcome_assigns_distinct_ids() {
    let addr = start_server().await;
    let a = Client::connect(&addr).await;
    let b = Client::connect(&addr).await;
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .ws
        .send(Message::Text("not json".to_owned().into()))
        .await
        .unwrap();
    let err = client.next_event().await;
    assert_eq!(err["event"], "errorMessage");

    let code = client.create_room("ann").await;
    assert_eq!(code.len(), 6);
}

#[tokio::test]
async fn test_blank_username_rejected() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .send(json!({"event": "createRoom", "data": {"username": "   "}}))
        .await;
    let err = client.next_event().await;
    assert_eq!(err["event"], "errorMessage");
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_create_room_sends_lobby_state() {
    let addr = start_server().await;
    let mut host = Client::connect(&addr).await;
    let code = host.create_room("ann").await;

    let lobby = host.next_event().await;
    assert_eq!(lobby["event"], "lobbyState");
    assert_eq!(lobby["data"]["roomCode"], code.as_str());
    assert_eq!(lobby["data"]["hostId"], host.id);
    assert_eq!(lobby["data"]["phase"], "lobby");
    assert_eq!(lobby["data"]["players"][0]["name"], "ann");
}

#[tokio::test]
async fn test_join_broadcasts_roster() {
    let addr = start_server().await;
    let (_code, mut clients) = table(&addr, 1).await;

    let update = clients[0].expect_event("updatePlayers").await;
    let players = update["data"]["players"].as_array().expect("players");
    assert_eq!(players.len(), 2);
    assert_eq!(players[1]["name"], "guest0");
}

#[tokio::test]
async fn test_join_unknown_room() {
    let addr = start_server().await;
    let mut client = Client::connect(&addr).await;

    client
        .send(json!({"event": "joinRoom", "data": {"username": "bo", "roomCode": "ZZZZZZ"}}))
        .await;
    let err = client.next_event().await;
    assert_eq!(err["event"], "errorMessage");
    assert!(err["data"]["text"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_room_code_is_case_insensitive() {
    let addr = start_server().await;
    let mut host = Client::connect(&addr).await;
    let code = host.create_room("ann").await;

    let mut guest = Client::connect(&addr).await;
    guest.join_room("bo", &code.to_lowercase()).await;
}

#[tokio::test]
async fn test_request_lobby_resends_snapshot() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 1).await;

    let guest = &mut clients[1];
    guest
        .send(json!({"event": "requestLobby", "data": {"roomCode": code}}))
        .await;
    let lobby = guest.expect_event("lobbyState").await;
    assert_eq!(lobby["data"]["players"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_reaches_room() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 1).await;

    clients[1]
        .send(json!({"event": "chatMessage", "data": {"roomCode": code, "text": "hi all"}}))
        .await;

    let chat = clients[0].expect_event("chatMessage").await;
    assert_eq!(chat["data"]["name"], "guest0");
    assert_eq!(chat["data"]["text"], "hi all");
}

#[tokio::test]
async fn test_disconnect_updates_roster_and_moves_host() {
    let addr = start_server().await;
    let (_code, mut clients) = table(&addr, 2).await;

    let host = clients.remove(0);
    let next_host = clients[0].id;
    drop(host);

    // guest0 may still have guest1's join update queued.
    let update = loop {
        let update = clients[0].expect_event("updatePlayers").await;
        if update["data"]["players"].as_array().unwrap().len() == 2 {
            break update;
        }
    };
    assert_eq!(update["data"]["hostId"], next_host);
}

// =========================================================================
// Game
// =========================================================================

#[tokio::test]
async fn test_start_needs_enough_players() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 1).await;

    clients[0]
        .send(json!({"event": "startGame", "data": {"roomCode": code}}))
        .await;
    let err = clients[0].expect_event("errorMessage").await;
    assert!(err["data"]["text"].as_str().unwrap().contains("at least"));
}

#[tokio::test]
async fn test_start_by_guest_is_refused() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 3).await;

    clients[1]
        .send(json!({"event": "startGame", "data": {"roomCode": code}}))
        .await;
    let err = clients[1].expect_event("errorMessage").await;
    assert!(err["data"]["text"].as_str().unwrap().contains("host"));
}

#[tokio::test]
async fn test_start_deals_roles_and_opens_night() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 3).await;

    clients[0]
        .send(json!({"event": "startGame", "data": {"roomCode": code}}))
        .await;

    let mut roles = Vec::new();
    for client in &mut clients {
        let role = client.expect_event("yourRole").await;
        roles.push(role["data"]["role"].as_str().unwrap().to_string());
        let phase = client.expect_event("phaseMessage").await;
        assert_eq!(phase["data"]["phase"], "nightMafia");
        assert_eq!(phase["data"]["timeoutMs"], 200);
    }

    roles.sort();
    assert_eq!(roles, ["detective", "mafia", "medic", "villager"]);
}

#[tokio::test]
async fn test_night_runs_on_timer_to_day() {
    let addr = start_server().await;
    let (code, mut clients) = table(&addr, 3).await;

    clients[0]
        .send(json!({"event": "startGame", "data": {"roomCode": code}}))
        .await;

    // Nobody acts: the mafia target falls back to a random non-mafia.
    let result = clients[0].expect_event("nightResult").await;
    assert_eq!(result["data"]["medicSaved"], false);
    assert!(result["data"]["killedId"].is_u64());
}
