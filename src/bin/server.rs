use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use neon_snake_server::constants::IDLE_POLL_MS;
use neon_snake_server::engine::GameEngine;
use neon_snake_server::highscore_store::HighScoreStore;
use neon_snake_server::server_protocol::{parse_client_message, ParsedClientMessage};
use neon_snake_server::types::{GameConfig, RunState};
use rand::Rng as _;
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tower_http::services::{ServeDir, ServeFile};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type SharedState = Arc<Mutex<ServerState>>;

struct ServerState {
    clients: HashMap<String, mpsc::Sender<String>>,
    game: GameEngine,
    highscore_store: HighScoreStore,
}

impl ServerState {
    fn new(game: GameEngine, highscore_store: HighScoreStore) -> Self {
        Self {
            clients: HashMap::new(),
            game,
            highscore_store,
        }
    }
}

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let highscores_path = std::env::var("HIGHSCORES_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".data/highscores.json"));

    let config = GameConfig::default();
    let capacity = config.high_score_capacity;
    let seed: u32 = rand::rng().random();
    let state = Arc::new(Mutex::new(ServerState::new(
        GameEngine::new(config, seed),
        HighScoreStore::new(highscores_path, capacity),
    )));
    start_tick_loop(state.clone());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/highscores", get(highscores_handler))
        .route("/ws", get(ws_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found. run the client build to generate dist/client.");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("failed to bind server socket");

    println!("[server] listening on :{port}");
    axum::serve(listener, app)
        .await
        .expect("server runtime failed");
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [
        PathBuf::from("dist/client"),
        PathBuf::from("../../dist/client"),
    ];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn highscores_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let guard = state.lock().await;
    Json(guard.highscore_store.build_response())
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: SharedState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, mut rx) = mpsc::channel::<String>(256);

    {
        let mut guard = state.lock().await;
        guard.clients.insert(client_id.clone(), tx.clone());
        send_initial_state(&mut guard, &client_id);
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = ws_receiver.next().await {
        let Ok(message) = received else {
            break;
        };

        match message {
            Message::Text(raw) => {
                handle_client_message(state.clone(), &client_id, raw.to_string()).await;
            }
            Message::Binary(raw) => {
                if let Ok(text) = String::from_utf8(raw.to_vec()) {
                    handle_client_message(state.clone(), &client_id, text).await;
                } else {
                    send_error_to_client(&state, &client_id, "invalid utf8 message").await;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    {
        let mut guard = state.lock().await;
        guard.clients.remove(&client_id);
    }
    drop(tx);
    let _ = writer.await;
}

async fn handle_client_message(state: SharedState, client_id: &str, raw: String) {
    let Some(message) = parse_client_message(&raw) else {
        send_error_to_client(&state, client_id, "invalid message").await;
        return;
    };

    let mut guard = state.lock().await;
    match message {
        ParsedClientMessage::Start => {
            if guard.game.start() {
                broadcast_snapshot(&mut guard);
            } else {
                send_to_client(&guard, client_id, &json!({
                    "type": "error",
                    "message": "start is only accepted from idle",
                }));
            }
        }
        ParsedClientMessage::Pause => {
            if guard.game.toggle_pause() {
                broadcast_snapshot(&mut guard);
            } else {
                send_to_client(&guard, client_id, &json!({
                    "type": "error",
                    "message": "nothing to pause or resume",
                }));
            }
        }
        ParsedClientMessage::Restart => {
            guard.game.restart();
            broadcast_snapshot(&mut guard);
        }
        ParsedClientMessage::Input { dir } => {
            guard.game.set_direction(dir);
        }
        ParsedClientMessage::Ping { t } => {
            send_to_client(&guard, client_id, &json!({
                "type": "pong",
                "t": t,
            }));
        }
    }
}

fn send_initial_state(state: &mut ServerState, client_id: &str) {
    let snapshot = state.game.build_snapshot(false);
    send_to_client(state, client_id, &json!({
        "type": "state",
        "config": state.game.config,
        "snapshot": snapshot,
    }));
    send_to_client(state, client_id, &json!({
        "type": "high_scores",
        "highScores": state.highscore_store.build_response(),
    }));
}

fn start_tick_loop(state: SharedState) {
    tokio::spawn(async move {
        loop {
            let sleep_ms = {
                let guard = state.lock().await;
                if guard.game.run_state() == RunState::Running {
                    guard.game.tick_ms()
                } else {
                    IDLE_POLL_MS
                }
            };
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;

            let mut guard = state.lock().await;
            tick_game(&mut guard);
        }
    });
}

fn tick_game(state: &mut ServerState) {
    if state.game.run_state() != RunState::Running {
        return;
    }
    state.game.tick();
    broadcast_snapshot(state);

    if let Some((score, level)) = state.game.final_result() {
        let saved = state.highscore_store.append(score, level);
        broadcast(state, &json!({
            "type": "game_over",
            "finalScore": score,
            "finalLevel": level,
            "saved": saved,
            "highScores": state.highscore_store.build_response(),
        }));
    }
}

fn broadcast_snapshot(state: &mut ServerState) {
    let snapshot = state.game.build_snapshot(true);
    broadcast(state, &json!({
        "type": "state",
        "snapshot": snapshot,
    }));
}

fn broadcast(state: &ServerState, message: &Value) {
    let payload = message.to_string();
    for tx in state.clients.values() {
        let _ = tx.try_send(payload.clone());
    }
}

fn send_to_client(state: &ServerState, client_id: &str, message: &Value) {
    if let Some(tx) = state.clients.get(client_id) {
        let _ = tx.try_send(message.to_string());
    }
}

async fn send_error_to_client(state: &SharedState, client_id: &str, message: &str) {
    let guard = state.lock().await;
    send_to_client(&guard, client_id, &json!({
        "type": "error",
        "message": message,
    }));
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
