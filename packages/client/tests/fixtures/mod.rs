//! Test fixtures: an in-process websocket game server with scripted pushes.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rankfile_client::{
    domain::{Board, BoardDimensions, Color, Piece, PieceType, Position},
    infrastructure::codec::{SquareEncoding, encode_board},
};
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::{Mutex, mpsc},
    task::JoinHandle,
};

/// What the server does on one accepted connection.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Frames pushed right after the upgrade.
    pub frames: Vec<String>,
    /// Close the socket once the frames are sent.
    pub close_after: bool,
}

/// A frame received by the server, tagged with the 1-based connection number.
#[derive(Debug, Clone)]
pub struct Received {
    pub connection: usize,
    pub frame: Value,
}

#[derive(Clone)]
struct ServerState {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    connections: Arc<Mutex<usize>>,
    received: mpsc::UnboundedSender<Received>,
}

pub struct TestServer {
    addr: SocketAddr,
    received: mpsc::UnboundedReceiver<Received>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start on an ephemeral port. Each accepted connection takes the next
    /// script; connections past the last script stay open and silent.
    pub async fn start(scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let (received_tx, received) = mpsc::unbounded_channel();
        let state = ServerState {
            scripts: Arc::new(Mutex::new(scripts.into())),
            connections: Arc::new(Mutex::new(0)),
            received: received_tx,
        };

        let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            addr,
            received,
            task,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Next frame the server received, or `None` after `timeout`.
    pub async fn next_received(&mut self, timeout: Duration) -> Option<Received> {
        tokio::time::timeout(timeout, self.received.recv())
            .await
            .ok()
            .flatten()
    }

    /// Skip received frames until one matches `predicate`.
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        predicate: impl Fn(&Received) -> bool,
    ) -> Option<Received> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let left = deadline.saturating_duration_since(tokio::time::Instant::now());
            let received = self.next_received(left).await?;
            if predicate(&received) {
                return Some(received);
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ServerState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: ServerState) {
    let connection = {
        let mut connections = state.connections.lock().await;
        *connections += 1;
        *connections
    };
    let script = state.scripts.lock().await.pop_front().unwrap_or_default();

    for frame in script.frames {
        if socket.send(Message::Text(frame.into())).await.is_err() {
            return;
        }
    }
    if script.close_after {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        if let Message::Text(text) = message {
            let frame = serde_json::from_str(text.as_str()).unwrap_or(Value::Null);
            let _ = state.received.send(Received { connection, frame });
        }
    }
}

/// 8x8 board with kings on e1/e8 plus the given pieces.
pub fn board_with(extra: &[(Position, Piece)]) -> Board {
    let dims = BoardDimensions::new(8, 8).expect("8x8 is valid");
    let mut board = Board::empty(dims);
    board.set(Position::new(0, 4), Some(Piece::new(PieceType::King, Color::White)));
    board.set(Position::new(7, 4), Some(Piece::new(PieceType::King, Color::Black)));
    for (position, piece) in extra {
        board.set(*position, Some(*piece));
    }
    board
}

/// A full server push carrying one game record.
pub fn game_frame(
    game_id: &str,
    connection_id: &str,
    state: Value,
    current_turn: &str,
    board: &Board,
    messages: Value,
) -> String {
    let dims = board.dimensions();
    json!({
        "statusCode": 200,
        "connectionId": connection_id,
        "messages": messages,
        "data": {
            "gameId": game_id,
            "whiteUsername": "alice",
            "whiteConnectionId": connection_id,
            "blackUsername": "bob",
            "blackConnectionId": "conn-bob",
            "gameTime": {
                "whiteSecondsLeft": 300,
                "blackSecondsLeft": 300
            },
            "state": state,
            "currentTurn": current_turn,
            "inCheck": null,
            "board": {
                "squares": STANDARD.encode(encode_board(board, SquareEncoding::Nibble)),
                "dimensions": { "ranks": dims.ranks, "files": dims.files },
                "lastMoves": []
            },
            "capturedPieces": {
                "white": "",
                "black": "",
                "whitePoints": 0,
                "blackPoints": 0
            }
        }
    })
    .to_string()
}
