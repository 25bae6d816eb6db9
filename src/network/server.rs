//! WebSocket Game Server
//!
//! Async WebSocket server: accepts connections, routes client messages
//! into the engine, and drives the fixed-rate tick. One reader loop and
//! one writer task per connection; the engine sits behind a single
//! mutex, which serializes joins, moves, disconnects, and the tick.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::engine::GameEngine;
use crate::game::session::PlayerId;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::TICK_INTERVAL_MS;

/// Wall clock in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Tick period for the orchestrator.
    pub tick_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static address"),
            max_connections: 1000,
            tick_interval: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The game server: listener, tick driver, and shared engine.
pub struct GameServer {
    config: ServerConfig,
    engine: Arc<Mutex<GameEngine>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            engine: Arc::new(Mutex::new(GameEngine::new())),
            shutdown_tx,
        }
    }

    /// Run the server until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("listening on {}", self.config.bind_addr);

        let tick_engine = self.engine.clone();
        let tick_interval = self.config.tick_interval;
        let tick_shutdown = self.shutdown_tx.subscribe();
        let tick_handle = tokio::spawn(async move {
            Self::run_tick_loop(tick_engine, tick_interval, tick_shutdown).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let connections = self.engine.lock().await.connection_count();
                            if connections >= self.config.max_connections {
                                warn!("connection limit reached, rejecting {}", addr);
                                continue;
                            }
                            debug!("new connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        tick_handle.abort();
        Ok(())
    }

    /// Drive the orchestrator at a fixed period. A slow tick is not
    /// compensated for; absolute session deadlines absorb the jitter.
    async fn run_tick_loop(
        engine: Arc<Mutex<GameEngine>>,
        period: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    engine.lock().await.tick(now_ms());
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }

    /// Spawn the reader loop and writer task for one connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let engine = self.engine.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("websocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<ServerMessage>();

            // Writer task: serialize outbound events onto the socket.
            let writer = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // The player id bound to this connection, once known.
            let mut player_id: Option<PlayerId> = None;

            loop {
                tokio::select! {
                    frame = ws_receiver.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => {
                                Self::handle_frame(&engine, &msg_tx, &mut player_id, &text).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                debug!("websocket error for {}: {}", addr, e);
                                break;
                            }
                            // Ping/Pong handled by tungstenite, binary ignored
                            Some(Ok(_)) => {}
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }

            writer.abort();
            if let Some(id) = player_id {
                engine.lock().await.handle_disconnect(&id);
            }
            debug!("client {} cleaned up", addr);
        });
    }

    /// Parse one inbound frame and route it into the engine.
    async fn handle_frame(
        engine: &Arc<Mutex<GameEngine>>,
        msg_tx: &mpsc::UnboundedSender<ServerMessage>,
        player_id: &mut Option<PlayerId>,
        text: &str,
    ) {
        let msg = match ClientMessage::from_json(text) {
            Ok(m) => m,
            Err(e) => {
                debug!("malformed client message: {}", e);
                let _ = msg_tx.send(ServerMessage::Error {
                    message: "invalid message format".to_string(),
                });
                return;
            }
        };

        match msg {
            ClientMessage::Join { name } => {
                let id = engine
                    .lock()
                    .await
                    .handle_join(&name, msg_tx.clone(), now_ms());
                *player_id = Some(id);
            }
            ClientMessage::Move { from_cell, to_cell } => {
                let Some(id) = *player_id else {
                    let _ = msg_tx.send(ServerMessage::Error {
                        message: "player not initialized".to_string(),
                    });
                    return;
                };
                let result = engine
                    .lock()
                    .await
                    .handle_move(id, from_cell, to_cell, now_ms());
                if let Err(e) = result {
                    let _ = msg_tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
            ClientMessage::Reconnect { player_id: id } => {
                let rebound = engine
                    .lock()
                    .await
                    .handle_reconnect(id, msg_tx.clone(), now_ms());
                if rebound {
                    *player_id = Some(id);
                    let _ = msg_tx.send(ServerMessage::ReconnectSuccess);
                } else {
                    let _ = msg_tx.send(ServerMessage::ReconnectFailed);
                }
            }
        }
    }

    /// Shut the server down.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Connected player count.
    pub async fn connection_count(&self) -> usize {
        self.engine.lock().await.connection_count()
    }

    /// Active session count.
    pub async fn session_count(&self) -> usize {
        self.engine.lock().await.session_count()
    }

    /// Players waiting in the matchmaking queue.
    pub async fn queue_len(&self) -> usize {
        self.engine.lock().await.queue_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(TICK_INTERVAL_MS));
        assert_eq!(config.max_connections, 1000);
    }

    #[tokio::test]
    async fn server_starts_empty() {
        let server = GameServer::new(ServerConfig::default());
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.session_count().await, 0);
        assert_eq!(server.queue_len().await, 0);
    }

    #[tokio::test]
    async fn malformed_frame_answers_error_and_keeps_state() {
        let engine = Arc::new(Mutex::new(GameEngine::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player_id = None;

        GameServer::handle_frame(&engine, &tx, &mut player_id, "{not json").await;
        GameServer::handle_frame(&engine, &tx, &mut player_id, r#"{"type":"warp"}"#).await;

        for _ in 0..2 {
            let msg = rx.try_recv().unwrap();
            assert!(matches!(msg, ServerMessage::Error { .. }));
        }
        assert!(player_id.is_none());
        assert_eq!(engine.lock().await.connection_count(), 0);
    }

    #[tokio::test]
    async fn join_binds_the_connection() {
        let engine = Arc::new(Mutex::new(GameEngine::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player_id = None;

        GameServer::handle_frame(&engine, &tx, &mut player_id, r#"{"type":"join","name":"a"}"#)
            .await;

        assert!(player_id.is_some());
        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::QueueUpdate { position: 1 }
        ));
    }

    #[tokio::test]
    async fn move_before_join_is_an_error() {
        let engine = Arc::new(Mutex::new(GameEngine::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player_id = None;

        GameServer::handle_frame(
            &engine,
            &tx,
            &mut player_id,
            r#"{"type":"move","fromCell":[0,0],"toCell":[0,1]}"#,
        )
        .await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Error { message } if message == "player not initialized"
        ));
    }

    #[tokio::test]
    async fn queued_move_gets_not_in_game_error() {
        let engine = Arc::new(Mutex::new(GameEngine::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player_id = None;

        GameServer::handle_frame(&engine, &tx, &mut player_id, r#"{"type":"join","name":"a"}"#)
            .await;
        let _ = rx.try_recv();

        GameServer::handle_frame(
            &engine,
            &tx,
            &mut player_id,
            r#"{"type":"move","fromCell":[0,0],"toCell":[0,1]}"#,
        )
        .await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerMessage::Error { message } if message == "not in a game"
        ));
    }

    #[tokio::test]
    async fn reconnect_for_unknown_player_fails() {
        let engine = Arc::new(Mutex::new(GameEngine::new()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut player_id = None;

        GameServer::handle_frame(
            &engine,
            &tx,
            &mut player_id,
            r#"{"type":"reconnect","playerId":"00000000-0000-0000-0000-000000000000"}"#,
        )
        .await;

        assert!(matches!(rx.try_recv().unwrap(), ServerMessage::ReconnectFailed));
        assert!(player_id.is_none());
    }

    #[tokio::test]
    async fn shutdown_does_not_panic() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = GameServer::new(config);
        server.shutdown();
    }
}
