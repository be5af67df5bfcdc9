//! Native WebSocket client on `tokio-tungstenite`.
//!
//! - Background tokio task for connection management
//! - Exponential backoff reconnection with jitter
//! - Stream-based event delivery to consumer
//!
//! The client does not replay subscriptions after a reconnect. The feed sees
//! `Disconnected` then `Connected` and re-runs its own bootstrap, so only the
//! topic that is active at that moment gets subscribed. Messages sent while
//! the socket is down are dropped.

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::feed::Channel;
use crate::ws::{backoff_delay_ms, MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code the server uses when it throttles a client.
const POLICY_VIOLATION: u16 = 1008;

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Disconnect,
}

// ─── Disconnect reasons for reconnection decision ────────────────────────────

enum DisconnectReason {
    UserRequested,
    NormalClose,
    RateLimited,
    Error(String),
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    reconnect_attempts: u32,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn emit(&self, event: WsEvent) {
        if self.event_tx.try_send(event).is_err() {
            tracing::warn!("Event channel full or closed, dropping event");
        }
    }

    fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }

    fn should_reconnect(&self) -> bool {
        self.config.reconnect && self.reconnect_attempts < self.config.max_reconnect_attempts
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native WebSocket client using `tokio-tungstenite`.
///
/// Uses a background tokio task for connection management.
/// The public API communicates with it via mpsc channels.
pub struct WsClient {
    config: WsConfig,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);
        Self {
            config,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Spawn the background task that dials and keeps the connection alive.
    ///
    /// Returns immediately; `WsEvent::Connected` arrives on [`Self::events`]
    /// once the handshake completes.
    pub async fn connect(&mut self) -> Result<(), WsError> {
        if self.cmd_tx.is_some() {
            return Ok(());
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state.store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            reconnect_attempts: 0,
            ready_state: Arc::clone(&self.ready_state),
        };

        self.task_handle = Some(tokio::spawn(run_task(state)));
        Ok(())
    }

    /// Disconnect from the WebSocket server.
    ///
    /// Sends a graceful close to the background task and waits for it to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.ready_state.store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Queue a message for the background task.
    ///
    /// Returns `WsError::NotConnected` if the client was never connected or
    /// has been shut down.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    /// Whether the WebSocket is currently open.
    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Current connection state.
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    /// Force a fresh connection attempt.
    ///
    /// Tears down the current connection (if any), resets the reconnect
    /// counter, and spawns a new background task.
    pub async fn restart_connection(&mut self) {
        if self.ready_state() == ReadyState::Connecting {
            tracing::info!("Already connecting, skipping restart");
            return;
        }

        tracing::info!("Manual reconnection requested");
        self.disconnect().await.ok();
        self.connect().await.ok();
    }

    /// Get a stream of events from the WebSocket connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(&self.event_rx, |rx| async move {
            let mut guard = rx.lock().await;
            guard.recv().await.map(|event| (event, rx))
        }))
    }
}

impl Channel for WsClient {
    fn emit(&self, msg: MessageOut) -> Result<(), WsError> {
        self.send(msg)
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        // ── 1. Attempt connection ────────────────────────────────────────
        let (sink, stream) = match attempt_connect(&state.config).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("WebSocket connection to {} failed: {}", state.config.url, e);
                state.emit(WsEvent::Error(format!("Connection failed: {}", e)));

                if !state.should_reconnect() {
                    state.set_ready_state(ReadyState::Closed);
                    state.emit(WsEvent::MaxReconnectReached);
                    return;
                }
                backoff_sleep(&mut state, false).await;
                if !drain_commands(&mut state) {
                    state.set_ready_state(ReadyState::Closed);
                    return;
                }
                continue;
            }
        };

        // ── 2. Connected ─────────────────────────────────────────────────
        tracing::info!("WebSocket connected to {}", state.config.url);
        state.reconnect_attempts = 0;
        state.set_ready_state(ReadyState::Open);
        state.emit(WsEvent::Connected);

        // ── 3. Inner select! loop ────────────────────────────────────────
        let reason = run_connected(&mut state, sink, stream).await;

        // ── 4. Post-disconnect decision ──────────────────────────────────
        state.set_ready_state(ReadyState::Closed);

        let rate_limited = match reason {
            DisconnectReason::UserRequested | DisconnectReason::NormalClose => return,
            DisconnectReason::RateLimited => true,
            DisconnectReason::Error(reason) => {
                tracing::debug!("Connection lost: {}", reason);
                false
            }
        };

        if !state.should_reconnect() {
            state.emit(WsEvent::MaxReconnectReached);
            return;
        }
        state.set_ready_state(ReadyState::Connecting);
        backoff_sleep(&mut state, rate_limited).await;
        if !drain_commands(&mut state) {
            state.set_ready_state(ReadyState::Closed);
            return;
        }
    }
}

/// The inner connected loop: runs until the connection breaks.
async fn run_connected(
    state: &mut TaskState,
    mut sink: SplitSink<WsStream, Message>,
    mut stream: SplitStream<WsStream>,
) -> DisconnectReason {
    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match MessageIn::parse(text.as_str()) {
                        Ok(msg_in) => state.emit(WsEvent::Message(msg_in.kind)),
                        Err(e) => {
                            tracing::warn!("WS frame rejected: {}, raw: {}", e, text.as_str());
                            state.emit(WsEvent::Error(e.to_string()));
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        state.emit(WsEvent::Disconnected {
                            code: Some(code),
                            reason: reason.clone(),
                        });
                        return match code {
                            1000 => DisconnectReason::NormalClose,
                            POLICY_VIOLATION => DisconnectReason::RateLimited,
                            _ => DisconnectReason::Error(reason),
                        };
                    }
                    Some(Ok(_)) => {} // Binary, Pong, Frame: ignore
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: reason.clone(),
                        });
                        return DisconnectReason::Error(reason);
                    }
                    None => {
                        state.emit(WsEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        });
                        return DisconnectReason::Error("Stream ended".into());
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        tracing::debug!("WS send: {}", msg_out);
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("Send failed: {}", e);
                            state.emit(WsEvent::Error(e.to_string()));
                        }
                    }
                    Some(Command::Disconnect) => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "Client disconnect".into(),
                        }))).await;
                        state.emit(WsEvent::Disconnected {
                            code: Some(1000),
                            reason: "Client disconnect".into(),
                        });
                        return DisconnectReason::UserRequested;
                    }
                    None => {
                        // WsClient dropped: clean exit
                        return DisconnectReason::UserRequested;
                    }
                }
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn attempt_connect(
    config: &WsConfig,
) -> Result<(SplitSink<WsStream, Message>, SplitStream<WsStream>), WsError> {
    let timeout = Duration::from_millis(config.connect_timeout_ms);
    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(config.connect_url()))
        .await
        .map_err(|_| WsError::ConnectionFailed("Connection timeout".into()))?
        .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

    Ok(ws_stream.split())
}

async fn send_msg(sink: &mut SplitSink<WsStream, Message>, msg: &MessageOut) -> Result<(), WsError> {
    let frame = msg.to_frame()?;
    sink.send(Message::Text(frame.into()))
        .await
        .map_err(|e| WsError::SendFailed(e.to_string()))
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1006, "No close frame".into()),
    }
}

/// Discard commands that arrived while the socket was down.
///
/// Returns `false` if a disconnect was requested in the meantime.
fn drain_commands(state: &mut TaskState) -> bool {
    let mut dropped = 0;
    while let Ok(cmd) = state.cmd_rx.try_recv() {
        match cmd {
            Command::Send(msg) => {
                tracing::debug!("Dropping {} while disconnected", msg);
                dropped += 1;
            }
            Command::Disconnect => return false,
        }
    }
    if dropped > 0 {
        tracing::info!("Dropped {} message(s) sent while disconnected", dropped);
    }
    true
}

// ─── Reconnection backoff ────────────────────────────────────────────────────

/// `(jitter_max, cap)` in milliseconds.
fn backoff_limits(rate_limited: bool) -> (u32, u32) {
    if rate_limited {
        (1_000, 300_000) // up to 5 minutes for rate limits
    } else {
        (500, 60_000) // up to 60 seconds normally
    }
}

async fn backoff_sleep(state: &mut TaskState, rate_limited: bool) {
    state.reconnect_attempts += 1;

    let (jitter_max, cap) = backoff_limits(rate_limited);
    let jitter = rand::random::<u32>() % jitter_max;
    let delay = backoff_delay_ms(
        state.config.base_reconnect_delay_ms,
        state.reconnect_attempts,
        jitter,
        cap,
    );

    tracing::info!(
        "Reconnect attempt {}/{} in {}ms{}",
        state.reconnect_attempts,
        state.config.max_reconnect_attempts,
        delay,
        if rate_limited { " (rate-limited)" } else { "" }
    );

    tokio::time::sleep(Duration::from_millis(delay as u64)).await;
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{ChartType, Topic};

    #[test]
    fn test_ws_client_new() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert_eq!(client.ready_state(), ReadyState::Closed);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_send_when_not_connected() {
        let client = WsClient::new(WsConfig::default());
        let result = client.send(MessageOut::UserInit);
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_emit_through_channel_trait() {
        let client = WsClient::new(WsConfig::default());
        let topic = Topic::new("XAUUSD", ChartType::Area);
        let result = (&client).emit(MessageOut::subscribe(&topic));
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1006);
        assert_eq!(reason, "No close frame");
    }

    #[test]
    fn test_extract_close_policy() {
        let frame = CloseFrame {
            code: CloseCode::Policy,
            reason: "slow down".into(),
        };
        assert_eq!(extract_close(Some(&frame)).0, POLICY_VIOLATION);
    }

    #[test]
    fn test_backoff_limits() {
        assert_eq!(backoff_limits(false), (500, 60_000));
        assert_eq!(backoff_limits(true), (1_000, 300_000));
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut client = WsClient::new(WsConfig::default());
        let result = client.disconnect().await;
        assert!(result.is_ok());
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }
}
