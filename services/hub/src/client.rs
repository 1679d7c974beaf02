//! Per-client session state.

use crate::protocol::{ServerMessage, SignalFilter, SIGNAL_SOURCE};
use pulse_types::Signal;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

/// One connected client: connected → (subscribed)* → disconnected.
///
/// The session owns the outbound half of the connection as an unbounded
/// channel drained by a writer task; broadcast never blocks on a slow
/// client socket.
#[derive(Debug)]
pub struct ClientSession {
    pub id: Uuid,
    /// Explicit symbol subscriptions. Empty set = receive all symbols.
    pub subscriptions: HashSet<String>,
    pub filter: Option<SignalFilter>,
    /// Cleared when a ping goes out, set again by the pong. A client that
    /// misses a full heartbeat interval is dropped at the next tick.
    pub responsive: bool,
    outbound: mpsc::UnboundedSender<Message>,
}

impl ClientSession {
    pub fn new(id: Uuid, outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id,
            subscriptions: HashSet::new(),
            filter: None,
            responsive: true,
            outbound,
        }
    }

    /// Subscription membership and every present filter field must accept
    /// the signal.
    pub fn accepts(&self, signal: &Signal) -> bool {
        if !self.subscriptions.is_empty() && !self.subscriptions.contains(&signal.symbol) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter.accepts(signal, SIGNAL_SOURCE),
            None => true,
        }
    }

    /// Queue a server message; false when the outbound channel is gone
    /// (writer task ended, client disconnecting).
    pub fn send(&self, message: &ServerMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => self.outbound.send(Message::Text(json)).is_ok(),
            Err(_) => false,
        }
    }

    pub fn send_ping(&self) -> bool {
        self.outbound.send(Message::Ping(Vec::new())).is_ok()
    }

    /// Queue a raw protocol frame (pong replies, close handshakes).
    pub fn send_frame(&self, frame: Message) -> bool {
        self.outbound.send(frame).is_ok()
    }

    pub fn send_close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}
