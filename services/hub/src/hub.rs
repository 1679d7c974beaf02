//! # Signal Broadcast Hub
//!
//! ## Purpose
//! Owns the set of live WebSocket clients, runs the periodic signal
//! generation loop against the watch-list, persists every generated signal,
//! and pushes it to the clients whose subscription and filter accept it.
//!
//! ## Architecture Role
//! ```text
//! Prediction ──▶ [SignalHub] ──▶ Subscribed Clients
//! Collaborator       │                  ▲
//!                    ▼                  │
//!               SignalStore        Heartbeat /
//!               (system of         Accept Loop
//!                record)
//! ```
//!
//! ## Concurrency
//! One accept loop, one message-handling task per client, and three
//! background timers (heartbeat, generation, maintenance), all cooperatively
//! multiplexed on the runtime. The client map and watch-list are the only
//! shared mutable structures and live behind `tokio::sync::RwLock` with a
//! single-writer discipline. Signals for a given symbol are generated by a
//! single sequential task, so per-symbol broadcast order follows cycle
//! order.

use crate::client::ClientSession;
use crate::collaborators::{NotificationSink, PredictionProvider};
use crate::config::HubConfig;
use crate::error::{HubError, Result};
use crate::generator::build_signal;
use crate::market_hours;
use crate::metrics::HubMetrics;
use crate::protocol::{ClientRequest, MessageKind, ServerMessage};
use crate::storage::SignalStore;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use pulse_risk::atr_stop_target;
use pulse_types::Signal;
use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{interval, sleep};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Bars fetched per symbol for stop/target derivation.
const ANALYSIS_BAR_COUNT: usize = 64;

/// How often the maintenance task logs metrics and sweeps expired signals.
const MAINTENANCE_INTERVAL_SECS: u64 = 60;

pub struct SignalHub {
    config: HubConfig,
    store: Arc<dyn SignalStore>,
    predictor: Arc<dyn PredictionProvider>,
    notifier: Option<Arc<dyn NotificationSink>>,
    clients: Arc<RwLock<HashMap<Uuid, ClientSession>>>,
    watchlist: Arc<RwLock<BTreeSet<String>>>,
    metrics: Arc<parking_lot::RwLock<HubMetrics>>,
    started: AtomicBool,
    local_addr: parking_lot::Mutex<Option<SocketAddr>>,
    shutdown: watch::Sender<bool>,
}

impl SignalHub {
    pub fn new(
        config: HubConfig,
        store: Arc<dyn SignalStore>,
        predictor: Arc<dyn PredictionProvider>,
    ) -> Self {
        let watchlist: BTreeSet<String> = config.watchlist.iter().cloned().collect();
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            store,
            predictor,
            notifier: None,
            clients: Arc::new(RwLock::new(HashMap::new())),
            watchlist: Arc::new(RwLock::new(watchlist)),
            metrics: Arc::new(parking_lot::RwLock::new(HubMetrics::new())),
            started: AtomicBool::new(false),
            local_addr: parking_lot::Mutex::new(None),
            shutdown,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn SignalStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics_snapshot(&self) -> HubMetrics {
        self.metrics.read().clone()
    }

    /// Bind the listener and spawn the accept loop plus background timers.
    ///
    /// Idempotent: a second call while running logs a no-op and returns the
    /// already-bound address.
    pub async fn start(self: &Arc<Self>) -> Result<SocketAddr> {
        if self.started.swap(true, Ordering::SeqCst) {
            let addr = (*self.local_addr.lock()).ok_or_else(|| {
                HubError::config("hub marked started but no listener address recorded")
            })?;
            info!("hub already running on {addr}; start is a no-op");
            return Ok(addr);
        }

        // Reset the shutdown baseline so tasks from a previous run's stop
        // signal do not fire immediately.
        self.shutdown.send_replace(false);

        let listener = match TcpListener::bind(&self.config.bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.started.store(false, Ordering::SeqCst);
                return Err(HubError::Io(e));
            }
        };
        let addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(addr);

        info!("🚀 signal hub listening on {addr}");

        let hub = Arc::clone(self);
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move { hub.accept_loop(listener, shutdown_rx).await });

        let hub = Arc::clone(self);
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move { hub.heartbeat_loop(shutdown_rx).await });

        let hub = Arc::clone(self);
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move { hub.generation_loop(shutdown_rx).await });

        let hub = Arc::clone(self);
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(async move { hub.maintenance_loop(shutdown_rx).await });

        Ok(addr)
    }

    /// Graceful shutdown: timers and the accept loop terminate, every client
    /// receives a close frame, and the client map empties. A stopped hub can
    /// be started again.
    pub async fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            info!("hub not running; stop is a no-op");
            return;
        }

        self.shutdown.send_replace(true);

        let mut clients = self.clients.write().await;
        for session in clients.values() {
            session.send_close();
        }
        let dropped = clients.len();
        clients.clear();
        self.metrics.write().active_connections = 0;

        info!("hub stopped, {dropped} clients disconnected");
    }

    pub async fn watchlist_snapshot(&self) -> Vec<String> {
        self.watchlist.read().await.iter().cloned().collect()
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener, mut shutdown_rx: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let at_capacity = {
                            let clients = self.clients.read().await;
                            clients.len() >= self.config.max_clients
                        };
                        if at_capacity {
                            warn!("connection limit reached, rejecting {peer}");
                            continue;
                        }
                        debug!("📡 connection from {peer}");
                        let hub = Arc::clone(&self);
                        tokio::spawn(async move { hub.handle_connection(stream).await });
                    }
                    Err(e) => error!("accept failed: {e}"),
                },
            }
        }
        info!("accept loop closed");
    }

    async fn handle_connection(self: Arc<Self>, stream: TcpStream) {
        let ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("websocket handshake failed: {e}");
                return;
            }
        };
        let (mut sink, mut source) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        // Writer task: drains the session's outbound queue so broadcasting
        // never waits on a slow socket.
        let writer = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let closing = matches!(frame, Message::Close(_));
                if sink.send(frame).await.is_err() || closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let client_id = Uuid::new_v4();
        let session = ClientSession::new(client_id, tx);
        let greeting = ServerMessage::status("connected");
        session.send(&greeting);

        {
            let mut clients = self.clients.write().await;
            clients.insert(client_id, session);
        }
        {
            let mut metrics = self.metrics.write();
            metrics.total_connections += 1;
            metrics.active_connections += 1;
        }
        info!("client {client_id} connected");

        while let Some(frame) = source.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientRequest>(&text) {
                    Ok(request) => self.handle_request(client_id, request).await,
                    Err(e) => {
                        debug!("client {client_id} sent malformed request: {e}");
                        self.send_to_client(
                            client_id,
                            &ServerMessage::error_status(format!("malformed request: {e}")),
                        )
                        .await;
                    }
                },
                Ok(Message::Ping(payload)) => {
                    self.send_raw(client_id, Message::Pong(payload)).await;
                }
                Ok(Message::Pong(_)) => {
                    let mut clients = self.clients.write().await;
                    if let Some(session) = clients.get_mut(&client_id) {
                        session.responsive = true;
                    }
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }

        self.remove_client(client_id).await;
        writer.abort();
        info!("client {client_id} disconnected");
    }

    async fn handle_request(&self, client_id: Uuid, request: ClientRequest) {
        match request {
            ClientRequest::Subscribe { symbols } => {
                let mut clients = self.clients.write().await;
                if let Some(session) = clients.get_mut(&client_id) {
                    session.subscriptions.extend(symbols);
                    let count = session.subscriptions.len();
                    session.send(&ServerMessage::status(format!(
                        "subscribed to {count} symbols"
                    )));
                }
            }
            ClientRequest::Unsubscribe { symbols } => {
                let mut clients = self.clients.write().await;
                if let Some(session) = clients.get_mut(&client_id) {
                    for symbol in &symbols {
                        session.subscriptions.remove(symbol);
                    }
                    let count = session.subscriptions.len();
                    session.send(&ServerMessage::status(format!(
                        "subscribed to {count} symbols"
                    )));
                }
            }
            ClientRequest::Filter(filter) => {
                let mut clients = self.clients.write().await;
                if let Some(session) = clients.get_mut(&client_id) {
                    session.filter = Some(filter);
                    session.send(&ServerMessage::status("filter updated"));
                }
            }
            ClientRequest::Watchlist { symbols } => {
                let count = {
                    let mut watchlist = self.watchlist.write().await;
                    watchlist.extend(symbols);
                    watchlist.len()
                };
                self.send_to_client(
                    client_id,
                    &ServerMessage::status(format!("watch-list now {count} symbols")),
                )
                .await;
            }
            ClientRequest::RequestSignals => {
                let signals = match self.store.recent_signals(50).await {
                    Ok(signals) => signals,
                    Err(e) => {
                        warn!("signal history read failed: {e}");
                        self.send_to_client(
                            client_id,
                            &ServerMessage::error_status("signal history unavailable"),
                        )
                        .await;
                        return;
                    }
                };
                let clients = self.clients.read().await;
                if let Some(session) = clients.get(&client_id) {
                    for signal in signals.iter().filter(|s| s.is_active) {
                        if session.accepts(signal) {
                            session.send(&ServerMessage::signal(signal));
                        }
                    }
                }
            }
            ClientRequest::GeneratePrediction {
                symbol,
                horizon_days,
            } => {
                // On-demand request: errors surface to the caller instead of
                // being swallowed like in the background loop.
                let message = match self.predictor.generate(&symbol, horizon_days).await {
                    Ok(prediction) => ServerMessage::new(
                        MessageKind::Prediction,
                        serde_json::json!({ "symbol": symbol, "prediction": prediction }),
                    ),
                    Err(e) => ServerMessage::error_status(format!("prediction failed: {e}")),
                };
                self.send_to_client(client_id, &message).await;
            }
        }
    }

    async fn send_to_client(&self, client_id: Uuid, message: &ServerMessage) {
        let clients = self.clients.read().await;
        if let Some(session) = clients.get(&client_id) {
            session.send(message);
        }
    }

    async fn send_raw(&self, client_id: Uuid, frame: Message) {
        let clients = self.clients.read().await;
        if let Some(session) = clients.get(&client_id) {
            let _ = session.send_frame(frame);
        }
    }

    async fn remove_client(&self, client_id: Uuid) {
        let removed = {
            let mut clients = self.clients.write().await;
            clients.remove(&client_id).is_some()
        };
        if removed {
            let mut metrics = self.metrics.write();
            metrics.active_connections = metrics.active_connections.saturating_sub(1);
        }
    }

    /// Ping every client each tick; anyone still unresponsive from the
    /// previous tick gets dropped (two-interval timeout).
    async fn heartbeat_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.heartbeat_interval());
        ticker.tick().await; // immediate first tick

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let mut to_drop = Vec::new();
                    {
                        let mut clients = self.clients.write().await;
                        for (id, session) in clients.iter_mut() {
                            if !session.responsive {
                                to_drop.push(*id);
                            } else {
                                session.responsive = false;
                                if !session.send_ping() {
                                    to_drop.push(*id);
                                }
                            }
                        }
                        for id in &to_drop {
                            if let Some(session) = clients.remove(id) {
                                session.send_close();
                            }
                        }
                    }
                    if !to_drop.is_empty() {
                        let mut metrics = self.metrics.write();
                        metrics.active_connections =
                            metrics.active_connections.saturating_sub(to_drop.len() as u64);
                        metrics.clients_dropped_by_heartbeat += to_drop.len() as u64;
                        info!("heartbeat dropped {} unresponsive clients", to_drop.len());
                    }
                }
            }
        }
        info!("heartbeat loop closed");
    }

    async fn generation_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        tokio::select! {
            _ = sleep(self.config.initial_delay()) => {}
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    return;
                }
            }
        }

        let mut ticker = interval(self.config.generation_interval());
        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.run_generation_cycle().await;
                }
            }
        }
        info!("generation loop closed");
    }

    /// One full pass over the watch-list. Collaborator failures degrade the
    /// cycle for that symbol only; nothing here is cycle-fatal.
    pub async fn run_generation_cycle(&self) {
        let symbols = self.watchlist_snapshot().await;
        debug!("generation cycle over {} symbols", symbols.len());

        for symbol in symbols {
            if !self.config.ignore_market_hours {
                let session =
                    market_hours::session_at(Utc::now(), self.config.utc_offset_minutes);
                if session.is_closed() {
                    debug!("{symbol}: market closed, skipping");
                    continue;
                }
            }

            match self.generate_for_symbol(&symbol).await {
                Ok(Some(signal)) => {
                    let delivered = self.broadcast(&signal).await;
                    debug!(
                        "{symbol}: {:?} signal at {:.1}% delivered to {delivered} clients",
                        signal.signal_type, signal.confidence
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("{symbol}: generation failed: {e}");
                    self.metrics.write().prediction_failures += 1;
                }
            }

            sleep(self.config.symbol_spacing()).await;
        }

        self.metrics.write().cycles_completed += 1;
    }

    async fn generate_for_symbol(&self, symbol: &str) -> Result<Option<Signal>> {
        let prediction = self
            .predictor
            .generate(symbol, self.config.prediction_horizon_days)
            .await?;

        let bars = self
            .store
            .price_bars(symbol, self.config.bar_timeframe, ANALYSIS_BAR_COUNT)
            .await?;
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        if closes.is_empty() {
            warn!("{symbol}: no market data, skipping signal");
            return Ok(None);
        }

        let stops = atr_stop_target(&closes, self.config.atr_period, self.config.atr_multiplier)?;
        let signal = build_signal(
            symbol,
            &prediction,
            closes[closes.len() - 1],
            stops,
            self.config.signal_ttl_hours,
        );

        if let Err(e) = self.store.insert_signal(signal.clone()).await {
            // Not retried this cycle; the next cycle regenerates naturally.
            warn!("{symbol}: signal persist failed: {e}");
            self.metrics.write().persistence_failures += 1;
            return Ok(None);
        }
        self.metrics.write().signals_generated += 1;

        if signal.confidence >= self.config.notify_min_confidence {
            if let Some(notifier) = &self.notifier {
                let notifier = Arc::clone(notifier);
                let store = Arc::clone(&self.store);
                let payload = serde_json::json!(signal);
                let signal_id = signal.id;
                tokio::spawn(async move {
                    notifier.send_to_all_targets(payload).await;
                    if let Err(e) = store.set_signal_notified(signal_id).await {
                        debug!("notified flag update failed: {e}");
                    }
                });
            }
        }

        Ok(Some(signal))
    }

    /// Push a signal to every client whose subscription and filter accept
    /// it. Clients with a dead outbound channel are removed; no in-flight
    /// delivery is retried.
    pub async fn broadcast(&self, signal: &Signal) -> usize {
        let message = ServerMessage::signal(signal);
        let mut delivered = 0u64;
        let mut dead = Vec::new();

        {
            let mut clients = self.clients.write().await;
            for (id, session) in clients.iter() {
                if session.accepts(signal) {
                    if session.send(&message) {
                        delivered += 1;
                    } else {
                        dead.push(*id);
                    }
                }
            }
            for id in &dead {
                clients.remove(id);
            }
        }

        let mut metrics = self.metrics.write();
        metrics.signals_broadcast += delivered;
        metrics.broadcast_errors += dead.len() as u64;
        metrics.active_connections = metrics.active_connections.saturating_sub(dead.len() as u64);

        delivered as usize
    }

    /// Periodic housekeeping: expire stale signals and log a metrics line.
    async fn maintenance_loop(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval(std::time::Duration::from_secs(MAINTENANCE_INTERVAL_SECS));
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.store.deactivate_expired_signals(Utc::now()).await {
                        Ok(0) => {}
                        Ok(n) => info!("🧹 deactivated {n} expired signals"),
                        Err(e) => warn!("expiry sweep failed: {e}"),
                    }
                    info!("📊 {}", self.metrics.read().clone());
                }
            }
        }
    }
}
