//! Connection lifecycle driver.
//!
//! One background task per [`TransportManager::connect`] call owns the live
//! connection, its heartbeat and the reconnect schedule. The manager keeps
//! only the task handle and a shutdown signal.

use std::sync::Arc;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use super::{
    Connection, ConnectionStatus, Connector, TransportConfig, TransportError, TransportEvent,
};
use crate::{
    domain::{ConnectionId, PlayerAction},
    infrastructure::dto::{InboundEnvelope, OutboundEnvelope},
};

/// Cloneable sending side of the transport.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    route: String,
    outbound: mpsc::UnboundedSender<String>,
    status: watch::Receiver<ConnectionStatus>,
    connection_id: watch::Receiver<Option<ConnectionId>>,
}

impl TransportHandle {
    /// Send one action if the connection is open.
    ///
    /// Never fails: while not open the action is dropped with a warning, and
    /// nothing is queued for a later connection.
    pub fn send(&self, action: PlayerAction) {
        let status = *self.status.borrow();
        if status != ConnectionStatus::Open {
            tracing::warn!(
                "Dropping {} while connection is {}",
                action.name(),
                status
            );
            return;
        }

        let name = action.name();
        let frame = match OutboundEnvelope::new(self.route.clone(), action).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to serialize {}: {}", name, e);
                return;
            }
        };

        if self.outbound.send(frame).is_err() {
            tracing::warn!("Dropping {}: transport is shut down", name);
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Connection identity most recently assigned by the server.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection_id.borrow().clone()
    }
}

#[cfg(test)]
impl TransportHandle {
    /// Handle not attached to any driver; frames land on the returned receiver.
    pub(crate) fn detached(
        route: &str,
        status: ConnectionStatus,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<String>,
        watch::Sender<ConnectionStatus>,
    ) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(status);
        let (_, connection_id) = watch::channel(None);
        let handle = Self {
            route: route.to_string(),
            outbound,
            status: status_rx,
            connection_id,
        };
        (handle, outbound_rx, status_tx)
    }
}

struct Running {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<mpsc::UnboundedReceiver<String>>,
}

/// Owner of the connection lifecycle.
///
/// Dropping the manager aborts the driver without a close handshake; call
/// [`TransportManager::close`] for an orderly teardown.
pub struct TransportManager<C: Connector> {
    connector: Arc<C>,
    config: TransportConfig,
    status: Arc<watch::Sender<ConnectionStatus>>,
    connection_id: Arc<watch::Sender<Option<ConnectionId>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    handle: TransportHandle,
    outbound_rx: Option<mpsc::UnboundedReceiver<String>>,
    running: Option<Running>,
}

impl<C: Connector> TransportManager<C> {
    /// Create an idle manager.
    ///
    /// # Returns
    ///
    /// The manager and the receiving end of its event channel
    pub fn new(
        connector: C,
        config: TransportConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(ConnectionStatus::Idle);
        let (connection_id, connection_id_rx) = watch::channel(None);

        let handle = TransportHandle {
            route: config.route.clone(),
            outbound,
            status: status_rx,
            connection_id: connection_id_rx,
        };

        let manager = Self {
            connector: Arc::new(connector),
            config,
            status: Arc::new(status),
            connection_id: Arc::new(connection_id),
            events,
            handle,
            outbound_rx: Some(outbound_rx),
            running: None,
        };
        (manager, events_rx)
    }

    pub fn handle(&self) -> TransportHandle {
        self.handle.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Start connecting. No-op while a connection is open or being established.
    pub async fn connect(&mut self) {
        if let Some(running) = &self.running
            && !running.task.is_finished()
        {
            tracing::debug!("connect() ignored: connection is {}", self.status());
            return;
        }

        // A driver that gave up still holds the outbound queue.
        self.reclaim().await;

        let Some(outbound_rx) = self.outbound_rx.take() else {
            tracing::error!("Outbound queue was lost; cannot connect");
            return;
        };

        let (shutdown, shutdown_rx) = watch::channel(false);
        self.status.send_replace(ConnectionStatus::Connecting);

        let driver = Driver {
            connector: Arc::clone(&self.connector),
            config: self.config.clone(),
            status: Arc::clone(&self.status),
            connection_id: Arc::clone(&self.connection_id),
            events: self.events.clone(),
        };
        let task = tokio::spawn(driver.run(outbound_rx, shutdown_rx));

        self.running = Some(Running { shutdown, task });
    }

    /// Tear the connection down.
    ///
    /// Marks the close as intentional so no reconnect is scheduled, stops the
    /// heartbeat and inbound processing, closes the socket and waits for the
    /// driver to finish. Calling it again is a no-op.
    pub async fn close(&mut self) {
        let Some(running) = self.running.as_ref() else {
            tracing::debug!("close() ignored: transport is not running");
            return;
        };

        // The driver may already have exited on its own; a send error is fine.
        let _ = running.shutdown.send(true);
        self.reclaim().await;
        self.status.send_replace(ConnectionStatus::Idle);
        tracing::info!("Transport closed");
    }

    async fn reclaim(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        match running.task.await {
            Ok(outbound_rx) => self.outbound_rx = Some(outbound_rx),
            Err(e) => tracing::error!("Transport driver ended abnormally: {}", e),
        }
    }
}

impl<C: Connector> Drop for TransportManager<C> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.task.abort();
        }
    }
}

/// How a served connection ended.
enum ServeExit {
    Shutdown,
    Dropped(Option<String>),
}

/// Result of one `select!` round while a connection is open.
enum Step {
    Shutdown,
    Send(String),
    Received(String),
    Dropped(Option<String>),
}

struct Driver<C: Connector> {
    connector: Arc<C>,
    config: TransportConfig,
    status: Arc<watch::Sender<ConnectionStatus>>,
    connection_id: Arc<watch::Sender<Option<ConnectionId>>>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl<C: Connector> Driver<C> {
    async fn run(
        self,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> mpsc::UnboundedReceiver<String> {
        let mut attempt: u32 = 0;
        let mut opened_before = false;

        loop {
            self.set_status(ConnectionStatus::Connecting);
            let connected = tokio::select! {
                _ = shutdown_rx.changed() => break,
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(mut connection) => {
                    attempt = 0;
                    self.set_status(ConnectionStatus::Open);
                    tracing::info!("Connection open (reconnected: {})", opened_before);
                    self.emit(TransportEvent::Opened {
                        reconnected: opened_before,
                    });
                    opened_before = true;

                    let exit = self
                        .serve(&mut connection, &mut outbound_rx, &mut shutdown_rx)
                        .await;
                    match exit {
                        ServeExit::Shutdown => {
                            if let Err(e) = connection.close().await {
                                tracing::warn!("{}", e);
                            }
                            self.set_status(ConnectionStatus::Closed);
                            break;
                        }
                        ServeExit::Dropped(reason) => {
                            tracing::warn!(
                                "Connection closed unexpectedly: {}",
                                reason.as_deref().unwrap_or("closed by peer")
                            );
                            self.set_status(ConnectionStatus::Closed);
                            self.emit(TransportEvent::Closed { reason });
                            discard_queued(&mut outbound_rx);
                        }
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            }

            if attempt >= self.config.max_reconnect_attempts {
                tracing::error!(
                    "Giving up after {} reconnect attempts",
                    self.config.max_reconnect_attempts
                );
                self.set_status(ConnectionStatus::Failed);
                self.emit(TransportEvent::Failed);
                break;
            }

            let delay = self.config.backoff_delay(attempt);
            attempt += 1;
            tracing::info!("Reconnect attempt {} in {:?}", attempt, delay);
            self.set_status(ConnectionStatus::Reconnecting);
            self.emit(TransportEvent::Reconnecting { attempt, delay });

            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        outbound_rx
    }

    /// Pump one open connection until it drops or shutdown is requested.
    async fn serve(
        &self,
        connection: &mut C::Connection,
        outbound_rx: &mut mpsc::UnboundedReceiver<String>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> ServeExit {
        let period = self.config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                _ = shutdown_rx.changed() => Step::Shutdown,
                _ = heartbeat.tick() => match self.heartbeat_frame() {
                    Some(frame) => Step::Send(frame),
                    None => continue,
                },
                frame = outbound_rx.recv() => match frame {
                    Some(frame) => Step::Send(frame),
                    None => Step::Shutdown,
                },
                incoming = connection.recv() => match incoming {
                    Some(Ok(text)) => Step::Received(text),
                    Some(Err(e)) => Step::Dropped(Some(e.to_string())),
                    None => Step::Dropped(None),
                },
            };

            match step {
                Step::Shutdown => return ServeExit::Shutdown,
                Step::Dropped(reason) => return ServeExit::Dropped(reason),
                Step::Send(frame) => {
                    tracing::debug!("-> {}", frame);
                    if let Err(e) = connection.send(frame).await {
                        return ServeExit::Dropped(Some(e.to_string()));
                    }
                }
                Step::Received(text) => self.forward(&text),
            }
        }
    }

    fn heartbeat_frame(&self) -> Option<String> {
        OutboundEnvelope::new(self.config.route.clone(), PlayerAction::Heartbeat)
            .to_json()
            .map_err(TransportError::from)
            .inspect_err(|e| tracing::warn!("{}", e))
            .ok()
    }

    /// Parse one frame, track the connection identity and pass it on.
    fn forward(&self, text: &str) {
        tracing::debug!("<- {}", text);
        let envelope = match InboundEnvelope::from_json(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Skipping malformed frame: {}", e);
                return;
            }
        };

        // Every envelope carries the server's current view of our identity;
        // a null one clears it.
        let id = envelope.connection_id();
        self.connection_id.send_if_modified(|current| {
            if *current == id {
                return false;
            }
            match &id {
                Some(id) => tracing::info!("Assigned connection id {}", id),
                None => tracing::info!("Connection id cleared by server"),
            }
            *current = id;
            true
        });

        self.emit(TransportEvent::Envelope(envelope));
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    fn emit(&self, event: TransportEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Transport event receiver dropped");
        }
    }
}

/// Discard frames queued for a connection that no longer exists.
fn discard_queued(outbound_rx: &mut mpsc::UnboundedReceiver<String>) {
    let mut discarded = 0usize;
    while outbound_rx.try_recv().is_ok() {
        discarded += 1;
    }
    if discarded > 0 {
        tracing::warn!("Discarded {} frames queued for the dropped connection", discarded);
    }
}
