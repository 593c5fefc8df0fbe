//! Feed Client - Connection State Machine and Transport Orchestration
//!
//! Keeps one canonical vessel set fresh for subscribers regardless of
//! which transport is healthy:
//! 1. Opens the primary push transport and pushes the tracking config
//! 2. On a clean drop after a healthy connection, retries with backoff
//! 3. On transport errors, construction failures, or too many failed
//!    retries, engages REST fallback (one fetch now, then every 15 min)
//! 4. Fans every outcome out through the `EventBus`
//!
//! All state lives in a single actor task. The public `FeedClient` handle
//! only sends commands; transport events, timer firings and fetch
//! completions arrive on the same channel, so transitions are serialized.
//! Timers and fetches carry the session epoch and are discarded once a
//! newer `connect()`/`disconnect()` has superseded them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::error::FeedError;
use super::event_bus::{EventBus, Handler};
use super::fallback_poller::{FallbackPoller, FetchOutcome};
use crate::domain::backoff::ReconnectPolicy;
use crate::domain::events::{ConnectionState, EventKind, FeedEvent, FeedSource, VesselsPayload};
use crate::domain::normalize::normalize;
use crate::domain::tracking::{TrackingConfig, TrackingConfigPatch};
use crate::domain::vessel::VesselRecord;
use crate::ports::clock::Clock;
use crate::ports::protocol::{ControlMessage, InboundMessage};
use crate::ports::session::TokenProvider;
use crate::ports::transport::{
    Transport, TransportError, TransportEvent, TransportEvents, TransportLink,
};
use crate::ports::vessel_api::VesselApi;

/// Default fallback poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Reconnect attempts allowed before fallback takes over.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Static settings of a feed client.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Origin the application is served from (`https://host[:port]`).
    pub origin: Url,
    /// Backoff between primary reconnect attempts.
    pub reconnect_policy: ReconnectPolicy,
    /// Period of the REST poll while fallback is engaged.
    pub poll_interval: Duration,
    /// Reconnect attempts before giving up on the primary.
    pub max_reconnect_attempts: u32,
    /// Initial subscription intent.
    pub tracking: TrackingConfig,
}

impl FeedSettings {
    /// Settings with default policy, interval and tracking config.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            reconnect_policy: ReconnectPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            tracking: TrackingConfig::default(),
        }
    }
}

/// Injected capabilities.
#[derive(Clone)]
pub struct FeedDeps {
    pub transport: Arc<dyn Transport>,
    pub api: Arc<dyn VesselApi>,
    pub clock: Arc<dyn Clock>,
    pub tokens: Arc<dyn TokenProvider>,
}

/// Derive the push endpoint from the page origin.
///
/// `https` becomes `wss`, `http` becomes `ws`. The port is dropped so the
/// URL works behind reverse proxies that terminate on the default port.
pub fn websocket_url(origin: &Url, token: Option<&str>) -> Result<Url, TransportError> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported origin scheme '{other}'"
            )));
        }
    };
    let host = origin
        .host_str()
        .ok_or_else(|| TransportError::InvalidUrl(format!("origin '{origin}' has no host")))?;

    let mut url = Url::parse(&format!("{scheme}://{host}/ws"))
        .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("token", token);
    }
    Ok(url)
}

/// Messages processed by the actor.
enum Input {
    Connect,
    Disconnect,
    UpdateConfig(TrackingConfigPatch),
    Refresh,
    Transport {
        generation: u64,
        event: TransportEvent,
    },
    ReconnectDue {
        epoch: u64,
    },
    PollDue {
        epoch: u64,
    },
    Fetched {
        epoch: u64,
        seq: u64,
        result: Result<FetchOutcome, FeedError>,
    },
}

/// Handle to a running feed client.
///
/// Cheap to clone. Methods never fail: problems surface as `error`
/// events. The actor stops once every handle is dropped.
#[derive(Clone)]
pub struct FeedClient {
    commands: mpsc::UnboundedSender<Input>,
    bus: Arc<EventBus>,
    status_rx: watch::Receiver<ConnectionState>,
    vessels_rx: watch::Receiver<Arc<Vec<VesselRecord>>>,
    config_rx: watch::Receiver<TrackingConfig>,
}

impl FeedClient {
    /// Spawn the client actor on the current tokio runtime.
    ///
    /// The client starts `disconnected`; call `connect()` to start.
    pub fn spawn(settings: FeedSettings, deps: FeedDeps) -> Self {
        let (commands, inbox) = mpsc::unbounded_channel();
        let bus = Arc::new(EventBus::new());
        let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);
        let (vessels_tx, vessels_rx) = watch::channel(Arc::new(Vec::new()));
        let (config_tx, config_rx) = watch::channel(settings.tracking.clone());

        let actor = FeedActor::new(
            settings,
            deps,
            Arc::clone(&bus),
            commands.downgrade(),
            status_tx,
            vessels_tx,
            config_tx,
        );
        tokio::spawn(actor.run(inbox));

        Self {
            commands,
            bus,
            status_rx,
            vessels_rx,
            config_rx,
        }
    }

    /// (Re)start the primary transport from a clean state.
    pub fn connect(&self) {
        self.send(Input::Connect);
    }

    /// Stop all transports and timers.
    pub fn disconnect(&self) {
        self.send(Input::Disconnect);
    }

    /// Merge `patch` into the tracking config and propagate it.
    pub fn update_config(&self, patch: TrackingConfigPatch) {
        self.send(Input::UpdateConfig(patch));
    }

    /// Ask for a fresh vessel batch over whichever transport is active.
    pub fn refresh(&self) {
        self.send(Input::Refresh);
    }

    /// Subscribe `handler` to events of `kind`.
    pub fn on(&self, kind: EventKind, handler: Handler) {
        self.bus.on(kind, handler);
    }

    /// Unsubscribe a previously registered `handler`.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> bool {
        self.bus.off(kind, handler)
    }

    /// Current connection state.
    pub fn status(&self) -> ConnectionState {
        *self.status_rx.borrow()
    }

    /// Last successfully normalized vessel set.
    pub fn vessels(&self) -> Arc<Vec<VesselRecord>> {
        Arc::clone(&self.vessels_rx.borrow())
    }

    /// Current tracking config.
    pub fn config(&self) -> TrackingConfig {
        self.config_rx.borrow().clone()
    }

    /// Watch connection state changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionState> {
        self.status_rx.clone()
    }

    fn send(&self, input: Input) {
        if self.commands.send(input).is_err() {
            warn!("Feed client actor has stopped, command dropped");
        }
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("status", &self.status())
            .field("vessels", &self.vessels_rx.borrow().len())
            .finish()
    }
}

/// Primary link currently owned by the actor.
struct ActiveLink {
    generation: u64,
    handle: Box<dyn TransportLink>,
    opened: bool,
}

/// Single owner of all feed state.
struct FeedActor {
    settings: FeedSettings,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    tokens: Arc<dyn TokenProvider>,
    poller: FallbackPoller,
    bus: Arc<EventBus>,
    inbox: mpsc::WeakUnboundedSender<Input>,
    status_tx: watch::Sender<ConnectionState>,
    vessels_tx: watch::Sender<Arc<Vec<VesselRecord>>>,
    config_tx: watch::Sender<TrackingConfig>,

    config: TrackingConfig,
    state: ConnectionState,
    /// Bumped by every external connect/disconnect.
    epoch: u64,
    link: Option<ActiveLink>,
    next_generation: u64,
    /// Reconnect attempts since the link was last healthy.
    attempts: u32,
    /// The session has reached `connected` at least once since `connect()`.
    was_connected: bool,
    fallback: bool,
    reconnect_timer: Option<JoinHandle<()>>,
    poll_timer: Option<JoinHandle<()>>,
    fetch_seq: u64,
    applied_seq: u64,
}

impl FeedActor {
    fn new(
        settings: FeedSettings,
        deps: FeedDeps,
        bus: Arc<EventBus>,
        inbox: mpsc::WeakUnboundedSender<Input>,
        status_tx: watch::Sender<ConnectionState>,
        vessels_tx: watch::Sender<Arc<Vec<VesselRecord>>>,
        config_tx: watch::Sender<TrackingConfig>,
    ) -> Self {
        Self {
            config: settings.tracking.clone(),
            settings,
            transport: deps.transport,
            clock: deps.clock,
            tokens: deps.tokens,
            poller: FallbackPoller::new(deps.api),
            bus,
            inbox,
            status_tx,
            vessels_tx,
            config_tx,
            state: ConnectionState::Disconnected,
            epoch: 0,
            link: None,
            next_generation: 0,
            attempts: 0,
            was_connected: false,
            fallback: false,
            reconnect_timer: None,
            poll_timer: None,
            fetch_seq: 0,
            applied_seq: 0,
        }
    }

    #[instrument(skip_all, name = "feed_client")]
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Input>) {
        info!(origin = %self.settings.origin, "Feed client started");

        while let Some(input) = inbox.recv().await {
            self.handle(input);
        }

        self.teardown();
        info!("Feed client stopped");
    }

    fn handle(&mut self, input: Input) {
        match input {
            Input::Connect => self.connect(),
            Input::Disconnect => self.disconnect(),
            Input::UpdateConfig(patch) => self.update_config(patch),
            Input::Refresh => self.refresh(),
            Input::Transport { generation, event } => self.on_transport(generation, event),
            Input::ReconnectDue { epoch } => self.on_reconnect_due(epoch),
            Input::PollDue { epoch } => self.on_poll_due(epoch),
            Input::Fetched { epoch, seq, result } => self.on_fetched(epoch, seq, result),
        }
    }

    // ── Public operations ───────────────────────────────────

    fn connect(&mut self) {
        self.teardown();
        self.epoch += 1;
        self.attempts = 0;
        self.was_connected = false;
        self.fallback = false;
        info!(epoch = self.epoch, "Connecting feed");
        self.open_primary();
    }

    fn disconnect(&mut self) {
        self.teardown();
        self.epoch += 1;
        self.attempts = 0;
        self.was_connected = false;
        self.fallback = false;
        self.set_state(ConnectionState::Disconnected);
        info!("Feed disconnected");
    }

    fn update_config(&mut self, patch: TrackingConfigPatch) {
        let changed = self.config.merge(&patch);
        self.config_tx.send_replace(self.config.clone());
        debug!(changed, "Tracking config updated");

        if self.link_open() {
            self.push_config();
        } else if self.fallback {
            self.start_fetch();
        }
        // Otherwise the merged config is pushed when the next link opens.
    }

    fn refresh(&mut self) {
        if self.link_open() {
            self.send_control(&ControlMessage::Refresh);
        } else {
            self.start_fetch();
        }
    }

    // ── Primary transport ───────────────────────────────────

    fn open_primary(&mut self) {
        self.close_link();
        self.set_state(ConnectionState::Connecting);

        let token = self.tokens.token();
        let opened = websocket_url(&self.settings.origin, token.as_deref()).and_then(|url| {
            self.next_generation += 1;
            let generation = self.next_generation;
            let inbox = self.inbox.clone();
            let events = TransportEvents::new(move |event| {
                if let Some(tx) = inbox.upgrade() {
                    let _ = tx.send(Input::Transport { generation, event });
                }
            });
            debug!(%url, generation, "Opening primary transport");
            self.transport
                .open(&url, events)
                .map(|handle| (generation, handle))
        });

        match opened {
            Ok((generation, handle)) => {
                self.link = Some(ActiveLink {
                    generation,
                    handle,
                    opened: false,
                });
            }
            Err(e) => {
                let err = FeedError::TransportConstruction(e);
                warn!(error = %err, "Primary transport construction failed");
                self.set_state(ConnectionState::Error);
                self.emit(FeedEvent::error("Failed to open live connection", Some(err.to_string())));
                self.engage_fallback();
            }
        }
    }

    fn on_transport(&mut self, generation: u64, event: TransportEvent) {
        let current = self.link.as_ref().map(|link| link.generation);
        if current != Some(generation) {
            debug!(generation, ?current, "Ignoring event from superseded link");
            return;
        }

        match event {
            TransportEvent::Opened => self.on_opened(),
            TransportEvent::Message(text) => self.on_message(&text),
            TransportEvent::Error(message) => self.on_link_error(message),
            TransportEvent::Closed => self.on_closed(),
        }
    }

    fn on_opened(&mut self) {
        if let Some(link) = self.link.as_mut() {
            link.opened = true;
        }
        self.attempts = 0;
        self.was_connected = true;
        self.set_state(ConnectionState::Connected);
        info!("Primary transport connected");
        self.push_config();
    }

    fn on_message(&mut self, text: &str) {
        match InboundMessage::parse(text) {
            Ok(InboundMessage::Vessels {
                vessels,
                total_count,
            }) => {
                let normalized = normalize(&vessels, &self.config);
                let total_count = total_count.unwrap_or(normalized.len() as u64);
                debug!(
                    received = vessels.len(),
                    kept = normalized.len(),
                    "Vessel batch from primary transport"
                );
                self.apply_vessels(normalized, total_count, FeedSource::Websocket);
            }
            Ok(InboundMessage::Error { message }) => {
                let message = message.unwrap_or_else(|| "Server reported an error".to_string());
                warn!(%message, "Server error on primary transport");
                self.emit(FeedEvent::error(message, None));
            }
            Err(e) => {
                let err = FeedError::MalformedPayload(e);
                debug!(error = %err, "Ignoring malformed feed message");
            }
        }
    }

    fn on_link_error(&mut self, message: String) {
        let err = FeedError::TransportRuntime(message);
        warn!(error = %err, "Primary transport error");
        self.close_link();
        self.set_state(ConnectionState::Error);
        self.emit(FeedEvent::error("Live connection error", Some(err.to_string())));
        self.engage_fallback();
    }

    fn on_closed(&mut self) {
        let opened = self
            .link
            .take()
            .map(|link| link.opened)
            .unwrap_or_default();

        if self.fallback {
            debug!("Primary transport closed while fallback is engaged");
            return;
        }

        if opened || self.was_connected {
            info!(opened, attempts = self.attempts, "Primary transport closed");
            self.set_state(ConnectionState::Disconnected);
            self.schedule_reconnect();
        } else {
            info!("Primary transport closed before connecting");
            self.engage_fallback();
        }
    }

    fn schedule_reconnect(&mut self) {
        cancel(&mut self.reconnect_timer);

        let delay = self.settings.reconnect_policy.next_delay(self.attempts);
        info!(
            attempt = self.attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        let clock = Arc::clone(&self.clock);
        let inbox = self.inbox.clone();
        let epoch = self.epoch;
        self.reconnect_timer = Some(tokio::spawn(async move {
            clock.sleep(delay).await;
            if let Some(tx) = inbox.upgrade() {
                let _ = tx.send(Input::ReconnectDue { epoch });
            }
        }));
    }

    fn on_reconnect_due(&mut self, epoch: u64) {
        if epoch != self.epoch || self.fallback {
            debug!(epoch, current = self.epoch, "Ignoring stale reconnect timer");
            return;
        }
        self.reconnect_timer = None;

        self.attempts += 1;
        self.emit(FeedEvent::Reconnect {
            attempt: self.attempts,
        });

        if self.attempts > self.settings.max_reconnect_attempts {
            warn!(
                attempts = self.attempts,
                "Reconnect attempts exhausted, switching to REST fallback"
            );
            self.engage_fallback();
        } else {
            info!(attempt = self.attempts, "Reconnecting primary transport");
            self.open_primary();
        }
    }

    fn push_config(&mut self) {
        let message = ControlMessage::Config(self.config.clone());
        self.send_control(&message);
    }

    fn send_control(&mut self, message: &ControlMessage) {
        let Some(link) = self.link.as_mut().filter(|link| link.opened) else {
            return;
        };
        match message.to_json() {
            Ok(text) => {
                if let Err(e) = link.handle.send(text) {
                    warn!(error = %e, "Failed to send control message");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode control message"),
        }
    }

    fn link_open(&self) -> bool {
        self.link.as_ref().is_some_and(|link| link.opened)
    }

    fn close_link(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.handle.close();
        }
    }

    // ── Fallback ────────────────────────────────────────────

    fn engage_fallback(&mut self) {
        if self.fallback {
            return;
        }
        self.fallback = true;
        cancel(&mut self.reconnect_timer);
        self.set_state(ConnectionState::UsingRest);
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "REST fallback engaged"
        );

        self.start_fetch();

        let clock = Arc::clone(&self.clock);
        let inbox = self.inbox.clone();
        let epoch = self.epoch;
        let interval = self.settings.poll_interval;
        cancel(&mut self.poll_timer);
        self.poll_timer = Some(tokio::spawn(async move {
            loop {
                clock.sleep(interval).await;
                let Some(tx) = inbox.upgrade() else {
                    return;
                };
                if tx.send(Input::PollDue { epoch }).is_err() {
                    return;
                }
            }
        }));
    }

    fn on_poll_due(&mut self, epoch: u64) {
        if epoch != self.epoch || !self.fallback {
            debug!(epoch, current = self.epoch, "Ignoring stale poll timer");
            return;
        }
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        self.fetch_seq += 1;
        let seq = self.fetch_seq;
        let epoch = self.epoch;
        let config = self.config.clone();
        let poller = self.poller.clone();
        let inbox = self.inbox.clone();

        debug!(seq, page = config.page, "Starting REST fetch");
        tokio::spawn(async move {
            let result = poller.fetch_once(&config).await;
            if let Some(tx) = inbox.upgrade() {
                let _ = tx.send(Input::Fetched { epoch, seq, result });
            }
        });
    }

    fn on_fetched(&mut self, epoch: u64, seq: u64, result: Result<FetchOutcome, FeedError>) {
        if epoch != self.epoch || seq < self.applied_seq {
            debug!(epoch, seq, applied = self.applied_seq, "Discarding stale fetch result");
            return;
        }
        self.applied_seq = seq;

        match result {
            Ok(outcome) => {
                self.apply_vessels(outcome.vessels, outcome.total_count, outcome.source);
            }
            Err(e) => {
                warn!(error = %e, "REST fetch failed, keeping last known vessels");
                self.emit(FeedEvent::error("Failed to fetch vessels", Some(e.to_string())));
            }
        }
    }

    // ── Shared state ────────────────────────────────────────

    fn apply_vessels(&mut self, vessels: Vec<VesselRecord>, total_count: u64, source: FeedSource) {
        let vessels = Arc::new(vessels);
        self.vessels_tx.send_replace(Arc::clone(&vessels));
        info!(count = vessels.len(), total_count, %source, "Vessel set updated");
        self.emit(FeedEvent::Vessels(VesselsPayload {
            vessels,
            total_count,
            source,
            received_at: self.clock.now(),
        }));
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "Connection state changed");
        self.state = state;
        self.status_tx.send_replace(state);
        self.emit(FeedEvent::Status { status: state });
    }

    fn emit(&self, event: FeedEvent) {
        self.bus.emit(&event);
    }

    /// Close the link and cancel both timers.
    fn teardown(&mut self) {
        self.close_link();
        cancel(&mut self.reconnect_timer);
        cancel(&mut self.poll_timer);
    }
}

fn cancel(timer: &mut Option<JoinHandle<()>>) {
    if let Some(handle) = timer.take() {
        handle.abort();
    }
}
