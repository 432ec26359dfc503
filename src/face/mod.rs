//! The Face: an endpoint's multiplexed connection to an NDN forwarder.
//!
//! A [`Face`] is a cheap cloneable handle. All state — the pending-interest
//! table, the filter and prefix tables, the element reader, and the
//! transport — is owned by one driver task, and every callback runs on
//! that task. Handles allocate entry ids from a shared monotonic counter
//! and post commands over an unbounded channel, which also gives
//! operations issued while the connection is still opening their
//! insertion-order drain once it opens.

pub mod command;
pub mod register;
pub mod tables;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::core::constants::{DEFAULT_INTEREST_LIFETIME, LOCAL_TIMEOUT_PREFIX, MAX_PACKET_SIZE};
use crate::core::error::{FaceError, RegisterError};
use crate::transport::reader::ElementReader;
use crate::transport::{Endpoint, Transport};
use crate::wire::{Data, Element, Interest, Name};

use command::{CommandInterestGenerator, KeyChain};
use register::RibVerb;
use tables::{
    FilterEntry, InterestFilter, OnData, OnInterest, OnRegisterFailed, OnRegisterSuccess,
    OnTimeout, PitEntry, PrefixEntry, Tables,
};

const PHASE_UNOPEN: u8 = 0;
const PHASE_OPEN_REQUESTED: u8 = 1;
const PHASE_OPENED: u8 = 2;
const PHASE_CLOSED: u8 = 3;

/// Face configuration.
pub struct FaceConfig {
    endpoints: Vec<Endpoint>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl FaceConfig {
    /// Configuration pointing at the platform default forwarder.
    pub fn new() -> Self {
        Self {
            endpoints: vec![Endpoint::default_local()],
            on_close: None,
        }
    }

    /// Connect to a single endpoint.
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoints = vec![endpoint];
        self
    }

    /// Connect to the first reachable of several endpoints.
    pub fn endpoints(mut self, endpoints: Vec<Endpoint>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Callback invoked once when the Face closes, whether explicitly or
    /// because the transport failed.
    pub fn on_close(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceConfig")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

#[derive(Clone)]
struct SigningInfo {
    keychain: Arc<dyn KeyChain>,
    cert_name: Name,
}

enum Command {
    Express {
        id: u64,
        interest: Interest,
        wire: Vec<u8>,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    },
    RemovePendingInterest {
        id: u64,
    },
    SetFilter {
        id: u64,
        filter: InterestFilter,
        on_interest: OnInterest,
    },
    UnsetFilter {
        id: u64,
    },
    Register {
        prefix_id: u64,
        filter_id: Option<u64>,
        prefix: Name,
        on_interest: Option<OnInterest>,
        on_failed: OnRegisterFailed,
        on_success: Option<OnRegisterSuccess>,
    },
    RegistrationOutcome {
        prefix_id: u64,
        outcome: Result<(), RegisterError>,
    },
    RemoveRegisteredPrefix {
        id: u64,
    },
    PutData {
        wire: Vec<u8>,
    },
    TimerFired {
        id: u64,
    },
    Close,
}

struct FaceShared {
    cmd_tx: mpsc::UnboundedSender<Command>,
    next_id: AtomicU64,
    phase: AtomicU8,
    pit_size: AtomicUsize,
    signing: Mutex<Option<SigningInfo>>,
}

impl FaceShared {
    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn signing(&self) -> Option<SigningInfo> {
        self.signing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Closes the driver once the last Face handle is gone. The driver keeps
/// its own sender alive, so channel closure alone cannot signal this.
struct CloseOnDrop {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Close);
    }
}

/// Handle to a Face. Clones share the same connection and tables.
#[derive(Clone)]
pub struct Face {
    shared: Arc<FaceShared>,
    _close_guard: Arc<CloseOnDrop>,
}

impl Face {
    /// Create a Face and spawn its driver task.
    ///
    /// Must be called from within a Tokio runtime. The transport is not
    /// connected until the first operation needs it.
    pub fn new(config: FaceConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(FaceShared {
            cmd_tx,
            next_id: AtomicU64::new(1),
            phase: AtomicU8::new(PHASE_UNOPEN),
            pit_size: AtomicUsize::new(0),
            signing: Mutex::new(None),
        });

        let driver = Driver {
            shared: shared.clone(),
            cmd_rx,
            endpoints: config.endpoints,
            connected_endpoint: None,
            transport: None,
            reader: ElementReader::new(),
            tables: Tables::new(),
            pending_registrations: HashMap::new(),
            command_gen: CommandInterestGenerator::new(),
            on_close: config.on_close,
        };
        tokio::spawn(driver.run());

        let close_guard = Arc::new(CloseOnDrop {
            cmd_tx: shared.cmd_tx.clone(),
        });
        Self {
            shared,
            _close_guard: close_guard,
        }
    }

    /// Express `interest` (from a defensive copy).
    ///
    /// `on_data` or `on_timeout` is invoked exactly once, never both.
    /// Returns the pending-interest id for `remove_pending_interest`.
    pub fn express_interest<D, T>(
        &self,
        interest: &Interest,
        on_data: D,
        on_timeout: T,
    ) -> Result<u64, FaceError>
    where
        D: FnOnce(&Interest, &Data) + Send + 'static,
        T: FnOnce(&Interest) + Send + 'static,
    {
        self.express_boxed(interest.clone(), Box::new(on_data), Some(Box::new(on_timeout)))
    }

    /// Express an Interest for `name`, copying selectors from `template`.
    pub fn express_interest_named<D, T>(
        &self,
        name: &Name,
        template: Option<&Interest>,
        on_data: D,
        on_timeout: T,
    ) -> Result<u64, FaceError>
    where
        D: FnOnce(&Interest, &Data) + Send + 'static,
        T: FnOnce(&Interest) + Send + 'static,
    {
        let mut interest = template.cloned().unwrap_or_default();
        interest.set_name(name.clone());
        self.express_boxed(interest, Box::new(on_data), Some(Box::new(on_timeout)))
    }

    fn express_boxed(
        &self,
        mut interest: Interest,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    ) -> Result<u64, FaceError> {
        if self.shared.phase.load(Ordering::Acquire) == PHASE_CLOSED {
            return Err(FaceError::NotConnected);
        }
        if interest.lifetime().is_none() {
            interest.set_lifetime(Some(DEFAULT_INTEREST_LIFETIME));
        }
        let wire = interest.encode();
        if wire.len() > MAX_PACKET_SIZE {
            return Err(FaceError::EncodedTooLarge(wire.len()));
        }

        let id = self.shared.alloc_id();
        self.shared
            .cmd_tx
            .send(Command::Express {
                id,
                interest,
                wire,
                on_data,
                on_timeout,
            })
            .map_err(|_| FaceError::NotConnected)?;
        Ok(id)
    }

    /// Cancel an outstanding Interest. Idempotent; its timeout callback
    /// will not fire afterwards. A removal that arrives before the
    /// insertion (the send is asynchronous) suppresses the insertion.
    pub fn remove_pending_interest(&self, id: u64) {
        let _ = self
            .shared
            .cmd_tx
            .send(Command::RemovePendingInterest { id });
    }

    /// Install a local interest filter. No forwarder interaction.
    pub fn set_interest_filter<F>(&self, filter: InterestFilter, on_interest: F) -> u64
    where
        F: FnMut(&Name, &Interest) + Send + 'static,
    {
        let id = self.shared.alloc_id();
        let _ = self.shared.cmd_tx.send(Command::SetFilter {
            id,
            filter,
            on_interest: Box::new(on_interest),
        });
        id
    }

    /// Remove a local interest filter. Idempotent.
    pub fn unset_interest_filter(&self, id: u64) {
        let _ = self.shared.cmd_tx.send(Command::UnsetFilter { id });
    }

    /// Register `prefix` with the forwarder.
    ///
    /// Requires `set_command_signing_info` to have been called. On a
    /// status-200 reply the prefix entry is installed along with an
    /// interest filter when `on_interest` is supplied; any other reply or
    /// a timeout invokes `on_register_failed` with the prefix.
    pub fn register_prefix<G>(
        &self,
        prefix: &Name,
        on_interest: Option<OnInterest>,
        on_register_failed: G,
        on_register_success: Option<OnRegisterSuccess>,
    ) -> Result<u64, FaceError>
    where
        G: FnOnce(&Name) + Send + 'static,
    {
        if self.shared.signing().is_none() {
            return Err(FaceError::NotConfigured);
        }
        if self.shared.phase.load(Ordering::Acquire) == PHASE_CLOSED {
            return Err(FaceError::NotConnected);
        }

        let prefix_id = self.shared.alloc_id();
        let filter_id = on_interest.as_ref().map(|_| self.shared.alloc_id());
        self.shared
            .cmd_tx
            .send(Command::Register {
                prefix_id,
                filter_id,
                prefix: prefix.clone(),
                on_interest,
                on_failed: Box::new(on_register_failed),
                on_success: on_register_success,
            })
            .map_err(|_| FaceError::NotConnected)?;
        Ok(prefix_id)
    }

    /// Withdraw a registration and its related filter, if any.
    pub fn remove_registered_prefix(&self, id: u64) {
        let _ = self
            .shared
            .cmd_tx
            .send(Command::RemoveRegisteredPrefix { id });
    }

    /// Send a Data packet, normally in response to an inbound Interest.
    pub fn put_data(&self, data: &Data) -> Result<(), FaceError> {
        if self.shared.phase.load(Ordering::Acquire) == PHASE_CLOSED {
            return Err(FaceError::NotConnected);
        }
        let wire = data.encode();
        if wire.len() > MAX_PACKET_SIZE {
            return Err(FaceError::EncodedTooLarge(wire.len()));
        }
        self.shared
            .cmd_tx
            .send(Command::PutData { wire })
            .map_err(|_| FaceError::NotConnected)
    }

    /// Install the keychain and certificate name used to sign command
    /// Interests.
    pub fn set_command_signing_info(&self, keychain: Arc<dyn KeyChain>, cert_name: Name) {
        *self.shared.signing.lock().unwrap_or_else(|e| e.into_inner()) = Some(SigningInfo {
            keychain,
            cert_name,
        });
    }

    /// Close the Face. Outstanding timers are cancelled; no further
    /// callbacks fire.
    pub fn close(&self) {
        let _ = self.shared.cmd_tx.send(Command::Close);
    }

    /// Number of outstanding pending Interests.
    pub fn pending_interest_count(&self) -> usize {
        self.shared.pit_size.load(Ordering::Acquire)
    }

    /// Whether the Face has closed.
    pub fn is_closed(&self) -> bool {
        self.shared.phase.load(Ordering::Acquire) == PHASE_CLOSED
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("phase", &self.shared.phase.load(Ordering::Relaxed))
            .field("pit_size", &self.shared.pit_size.load(Ordering::Relaxed))
            .finish()
    }
}

struct PendingRegistration {
    prefix: Name,
    filter_id: Option<u64>,
    on_interest: Option<OnInterest>,
    on_failed: OnRegisterFailed,
    on_success: Option<OnRegisterSuccess>,
}

enum Event {
    Cmd(Option<Command>),
    Chunk(std::io::Result<bytes::Bytes>),
}

struct Driver {
    shared: Arc<FaceShared>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    endpoints: Vec<Endpoint>,
    connected_endpoint: Option<Endpoint>,
    transport: Option<Transport>,
    reader: ElementReader,
    tables: Tables,
    pending_registrations: HashMap<u64, PendingRegistration>,
    command_gen: CommandInterestGenerator,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl Driver {
    async fn run(mut self) {
        loop {
            let Self {
                cmd_rx, transport, ..
            } = &mut self;

            let event = match transport {
                Some(t) => tokio::select! {
                    cmd = cmd_rx.recv() => Event::Cmd(cmd),
                    chunk = t.recv() => Event::Chunk(chunk),
                },
                None => Event::Cmd(cmd_rx.recv().await),
            };

            match event {
                Event::Cmd(None) => {
                    self.shutdown().await;
                    return;
                }
                Event::Cmd(Some(cmd)) => {
                    if !self.handle_command(cmd).await {
                        self.shutdown().await;
                        return;
                    }
                }
                Event::Chunk(Ok(chunk)) if chunk.is_empty() => {
                    debug!("forwarder closed the connection");
                    self.shutdown().await;
                    return;
                }
                Event::Chunk(Ok(chunk)) => {
                    if let Err(err) = self.handle_chunk(&chunk) {
                        warn!(%err, "inbound stream unreadable");
                        self.shutdown().await;
                        return;
                    }
                }
                Event::Chunk(Err(err)) => {
                    warn!(%err, "transport read failed");
                    self.shutdown().await;
                    return;
                }
            }
        }
    }

    fn set_phase(&self, phase: u8) {
        self.shared.phase.store(phase, Ordering::Release);
    }

    fn sync_pit_size(&self) {
        self.shared
            .pit_size
            .store(self.tables.pit_len(), Ordering::Release);
    }

    async fn ensure_open(&mut self) -> bool {
        if self.transport.is_some() {
            return true;
        }
        self.set_phase(PHASE_OPEN_REQUESTED);
        match Transport::connect_any(&self.endpoints).await {
            Ok((transport, endpoint)) => {
                self.connected_endpoint = Some(endpoint);
                self.transport = Some(transport);
                self.set_phase(PHASE_OPENED);
                true
            }
            Err(err) => {
                warn!(%err, "could not reach any forwarder endpoint");
                false
            }
        }
    }

    /// Handle one command; `false` means the Face must shut down.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Express {
                id,
                interest,
                wire,
                on_data,
                on_timeout,
            } => self.handle_express(id, interest, wire, on_data, on_timeout).await,
            Command::RemovePendingInterest { id } => {
                if let Some(mut entry) = self.tables.remove_pit(id) {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    self.sync_pit_size();
                } else {
                    self.tables.defer_pit_removal(id);
                }
                true
            }
            Command::SetFilter {
                id,
                filter,
                on_interest,
            } => {
                self.tables.insert_filter(FilterEntry {
                    id,
                    filter,
                    on_interest,
                });
                true
            }
            Command::UnsetFilter { id } => {
                let _ = self.tables.remove_filter(id);
                true
            }
            Command::Register {
                prefix_id,
                filter_id,
                prefix,
                on_interest,
                on_failed,
                on_success,
            } => {
                self.handle_register(prefix_id, filter_id, prefix, on_interest, on_failed, on_success)
                    .await
            }
            Command::RegistrationOutcome { prefix_id, outcome } => {
                self.handle_registration_outcome(prefix_id, outcome);
                true
            }
            Command::RemoveRegisteredPrefix { id } => {
                if let Some(entry) = self.tables.remove_prefix(id) {
                    if entry.related_filter_id != 0 {
                        let _ = self.tables.remove_filter(entry.related_filter_id);
                    }
                    self.send_unregister(&entry.prefix).await
                } else {
                    self.tables.defer_prefix_removal(id);
                    true
                }
            }
            Command::PutData { wire } => {
                if !self.ensure_open().await {
                    return false;
                }
                self.send_wire(&wire).await
            }
            Command::TimerFired { id } => {
                if let Some(mut entry) = self.tables.remove_pit(id) {
                    if let Some(timer) = entry.timer.take() {
                        timer.abort();
                    }
                    self.sync_pit_size();
                    trace!(name = %entry.interest.name(), "interest timed out");
                    if let Some(on_timeout) = entry.on_timeout {
                        on_timeout(&entry.interest);
                    }
                }
                true
            }
            Command::Close => false,
        }
    }

    async fn handle_express(
        &mut self,
        id: u64,
        interest: Interest,
        wire: Vec<u8>,
        on_data: OnData,
        on_timeout: Option<OnTimeout>,
    ) -> bool {
        if self.tables.take_deferred_pit_removal(id) {
            trace!(id, "expression suppressed by earlier removal");
            return true;
        }

        let local_only = Name::from_uri(LOCAL_TIMEOUT_PREFIX).is_prefix_of(interest.name());
        if !local_only && !self.ensure_open().await {
            return false;
        }

        let lifetime = interest.lifetime().unwrap_or(DEFAULT_INTEREST_LIFETIME);
        let tx = self.shared.cmd_tx.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(lifetime).await;
            let _ = tx.send(Command::TimerFired { id });
        });

        let entry = PitEntry {
            id,
            interest,
            on_data,
            on_timeout,
            created_at: Instant::now(),
            timer: Some(timer),
        };
        if let Err(mut suppressed) = self.tables.insert_pit(entry) {
            if let Some(timer) = suppressed.timer.take() {
                timer.abort();
            }
            return true;
        }
        self.sync_pit_size();

        if local_only {
            trace!(id, "local timeout interest held off the wire");
            return true;
        }
        self.send_wire(&wire).await
    }

    async fn handle_register(
        &mut self,
        prefix_id: u64,
        filter_id: Option<u64>,
        prefix: Name,
        on_interest: Option<OnInterest>,
        on_failed: OnRegisterFailed,
        on_success: Option<OnRegisterSuccess>,
    ) -> bool {
        if self.tables.take_deferred_prefix_removal(prefix_id) {
            return true;
        }
        let Some(signing) = self.shared.signing() else {
            on_failed(&prefix);
            return true;
        };
        if !self.ensure_open().await {
            return false;
        }

        let is_local = match &self.connected_endpoint {
            Some(endpoint) => endpoint.is_local().await.unwrap_or(false),
            None => false,
        };
        let mut interest = register::build_command_interest(RibVerb::Register, &prefix, is_local);
        if let Err(err) = self
            .command_gen
            .prepare(&mut interest, signing.keychain.as_ref(), &signing.cert_name)
            .await
        {
            warn!(%err, prefix = %prefix, "command signing failed");
            on_failed(&prefix);
            return true;
        }
        let wire = interest.encode();
        if wire.len() > MAX_PACKET_SIZE {
            on_failed(&prefix);
            return true;
        }

        self.pending_registrations.insert(
            prefix_id,
            PendingRegistration {
                prefix,
                filter_id,
                on_interest,
                on_failed,
                on_success,
            },
        );

        let tx = self.shared.cmd_tx.clone();
        let on_data: OnData = Box::new(move |_, data| {
            let outcome = register::registration_outcome(data);
            let _ = tx.send(Command::RegistrationOutcome { prefix_id, outcome });
        });
        let tx = self.shared.cmd_tx.clone();
        let on_timeout: OnTimeout = Box::new(move |_| {
            let _ = tx.send(Command::RegistrationOutcome {
                prefix_id,
                outcome: Err(RegisterError::Timeout),
            });
        });

        let id = self.shared.alloc_id();
        self.handle_express(id, interest, wire, on_data, Some(on_timeout))
            .await
    }

    fn handle_registration_outcome(
        &mut self,
        prefix_id: u64,
        outcome: Result<(), RegisterError>,
    ) {
        let Some(pending) = self.pending_registrations.remove(&prefix_id) else {
            return;
        };
        if self.tables.take_deferred_prefix_removal(prefix_id) {
            return;
        }
        match outcome {
            Ok(()) => {
                let related_filter_id = pending.filter_id.unwrap_or(0);
                self.tables.insert_prefix(PrefixEntry {
                    id: prefix_id,
                    prefix: pending.prefix.clone(),
                    related_filter_id,
                });
                if let (Some(filter_id), Some(on_interest)) =
                    (pending.filter_id, pending.on_interest)
                {
                    self.tables.insert_filter(FilterEntry {
                        id: filter_id,
                        filter: InterestFilter::new(pending.prefix.clone()),
                        on_interest,
                    });
                }
                debug!(prefix = %pending.prefix, "prefix registered");
                if let Some(on_success) = pending.on_success {
                    on_success(&pending.prefix, prefix_id);
                }
            }
            Err(err) => {
                warn!(prefix = %pending.prefix, %err, "prefix registration failed");
                (pending.on_failed)(&pending.prefix);
            }
        }
    }

    async fn send_unregister(&mut self, prefix: &Name) -> bool {
        let Some(signing) = self.shared.signing() else {
            debug!(prefix = %prefix, "prefix removed locally; no signing info to unregister");
            return true;
        };
        if self.transport.is_none() {
            return true;
        }

        let is_local = match &self.connected_endpoint {
            Some(endpoint) => endpoint.is_local().await.unwrap_or(false),
            None => false,
        };
        let mut interest = register::build_command_interest(RibVerb::Unregister, prefix, is_local);
        if let Err(err) = self
            .command_gen
            .prepare(&mut interest, signing.keychain.as_ref(), &signing.cert_name)
            .await
        {
            warn!(%err, "could not sign unregister command");
            return true;
        }
        let wire = interest.encode();

        let unregistered = prefix.clone();
        let on_data: OnData = Box::new(move |_, data| {
            match register::registration_outcome(data) {
                Ok(()) => debug!(prefix = %unregistered, "prefix unregistered"),
                Err(err) => warn!(prefix = %unregistered, %err, "unregister rejected"),
            }
        });
        let unregistered = prefix.clone();
        let on_timeout: OnTimeout = Box::new(move |_| {
            warn!(prefix = %unregistered, "unregister command timed out");
        });

        let id = self.shared.alloc_id();
        self.handle_express(id, interest, wire, on_data, Some(on_timeout))
            .await
    }

    async fn send_wire(&mut self, wire: &[u8]) -> bool {
        let Some(transport) = self.transport.as_mut() else {
            return false;
        };
        match transport.send(wire).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "transport write failed");
                false
            }
        }
    }

    fn handle_chunk(&mut self, chunk: &[u8]) -> Result<(), crate::core::error::WireError> {
        for element in self.reader.push(chunk)? {
            match Element::decode(&element) {
                Ok(Element::Data(data)) => self.dispatch_data(data),
                Ok(Element::Interest(interest)) => self.dispatch_interest(interest),
                Err(err) => warn!(%err, "dropping undecodable element"),
            }
        }
        Ok(())
    }

    fn dispatch_data(&mut self, data: Data) {
        let matched = self.tables.extract_matches(&data);
        self.sync_pit_size();
        if matched.is_empty() {
            trace!(name = %data.name(), "unmatched data dropped");
            return;
        }
        for mut entry in matched {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
            let on_data = entry.on_data;
            on_data(&entry.interest, &data);
        }
    }

    fn dispatch_interest(&mut self, interest: Interest) {
        for entry in self.tables.filters_mut() {
            if entry.filter.matches(interest.name()) {
                (entry.on_interest)(&entry.filter.prefix, &interest);
            }
        }
    }

    async fn shutdown(&mut self) {
        self.set_phase(PHASE_CLOSED);
        for mut entry in self.tables.drain_pit() {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
        self.sync_pit_size();
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
        debug!("face closed");
    }
}
