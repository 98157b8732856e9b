//! Manager connection lifecycle and message dispatch.
//!
//! [`ManagerConnection`] is the main point of access to the manager API.
//! Once connected you can send actions to and read events from Asterisk.
//!
//! Actions are sent with [`ManagerConnection::send_action`] (blocks until
//! the response arrives) or [`ManagerConnection::send_action_with`] (the
//! handler fires later from [`process_responses`]). Response correlation
//! is FIFO over the single socket: responses are delivered to handlers in
//! send order, which is why the connection is single-owner by contract —
//! interleaving sends from several tasks would silently mispair responses.
//!
//! To receive events, register a handler with
//! [`ManagerConnection::register_event`] (use `""` to match every event),
//! then drive the queues:
//!
//! ```rust,no_run
//! # use asterisk_ami_rs::{ManagerConnection, AmiResult};
//! # async fn run(mut connection: ManagerConnection) -> AmiResult<()> {
//! loop {
//!     connection.wait_event().await?;
//!     connection.pump_messages().await?;
//!     connection.process_events();
//!     connection.process_responses(); // if sending actions asynchronously
//! }
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::actions::ManagerAction;
use crate::constants::*;
use crate::error::{AmiError, AmiResult};
use crate::message::Message;
use crate::protocol::{parse_greeting, AmiParser};

/// Completion callback for an asynchronously sent action
pub type ResponseHandler = Box<dyn FnOnce(Message) + Send>;

/// Event subscriber callback
pub type EventHandler = Box<dyn FnMut(&Message) + Send>;

/// An Asterisk Manager connection.
///
/// Owns the TCP socket, the inbound event and response queues, the pending
/// response-handler queue, and the event subscriber registry. All queues
/// live for the connection's lifetime.
pub struct ManagerConnection {
    stream: TcpStream,
    parser: AmiParser,
    read_buffer: Box<[u8; SOCKET_BUF_SIZE]>,
    connected: bool,

    name: String,
    version: String,
    host: String,
    port: u16,

    events: VecDeque<Message>,
    responses: VecDeque<Message>,
    response_handlers: VecDeque<ResponseHandler>,
    registry: Arc<Mutex<EventRegistry>>,
}

impl ManagerConnection {
    /// Connect to the manager at `host:port` and read the server greeting.
    ///
    /// The peer sends exactly one `<server-name>/<version>` line before the
    /// message stream begins; it is parsed into [`name`](Self::name) and
    /// [`version`](Self::version).
    pub async fn connect(host: &str, port: u16) -> AmiResult<Self> {
        info!("connecting to Asterisk manager at {}:{}", host, port);
        let stream = Self::open_stream(host, port).await?;

        let mut connection = Self {
            stream,
            parser: AmiParser::new(),
            read_buffer: Box::new([0u8; SOCKET_BUF_SIZE]),
            connected: true,
            name: String::new(),
            version: String::new(),
            host: host.to_string(),
            port,
            events: VecDeque::new(),
            responses: VecDeque::new(),
            response_handlers: VecDeque::new(),
            registry: Arc::new(Mutex::new(EventRegistry::new())),
        };

        connection.read_greeting().await?;
        info!(
            "connected to {} version {}",
            connection.name, connection.version
        );
        Ok(connection)
    }

    /// Connect to the default manager port
    pub async fn connect_default(host: &str) -> AmiResult<Self> {
        Self::connect(host, DEFAULT_AMI_PORT).await
    }

    async fn open_stream(host: &str, port: u16) -> AmiResult<TcpStream> {
        match timeout(
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            TcpStream::connect((host, port)),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => {
                warn!("TCP connect failed: {}", e);
                Err(AmiError::Io(e))
            }
            Err(_) => {
                warn!("TCP connect timed out after {}ms", DEFAULT_TIMEOUT_MS);
                Err(AmiError::Timeout {
                    timeout_ms: DEFAULT_TIMEOUT_MS,
                })
            }
        }
    }

    async fn read_greeting(&mut self) -> AmiResult<()> {
        let line = loop {
            if let Some(line) = self.parser.take_line()? {
                break line;
            }
            self.fill_from_socket().await?;
        };

        let (name, version) = parse_greeting(&line);
        self.name = name;
        self.version = version;
        Ok(())
    }

    /// Re-establish the connection, optionally re-wiring host and port.
    ///
    /// Omitted arguments reuse the values given at construction (the port
    /// is only updated when a host is also given). Any existing connection
    /// is replaced; queues and subscribers are retained.
    pub async fn reconnect(&mut self, host: Option<&str>, port: Option<u16>) -> AmiResult<()> {
        if let Some(host) = host {
            self.host = host.to_string();
            if let Some(port) = port {
                self.port = port;
            }
        }

        let stream = Self::open_stream(&self.host, self.port).await?;
        self.stream = stream;
        self.parser = AmiParser::new();
        self.connected = true;
        self.read_greeting().await
    }

    /// Close the connection to Asterisk, shutting the socket down
    pub async fn disconnect(&mut self) -> AmiResult<()> {
        if self.connected {
            info!("disconnecting from Asterisk manager");
            self.connected = false;
            if let Err(e) = self.stream.shutdown().await {
                debug!("socket shutdown failed: {}", e);
            }
        }
        Ok(())
    }

    /// Whether the connection is open
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The name of the manager we are connected to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version string of the manager we are connected to
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Send an action and wait for its response.
    ///
    /// Messages arriving while waiting are routed to their queues; events
    /// are never discarded. Responses to previously queued asynchronous
    /// actions are dispatched in order before this action's own response
    /// is captured.
    ///
    /// The response is returned raw. Pass it through the action's
    /// [`handle_response`](ManagerAction::handle_response) — or use
    /// [`execute`](Self::execute) — for error translation.
    pub async fn send_action(&mut self, action: &dyn ManagerAction) -> AmiResult<Message> {
        let slot: Arc<Mutex<Option<Message>>> = Arc::new(Mutex::new(None));
        let waiter: ResponseHandler = {
            let slot = Arc::clone(&slot);
            Box::new(move |response| {
                *slot.lock().unwrap() = Some(response);
            })
        };
        self.send_action_with(action, waiter).await?;

        loop {
            if let Some(response) = slot.lock().unwrap().take() {
                return Ok(response);
            }
            self.wait_response().await?;
            self.process_responses();
        }
    }

    /// Send an action and receive its response asynchronously.
    ///
    /// The action is written to the socket and `handler` is queued; it
    /// fires from [`process_responses`](Self::process_responses) when the
    /// matching response has been read. No read is performed here.
    pub async fn send_action_with(
        &mut self,
        action: &dyn ManagerAction,
        handler: ResponseHandler,
    ) -> AmiResult<()> {
        if !self.connected {
            return Err(AmiError::NotConnected);
        }

        let mut message = action.to_message();
        if let Some(id) = action.action_id() {
            message.set(HEADER_ACTION_ID, id);
        }

        let wire = message.to_wire()?;
        trace!("sending action:\n{}", wire.trim_end());
        self.stream.write_all(wire.as_bytes()).await?;
        self.response_handlers.push_back(handler);
        Ok(())
    }

    /// Send an action and run its response handler, returning the
    /// processed response or the translated failure.
    pub async fn execute(&mut self, action: &mut dyn ManagerAction) -> AmiResult<Message> {
        let response = self.send_action(action).await?;
        action.handle_response(response)
    }

    /// Dispatch queued responses to their pending handlers in pair order.
    ///
    /// Responses and handlers are popped one pair at a time because a
    /// handler may itself queue further responses; the loop condition is
    /// re-tested after every invocation.
    pub fn process_responses(&mut self) {
        while !self.response_handlers.is_empty() && !self.responses.is_empty() {
            let handler = self.response_handlers.pop_front().unwrap();
            let response = self.responses.pop_front().unwrap();
            handler(response);
        }
    }

    /// Dispatch every queued event to its registered subscribers.
    ///
    /// Events are popped before their handlers run, so a handler causing
    /// more events to be queued never invalidates the iteration. For each
    /// event, subscribers registered under the exact event name fire first
    /// (in registration order), then the catch-all subscribers registered
    /// under `""`.
    pub fn process_events(&mut self) {
        while let Some(event) = self.events.pop_front() {
            let name = event.primary().unwrap_or("").to_string();
            trace!("dispatching event {}", name);
            let mut registry = self.registry.lock().unwrap();
            registry.dispatch(&name, &event);
            registry.dispatch("", &event);
        }
    }

    /// Block until at least one event is queued.
    ///
    /// Does not block if an event is already waiting. Responses read while
    /// waiting are queued, not discarded.
    pub async fn wait_event(&mut self) -> AmiResult<()> {
        while self.events.is_empty() {
            self.read_message().await?;
        }
        Ok(())
    }

    /// Block until at least one response is queued.
    ///
    /// Does not block if a response is already waiting. Events read while
    /// waiting are queued, not discarded.
    pub async fn wait_response(&mut self) -> AmiResult<()> {
        while self.responses.is_empty() {
            self.read_message().await?;
        }
        Ok(())
    }

    /// Read messages from the network until no more data is waiting.
    ///
    /// Does not block: drains whatever the socket has ready, routes every
    /// complete message to its queue, and returns promptly when the socket
    /// is empty.
    pub async fn pump_messages(&mut self) -> AmiResult<()> {
        if !self.connected {
            return Err(AmiError::NotConnected);
        }

        loop {
            match self.stream.try_read(&mut self.read_buffer[..]) {
                Ok(0) => {
                    self.connected = false;
                    return Err(AmiError::ConnectionClosed);
                }
                Ok(n) => {
                    trace!("pumped {} bytes from socket", n);
                    self.parser.extend(&self.read_buffer[..n])?;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.connected = false;
                    return Err(AmiError::Io(e));
                }
            }
        }

        while let Some(message) = self.parser.parse_message()? {
            self.route(message);
        }
        Ok(())
    }

    /// Register an event handler.
    ///
    /// `event` is case sensitive and must match exactly what Asterisk
    /// sends as the `Event` header value. Pass `""` to match all events;
    /// the catch-all fires for every event *after* any name-matched
    /// subscribers. Registering the same callback twice yields two
    /// invocations per matching event.
    ///
    /// The returned [`Subscription`] detaches exactly this handler when
    /// dropped (or via [`Subscription::unsubscribe`]).
    pub fn register_event(
        &mut self,
        event: &str,
        handler: impl FnMut(&Message) + Send + 'static,
    ) -> Subscription {
        let id = self
            .registry
            .lock()
            .unwrap()
            .register(event, Box::new(handler));
        debug!("registered subscriber {} for event {:?}", id, event);
        Subscription {
            registry: Arc::downgrade(&self.registry),
            event: event.to_string(),
            id,
        }
    }

    /// Read one whole message from the network and route it to its queue
    async fn read_message(&mut self) -> AmiResult<()> {
        loop {
            if let Some(message) = self.parser.parse_message()? {
                self.route(message);
                return Ok(());
            }
            self.fill_from_socket().await?;
        }
    }

    async fn fill_from_socket(&mut self) -> AmiResult<()> {
        if !self.connected {
            return Err(AmiError::NotConnected);
        }
        let n = self.stream.read(&mut self.read_buffer[..]).await?;
        if n == 0 {
            self.connected = false;
            return Err(AmiError::ConnectionClosed);
        }
        trace!("read {} bytes from socket", n);
        self.parser.extend(&self.read_buffer[..n])
    }

    fn route(&mut self, message: Message) {
        use crate::message::MessageKind;
        match message.kind() {
            MessageKind::Event => self.events.push_back(message),
            MessageKind::Response => self.responses.push_back(message),
            // the parser only ever produces events and responses
            MessageKind::Action => unreachable!("parser produced an Action message"),
        }
    }

    /// Number of events waiting to be dispatched
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Number of responses waiting to be paired with a handler
    pub fn pending_responses(&self) -> usize {
        self.responses.len()
    }
}

impl Drop for ManagerConnection {
    fn drop(&mut self) {
        if self.connected {
            debug!("ManagerConnection dropped, connection will be closed");
        }
    }
}

/// Registry of event subscribers keyed by event name.
///
/// Each registration occupies a generational slot so that releasing one
/// handle removes exactly that callback, even when the same name holds
/// several subscribers.
struct EventRegistry {
    next_id: u64,
    slots: HashMap<String, Vec<(u64, EventHandler)>>,
}

impl EventRegistry {
    fn new() -> Self {
        Self {
            next_id: 0,
            slots: HashMap::new(),
        }
    }

    fn register(&mut self, event: &str, handler: EventHandler) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.slots
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn remove(&mut self, event: &str, id: u64) {
        if let Some(handlers) = self.slots.get_mut(event) {
            handlers.retain(|(slot, _)| *slot != id);
            if handlers.is_empty() {
                self.slots.remove(event);
            }
        }
    }

    fn dispatch(&mut self, name: &str, event: &Message) {
        if let Some(handlers) = self.slots.get_mut(name) {
            for (_, handler) in handlers.iter_mut() {
                handler(event);
            }
        }
    }
}

/// Handle to one registered event subscriber.
///
/// Holds a weak reference to the registry; dropping the handle removes
/// only its own callback. Outliving the connection is harmless.
#[must_use = "dropping a Subscription immediately detaches the handler"]
pub struct Subscription {
    registry: Weak<Mutex<EventRegistry>>,
    event: String,
    id: u64,
}

impl Subscription {
    /// Detach this subscriber from the connection
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().unwrap().remove(&self.event, self.id);
        }
    }
}
