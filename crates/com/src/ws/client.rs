use {
    crate::*,
    futures_util::{SinkExt, StreamExt},
    std::sync::{Arc, Mutex},
    tokio::sync::{mpsc, oneshot, watch},
    tokio_websockets::{ClientBuilder, MaybeTlsStream, Message, WebSocketStream},
};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// frames waiting for the writer; anything beyond this is dropped
const OUTBOUND_CAPACITY: usize = 1;

/// Receives everything the connection reports.
///
/// Called from the connection's driver task, so implementations must not block.
pub trait TransportHandler: Send + Sync + 'static {
    /// A prediction message arrived. Messages are delivered in wire order.
    fn on_prediction(&self, message: PredictionMessage);

    fn on_state(&self, _state: ConnectionState) {}

    /// The handshake or the established connection failed. No retry follows.
    fn on_error(&self, _error: &ComError) {}
}

struct Shared {
    state: watch::Sender<ConnectionState>,
    outbound: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    handler: Arc<dyn TransportHandler>,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            log::debug!("connection: {previous} -> {state}");
            self.handler.on_state(state);
        }
    }

    fn fail(&self, error: ComError) {
        log::warn!("connection failed: {error}");
        self.outbound.lock().unwrap_or_else(|e| e.into_inner()).take();
        self.handler.on_error(&error);
        self.set_state(ConnectionState::Failed);
    }

    fn deliver(&self, message: Message) {
        if let Some(text) = message.as_text() {
            if text.len() > MAX_MESSAGE_SIZE {
                log::warn!("connection: dropping {} byte message", text.len());
                return;
            }
            match PredictionMessage::parse(text) {
                Ok(prediction) => self.handler.on_prediction(prediction),
                Err(error) => log::warn!("connection: unreadable prediction: {error}"),
            }
        } else if message.is_binary() {
            log::debug!("connection: ignoring binary message");
        }
        // ping, pong and close are handled by the websocket layer
    }
}

/// One persistent WebSocket connection to the inference backend.
pub struct Connection {
    endpoint: http::Uri,
    shared: Arc<Shared>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl Connection {
    /// Start connecting to `endpoint` (a `ws://` URI) and return immediately.
    ///
    /// The connection starts in `Connecting` and moves to `Open` or `Failed`
    /// once the handshake finishes. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ComError::InvalidEndpoint` if the endpoint is not a `ws://` URI,
    /// or `ComError::NoRuntime` outside a tokio runtime.
    pub fn open(endpoint: &str, handler: Arc<dyn TransportHandler>) -> Result<Self, ComError> {
        let uri = parse_endpoint(endpoint)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ComError::NoRuntime)?;

        let (state, _) = watch::channel(ConnectionState::Connecting);
        let shared = Arc::new(Shared {
            state,
            outbound: Mutex::new(None),
            handler,
        });
        shared.handler.on_state(ConnectionState::Connecting);

        let (close_tx, close_rx) = oneshot::channel();
        runtime.spawn(drive(Arc::clone(&shared), uri.clone(), close_rx));
        log::info!("connection: connecting to {uri}");

        Ok(Self {
            endpoint: uri,
            shared,
            close_tx: Mutex::new(Some(close_tx)),
        })
    }

    pub fn endpoint(&self) -> &http::Uri {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Queue one binary frame without waiting for the network.
    ///
    /// Returns `false` and drops the frame if the connection is not open or
    /// the writer is still busy with the previous frame.
    pub fn send(&self, bytes: Vec<u8>) -> bool {
        if self.state() != ConnectionState::Open {
            return false;
        }
        let outbound = self.shared.outbound.lock().unwrap_or_else(|e| e.into_inner());
        match outbound.as_ref() {
            Some(sender) => sender.try_send(bytes).is_ok(),
            None => false,
        }
    }

    /// Begin closing the connection. Idempotent.
    ///
    /// Moves to `Closing` right away; the driver sends a close frame, releases
    /// the socket and moves to `Closed`. A failed connection stays `Failed`.
    pub fn close(&self) {
        let Some(close_tx) = self
            .close_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        else {
            return;
        };
        if self.state().is_terminal() {
            return;
        }
        self.shared
            .outbound
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.shared.set_state(ConnectionState::Closing);
        if close_tx.send(()).is_err() {
            // driver already gone
            self.shared.set_state(ConnectionState::Closed);
        }
    }

    /// Wait until the handshake has either succeeded or failed.
    pub async fn wait_settled(&self) -> ConnectionState {
        self.wait_for(|state| state != ConnectionState::Connecting)
            .await
    }

    /// Wait until the connection is `Closed` or `Failed`.
    pub async fn wait_closed(&self) -> ConnectionState {
        self.wait_for(ConnectionState::is_terminal).await
    }

    async fn wait_for(&self, done: impl Fn(ConnectionState) -> bool) -> ConnectionState {
        let mut receiver = self.shared.state.subscribe();
        loop {
            let state = *receiver.borrow_and_update();
            if done(state) {
                return state;
            }
            if receiver.changed().await.is_err() {
                return *receiver.borrow();
            }
        }
    }
}

impl Drop for Connection {
    // the driver finishes the close handshake on its own
    fn drop(&mut self) {
        self.close();
    }
}

fn parse_endpoint(endpoint: &str) -> Result<http::Uri, ComError> {
    let uri: http::Uri = endpoint
        .parse()
        .map_err(|e| ComError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    if uri.scheme_str() != Some("ws") {
        return Err(ComError::InvalidEndpoint(format!(
            "{endpoint}: expected a ws:// URI"
        )));
    }
    if uri.host().is_none() {
        return Err(ComError::InvalidEndpoint(format!("{endpoint}: missing host")));
    }
    Ok(uri)
}

async fn drive(shared: Arc<Shared>, uri: http::Uri, mut close_rx: oneshot::Receiver<()>) {
    let builder = ClientBuilder::from_uri(uri);
    let stream: WsStream = tokio::select! {
        connected = builder.connect() => match connected {
            Ok((stream, _response)) => stream,
            Err(error) => {
                shared.fail(error.into());
                return;
            }
        },
        _ = &mut close_rx => {
            shared.set_state(ConnectionState::Closed);
            return;
        }
    };

    let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(OUTBOUND_CAPACITY);
    *shared.outbound.lock().unwrap_or_else(|e| e.into_inner()) = Some(frame_tx);
    shared.set_state(ConnectionState::Open);
    log::info!("connection: open");

    let (mut writer, mut reader) = stream.split();
    let mut accepting = true;
    loop {
        tokio::select! {
            frame = frame_rx.recv(), if accepting => {
                let Some(bytes) = frame else {
                    // sender dropped by close(), the close signal follows
                    accepting = false;
                    continue;
                };
                if let Err(error) = writer.send(Message::binary(bytes)).await {
                    shared.fail(error.into());
                    return;
                }
            }
            message = reader.next() => match message {
                Some(Ok(message)) => shared.deliver(message),
                Some(Err(error)) => {
                    shared.fail(error.into());
                    return;
                }
                None => {
                    log::info!("connection: closed by backend");
                    shared.outbound.lock().unwrap_or_else(|e| e.into_inner()).take();
                    shared.handler.on_error(&ComError::ConnectionClosed);
                    shared.set_state(ConnectionState::Closed);
                    return;
                }
            },
            _ = &mut close_rx => {
                if let Err(error) = writer.close().await {
                    log::debug!("connection: close handshake failed: {error}");
                }
                shared.set_state(ConnectionState::Closed);
                log::info!("connection: closed");
                return;
            }
        }
    }
}
