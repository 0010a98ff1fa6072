use {
    crate::*,
    futures_util::{SinkExt, StreamExt},
    std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration},
    tokio::{
        net::{TcpListener, ToSocketAddrs},
        sync::{RwLock, mpsc},
        task::JoinHandle,
    },
    tokio_websockets::{Message, ServerBuilder, WebSocketStream},
};

type WsSink = futures_util::stream::SplitSink<WebSocketStream<tokio::net::TcpStream>, Message>;

const ACCEPT_RETRY_MS: u64 = 100;

/// A binary frame received from one client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub addr: SocketAddr,
    pub data: Vec<u8>,
}

/// Backend side of the protocol: accepts clients, collects their binary
/// frames and broadcasts label lists back as JSON text.
pub struct WsServer {
    clients: Arc<RwLock<HashMap<SocketAddr, WsSink>>>,
    rx: mpsc::Receiver<ReceivedFrame>,
    accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl WsServer {
    /// Bind a TCP listener and start accepting WebSocket connections.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, ComError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let clients: Arc<RwLock<HashMap<SocketAddr, WsSink>>> =
            Arc::new(RwLock::new(HashMap::new()));
        let (tx, rx) = mpsc::channel(256);

        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&clients), tx));
        log::info!("server: listening on {local_addr}");

        Ok(Self {
            clients,
            rx,
            accept_task,
            local_addr,
        })
    }

    /// Next binary frame from any client.
    ///
    /// Returns `ComError::ConnectionClosed` once the accept loop is gone and
    /// every reader has finished.
    pub async fn recv(&mut self) -> Result<ReceivedFrame, ComError> {
        self.rx.recv().await.ok_or(ComError::ConnectionClosed)
    }

    /// Broadcast a label list to every connected client.
    ///
    /// Clients that fail to receive are dropped from the client map.
    pub async fn send_labels(&self, labels: &[String]) {
        let text = PredictionMessage::new(labels.to_vec()).to_json();
        self.broadcast(Message::text(text)).await;
    }

    /// Broadcast raw text, well-formed or not.
    pub async fn send_text(&self, text: &str) {
        self.broadcast(Message::text(text.to_string())).await;
    }

    async fn broadcast(&self, message: Message) {
        let mut clients = self.clients.write().await;
        let mut failed = Vec::new();
        for (addr, writer) in clients.iter_mut() {
            if let Err(error) = writer.send(message.clone()).await {
                log::warn!("server: send to {addr} failed: {error}");
                failed.push(*addr);
            }
        }
        for addr in failed {
            clients.remove(&addr);
        }
    }

    /// Close every client connection, keeping the listener open.
    pub async fn close_all(&self) {
        let mut clients = self.clients.write().await;
        for (addr, mut writer) in clients.drain() {
            if let Err(error) = writer.close().await {
                log::debug!("server: closing {addr} failed: {error}");
            }
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `ws://` endpoint clients can connect to.
    pub fn endpoint(&self) -> String {
        format!("ws://{}/ws", self.local_addr)
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(
    listener: TcpListener,
    clients: Arc<RwLock<HashMap<SocketAddr, WsSink>>>,
    tx: mpsc::Sender<ReceivedFrame>,
) {
    loop {
        let (tcp_stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                log::warn!("server: accept failed: {error}");
                tokio::time::sleep(Duration::from_millis(ACCEPT_RETRY_MS)).await;
                continue;
            }
        };
        let stream = match ServerBuilder::new().accept(tcp_stream).await {
            Ok((_request, stream)) => stream,
            Err(error) => {
                log::warn!("server: handshake with {addr} failed: {error}");
                continue;
            }
        };
        log::debug!("server: client {addr} connected");

        let (writer, reader) = stream.split();
        clients.write().await.insert(addr, writer);
        tokio::spawn(read_client(addr, reader, Arc::clone(&clients), tx.clone()));
    }
}

async fn read_client(
    addr: SocketAddr,
    mut reader: futures_util::stream::SplitStream<WebSocketStream<tokio::net::TcpStream>>,
    clients: Arc<RwLock<HashMap<SocketAddr, WsSink>>>,
    tx: mpsc::Sender<ReceivedFrame>,
) {
    loop {
        match reader.next().await {
            Some(Ok(message)) => {
                if !message.is_binary() {
                    continue;
                }
                let data = message.into_payload().to_vec();
                if data.len() > MAX_MESSAGE_SIZE {
                    log::warn!("server: frame from {addr} too large: {} bytes", data.len());
                    continue;
                }
                if tx.send(ReceivedFrame { addr, data }).await.is_err() {
                    break;
                }
            }
            Some(Err(error)) => {
                log::warn!("server: client {addr} failed: {error}");
                break;
            }
            None => {
                log::debug!("server: client {addr} disconnected");
                break;
            }
        }
    }
    clients.write().await.remove(&addr);
}
