use std::fmt;

#[derive(Debug)]
pub enum ComError {
    InvalidEndpoint(String),
    /// No tokio runtime to drive the connection.
    NoRuntime,
    Io(std::io::Error),
    WebSocket(tokio_websockets::Error),
    ConnectionClosed,
    Protocol(String),
}

impl fmt::Display for ComError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComError::InvalidEndpoint(msg) => write!(f, "invalid endpoint: {msg}"),
            ComError::NoRuntime => write!(f, "no tokio runtime available"),
            ComError::Io(err) => write!(f, "io error: {err}"),
            ComError::WebSocket(err) => write!(f, "websocket error: {err}"),
            ComError::ConnectionClosed => write!(f, "connection closed"),
            ComError::Protocol(msg) => write!(f, "protocol error: {msg}"),
        }
    }
}

impl std::error::Error for ComError {}

impl From<std::io::Error> for ComError {
    fn from(err: std::io::Error) -> Self {
        ComError::Io(err)
    }
}

impl From<tokio_websockets::Error> for ComError {
    fn from(err: tokio_websockets::Error) -> Self {
        ComError::WebSocket(err)
    }
}

impl From<serde_json::Error> for ComError {
    fn from(err: serde_json::Error) -> Self {
        ComError::Protocol(err.to_string())
    }
}
