use std::fmt;

#[derive(Debug)]
pub enum VideoError {
    /// The requested sensor could not be bound.
    Bind(String),
    /// The session has no active binding.
    Inactive,
    Device(String),
    Stream(String),
    /// No frame arrived within the capture timeout.
    Timeout,
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::Bind(msg) => write!(f, "camera bind error: {msg}"),
            VideoError::Inactive => write!(f, "capture session is not running"),
            VideoError::Device(msg) => write!(f, "device error: {msg}"),
            VideoError::Stream(msg) => write!(f, "stream error: {msg}"),
            VideoError::Timeout => write!(f, "capture timed out"),
        }
    }
}

impl std::error::Error for VideoError {}

impl From<std::io::Error> for VideoError {
    fn from(err: std::io::Error) -> Self {
        VideoError::Device(err.to_string())
    }
}
