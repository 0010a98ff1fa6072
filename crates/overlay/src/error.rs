use std::fmt;

#[derive(Debug)]
pub enum OverlayError {
    Video(video::VideoError),
    Com(com::ComError),
    Image(image::ImageError),
    Config(String),
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayError::Video(err) => write!(f, "camera: {err}"),
            OverlayError::Com(err) => write!(f, "transport: {err}"),
            OverlayError::Image(err) => write!(f, "image: {err}"),
            OverlayError::Config(msg) => write!(f, "configuration: {msg}"),
        }
    }
}

impl std::error::Error for OverlayError {}

impl From<video::VideoError> for OverlayError {
    fn from(err: video::VideoError) -> Self {
        OverlayError::Video(err)
    }
}

impl From<com::ComError> for OverlayError {
    fn from(err: com::ComError) -> Self {
        OverlayError::Com(err)
    }
}

impl From<image::ImageError> for OverlayError {
    fn from(err: image::ImageError) -> Self {
        OverlayError::Image(err)
    }
}
