use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    /// Plane data is malformed or too short for the frame dimensions.
    Conversion(String),
    /// Dimensions, buffer length or quality are not encodable.
    Encoding(String),
    Decode(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Conversion(msg) => write!(f, "conversion error: {msg}"),
            ImageError::Encoding(msg) => write!(f, "encoding error: {msg}"),
            ImageError::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}
