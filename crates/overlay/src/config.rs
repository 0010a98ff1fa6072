use {
    crate::OverlayError,
    base::Vec2,
    serde::Deserialize,
    std::path::Path,
    video::Sensor,
};

pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000/ws";
pub const DEFAULT_DELIMITER: char = '_';

/// Settings for one overlay pipeline.
///
/// Missing fields in a JSON file fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    endpoint: String,
    quality: u8,
    sensor: Sensor,
    width: usize,
    height: usize,
    frame_rate: f32,
    delimiter: char,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            quality: image::DEFAULT_QUALITY,
            sensor: Sensor::Back,
            width: 480,
            height: 640,
            frame_rate: 30.0,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl OverlayConfig {
    /// Load from a JSON file and validate.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OverlayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| OverlayError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, OverlayError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| OverlayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that the type system does not.
    pub fn validate(&self) -> Result<(), OverlayError> {
        if !self.endpoint.starts_with("ws://") {
            return Err(OverlayError::Config(format!(
                "endpoint {} is not a ws:// URI",
                self.endpoint
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(OverlayError::Config(format!(
                "quality {} outside 1..=100",
                self.quality
            )));
        }
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(OverlayError::Config(format!(
                "frame size {}x{} must be even and non-zero",
                self.width, self.height
            )));
        }
        if self.frame_rate.is_nan() || self.frame_rate < 0.0 {
            return Err(OverlayError::Config(format!(
                "frame rate {} is negative",
                self.frame_rate
            )));
        }
        Ok(())
    }

    /// Set the backend WebSocket endpoint (e.g., "ws://10.0.0.2:8000/ws").
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the JPEG quality (1..=100).
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the sensor bound by `start_capture` when none is given.
    pub fn with_sensor(mut self, sensor: Sensor) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set the capture size in pixels.
    pub fn with_size(mut self, size: Vec2<usize>) -> Self {
        self.width = size.x;
        self.height = size.y;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: f32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the character that separates a label from its variant suffix.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    // Getters
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn size(&self) -> Vec2<usize> {
        Vec2::new(self.width, self.height)
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Synthetic camera matching the configured size and rate.
    pub fn synthetic_backend(&self) -> video::CaptureBackend {
        video::CaptureBackend::Synthetic(
            video::SyntheticConfig::default()
                .with_size(self.size())
                .with_frame_rate(self.frame_rate),
        )
    }

    /// V4L2 camera matching the configured size and rate.
    #[cfg(feature = "v4l2")]
    pub fn v4l2_backend(&self) -> video::CaptureBackend {
        video::CaptureBackend::V4l2(
            video::V4l2Config::default()
                .with_size(self.size())
                .with_frame_rate(self.frame_rate),
        )
    }
}
