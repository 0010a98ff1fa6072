use crate::ComError;

/// Labels recognized by the backend, oldest first.
///
/// On the wire this is a bare JSON array of strings, e.g. `["hello_2","thanks_1"]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PredictionMessage {
    pub labels: Vec<String>,
}

impl PredictionMessage {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn parse(text: &str) -> Result<Self, ComError> {
        let labels: Vec<String> = serde_json::from_str(text)?;
        Ok(Self { labels })
    }

    pub fn to_json(&self) -> String {
        // a Vec<String> always serializes
        serde_json::to_string(&self.labels).unwrap_or_else(|_| "[]".to_string())
    }
}
