use {
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Which camera to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Front,
    #[default]
    Back,
}

impl Sensor {
    pub fn opposite(self) -> Self {
        match self {
            Sensor::Front => Sensor::Back,
            Sensor::Back => Sensor::Front,
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Front => write!(f, "front"),
            Sensor::Back => write!(f, "back"),
        }
    }
}

impl FromStr for Sensor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Sensor::Front),
            "back" => Ok(Sensor::Back),
            other => Err(format!("unknown sensor '{other}', expected front or back")),
        }
    }
}
