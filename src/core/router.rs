use serde::{Deserialize, Serialize};
use std::fmt;

/// Model label recorded with a job. Labels do not change how data is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Quantum,
    Diffusion,
    Transformer,
    Neural,
    Gan,
}

const QUANTUM_THRESHOLD: usize = 10_000_000;

impl ModelKind {
    pub fn select(
        record_count: usize,
        privacy: &str,
        correlations: bool,
        data_type: &str,
        seasonality: bool,
    ) -> Self {
        let data_type = data_type.to_lowercase();
        if record_count > QUANTUM_THRESHOLD {
            Self::Quantum
        } else if privacy.eq_ignore_ascii_case("high") {
            Self::Diffusion
        } else if correlations && data_type == "financial" {
            Self::Transformer
        } else if seasonality || data_type.contains("time") {
            Self::Neural
        } else {
            Self::Gan
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Quantum => "quantum",
            Self::Diffusion => "diffusion",
            Self::Transformer => "transformer",
            Self::Neural => "neural",
            Self::Gan => "gan",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
