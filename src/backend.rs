use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies which generation of the platform API handled (or failed) a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// First-generation SOAP/XML API.
    Legacy,
    /// Second-generation JSON/HTTP API.
    Rest,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Legacy => "legacy",
            Backend::Rest => "rest",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Backend::Legacy),
            "rest" => Ok(Backend::Rest),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}
