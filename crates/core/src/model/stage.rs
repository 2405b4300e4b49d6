use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Phase of a validation session. Each stage has its own flip set and answer submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStage {
    Short,
    Long,
}

impl ValidationStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }

    /// Node RPC method listing the flips assigned for this stage.
    #[must_use]
    pub const fn hashes_method(self) -> &'static str {
        match self {
            Self::Short => "flip_shortHashes",
            Self::Long => "flip_longHashes",
        }
    }

    /// Node RPC method accepting this stage's answers.
    #[must_use]
    pub const fn submit_method(self) -> &'static str {
        match self {
            Self::Short => "flip_submitShortAnswers",
            Self::Long => "flip_submitLongAnswers",
        }
    }

    /// The stage that follows a successful submission, `None` once validation is over.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Short => Some(Self::Long),
            Self::Long => None,
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStageError(String);

impl fmt::Display for ParseStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown validation stage: {}", self.0)
    }
}

impl std::error::Error for ParseStageError {}

impl FromStr for ValidationStage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            _ => Err(ParseStageError(s.to_string())),
        }
    }
}
