use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy applied when a runtime value falls outside a classification's codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UndefinedHandlingType {
    /// Reject the value with an error.
    Exception,
    /// Accept the value and log it.
    Logging,
    /// Accept the value silently.
    Allowed,
}

impl UndefinedHandlingType {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Exception => "EXCEPTION",
            Self::Logging => "LOGGING",
            Self::Allowed => "ALLOWED",
        }
    }

    /// Parse a definition code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "EXCEPTION" => Some(Self::Exception),
            "LOGGING" => Some(Self::Logging),
            "ALLOWED" => Some(Self::Allowed),
            _ => None,
        }
    }

    /// Whether generated accessors should validate codes under this policy.
    pub const fn is_checked(&self) -> bool {
        matches!(self, Self::Exception | Self::Logging)
    }
}

impl fmt::Display for UndefinedHandlingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UndefinedHandlingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown undefined handling type: {s}"))
    }
}

/// Global default for classifications that set no handling type of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlingCompatibility {
    /// Older projects: unset handling means EXCEPTION.
    Legacy,
    /// Unset handling means LOGGING.
    #[default]
    Modern,
}

impl HandlingCompatibility {
    pub const fn default_handling(&self) -> UndefinedHandlingType {
        match self {
            Self::Legacy => UndefinedHandlingType::Exception,
            Self::Modern => UndefinedHandlingType::Logging,
        }
    }
}
