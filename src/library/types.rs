// Types for stack persistence

use crate::sequencer::TempoStack;
use serde::{Deserialize, Serialize};

/// Version of the on-disk library format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn current() -> Self {
        Self::new(1, 0)
    }

    /// Same major version: minor additions are optional fields
    pub fn is_compatible(&self) -> bool {
        self.major == Self::current().major
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Everything the repository writes to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackLibrary {
    pub version: FormatVersion,
    /// RFC 3339 timestamp of the last save
    pub saved_at: String,
    /// Stacks in display order
    pub stacks: Vec<TempoStack>,
}

impl StackLibrary {
    pub fn new(stacks: Vec<TempoStack>) -> Self {
        Self {
            version: FormatVersion::current(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            stacks,
        }
    }

    /// Library used on first run or when the stored one cannot be read
    pub fn seeded() -> Self {
        Self::new(vec![TempoStack::sample()])
    }
}
