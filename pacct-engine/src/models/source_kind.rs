//! Alias provenance tag

use serde::{Deserialize, Serialize};
use std::fmt;

const OFFICIAL_PREFIX: &str = "official_";

/// Provenance of an alias: an unevidenced guess or a documented source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceKind {
    /// `manual_seed`
    ManualSeed,
    /// `official_*`, holding the full normalized tag (e.g. `official_nombramiento`)
    Official(String),
}

impl SourceKind {
    /// Parse a raw tag (trimmed, case-insensitive)
    pub fn parse(raw: &str) -> Result<Self, String> {
        let normalized = raw.trim().to_lowercase();
        if normalized == pacct_common::db::MANUAL_SEED {
            Ok(Self::ManualSeed)
        } else if normalized.len() > OFFICIAL_PREFIX.len() && normalized.starts_with(OFFICIAL_PREFIX)
        {
            Ok(Self::Official(normalized))
        } else {
            Err(format!(
                "invalid source_kind '{}': expected 'manual_seed' or 'official_*'",
                raw.trim()
            ))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ManualSeed => pacct_common::db::MANUAL_SEED,
            Self::Official(tag) => tag,
        }
    }

    pub fn is_official(&self) -> bool {
        matches!(self, Self::Official(_))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SourceKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SourceKind> for String {
    fn from(value: SourceKind) -> Self {
        value.as_str().to_string()
    }
}
