use serde::{Deserialize, Serialize};

/// Hosting platform a repository or owner lives on.
///
/// Stored as a lowercase string in Postgres; unrecognized stored values read
/// back as [`Platform::Unknown`] via [`Platform::parse`] so a schema bump
/// never breaks row decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Github,
    // Gitlab and Bitbucket are expected next; the storage format already
    // accommodates them.
    Unknown,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Github => "github",
            Platform::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "github" => Platform::Github,
            _ => Platform::Unknown,
        }
    }

    /// Whether an integration exists for this platform. Fan-out operations
    /// skip owners on unsupported platforms instead of erroring.
    pub fn is_supported(&self) -> bool {
        matches!(self, Platform::Github)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Github
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
