use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Provenance of a tracked component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Created in this workspace.
    #[default]
    Authored,
    /// Brought in from elsewhere; locally editable but its id is fixed.
    Imported,
    /// Pulled in transitively by dependency resolution. Not user-editable.
    Nested,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authored => "authored",
            Self::Imported => "imported",
            Self::Nested => "nested",
        }
    }

    /// Whether direct user actions (add, re-add) may modify the entry.
    pub fn is_user_editable(&self) -> bool {
        !matches!(self, Self::Nested)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authored" => Ok(Self::Authored),
            "imported" => Ok(Self::Imported),
            "nested" => Ok(Self::Nested),
            other => Err(TypeError::UnknownOrigin(other.to_string())),
        }
    }
}
