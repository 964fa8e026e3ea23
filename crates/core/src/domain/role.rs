use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Who is filling the quotation form; selects the subsidy caps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Telecaller,
    BusinessDevelopmentOfficer,
    Manager,
    CoFounder,
}

impl Role {
    pub const ALL: [Role; 4] =
        [Role::Telecaller, Role::BusinessDevelopmentOfficer, Role::Manager, Role::CoFounder];

    pub fn label(self) -> &'static str {
        match self {
            Self::Telecaller => "Telecaller",
            Self::BusinessDevelopmentOfficer => "Business Development Officer",
            Self::Manager => "Manager",
            Self::CoFounder => "Co-Founder",
        }
    }

    /// Parses a form value. A blank value means no role was chosen yet.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, DomainError> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        value.parse().map(Some)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "telecaller" => Ok(Self::Telecaller),
            "business development officer" | "bdo" => Ok(Self::BusinessDevelopmentOfficer),
            "manager" => Ok(Self::Manager),
            "co founder" | "cofounder" => Ok(Self::CoFounder),
            _ => Err(DomainError::UnknownRole),
        }
    }
}
