use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a replica takes part in the mesh.
///
/// The host is the only snapshot source: it answers HELLO with a WELCOME and
/// never accepts one. Joiners do the opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    #[serde(alias = "join")]
    Joiner,
}

impl Role {
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }

    pub fn answers_hello(self) -> bool {
        matches!(self, Role::Host)
    }

    pub fn accepts_snapshot(self) -> bool {
        matches!(self, Role::Joiner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Joiner => write!(f, "joiner"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "join" | "joiner" => Ok(Role::Joiner),
            other => Err(format!("unknown mesh role '{}'", other)),
        }
    }
}

/// Bootstrap state. `Active` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotJoined,
    Active(Role),
}

impl SessionPhase {
    pub fn role(self) -> Option<Role> {
        match self {
            SessionPhase::NotJoined => None,
            SessionPhase::Active(role) => Some(role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_are_mirrored() {
        assert!(Role::Host.answers_hello());
        assert!(!Role::Host.accepts_snapshot());
        assert!(!Role::Joiner.answers_hello());
        assert!(Role::Joiner.accepts_snapshot());
    }

    #[test]
    fn parses_config_spellings() {
        assert_eq!("HOST".parse::<Role>(), Ok(Role::Host));
        assert_eq!("join".parse::<Role>(), Ok(Role::Joiner));
        assert!("relay".parse::<Role>().is_err());
    }
}
