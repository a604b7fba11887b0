//! Local actor identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which side of a trip the local actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Rider,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rider => "rider",
            Self::Driver => "driver",
        }
    }

    /// Key naming the actor in outbound location messages.
    pub fn location_key(&self) -> &'static str {
        match self {
            Self::Rider => "riderId",
            Self::Driver => "driverId",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rider" => Ok(Self::Rider),
            "driver" => Ok(Self::Driver),
            other => Err(format!("unknown role '{}' (expected rider or driver)", other)),
        }
    }
}

/// Identity sent to the server on every (re)connect.
///
/// Created once per process and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    id: String,
    role: Role,
}

impl ActorIdentity {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Generate a fresh `<role>_<uuid>` identity.
    pub fn generate(role: Role) -> Self {
        Self::new(format!("{}_{}", role, uuid::Uuid::new_v4().simple()), role)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Driver".parse::<Role>(), Ok(Role::Driver));
        assert_eq!(" rider ".parse::<Role>(), Ok(Role::Rider));
        assert!("pilot".parse::<Role>().is_err());
    }

    #[test]
    fn test_generate_prefix() {
        let id = ActorIdentity::generate(Role::Driver);
        assert!(id.id().starts_with("driver_"));
        assert_eq!(id.id().len(), "driver_".len() + 32);
        assert_ne!(id, ActorIdentity::generate(Role::Driver));
    }

    #[test]
    fn test_location_key() {
        assert_eq!(Role::Driver.location_key(), "driverId");
        assert_eq!(Role::Rider.location_key(), "riderId");
    }
}
