use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

impl Role {
    pub fn from_driver_flag(is_driver: bool) -> Self {
        if is_driver {
            Role::Driver
        } else {
            Role::Passenger
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Passenger => "passenger",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Role::Driver),
            "passenger" => Ok(Role::Passenger),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
