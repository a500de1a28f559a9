use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Role claim resolved against the fixed role set. Unknown claims yield `None`.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    /// Name recorded against audit notes.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.id)
    }
}

/// Closed set of principals the hospital recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Receptionist,
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let normalized = normalized.strip_prefix("role_").unwrap_or(&normalized);
        match normalized {
            "admin" => Some(Role::Admin),
            "receptionist" | "front_desk" | "front-desk" => Some(Role::Receptionist),
            "doctor" => Some(Role::Doctor),
            "nurse" => Some(Role::Nurse),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Receptionist => write!(f, "receptionist"),
            Role::Doctor => write!(f, "doctor"),
            Role::Nurse => write!(f, "nurse"),
            Role::Patient => write!(f, "patient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spring_style_and_plain_roles() {
        assert_eq!(Role::parse("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("front-desk"), Some(Role::Receptionist));
        assert_eq!(Role::parse("patient"), Some(Role::Patient));
        assert_eq!(Role::parse("authenticated"), None);
    }
}
