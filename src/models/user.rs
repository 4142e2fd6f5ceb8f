use std::fmt;

use serde::{Deserialize, Serialize};

use super::wire;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "wire::opt_id")]
    pub tenant_id: Option<String>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_backend(&self.role)
    }
}

fn default_true() -> bool {
    true
}

/// Front-end role constants. The backend speaks English role names; the
/// apps branch on these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Cliente,
    Profissional,
    Atendente,
    Gestor,
    /// Unrecognised roles pass through untouched.
    Other(String),
}

impl Role {
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "manager" | "admin" | "gestor" => Role::Gestor,
            "receptionist" | "atendente" => Role::Atendente,
            "professional" | "profissional" => Role::Profissional,
            "client" | "cliente" => Role::Cliente,
            _ => Role::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Cliente => "CLIENTE",
            Role::Profissional => "PROFISSIONAL",
            Role::Atendente => "ATENDENTE",
            Role::Gestor => "GESTOR",
            Role::Other(raw) => raw,
        }
    }

    /// Staff roles run the kanban and checkout.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Profissional | Role::Atendente | Role::Gestor)
    }

    /// Back-office management (professionals, services, blocked slots).
    pub fn can_manage(&self) -> bool {
        matches!(self, Role::Gestor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from_backend(&raw))
    }
}
