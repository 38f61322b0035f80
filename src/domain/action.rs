use serde::{Deserialize, Serialize};
use std::fmt;

/// Commands that drive an item through its lifecycle.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CreateTransaction,
    Move,
    Error,
    Fix,
    Refund,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTransaction => "create_transaction",
            Self::Move => "move",
            Self::Error => "error",
            Self::Fix => "fix",
            Self::Refund => "refund",
        }
    }

    /// Whether the action is gated behind administrator privilege.
    pub fn requires_admin(&self) -> bool {
        matches!(self, Self::Refund)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    #[default]
    Operator,
    #[serde(alias = "administrator")]
    Admin,
}

impl ActorRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operator => f.write_str("operator"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// The caller on whose behalf an action is applied.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Actor {
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn operator(name: impl Into<String>) -> Self {
        Self::new(name, ActorRole::Operator)
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self::new(name, ActorRole::Admin)
    }
}
