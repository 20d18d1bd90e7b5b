use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The state change an audit record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    Allocate,
    Vacate,
    SetResourceStatus,
}

/// Append-only log entry: who did what, when, to which entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entity: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

impl AuditRecord {
    pub fn new(
        entity: impl Into<String>,
        entity_id: impl Into<String>,
        action: AuditAction,
        actor_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: entity.into(),
            entity_id: entity_id.into(),
            action,
            actor_id: actor_id.into(),
            timestamp,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}
