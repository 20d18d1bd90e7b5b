use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Lifecycle state of a single bed
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResourceStatus {
    #[default]
    Vacant,
    Occupied,
    Blocked,
    Maintenance,
}

/// Whether an allocation still holds its bed
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AllocationStatus {
    #[default]
    Active,
    Vacated,
}

/// What an applicant asked for. Unset fields accept anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl Preferences {
    pub fn for_type(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            group_id: None,
        }
    }

    /// Whether a bed in group `group_id` of type `resource_type` satisfies
    /// these preferences. Types compare case-insensitively; blank preferences
    /// are treated as unset.
    pub fn accepts(&self, resource_type: &str, group_id: &str) -> bool {
        let type_ok = match self.resource_type.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => wanted.eq_ignore_ascii_case(resource_type.trim()),
        };

        let group_ok = match self.group_id.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => wanted == group_id,
        };

        type_ok && group_ok
    }
}

/// An applicant waiting for a bed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: String,
    pub applicant_id: String,
    #[serde(default)]
    pub roll_no: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Lower ranks are served first
    #[serde(default)]
    pub priority_rank: Option<u32>,
    #[serde(default)]
    pub applied_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fulfilled: bool,
}

/// A bed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub parent_group_id: String,
    #[serde(default)]
    pub status: ResourceStatus,
}

/// A room, owning one or more beds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub resource_type: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
}

/// Binds an applicant to a bed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub applicant_id: String,
    #[serde(default)]
    pub waitlist_id: Option<String>,
    pub resource_id: String,
    pub group_id: String,
    #[serde(default)]
    pub status: AllocationStatus,
    pub allot_date: DateTime<Utc>,
    #[serde(default)]
    pub vacate_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod test {
    use crate::housing::{Preferences, ResourceStatus, WaitlistEntry};
    use std::str::FromStr;

    #[test]
    fn test_preferences_accepts() {
        assert!(Preferences::default().accepts("single", "R1"));
        assert!(Preferences::for_type("Double").accepts("double", "R1"));
        assert!(!Preferences::for_type("single").accepts("double", "R1"));

        let blank = Preferences {
            resource_type: Some("  ".to_string()),
            group_id: Some(String::new()),
        };
        assert!(blank.accepts("triple", "R9"));

        let pinned = Preferences {
            resource_type: Some("double".to_string()),
            group_id: Some("R2".to_string()),
        };
        assert!(pinned.accepts("double", "R2"));
        assert!(!pinned.accepts("double", "R1"));
    }

    #[test]
    fn test_resource_status_strings() {
        assert_eq!(ResourceStatus::Maintenance.to_string(), "maintenance");
        assert_eq!(ResourceStatus::from_str("Blocked"), Ok(ResourceStatus::Blocked));
        assert_eq!(
            serde_json::to_value(ResourceStatus::Occupied).unwrap(),
            serde_json::json!("occupied")
        );
    }

    #[test]
    fn test_waitlist_entry_defaults() {
        let entry: WaitlistEntry = serde_json::from_value(serde_json::json!({
            "id": "w1",
            "applicant_id": "s1",
        }))
        .unwrap();

        assert_eq!(entry.priority_rank, None);
        assert_eq!(entry.preferences, Preferences::default());
        assert!(!entry.fulfilled);
    }
}
