use std::str::FromStr;

use driftscan_core::AppError;
use serde::{Deserialize, Serialize};

/// Action a change set would apply to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Resource is created.
    Add,
    /// Resource is updated in place or replaced.
    Modify,
    /// Resource is deleted.
    Remove,
    /// Existing resource is imported into the stack.
    Import,
    /// Action is only known once the change set executes.
    Dynamic,
}

impl FromStr for ChangeAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Add" => Ok(Self::Add),
            "Modify" => Ok(Self::Modify),
            "Remove" => Ok(Self::Remove),
            "Import" => Ok(Self::Import),
            "Dynamic" => Ok(Self::Dynamic),
            _ => Err(AppError::Validation(format!(
                "unknown change action '{value}'"
            ))),
        }
    }
}

/// Lifecycle status of a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeSetStatus {
    /// Creation was requested but has not started.
    CreatePending,
    /// The provider is computing the change set.
    CreateInProgress,
    /// The change set is ready to be described.
    CreateComplete,
    /// Deletion was requested.
    DeletePending,
    /// Deletion is running.
    DeleteInProgress,
    /// The change set was deleted.
    DeleteComplete,
    /// Deletion failed.
    DeleteFailed,
    /// The provider could not create the change set.
    Failed,
}

impl ChangeSetStatus {
    /// Returns the provider wire value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatePending => "CREATE_PENDING",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateComplete => "CREATE_COMPLETE",
            Self::DeletePending => "DELETE_PENDING",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteComplete => "DELETE_COMPLETE",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::Failed => "FAILED",
        }
    }

    /// Returns whether the change set is still being created.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::CreatePending | Self::CreateInProgress)
    }

    /// Returns whether the change set can be described and inspected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::CreateComplete)
    }
}

impl FromStr for ChangeSetStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATE_PENDING" => Ok(Self::CreatePending),
            "CREATE_IN_PROGRESS" => Ok(Self::CreateInProgress),
            "CREATE_COMPLETE" => Ok(Self::CreateComplete),
            "DELETE_PENDING" => Ok(Self::DeletePending),
            "DELETE_IN_PROGRESS" => Ok(Self::DeleteInProgress),
            "DELETE_COMPLETE" => Ok(Self::DeleteComplete),
            "DELETE_FAILED" => Ok(Self::DeleteFailed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown change set status '{value}'"
            ))),
        }
    }
}

/// Point-in-time view of a change set's lifecycle, as returned by a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetState {
    /// Current status.
    pub status: ChangeSetStatus,
    /// Provider explanation, mostly present on failure.
    pub status_reason: Option<String>,
}

/// Attribute targeted by one change detail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTargetDefinition {
    /// Changed attribute class, e.g. `Properties` or `Tags`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Property name when the attribute is `Properties`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `Never`, `Conditionally` or `Always`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_recreation: Option<String>,
}

/// One reason a resource changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChangeDetail {
    /// Changed attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ResourceTargetDefinition>,
    /// `Static` or `Dynamic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<String>,
    /// What triggered the change, e.g. `DirectModification`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_source: Option<String>,
    /// Entity that caused the change, when the source is indirect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causing_entity: Option<String>,
}

/// Resource-level portion of a change entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChange {
    /// Action the change set would apply.
    pub action: ChangeAction,
    /// Template-defined resource name.
    pub logical_resource_id: String,
    /// Provider-assigned identifier, absent for resources not yet created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// Resource type, e.g. `AWS::S3::Bucket`.
    pub resource_type: String,
    /// `True`, `False` or `Conditional` for modifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    /// Attribute classes affected by the change.
    #[serde(default)]
    pub scope: Vec<String>,
    /// Individual change reasons.
    #[serde(default)]
    pub details: Vec<ResourceChangeDetail>,
}

/// One entry of a change set's change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    /// Entry kind; the provider currently only emits `Resource`.
    #[serde(rename = "Type")]
    pub change_type: String,
    /// Resource-level change.
    pub resource_change: ResourceChange,
}

impl Change {
    /// Creates a `Resource` change entry.
    #[must_use]
    pub fn resource(resource_change: ResourceChange) -> Self {
        Self {
            change_type: "Resource".to_owned(),
            resource_change,
        }
    }
}

/// Full description of a created change set.
///
/// Values are already coerced to primitives by the provider adapter, so the
/// description can be embedded verbatim in alert payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeSetDescription {
    /// Change set name.
    pub change_set_name: String,
    /// Provider identifier of the change set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
    /// Stack the change set targets.
    pub stack_name: String,
    /// Status at description time.
    pub status: ChangeSetStatus,
    /// Provider explanation of the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    /// RFC 3339 creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
    /// Ordered change list.
    #[serde(default)]
    pub changes: Vec<Change>,
}
