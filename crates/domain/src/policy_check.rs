use serde::{Deserialize, Serialize};

/// One failing static-analysis check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCheckResult {
    /// Scanner check identifier, e.g. `CKV_AWS_18`.
    pub check_id: String,
    /// Human-readable check name.
    pub check_name: String,
    /// Dotted resource reference, `<ResourceType>.<LogicalId>`.
    pub resource: String,
}

impl PolicyCheckResult {
    /// Returns the logical resource id the check targets.
    ///
    /// This is the second `.`-separated segment of the resource reference,
    /// or `None` when the reference has fewer than two segments.
    #[must_use]
    pub fn logical_resource_id(&self) -> Option<&str> {
        self.resource.split('.').nth(1)
    }
}
