use serde::{Deserialize, Serialize};

use crate::{Change, ModifiedResources};

/// Source marker attached to every alert.
pub const ALERT_SOURCE: &str = "checkov";

/// Account and region the alerts are raised in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertContext {
    /// Cloud account owning the credentials in use.
    pub account: String,
    /// Configured cloud region.
    pub region: String,
}

/// Normalized alert for one (modified resource, violated check) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Alert {
    /// Always [`ALERT_SOURCE`].
    pub source: String,
    /// Provider id of the resource, empty when unknown.
    pub physical_resource_id: String,
    /// Template-defined resource name.
    pub logical_resource_id: String,
    /// Resource type, e.g. `AWS::S3::Bucket`.
    pub resource_type: String,
    /// Raw change entries for the resource.
    pub changes: Vec<Change>,
    /// Violated check id.
    pub check_id: String,
    /// Violated check name.
    pub check_name: String,
    /// Account id.
    pub account: String,
    /// Region.
    pub region: String,
}

/// Emits one alert per violated check of every modified resource.
///
/// Resources without checks produce nothing. Ordering follows resource
/// iteration order, then scan order within a resource.
#[must_use]
pub fn build_alerts(resources: &ModifiedResources, context: &AlertContext) -> Vec<Alert> {
    let mut alerts = Vec::with_capacity(resources.total_check_count());

    for resource in resources.iter() {
        for (check_id, check_name) in resource.checks() {
            alerts.push(Alert {
                source: ALERT_SOURCE.to_owned(),
                physical_resource_id: resource.physical_resource_id.clone().unwrap_or_default(),
                logical_resource_id: resource.logical_resource_id.clone(),
                resource_type: resource.resource_type.clone(),
                changes: resource.changes.clone(),
                check_id: check_id.to_owned(),
                check_name: check_name.to_owned(),
                account: context.account.clone(),
                region: context.region.clone(),
            });
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{AlertContext, build_alerts};
    use crate::{
        Change, ChangeAction, ChangeSetDescription, ChangeSetStatus, ModifiedResources,
        PolicyCheckResult, ResourceChange,
    };

    fn context() -> AlertContext {
        AlertContext {
            account: "123456789012".to_owned(),
            region: "us-east-1".to_owned(),
        }
    }

    fn modify(logical_id: &str) -> Change {
        Change::resource(ResourceChange {
            action: ChangeAction::Modify,
            logical_resource_id: logical_id.to_owned(),
            physical_resource_id: None,
            resource_type: "AWS::S3::Bucket".to_owned(),
            replacement: Some("False".to_owned()),
            scope: Vec::new(),
            details: Vec::new(),
        })
    }

    fn resources_with_checks(check_counts: &[usize]) -> ModifiedResources {
        let changes = (0..check_counts.len())
            .map(|index| modify(&format!("Resource{index}")))
            .collect();
        let mut resources = ModifiedResources::from_change_set(&ChangeSetDescription {
            change_set_name: "cft-prop".to_owned(),
            change_set_id: None,
            stack_name: "app".to_owned(),
            status: ChangeSetStatus::CreateComplete,
            status_reason: None,
            creation_time: None,
            changes,
        });

        let findings: Vec<PolicyCheckResult> = check_counts
            .iter()
            .enumerate()
            .flat_map(|(index, count)| {
                (0..*count).map(move |check| PolicyCheckResult {
                    check_id: format!("CKV_AWS_{check}"),
                    check_name: format!("check {check}"),
                    resource: format!("AWS::S3::Bucket.Resource{index}"),
                })
            })
            .collect();
        resources.attach_findings(&findings);
        resources
    }

    #[test]
    fn one_alert_per_check_differing_only_in_check_fields() {
        let resources = resources_with_checks(&[3]);
        let alerts = build_alerts(&resources, &context());

        assert_eq!(alerts.len(), 3);
        for (position, alert) in alerts.iter().enumerate() {
            assert_eq!(alert.check_id, format!("CKV_AWS_{position}"));
            assert_eq!(alert.logical_resource_id, "Resource0");
            assert_eq!(alert.source, "checkov");
            assert_eq!(alert.physical_resource_id, "");
            assert_eq!(alert.account, "123456789012");
            assert_eq!(alert.region, "us-east-1");
            assert_eq!(alert.changes, alerts[0].changes);
        }
    }

    #[test]
    fn resources_without_checks_are_dropped() {
        let resources = resources_with_checks(&[0, 2, 0]);
        let alerts = build_alerts(&resources, &context());

        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|alert| alert.logical_resource_id == "Resource1"));
    }

    #[test]
    fn alert_serializes_with_pascal_case_keys() {
        let resources = resources_with_checks(&[1]);
        let alerts = build_alerts(&resources, &context());
        let value = serde_json::to_value(&alerts[0])
            .unwrap_or_else(|error| panic!("alert should serialize: {error}"));

        assert_eq!(value["Source"], "checkov");
        assert_eq!(value["CheckId"], "CKV_AWS_0");
        assert_eq!(value["Changes"][0]["ResourceChange"]["Action"], "Modify");
        assert_eq!(value["PhysicalResourceId"], "");
    }

    proptest! {
        #[test]
        fn alert_count_equals_total_check_count(check_counts in prop::collection::vec(0_usize..5, 0..8)) {
            let resources = resources_with_checks(&check_counts);
            let alerts = build_alerts(&resources, &context());
            prop_assert_eq!(alerts.len(), check_counts.iter().sum::<usize>());
        }
    }
}
