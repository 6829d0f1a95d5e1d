//! Domain model of a drift analysis run.

#![forbid(unsafe_code)]

mod alert;
mod change_set;
mod decorated_alert;
mod modified_resource;
mod policy_check;
mod pull_request;
mod report;

pub use alert::{ALERT_SOURCE, Alert, AlertContext, build_alerts};
pub use change_set::{
    Change, ChangeAction, ChangeSetDescription, ChangeSetState, ChangeSetStatus, ResourceChange,
    ResourceChangeDetail, ResourceTargetDefinition,
};
pub use decorated_alert::{
    DecoratedAlert, Decoration, NormalizeStage, NormalizedOutput, Risk, RiskContext,
};
pub use modified_resource::{ModifiedResource, ModifiedResources};
pub use policy_check::PolicyCheckResult;
pub use pull_request::PullRequestRef;
pub use report::{ReportRow, RiskAttribution, RiskTriple, build_report_rows};
