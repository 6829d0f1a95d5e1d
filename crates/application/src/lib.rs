//! Application services and ports.

#![forbid(unsafe_code)]

mod change_set_waiter;
mod drift_analysis_service;
mod drift_ports;
mod report_renderer;
mod retry_policy;

pub use change_set_waiter::{ChangeSetWaiter, WaitPolicy};
pub use drift_analysis_service::{
    DriftAnalysisPorts, DriftAnalysisService, DriftAnalysisSettings, PublishOutcome, RunSummary,
};
pub use drift_ports::{
    AccountIdentity, AlertEnricher, ChangeSetHandle, ChangeSetProvider, ChangeSetRequest,
    CommentPublisher, PolicyScanner, TemplateUpload,
};
pub use report_renderer::{compose_comment_body, render_report_table};
pub use retry_policy::RetryPolicy;
