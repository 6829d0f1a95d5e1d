mod account_identity;
mod alert_enricher;
mod change_set_provider;
mod comment_publisher;
mod policy_scanner;

pub use account_identity::AccountIdentity;
pub use alert_enricher::AlertEnricher;
pub use change_set_provider::{
    ChangeSetHandle, ChangeSetProvider, ChangeSetRequest, TemplateUpload,
};
pub use comment_publisher::CommentPublisher;
pub use policy_scanner::PolicyScanner;
