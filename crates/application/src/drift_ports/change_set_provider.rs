use std::path::PathBuf;

use async_trait::async_trait;
use driftscan_core::AppResult;
use driftscan_domain::{ChangeSetDescription, ChangeSetState};

/// Local template to place in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUpload {
    /// Target bucket.
    pub bucket: String,
    /// Object key; the template file name as configured.
    pub key: String,
    /// Local file to read.
    pub local_path: PathBuf,
}

/// Change set creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetRequest {
    /// Stack to preview an update for.
    pub stack_name: String,
    /// Unique change set name.
    pub change_set_name: String,
    /// URL of the uploaded template.
    pub template_url: String,
}

/// Reference to a created change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetHandle {
    /// Stack the change set belongs to.
    pub stack_name: String,
    /// Change set name.
    pub change_set_name: String,
    /// Provider identifier, when returned on creation.
    pub change_set_id: Option<String>,
}

/// Port for object storage and the change-set engine.
#[async_trait]
pub trait ChangeSetProvider: Send + Sync {
    /// Uploads the template, overwriting any existing object, and returns its URL.
    async fn upload_template(&self, upload: &TemplateUpload) -> AppResult<String>;

    /// Requests an `UPDATE` change set.
    async fn create_change_set(&self, request: &ChangeSetRequest) -> AppResult<ChangeSetHandle>;

    /// Returns the current lifecycle state of a change set.
    async fn change_set_state(&self, handle: &ChangeSetHandle) -> AppResult<ChangeSetState>;

    /// Returns the full description of a change set, including every change.
    async fn describe_change_set(
        &self,
        handle: &ChangeSetHandle,
    ) -> AppResult<ChangeSetDescription>;
}
