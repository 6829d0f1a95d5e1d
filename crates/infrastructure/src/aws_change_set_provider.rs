//! S3 + CloudFormation adapter for the change-set provider port.

use async_trait::async_trait;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use aws_sdk_cloudformation::operation::describe_change_set::DescribeChangeSetOutput;
use aws_sdk_cloudformation::primitives::DateTime;
use aws_sdk_cloudformation::types::{self as cfn, ChangeSetType};
use aws_sdk_s3::primitives::ByteStream;
use chrono::{SecondsFormat, Utc};
use driftscan_application::{ChangeSetHandle, ChangeSetProvider, ChangeSetRequest, TemplateUpload};
use driftscan_core::{AppError, AppResult};
use driftscan_domain::{
    Change, ChangeAction, ChangeSetDescription, ChangeSetState, ChangeSetStatus, ResourceChange,
    ResourceChangeDetail, ResourceTargetDefinition,
};
use tracing::{debug, warn};

/// Change-set provider backed by S3 and CloudFormation.
#[derive(Debug, Clone)]
pub struct AwsChangeSetProvider {
    s3: aws_sdk_s3::Client,
    cloudformation: aws_sdk_cloudformation::Client,
}

impl AwsChangeSetProvider {
    /// Creates a provider from an already loaded SDK configuration.
    #[must_use]
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            s3: aws_sdk_s3::Client::new(config),
            cloudformation: aws_sdk_cloudformation::Client::new(config),
        }
    }

    async fn describe_page(
        &self,
        handle: &ChangeSetHandle,
        next_token: Option<String>,
    ) -> AppResult<DescribeChangeSetOutput> {
        self.cloudformation
            .describe_change_set()
            .stack_name(handle.stack_name.as_str())
            .change_set_name(handle.change_set_name.as_str())
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "failed to describe change set '{}': {}",
                    handle.change_set_name,
                    DisplayErrorContext(&error)
                ))
            })
    }
}

fn template_url(bucket: &str, key: &str) -> String {
    format!("https://{bucket}.s3.amazonaws.com/{key}")
}

#[async_trait]
impl ChangeSetProvider for AwsChangeSetProvider {
    async fn upload_template(&self, upload: &TemplateUpload) -> AppResult<String> {
        let body = ByteStream::from_path(&upload.local_path)
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "failed to read template '{}': {error}",
                    upload.local_path.display()
                ))
            })?;

        self.s3
            .put_object()
            .bucket(upload.bucket.as_str())
            .key(upload.key.as_str())
            .body(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "failed to upload template to s3://{}/{}: {}",
                    upload.bucket,
                    upload.key,
                    aws_sdk_s3::error::DisplayErrorContext(&error)
                ))
            })?;

        Ok(template_url(&upload.bucket, &upload.key))
    }

    async fn create_change_set(&self, request: &ChangeSetRequest) -> AppResult<ChangeSetHandle> {
        let output = self
            .cloudformation
            .create_change_set()
            .stack_name(request.stack_name.as_str())
            .template_url(request.template_url.as_str())
            .change_set_name(request.change_set_name.as_str())
            .change_set_type(ChangeSetType::Update)
            .send()
            .await
            .map_err(|error| {
                AppError::Provider(format!(
                    "failed to create change set '{}' for stack '{}': {}",
                    request.change_set_name,
                    request.stack_name,
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(ChangeSetHandle {
            stack_name: request.stack_name.clone(),
            change_set_name: request.change_set_name.clone(),
            change_set_id: output.id().map(str::to_owned),
        })
    }

    async fn change_set_state(&self, handle: &ChangeSetHandle) -> AppResult<ChangeSetState> {
        let page = self.describe_page(handle, None).await?;

        Ok(ChangeSetState {
            status: map_status(page.status())?,
            status_reason: page.status_reason().map(str::to_owned),
        })
    }

    async fn describe_change_set(
        &self,
        handle: &ChangeSetHandle,
    ) -> AppResult<ChangeSetDescription> {
        let provider = self;
        let description =
            describe_all_pages(handle, move |token| provider.describe_page(handle, token)).await?;

        debug!(
            change_set = %description.change_set_name,
            changes = description.changes.len(),
            "described change set"
        );

        Ok(description)
    }
}

/// Fetches the first page, then follows `NextToken` until the last page,
/// appending changes in page order.
async fn describe_all_pages<F, Fut>(
    handle: &ChangeSetHandle,
    mut fetch_page: F,
) -> AppResult<ChangeSetDescription>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = AppResult<DescribeChangeSetOutput>>,
{
    let first_page = fetch_page(None).await?;
    let mut description = ChangeSetDescription {
        change_set_name: first_page
            .change_set_name()
            .unwrap_or(handle.change_set_name.as_str())
            .to_owned(),
        change_set_id: first_page
            .change_set_id()
            .map(str::to_owned)
            .or_else(|| handle.change_set_id.clone()),
        stack_name: first_page
            .stack_name()
            .unwrap_or(handle.stack_name.as_str())
            .to_owned(),
        status: map_status(first_page.status())?,
        status_reason: first_page.status_reason().map(str::to_owned),
        creation_time: first_page.creation_time().and_then(format_timestamp),
        changes: map_changes(first_page.changes()),
    };

    let mut next_token = first_page.next_token().map(str::to_owned);
    while let Some(token) = next_token {
        let page = fetch_page(Some(token)).await?;
        description.changes.extend(map_changes(page.changes()));
        next_token = page.next_token().map(str::to_owned);
    }

    Ok(description)
}

fn map_status(status: Option<&cfn::ChangeSetStatus>) -> AppResult<ChangeSetStatus> {
    let status = status
        .ok_or_else(|| AppError::Provider("change set description has no status".to_owned()))?;

    status
        .as_str()
        .parse::<ChangeSetStatus>()
        .map_err(|error| AppError::Provider(error.to_string()))
}

fn format_timestamp(timestamp: &DateTime) -> Option<String> {
    chrono::DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
        .map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Converts SDK change entries into the domain model.
///
/// Entries without a resource change, or with an action this crate does not
/// know, are skipped.
fn map_changes(changes: &[cfn::Change]) -> Vec<Change> {
    changes.iter().filter_map(map_change).collect()
}

fn map_change(change: &cfn::Change) -> Option<Change> {
    let resource_change = change.resource_change()?;

    let action = match resource_change
        .action()
        .map(|action| action.as_str().parse::<ChangeAction>())
    {
        Some(Ok(action)) => action,
        Some(Err(error)) => {
            warn!(error = %error, "skipping change with unsupported action");
            return None;
        }
        None => {
            warn!(
                logical_resource_id = resource_change.logical_resource_id().unwrap_or_default(),
                "skipping change without action"
            );
            return None;
        }
    };

    Some(Change {
        change_type: change
            .r#type()
            .map_or_else(|| "Resource".to_owned(), |value| value.as_str().to_owned()),
        resource_change: ResourceChange {
            action,
            logical_resource_id: resource_change
                .logical_resource_id()
                .unwrap_or_default()
                .to_owned(),
            physical_resource_id: resource_change.physical_resource_id().map(str::to_owned),
            resource_type: resource_change.resource_type().unwrap_or_default().to_owned(),
            replacement: resource_change
                .replacement()
                .map(|value| value.as_str().to_owned()),
            scope: resource_change
                .scope()
                .iter()
                .map(|value| value.as_str().to_owned())
                .collect(),
            details: resource_change.details().iter().map(map_detail).collect(),
        },
    })
}

fn map_detail(detail: &cfn::ResourceChangeDetail) -> ResourceChangeDetail {
    ResourceChangeDetail {
        target: detail.target().map(|target| ResourceTargetDefinition {
            attribute: target.attribute().map(|value| value.as_str().to_owned()),
            name: target.name().map(str::to_owned),
            requires_recreation: target
                .requires_recreation()
                .map(|value| value.as_str().to_owned()),
        }),
        evaluation: detail.evaluation().map(|value| value.as_str().to_owned()),
        change_source: detail.change_source().map(|value| value.as_str().to_owned()),
        causing_entity: detail.causing_entity().map(str::to_owned),
    }
}
