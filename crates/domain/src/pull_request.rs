use driftscan_core::{AppError, AppResult};

/// Pull request a report is published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    repository: String,
    number: u64,
}

impl PullRequestRef {
    /// Creates a pull request reference from `owner/name` coordinates.
    pub fn new(repository: impl Into<String>, number: u64) -> AppResult<Self> {
        let repository = repository.into();
        let valid = repository
            .split_once('/')
            .is_some_and(|(owner, name)| {
                !owner.trim().is_empty() && !name.trim().is_empty() && !name.contains('/')
            });
        if !valid {
            return Err(AppError::Validation(format!(
                "repository must be in 'owner/name' form, got '{repository}'"
            )));
        }

        if number == 0 {
            return Err(AppError::Validation(
                "pull request number must be greater than zero".to_owned(),
            ));
        }

        Ok(Self { repository, number })
    }

    /// Returns the `owner/name` repository coordinates.
    #[must_use]
    pub fn repository(&self) -> &str {
        self.repository.as_str()
    }

    /// Returns the pull request number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the hosting API path of the pull request's comment collection.
    #[must_use]
    pub fn comments_path(&self) -> String {
        format!("/repos/{}/issues/{}/comments", self.repository, self.number)
    }
}
