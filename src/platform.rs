pub mod github;

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Input(format!(
                "invalid repository {s:?} (expected owner/name)"
            ))),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The authenticated principal comments are posted as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub repo: RepoSlug,
    pub number: u64,
    pub html_url: String,
    pub labels: Vec<String>,
}

/// A comment as returned by the platform. Only `author` and `body` drive
/// decisions; the ids address follow-up mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingComment {
    pub id: u64,
    pub node_id: String,
    pub author: String,
    pub body: String,
    pub html_url: String,
}

/// Primary comment and label surface of the code-review platform.
pub trait PullRequestApi {
    /// Resolve the identity behind the configured token.
    fn current_user(&self) -> Result<Identity>;

    fn pull_request(&self, repo: &RepoSlug, number: u64) -> Result<PullRequest>;

    /// All issue comments on the pull request, oldest first.
    fn list_issue_comments(&self, pr: &PullRequest) -> Result<Vec<ExistingComment>>;

    fn create_issue_comment(&self, pr: &PullRequest, body: &str) -> Result<ExistingComment>;

    fn edit_comment(&self, pr: &PullRequest, comment: &ExistingComment, body: &str) -> Result<()>;

    fn delete_comment(&self, pr: &PullRequest, comment: &ExistingComment) -> Result<()>;

    /// Add all `labels` in a single call.
    fn add_labels(&self, pr: &PullRequest, labels: &[String]) -> Result<()>;

    /// Remove `label`. Removing a label the pull request does not carry succeeds.
    fn remove_label(&self, pr: &PullRequest, label: &str) -> Result<()>;
}
