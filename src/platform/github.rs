use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::{ExistingComment, Identity, PullRequest, PullRequestApi, RepoSlug};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("pr-commenter/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Raw HTTP response: status code plus the JSON body (`Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn message(&self) -> String {
        self.body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message")
            .to_string()
    }
}

/// Abstraction over the HTTP layer for testability.
///
/// `request` never fails on a non-2xx status; it hands the status back so the
/// caller can map it to the right error kind.
pub trait GitHubTransport {
    fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiResponse>;

    /// Run a GraphQL query or mutation and return its `data` member.
    fn graphql(&self, query: &str, variables: Value) -> Result<Value>;
}

/// Blocking `ureq` transport authenticated with a bearer token.
pub struct UreqTransport {
    agent: ureq::Agent,
    api_url: Url,
    graphql_url: Url,
    token: String,
}

impl UreqTransport {
    pub fn new(api_url: &str, graphql_url: &str, token: &str) -> Result<Self> {
        let parse_url = |raw: &str| {
            Url::parse(raw).map_err(|e| Error::ConfigValidation(format!("invalid url {raw}: {e}")))
        };
        Ok(Self {
            agent: ureq::AgentBuilder::new().user_agent(USER_AGENT).build(),
            api_url: parse_url(api_url)?,
            graphql_url: parse_url(graphql_url)?,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigValidation(format!("api url cannot be a base: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<ApiResponse> {
        let request = self
            .agent
            .request_url(method.as_str(), url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28");

        let sent = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        let response = match sent {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(Error::Platform(format!(
                    "{} {url} failed: {e}",
                    method.as_str()
                )));
            }
        };

        let status = response.status();
        let text = response
            .into_string()
            .map_err(|e| Error::Platform(format!("failed to read response from {url}: {e}")))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| Error::Platform(format!("invalid JSON from {url}: {e}")))?
        };
        debug!(method = method.as_str(), %url, status, "github request");
        Ok(ApiResponse { status, body })
    }
}

impl GitHubTransport for UreqTransport {
    fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint(segments, query)?;
        self.send(method, &url, body)
    }

    fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let body = json!({ "query": query, "variables": variables });
        let response = self.send(Method::Post, &self.graphql_url, Some(&body))?;
        if response.status == 401 {
            return Err(Error::Auth(format!("GraphQL request rejected: {}", response.message())));
        }
        if !response.is_success() {
            return Err(Error::Platform(format!(
                "GraphQL request failed (HTTP {}): {}",
                response.status,
                response.message()
            )));
        }
        graphql_data(response.body)
    }
}

/// Extract `data` from a GraphQL response, surfacing any reported errors.
pub fn graphql_data(mut response: Value) -> Result<Value> {
    if let Some(errors) = response.get("errors")
        && !errors.is_null()
    {
        return Err(Error::Platform(format!("GraphQL errors: {errors}")));
    }
    match response.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(Error::Platform("GraphQL response missing data".to_string())),
    }
}

// --- REST response types ---

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhPull {
    number: u64,
    html_url: String,
    #[serde(default)]
    labels: Vec<GhLabel>,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    id: u64,
    node_id: String,
    body: Option<String>,
    html_url: String,
    user: Option<GhUser>,
}

impl From<GhComment> for ExistingComment {
    fn from(gh: GhComment) -> Self {
        Self {
            id: gh.id,
            node_id: gh.node_id,
            author: gh.user.map(|u| u.login).unwrap_or_default(),
            body: gh.body.unwrap_or_default(),
            html_url: gh.html_url,
        }
    }
}

fn parse<T: DeserializeOwned>(body: Value, what: &str) -> Result<T> {
    serde_json::from_value(body)
        .map_err(|e| Error::Platform(format!("failed to parse {what}: {e}")))
}

fn expect_success(response: ApiResponse, what: &str) -> Result<Value> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(Error::Platform(format!(
            "{what} failed (HTTP {}): {}",
            response.status,
            response.message()
        )))
    }
}

/// GitHub REST client for pull request comments and labels.
pub struct GitHubClient {
    transport: Arc<dyn GitHubTransport>,
}

impl GitHubClient {
    pub fn new(transport: Arc<dyn GitHubTransport>) -> Self {
        Self { transport }
    }

    fn issue_comments_page(&self, pr: &PullRequest, page: usize) -> Result<Vec<GhComment>> {
        let number = pr.number.to_string();
        let per_page = PER_PAGE.to_string();
        let page = page.to_string();
        let response = self.transport.request(
            Method::Get,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", &number, "comments"],
            &[("per_page", &per_page), ("page", &page)],
            None,
        )?;
        parse(expect_success(response, "listing comments")?, "comments")
    }
}

impl PullRequestApi for GitHubClient {
    fn current_user(&self) -> Result<Identity> {
        let response = self.transport.request(Method::Get, &["user"], &[], None)?;
        if matches!(response.status, 401 | 403) {
            return Err(Error::Auth(format!("token is invalid: {}", response.message())));
        }
        let user: GhUser = parse(expect_success(response, "fetching user")?, "user")?;
        Ok(Identity { login: user.login })
    }

    fn pull_request(&self, repo: &RepoSlug, number: u64) -> Result<PullRequest> {
        let number_str = number.to_string();
        let response = self.transport.request(
            Method::Get,
            &["repos", &repo.owner, &repo.name, "pulls", &number_str],
            &[],
            None,
        )?;
        match response.status {
            404 => {
                return Err(Error::NotFound(format!("pull request {repo}#{number}")));
            }
            401 | 403 => {
                return Err(Error::Auth(format!(
                    "cannot access {repo}#{number}: {}",
                    response.message()
                )));
            }
            _ => {}
        }
        let pull: GhPull = parse(expect_success(response, "fetching pull request")?, "pull request")?;
        Ok(PullRequest {
            repo: repo.clone(),
            number: pull.number,
            html_url: pull.html_url,
            labels: pull.labels.into_iter().map(|l| l.name).collect(),
        })
    }

    fn list_issue_comments(&self, pr: &PullRequest) -> Result<Vec<ExistingComment>> {
        let mut comments = Vec::new();
        for page in 1.. {
            let batch = self.issue_comments_page(pr, page)?;
            let len = batch.len();
            comments.extend(batch.into_iter().map(ExistingComment::from));
            if len < PER_PAGE {
                break;
            }
        }
        debug!(count = comments.len(), pr = pr.number, "fetched issue comments");
        Ok(comments)
    }

    fn create_issue_comment(&self, pr: &PullRequest, body: &str) -> Result<ExistingComment> {
        let number = pr.number.to_string();
        let response = self.transport.request(
            Method::Post,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", &number, "comments"],
            &[],
            Some(&json!({ "body": body })),
        )?;
        let comment: GhComment = parse(expect_success(response, "creating comment")?, "comment")?;
        Ok(comment.into())
    }

    fn edit_comment(&self, pr: &PullRequest, comment: &ExistingComment, body: &str) -> Result<()> {
        let id = comment.id.to_string();
        let response = self.transport.request(
            Method::Patch,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", "comments", &id],
            &[],
            Some(&json!({ "body": body })),
        )?;
        expect_success(response, "editing comment")?;
        Ok(())
    }

    fn delete_comment(&self, pr: &PullRequest, comment: &ExistingComment) -> Result<()> {
        let id = comment.id.to_string();
        let response = self.transport.request(
            Method::Delete,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", "comments", &id],
            &[],
            None,
        )?;
        expect_success(response, "deleting comment")?;
        Ok(())
    }

    fn add_labels(&self, pr: &PullRequest, labels: &[String]) -> Result<()> {
        let number = pr.number.to_string();
        let response = self.transport.request(
            Method::Post,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", &number, "labels"],
            &[],
            Some(&json!({ "labels": labels })),
        )?;
        expect_success(response, "adding labels")?;
        Ok(())
    }

    fn remove_label(&self, pr: &PullRequest, label: &str) -> Result<()> {
        let number = pr.number.to_string();
        let response = self.transport.request(
            Method::Delete,
            &["repos", &pr.repo.owner, &pr.repo.name, "issues", &number, "labels", label],
            &[],
            None,
        )?;
        if response.status == 404 {
            debug!(label, pr = pr.number, "label not present, nothing to remove");
            return Ok(());
        }
        expect_success(response, "removing label")?;
        Ok(())
    }
}
