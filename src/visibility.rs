use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::platform::ExistingComment;
use crate::platform::github::GitHubTransport;

const MINIMIZE_MUTATION: &str = r#"
    mutation MinimizeComment($commentId: ID!, $minimizeReason: ReportedContentClassifiers!) {
      minimizeComment(input: {subjectId: $commentId, classifier: $minimizeReason}) {
        minimizedComment { isMinimized }
      }
    }
"#;

const IS_MINIMIZED_QUERY: &str = r#"
    query CheckMinimizedComment($commentId: ID!) {
      node(id: $commentId) {
        ... on Minimizable { isMinimized }
      }
    }
"#;

/// Classifier GitHub records when a comment is minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimizeReason {
    Abuse,
    OffTopic,
    Outdated,
    Resolved,
    Spam,
}

impl MinimizeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MinimizeReason::Abuse => "ABUSE",
            MinimizeReason::OffTopic => "OFF_TOPIC",
            MinimizeReason::Outdated => "OUTDATED",
            MinimizeReason::Resolved => "RESOLVED",
            MinimizeReason::Spam => "SPAM",
        }
    }
}

impl fmt::Display for MinimizeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hides comments without deleting them.
///
/// The REST comment API has no such operation, so this goes through a
/// separate channel from [`crate::platform::PullRequestApi`].
pub trait CommentVisibility {
    fn hide(&self, comment: &ExistingComment, reason: MinimizeReason) -> Result<()>;

    fn is_hidden(&self, comment: &ExistingComment) -> Result<bool>;
}

/// GraphQL `minimizeComment` based visibility controller.
pub struct GraphqlVisibility {
    transport: Arc<dyn GitHubTransport>,
}

impl GraphqlVisibility {
    pub fn new(transport: Arc<dyn GitHubTransport>) -> Self {
        Self { transport }
    }
}

impl CommentVisibility for GraphqlVisibility {
    fn hide(&self, comment: &ExistingComment, reason: MinimizeReason) -> Result<()> {
        let data = self.transport.graphql(
            MINIMIZE_MUTATION,
            json!({ "commentId": comment.node_id, "minimizeReason": reason.as_str() }),
        )?;
        let minimized = data
            .pointer("/minimizeComment/minimizedComment/isMinimized")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !minimized {
            return Err(Error::Platform(format!(
                "comment {} was not minimized",
                comment.html_url
            )));
        }
        debug!(comment = %comment.html_url, %reason, "minimized comment");
        Ok(())
    }

    fn is_hidden(&self, comment: &ExistingComment) -> Result<bool> {
        let data = self
            .transport
            .graphql(IS_MINIMIZED_QUERY, json!({ "commentId": comment.node_id }))?;
        data.pointer("/node/isMinimized")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                Error::Platform(format!(
                    "no minimized state returned for comment {}",
                    comment.html_url
                ))
            })
    }
}
