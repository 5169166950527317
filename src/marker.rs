use std::sync::LazyLock;

use regex::Regex;

/// Name embedded in every marker line. Only comments carrying it are managed.
pub const AGENT_NAME: &str = "pr-commenter";

static MARKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<!-- pr-commenter: (\S+)(?: (\S+))?\s*-->$").expect("marker pattern is valid")
});

/// The `(template, build)` pair a managed comment is keyed by.
///
/// An empty build is a valid value meaning "unspecified"; two identities are
/// the same build only when both fields match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentIdentity {
    pub template: String,
    pub build: String,
}

impl CommentIdentity {
    pub fn new(template: impl Into<String>, build: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            build: build.into(),
        }
    }

    pub fn is_same_build(&self, other: &CommentIdentity) -> bool {
        self.template == other.template && self.build == other.build
    }
}

/// Encode an identity as the single marker line prefixed to a rendered comment.
pub fn encode(identity: &CommentIdentity) -> String {
    format!(
        "<!-- {AGENT_NAME}: {} {} -->",
        identity.template, identity.build
    )
}

/// Decode the marker from a single line. The whole line must be the marker.
pub fn decode(line: &str) -> Option<CommentIdentity> {
    let caps = MARKER_LINE.captures(line)?;
    let template = caps.get(1)?.as_str();
    let build = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    Some(CommentIdentity::new(template, build))
}

/// Decode the marker from the first line of a comment body.
pub fn decode_body(body: &str) -> Option<CommentIdentity> {
    let first_line = body.split('\n').next().unwrap_or_default();
    decode(first_line.trim_end_matches('\r'))
}

/// The visible part of a comment body: everything after the marker line, or
/// the whole body when the first line is not a marker.
pub fn content(body: &str) -> &str {
    if decode_body(body).is_none() {
        return body;
    }
    body.split_once('\n').map(|(_, rest)| rest).unwrap_or_default()
}

/// Whether `build` can be written into a marker and decoded back unchanged.
pub fn is_valid_build(build: &str) -> bool {
    !build.chars().any(char::is_whitespace) && !build.contains("-->")
}
