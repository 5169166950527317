use tracing::debug;

use crate::error::Result;
use crate::marker;
use crate::platform::{ExistingComment, Identity};
use crate::visibility::CommentVisibility;

/// Where the previous managed comment for a template stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorResult<'a> {
    NotFound,
    /// Same template and build: new output is appended to it.
    SameBuild(&'a ExistingComment),
    /// Same template, other build: it is superseded by a new comment.
    DifferentBuild(&'a ExistingComment),
}

/// Find the first visible comment by `acting` whose marker names `template`.
///
/// Comments by other authors, without a marker, or for another template are
/// passed over. Only marker-bearing candidates cost a visibility lookup;
/// already hidden ones are passed over as well. The first remaining candidate
/// decides the result.
pub fn locate<'a>(
    comments: &'a [ExistingComment],
    acting: &Identity,
    template: &str,
    build: &str,
    visibility: &dyn CommentVisibility,
) -> Result<LocatorResult<'a>> {
    for comment in comments {
        if comment.author != acting.login {
            continue;
        }
        let Some(identity) = marker::decode_body(&comment.body) else {
            continue;
        };
        if identity.template != template {
            continue;
        }
        if visibility.is_hidden(comment)? {
            debug!(comment = %comment.html_url, "skipping minimized comment");
            continue;
        }

        return Ok(if identity.build == build {
            LocatorResult::SameBuild(comment)
        } else {
            LocatorResult::DifferentBuild(comment)
        });
    }
    Ok(LocatorResult::NotFound)
}
