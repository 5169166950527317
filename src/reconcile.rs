use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::locator::{LocatorResult, locate};
use crate::marker;
use crate::platform::{ExistingComment, Identity, PullRequest, PullRequestApi};
use crate::render::{Renderer, Template};
use crate::visibility::{CommentVisibility, MinimizeReason};

/// What happens to a comment left behind by a previous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Supersede {
    #[default]
    Minimize,
    Delete,
}

/// Whether label mutations still go through under `--debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DryRunLabels {
    #[default]
    Suppress,
    Live,
}

/// Per-invocation settings threaded through every engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub acting: Identity,
    pub debug: bool,
    pub supersede: Supersede,
    pub dry_run_labels: DryRunLabels,
}

impl Context {
    pub fn new(acting: Identity, debug: bool) -> Self {
        Self {
            acting,
            debug,
            supersede: Supersede::default(),
            dry_run_labels: DryRunLabels::default(),
        }
    }

    fn comments_live(&self) -> bool {
        !self.debug
    }

    fn labels_live(&self) -> bool {
        !self.debug || self.dry_run_labels == DryRunLabels::Live
    }
}

/// Input for one reconciliation run.
#[derive(Debug, Clone, Copy)]
pub struct CommentRequest<'a> {
    pub lines: &'a [String],
    pub template: Option<&'a Template>,
    pub build: &'a str,
    pub labels: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Output was appended to the comment for the same build.
    Appended,
    /// A new comment was posted.
    Created,
    /// Output rendered to nothing; no comment was posted.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelAction {
    None,
    Added(Vec<String>),
    Removed(Vec<String>),
}

/// The decision taken by a run. In dry-run mode this is what would have happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub action: Action,
    /// Full comment body sent (or that would be sent) to the platform.
    pub body: String,
    pub comment_url: Option<String>,
    /// URL of the previous-build comment that was minimized or deleted.
    pub superseded: Option<String>,
    pub labels: LabelAction,
}

/// Decides between appending, creating, and skipping a managed comment, and
/// keeps labels in line with whether a comment is shown.
pub struct Reconciler<P, V> {
    api: P,
    visibility: V,
    renderer: Renderer,
    ctx: Context,
}

impl<P: PullRequestApi, V: CommentVisibility> Reconciler<P, V> {
    pub fn new(api: P, visibility: V, renderer: Renderer, ctx: Context) -> Self {
        Self {
            api,
            visibility,
            renderer,
            ctx,
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn run(&self, pr: &PullRequest, request: &CommentRequest<'_>) -> Result<Outcome> {
        let Some(template) = request.template else {
            return self.create(pr, request, None);
        };

        let comments = self.api.list_issue_comments(pr)?;
        let located = locate(
            &comments,
            &self.ctx.acting,
            template.reference(),
            request.build,
            &self.visibility,
        )?;

        match located {
            LocatorResult::SameBuild(previous) => {
                info!(comment = %previous.html_url, "found a previous comment for the same build, appending");
                self.append(pr, request, previous)
            }
            LocatorResult::DifferentBuild(previous) => {
                info!(comment = %previous.html_url, "found a previous comment for a different build");
                self.create(pr, request, Some(previous))
            }
            LocatorResult::NotFound => self.create(pr, request, None),
        }
    }

    fn append(
        &self,
        pr: &PullRequest,
        request: &CommentRequest<'_>,
        previous: &ExistingComment,
    ) -> Result<Outcome> {
        let fragment = self
            .renderer
            .render(request.lines, request.template, request.build, true)?;
        let body = format!("{}\n{fragment}", previous.body);
        let dry_run = !self.ctx.comments_live();
        info!(url = %previous.html_url, dry_run, "updating comment");
        debug!(body = %body, "comment");

        if !dry_run {
            self.api.edit_comment(pr, previous, &body)?;
        }

        let labels = self.add_labels(pr, request.labels)?;
        Ok(Outcome {
            action: Action::Appended,
            body,
            comment_url: Some(previous.html_url.clone()),
            superseded: None,
            labels,
        })
    }

    fn create(
        &self,
        pr: &PullRequest,
        request: &CommentRequest<'_>,
        superseded: Option<&ExistingComment>,
    ) -> Result<Outcome> {
        // Render before touching the previous comment so a template failure
        // leaves the pull request as it was.
        let body = self
            .renderer
            .render(request.lines, request.template, request.build, false)?;

        if let Some(previous) = superseded {
            self.supersede(pr, previous)?;
        }
        let superseded = superseded.map(|c| c.html_url.clone());

        let visible = if request.template.is_some() {
            marker::content(&body)
        } else {
            body.as_str()
        };
        if visible.trim().is_empty() {
            info!(dry_run = !self.ctx.comments_live(), "new comment is empty, skipping");
            debug!(body = %body, "comment");
            let labels = self.remove_labels(pr, request.labels)?;
            return Ok(Outcome {
                action: Action::Empty,
                body,
                comment_url: None,
                superseded,
                labels,
            });
        }

        let dry_run = !self.ctx.comments_live();
        info!(pr = %pr.html_url, dry_run, "creating comment");
        debug!(body = %body, "comment");
        let comment_url = if dry_run {
            None
        } else {
            let created = self.api.create_issue_comment(pr, &body)?;
            debug!(url = %created.html_url, "comment created");
            Some(created.html_url)
        };

        let labels = self.add_labels(pr, request.labels)?;
        Ok(Outcome {
            action: Action::Created,
            body,
            comment_url,
            superseded,
            labels,
        })
    }

    fn supersede(&self, pr: &PullRequest, previous: &ExistingComment) -> Result<()> {
        let dry_run = !self.ctx.comments_live();
        info!(comment = %previous.html_url, strategy = ?self.ctx.supersede, dry_run, "superseding previous comment");
        if dry_run {
            return Ok(());
        }
        match self.ctx.supersede {
            Supersede::Minimize => self.visibility.hide(previous, MinimizeReason::Outdated)?,
            Supersede::Delete => self.api.delete_comment(pr, previous)?,
        }
        Ok(())
    }

    fn add_labels(&self, pr: &PullRequest, labels: &[String]) -> Result<LabelAction> {
        if labels.is_empty() {
            return Ok(LabelAction::None);
        }
        let dry_run = !self.ctx.labels_live();
        info!(labels = %labels.join(", "), dry_run, "adding labels");
        if !dry_run {
            self.api.add_labels(pr, labels)?;
        }
        Ok(LabelAction::Added(labels.to_vec()))
    }

    fn remove_labels(&self, pr: &PullRequest, labels: &[String]) -> Result<LabelAction> {
        if labels.is_empty() {
            return Ok(LabelAction::None);
        }
        let dry_run = !self.ctx.labels_live();
        info!(labels = %labels.join(", "), dry_run, "removing labels");
        if !dry_run {
            for label in labels {
                self.api.remove_label(pr, label)?;
            }
        }
        Ok(LabelAction::Removed(labels.to_vec()))
    }
}
