use std::path::PathBuf;

use clap::Parser;

use crate::platform::RepoSlug;

/// pr-commenter: post, update, and minimize CI report comments on a GitHub pull request
#[derive(Parser, Debug, Clone)]
#[command(name = "pr-commenter", version, about)]
pub struct Cli {
    /// Repository as owner/name
    pub repo: RepoSlug,

    /// Pull request number, optionally prefixed with `pr/`
    #[arg(value_parser = parse_pr_number)]
    pub pr: u64,

    /// Files whose lines make up the comment input (stdin when omitted)
    pub files: Vec<PathBuf>,

    /// Template used to render the comment
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Build identifier. Output for the same template and build is appended
    /// to the existing comment; a different build supersedes it
    #[arg(long)]
    pub build: Option<String>,

    /// GitHub token (default: $PR_COMMENTER_GITHUB_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Label to add when a comment is shown and remove when output is empty
    #[arg(long = "label")]
    pub labels: Vec<String>,

    /// Show the final comment but don't post it to GitHub
    #[arg(long)]
    pub debug: bool,

    /// Path to config file (default: .pr-commenter.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Delete the comment of a previous build instead of minimizing it
    #[arg(long)]
    pub delete_previous: bool,

    /// Keep label changes live under --debug
    #[arg(long)]
    pub live_labels: bool,
}

fn parse_pr_number(raw: &str) -> Result<u64, String> {
    let digits = raw.strip_prefix("pr/").unwrap_or(raw);
    match digits.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a pull request number, got {raw:?}")),
    }
}
