use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::marker;
use crate::platform::RepoSlug;
use crate::platform::github::DEFAULT_API_URL;
use crate::reconcile::{DryRunLabels, Supersede};

pub const TOKEN_ENV: &str = "PR_COMMENTER_GITHUB_TOKEN";
pub const API_URL_ENV: &str = "GITHUB_API_URL";
pub const GRAPHQL_URL_ENV: &str = "GITHUB_GRAPHQL_URL";
pub const DEFAULT_CONFIG_FILE: &str = ".pr-commenter.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub template: Option<PathBuf>,
    pub labels: Option<Vec<String>>,
    pub api_url: Option<String>,
    pub supersede: Option<Supersede>,
    pub dry_run_labels: Option<DryRunLabels>,
}

/// Fully resolved settings for one invocation.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub repo: RepoSlug,
    pub pr: u64,
    pub files: Vec<PathBuf>,
    pub template: Option<PathBuf>,
    pub build: String,
    pub token: String,
    pub labels: Vec<String>,
    pub debug: bool,
    pub api_url: String,
    pub graphql_url: String,
    pub supersede: Supersede,
    pub dry_run_labels: DryRunLabels,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repo", &self.repo.to_string())
            .field("pr", &self.pr)
            .field("files", &self.files)
            .field("template", &self.template)
            .field("build", &self.build)
            .field("token", &"<redacted>")
            .field("labels", &self.labels)
            .field("debug", &self.debug)
            .field("api_url", &self.api_url)
            .field("graphql_url", &self.graphql_url)
            .field("supersede", &self.supersede)
            .field("dry_run_labels", &self.dry_run_labels)
            .finish()
    }
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with `env` standing in for the process environment.
    pub fn load_with_env(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => read_config_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    read_config_file(default_path)?
                } else {
                    ConfigFile::default()
                }
            }
        };
        merge(file, cli, env)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref api_url) = config.api_url {
        url::Url::parse(api_url)
            .map_err(|e| Error::ConfigValidation(format!("invalid api_url {api_url}: {e}")))?;
    }
    if let Some(ref labels) = config.labels
        && labels.iter().any(|l| l.trim().is_empty())
    {
        return Err(Error::ConfigValidation("labels must not be empty".to_string()));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let token = cli
        .token
        .clone()
        .or_else(|| env(TOKEN_ENV))
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            Error::Auth(format!(
                "token not found. Pass --token or set the environment variable {TOKEN_ENV}"
            ))
        })?;

    let api_url = file
        .api_url
        .or_else(|| env(API_URL_ENV))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let graphql_url = env(GRAPHQL_URL_ENV)
        .unwrap_or_else(|| format!("{}/graphql", api_url.trim_end_matches('/')));

    let labels = if cli.labels.is_empty() {
        file.labels.unwrap_or_default()
    } else {
        cli.labels.clone()
    };

    let build = cli.build.clone().unwrap_or_default();
    if !marker::is_valid_build(&build) {
        return Err(Error::ConfigValidation(format!(
            "build must not contain whitespace or \"-->\": {build:?}"
        )));
    }

    let supersede = if cli.delete_previous {
        Supersede::Delete
    } else {
        file.supersede.unwrap_or_default()
    };
    let dry_run_labels = if cli.live_labels {
        DryRunLabels::Live
    } else {
        file.dry_run_labels.unwrap_or_default()
    };

    Ok(Config {
        repo: cli.repo.clone(),
        pr: cli.pr,
        files: cli.files.clone(),
        template: cli.template.clone().or(file.template),
        build,
        token,
        labels,
        debug: cli.debug,
        api_url,
        graphql_url,
        supersede,
        dry_run_labels,
    })
}
