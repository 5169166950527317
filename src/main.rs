use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pr_commenter::cli::Cli;
use pr_commenter::config::Config;
use pr_commenter::error::Result;
use pr_commenter::input::read_input_lines;
use pr_commenter::platform::PullRequestApi;
use pr_commenter::platform::github::{GitHubClient, GitHubTransport, UreqTransport};
use pr_commenter::reconcile::{CommentRequest, Context, Reconciler};
use pr_commenter::render::{Renderer, Template};
use pr_commenter::visibility::GraphqlVisibility;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Snapshot of the process environment handed to templates as plain data.
fn captured_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli)?;
    debug!(?config, "config loaded");

    let template = config.template.as_deref().map(Template::load).transpose()?;
    let lines = read_input_lines(&config.files)?;

    let transport: Arc<dyn GitHubTransport> = Arc::new(UreqTransport::new(
        &config.api_url,
        &config.graphql_url,
        &config.token,
    )?);
    let api = GitHubClient::new(transport.clone());
    let acting = api.current_user()?;
    let pr = api.pull_request(&config.repo, config.pr)?;
    info!(user = %acting.login, pr = %pr.html_url, "resolved pull request");

    let ctx = Context {
        acting,
        debug: config.debug,
        supersede: config.supersede,
        dry_run_labels: config.dry_run_labels,
    };
    let reconciler = Reconciler::new(
        api,
        GraphqlVisibility::new(transport),
        Renderer::new(captured_environment()),
        ctx,
    );

    let outcome = reconciler.run(
        &pr,
        &CommentRequest {
            lines: &lines,
            template: template.as_ref(),
            build: &config.build,
            labels: &config.labels,
        },
    )?;
    debug!(action = ?outcome.action, labels = ?outcome.labels, "done");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
