// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command-line interface for the repository activity service.
//!
//! `fetch` prints the activity of one owner as JSON; `serve` exposes the same
//! data over HTTP until interrupted.

use std::{
    io,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repo_activity::{
    ConnectorRegistry, Error, Overrides, RepositoryActivity, Settings, github, server,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "repo_activity=info";

/// Command line interface for collecting repository activity.
#[derive(Debug, Parser,)]
#[command(
    name = "repo-activity",
    version,
    about = "Collect recent commits across the repositories of an account"
)]
struct Cli
{
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Default,)]
struct GlobalArgs
{
    /// Path to the YAML settings file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    config: Option<PathBuf,>,

    /// Token used to authenticate against the GitHub API.
    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    github_token: Option<String,>,

    /// Base URL of the GitHub REST API.
    #[arg(long = "github-api-url", env = "GITHUB_API_URL", value_name = "URL", global = true)]
    github_api_url: Option<String,>,
}

#[derive(Debug, Subcommand,)]
enum Command
{
    /// Print the recent activity of every repository of an owner.
    Fetch(FetchArgs,),
    /// Serve the activity API over HTTP.
    Serve(ServeArgs,),
}

#[derive(Debug, Args,)]
struct FetchArgs
{
    /// Account whose repositories are inspected.
    #[arg(long = "owner", value_name = "OWNER")]
    owner: String,

    /// Provider the owner belongs to.
    #[arg(long = "provider", value_name = "NAME", default_value = github::PROVIDER)]
    provider: String,

    /// Output formatted JSON for easier inspection.
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pretty: bool,
}

#[derive(Debug, Args,)]
struct ServeArgs
{
    /// Socket address to listen on, overriding the settings file.
    #[arg(long = "bind", value_name = "ADDR")]
    bind: Option<String,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main]
async fn main()
{
    init_tracing();

    if let Err(error,) = run().await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing()
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER,),);
    tracing_subscriber::fmt().with_env_filter(filter,).with_writer(io::stderr,).init();
}

/// Executes the CLI using parsed arguments.
///
/// # Errors
///
/// Propagates settings, connector and serialization errors.
async fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();

    let bind = match &cli.command {
        Command::Serve(args,) => args.bind.clone(),
        Command::Fetch(_,) => None,
    };
    let settings = load_settings(&cli.global, bind,)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone(),);
    let registry = ConnectorRegistry::from_settings(&settings, cancel.clone(),)?;

    match cli.command {
        Command::Fetch(args,) => run_fetch(&registry, args,).await,
        Command::Serve(_,) => server::serve(registry, &settings.server.bind, cancel,).await,
    }
}

fn load_settings(global: &GlobalArgs, bind: Option<String,>,) -> Result<Settings, Error,>
{
    let config: Option<&Path,> = global.config.as_deref();
    Settings::load(config,)?.apply_overrides(Overrides {
        github_token: global.github_token.clone(),
        github_api_url: global.github_api_url.clone(),
        bind,
    },)
}

fn spawn_interrupt_handler(cancel: CancellationToken,)
{
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok((),) => info!("Interrupt received, shutting down"),
            Err(e,) => warn!("Failed to listen for interrupts: {}", e),
        }
        cancel.cancel();
    },);
}

async fn run_fetch(registry: &ConnectorRegistry, args: FetchArgs,) -> Result<(), Error,>
{
    let connector = registry.resolve(&args.provider,)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_spinner(),),
    );
    pb.enable_steady_tick(Duration::from_millis(100,),);
    pb.set_message(format!("Collecting {} activity for {}...", connector.provider(), args.owner),);

    let result = connector.get_activities(&args.owner,).await;
    pb.finish_and_clear();
    let activities = result?;
    info!("Collected activity for {} repositories of {}", activities.len(), args.owner);

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_activities(&mut handle, &activities, args.pretty,)
}

fn write_activities<W: io::Write,>(
    writer: &mut W,
    activities: &[RepositoryActivity],
    pretty: bool,
) -> Result<(), Error,>
{
    if pretty {
        serde_json::to_writer_pretty(writer, activities,)?;
    } else {
        serde_json::to_writer(writer, activities,)?;
    }

    Ok((),)
}

#[cfg(test)]
mod tests
{
    use std::{fs, io::Cursor};

    use clap::Parser;
    use repo_activity::{Commit, ConnectorRegistry, RepositoryActivity};
    use tempfile::tempdir;

    use super::{Cli, Command, FetchArgs, GlobalArgs, load_settings, run_fetch, write_activities};

    #[test]
    fn fetch_subcommand_defaults_to_github()
    {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "fetch", "--owner", "octocat",],)
            .expect("failed to parse CLI",);

        match cli.command {
            Command::Fetch(args,) => {
                assert_eq!(args.owner, "octocat");
                assert_eq!(args.provider, "github");
                assert!(!args.pretty);
            }
            other => panic!("unexpected command variant: {other:?}"),
        }
    }

    #[test]
    fn fetch_requires_owner()
    {
        let result = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "fetch",],);
        assert!(result.is_err());
    }

    #[test]
    fn serve_accepts_bind_and_global_config()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--config",
            "settings.yaml",
        ],)
        .expect("failed to parse CLI",);

        assert_eq!(cli.global.config.as_deref(), Some(std::path::Path::new("settings.yaml")));
        match cli.command {
            Command::Serve(args,) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000")),
            other => panic!("unexpected command variant: {other:?}"),
        }
    }

    #[test]
    fn settings_file_and_flags_are_merged()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("settings.yaml",);
        fs::write(&path, "github:\n  commit_limit: 5\nserver:\n  bind: 127.0.0.1:1\n",)
            .expect("failed to write settings",);

        let global = GlobalArgs {
            config:         Some(path,),
            github_token:   Some("token".to_string(),),
            github_api_url: Some("http://localhost:9999".to_string(),),
        };
        let settings =
            load_settings(&global, Some("127.0.0.1:2".to_string(),),).expect("settings load",);

        assert_eq!(settings.github.limits.commit_limit, 5);
        assert_eq!(settings.github.api_url, "http://localhost:9999");
        assert_eq!(settings.github.token.as_deref(), Some("token"));
        assert_eq!(settings.server.bind, "127.0.0.1:2");
    }

    #[test]
    fn pretty_and_compact_writers()
    {
        let activities = vec![RepositoryActivity::new("Hello-World", Vec::<Commit,>::new(),)];

        let mut buffer = Cursor::new(Vec::new(),);
        write_activities(&mut buffer, &activities, false,).expect("failed to serialize",);
        let output = String::from_utf8(buffer.into_inner(),).expect("invalid UTF-8",);
        assert_eq!(output, r#"[{"repositoryName":"Hello-World","recentCommits":[]}]"#);

        let mut buffer = Cursor::new(Vec::new(),);
        write_activities(&mut buffer, &activities, true,).expect("failed to serialize",);
        let output = String::from_utf8(buffer.into_inner(),).expect("invalid UTF-8",);
        assert!(output.starts_with("[\n  {\n    \"repositoryName\": \"Hello-World\""));
    }

    #[tokio::test]
    async fn fetch_reports_unknown_provider()
    {
        let args = FetchArgs {
            owner:    "octocat".to_string(),
            provider: "bitbucket".to_string(),
            pretty:   false,
        };

        let error = run_fetch(&ConnectorRegistry::new(), args,).await.expect_err("unknown provider",);
        assert_eq!(error.to_string(), "unknown source: bitbucket");
    }
}
