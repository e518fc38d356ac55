//! Buildhook CLI
//!
//! Command-line front end for the build-completion notifier.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use buildhook::config::{check_notify_url, NotificationConfig};
use buildhook::models::{BuildInfo, HostInfo};
use buildhook::notify::{ConsoleLog, DeliveryClient, Notifier, RunOutcome, TemplateRenderer};
use buildhook::resources::{self, Resources};
use buildhook::Config;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

/// Buildhook - JSON webhooks for finished builds
#[derive(Parser)]
#[command(name = "buildhook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "BUILDHOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Notify the configured endpoint about a finished build
    Send {
        #[command(flatten)]
        job: JobArgs,

        /// Destination URL (overrides configuration)
        #[arg(long)]
        url: Option<String>,
    },

    /// Render and validate the payload without sending it
    Render {
        #[command(flatten)]
        job: JobArgs,
    },

    /// Check a destination URL
    CheckUrl {
        /// URL to check
        url: String,
    },

    /// Print the built-in default template
    DefaultTemplate,
}

#[derive(Args)]
struct JobArgs {
    /// Build description as JSON (`-` for stdin)
    #[arg(long)]
    build: PathBuf,

    /// Template body file (overrides configuration)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Build environment variable, repeatable
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,

    /// Start from this process's environment
    #[arg(long)]
    inherit_env: bool,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    let result = match cli.command {
        Commands::Send { job, url } => run_send(&config, &job, url.as_deref()).await,
        Commands::Render { job } => run_render(&config, &job),
        Commands::CheckUrl { url } => run_check_url(&url),
        Commands::DefaultTemplate => run_default_template(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_send(config: &Config, job: &JobArgs, url: Option<&str>) -> anyhow::Result<()> {
    let url = url.or(config.notifier.url.as_deref());
    let notifier = build_notifier(config, job, url)?;
    let build = read_build(&job.build)?;
    let env = build_env(job);

    let mut log = ConsoleLog::new(io::stdout());
    match notifier.run(&build, &mut log, &env).await? {
        RunOutcome::Delivered { status } => info!(status, "Notification delivered"),
        RunOutcome::Skipped(reason) => info!(?reason, "Notification skipped"),
    }
    Ok(())
}

fn run_render(config: &Config, job: &JobArgs) -> anyhow::Result<()> {
    let notifier = build_notifier(config, job, None)?;
    let build = read_build(&job.build)?;
    let env = build_env(job);

    let payload = notifier.render_payload(&build, &env)?;
    println!("{}", serde_json::to_string_pretty(&payload.value)?);
    Ok(())
}

fn run_check_url(url: &str) -> anyhow::Result<()> {
    let check = check_notify_url(url);
    if !check.is_ok() {
        bail!("{}", check.message());
    }
    println!("{}", check.message());
    Ok(())
}

fn run_default_template(config: &Config) -> anyhow::Result<()> {
    let resources = Resources::resolve(config.notifier.resources_dir.as_deref())?;
    println!("{}", resources.default_template());
    Ok(())
}

fn build_notifier(config: &Config, job: &JobArgs, url: Option<&str>) -> anyhow::Result<Notifier> {
    let resources = Resources::resolve(config.notifier.resources_dir.as_deref())
        .context("Failed to load template resources")?;

    let template_path = job.template.as_deref().or(config.notifier.template_path.as_deref());
    let template = template_path.map(resources::load).transpose()?;

    let notification = NotificationConfig::new(url, template.as_deref(), resources.default_template());
    let client = DeliveryClient::new(&config.http)?;

    Ok(Notifier::new(
        notification,
        TemplateRenderer::new(resources.prelude()),
        client,
        Some(HostInfo::from(&config.host)),
    ))
}

fn read_build(path: &Path) -> anyhow::Result<BuildInfo> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read build from '{}'", path.display()))?
    };

    let build: BuildInfo = serde_json::from_str(&raw).context("Invalid build JSON")?;
    debug!(job = %build.job_name, number = build.number, "Loaded build");
    Ok(build)
}

fn build_env(job: &JobArgs) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    if job.inherit_env {
        env.extend(std::env::vars());
    }
    env.extend(job.env.iter().cloned());
    env
}
