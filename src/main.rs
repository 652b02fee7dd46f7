/// Version injected at compile time via AWSCHECK_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("AWSCHECK_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use awscheck::aws::{profile, AwsCliProvider, Ec2Provider, HttpProvider};
use awscheck::config::{Config, ProviderKind};
use awscheck::report::{self, OutputFormat};
use awscheck::resource::{field_paths, ResourceKind};
use awscheck::suite::{RunSummary, Suite, TestRunner};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Bearer token sent to the inventory endpoint
const TOKEN_ENV: &str = "AWSCHECK_TOKEN";

/// Verify live EC2 instances and security groups against a test suite
#[derive(Parser, Debug)]
#[command(name = "awscheck", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Suite file (YAML, or JSON with a .json extension)
    suite: Option<PathBuf>,

    /// AWS region to use
    #[arg(short, long)]
    region: Option<String>,

    /// AWS profile to use
    #[arg(short, long)]
    profile: Option<String>,

    /// Backend answering describe calls
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Inventory endpoint for the http backend
    #[arg(long)]
    endpoint: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Only run tests whose name contains this text
    #[arg(short, long)]
    filter: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or persist default settings
    Config {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long, value_enum)]
        provider: Option<ProviderKind>,
        #[arg(long)]
        endpoint: Option<String>,
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
    /// List the field paths recognised for a resource type (ec2, security_group)
    Fields {
        #[arg(value_name = "TYPE")]
        kind: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let directive = level.directive()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // AWSCHECK_LOG narrows or widens per-module levels, e.g. `awscheck::aws=trace`
    let filter =
        EnvFilter::try_from_env("AWSCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("awscheck {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("awscheck").join("awscheck.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".awscheck").join("awscheck.log");
    }
    PathBuf::from("awscheck.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(&args).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: &Args) -> Result<ExitCode> {
    match &args.command {
        Some(Command::Config {
            region,
            profile,
            provider,
            endpoint,
            show,
        }) => {
            let mut config = Config::load();
            let changed = region.is_some()
                || profile.is_some()
                || provider.is_some()
                || endpoint.is_some();
            if changed {
                config.update(
                    region.as_deref(),
                    profile.as_deref(),
                    *provider,
                    endpoint.as_deref(),
                )?;
                config.save()?;
                if let Some(path) = Config::config_path() {
                    println!("Saved {}", path.display());
                }
            }
            if *show || !changed {
                show_config(&config)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Fields { kind }) => {
            let kind = kind.parse::<ResourceKind>().map_err(anyhow::Error::msg)?;
            let mut out = io::stdout().lock();
            for path in field_paths(kind) {
                writeln!(out, "{}", path)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let Some(path) = &args.suite else {
                anyhow::bail!("no suite file given (see `awscheck --help`)");
            };
            run_suite(args, path).await
        }
    }
}

fn show_config(config: &Config) -> Result<()> {
    let profile_name = config.effective_profile(None);
    let region = config.effective_region(None, profile_name.as_deref());

    let mut out = io::stdout().lock();
    if let Some(path) = Config::config_path() {
        writeln!(out, "config file: {}", path.display())?;
    }
    if let Some(path) = profile::get_aws_config_path() {
        writeln!(out, "aws config:  {}", path.display())?;
    }
    writeln!(out, "region:      {}", region)?;
    writeln!(out, "profile:     {}", profile_name.as_deref().unwrap_or("-"))?;
    writeln!(
        out,
        "provider:    {}",
        config
            .effective_provider(None)
            .to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    )?;
    writeln!(
        out,
        "endpoint:    {}",
        config.effective_endpoint(None).as_deref().unwrap_or("-")
    )?;
    Ok(())
}

/// Build the provider handle shared by every test in the run
fn build_provider(args: &Args, config: &Config) -> Result<Box<dyn Ec2Provider>> {
    match config.effective_provider(args.provider) {
        ProviderKind::AwsCli => {
            let profile_name = config.effective_profile(args.profile.as_deref());
            let region = config.effective_region(args.region.as_deref(), profile_name.as_deref());
            tracing::info!("Using aws CLI, region: {}, profile: {:?}", region, profile_name);
            Ok(Box::new(AwsCliProvider::new(
                Some(&region),
                profile_name.as_deref(),
            )))
        }
        ProviderKind::Http => {
            let endpoint = config
                .effective_endpoint(args.endpoint.as_deref())
                .context("the http provider needs --endpoint or a configured endpoint")?;
            let token = std::env::var(TOKEN_ENV).ok();
            tracing::info!("Using inventory endpoint: {}", endpoint);
            Ok(Box::new(HttpProvider::new(&endpoint, token.as_deref())?))
        }
    }
}

async fn run_suite(args: &Args, path: &Path) -> Result<ExitCode> {
    let config = Config::load();
    let suite = Suite::load(path).with_context(|| format!("loading {}", path.display()))?;

    let provider = build_provider(args, &config)?;
    let runner = TestRunner::new(provider.as_ref()).with_filter(args.filter.clone());
    let outcomes = runner.run(&suite).await;
    let summary = RunSummary::from_outcomes(&outcomes);

    tracing::info!("{}", report::summary_line(&summary));

    match args.output {
        OutputFormat::Table => {
            let color = !args.no_color && io::stdout().is_terminal();
            report::render_table(&mut io::stdout().lock(), &outcomes, &summary, color)?;
        }
        OutputFormat::Json => {
            println!("{}", report::render_json(&outcomes, &summary)?);
        }
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
