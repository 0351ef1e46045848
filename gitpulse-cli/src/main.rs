//! GitPulse CLI - Command-line interface for GitPulse
//!
//! Analyzes contributor and commit statistics for one or more remote repositories

use clap::{Parser, Subcommand};
use gitpulse_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success, BatchMode,
    BatchReport, ErrorContext, GitExecutor, GitPulseConfig, GitPulseError, GitPulseResult,
    LoggingConfig,
};
use gitpulse_repo::{write_report, BatchCoordinator, RepositoryAnalyzer, SystemGit};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "gitpulse")]
#[command(about = "Contributor and commit statistics for git repositories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone or update repositories and report their statistics
    Analyze {
        /// Remote repository URLs (https://host/owner/repo or git@host:owner/repo)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Root directory for working copies
        #[arg(long)]
        root: Option<PathBuf>,

        /// Repositories analyzed at the same time
        #[arg(long)]
        concurrency: Option<usize>,

        /// Analyze one repository at a time
        #[arg(long)]
        sequential: bool,

        /// Directory for the JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not write a JSON report
        #[arg(long)]
        no_save: bool,

        /// Timeout for each git command, in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() -> GitPulseResult<()> {
    let cli = Cli::parse();

    let mut logging_config = LoggingConfig::default();
    if cli.verbose {
        logging_config.level = "debug".to_string();
        logging_config.filter_directives = vec![
            "gitpulse_core=debug".to_string(),
            "gitpulse_repo=debug".to_string(),
        ];
    }

    init_logging(&logging_config).map_err(|e| GitPulseError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the RUST_LOG filter syntax"),
    })?;

    info!("Starting GitPulse CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze {
            urls,
            root,
            concurrency,
            sequential,
            output,
            no_save,
            timeout,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(root) = root {
                config.workspace.root_dir = root;
            }
            if let Some(output) = output {
                config.workspace.results_dir = output;
            }
            if let Some(concurrency) = concurrency {
                config.batch.concurrency = concurrency;
            }
            if sequential {
                config.batch.mode = BatchMode::Sequential;
            }
            if timeout.is_some() {
                config.git.command_timeout_secs = timeout;
            }
            config.validate()?;

            let report = handle_analyze(&urls, &config, !no_save).await?;
            if report.all_failed() {
                std::process::exit(1);
            }
        }
        Commands::Config {
            show,
            init,
            validate,
        } => {
            handle_config(show, init, validate, cli.config.as_ref()).await?;
        }
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> GitPulseResult<GitPulseConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return GitPulseConfig::from_file(path);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("gitpulse").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".gitpulse").join("config.toml")),
        Some(PathBuf::from("gitpulse.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return GitPulseConfig::from_file(path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(GitPulseConfig::default())
}

async fn handle_analyze(
    urls: &[String],
    config: &GitPulseConfig,
    save: bool,
) -> GitPulseResult<BatchReport> {
    log_operation_start!("analyze", repositories = urls.len());

    let repos = BatchCoordinator::prepare(urls, &config.workspace.root_dir).map_err(|e| {
        log_operation_error!("prepare_batch", e);
        e
    })?;

    let git: Arc<dyn GitExecutor> = Arc::new(SystemGit::detect(&config.git).await?);
    let analyzer = RepositoryAnalyzer::new(git, config);
    let coordinator = BatchCoordinator::from_config(analyzer, &config.batch)?;

    let report = coordinator.run(&repos).await;
    print_report(&report);

    if save {
        let path = write_report(&config.workspace.results_dir, &report).await?;
        println!("\n💾 Report saved to {}", path.display());
    }

    log_operation_success!(
        "analyze",
        succeeded = report.results.len(),
        failed = report.failures.len()
    );
    Ok(report)
}

fn print_report(report: &BatchReport) {
    for result in &report.results {
        let summary = &result.summary;
        println!("\n📦 {}", result.remote_url);
        println!("   📁 {}", result.repository_path);
        println!(
            "   📊 {} commits by {} contributors ({} → {})",
            summary.total_commits,
            summary.total_contributors,
            or_dash(&summary.first_commit_date),
            or_dash(&summary.last_commit_date)
        );

        for contributor in result.contributors.iter().take(5) {
            println!(
                "   👤 {:<24} {:>6} commits  +{:<8} -{:<8} {} → {}",
                contributor.name,
                contributor.commit_count,
                contributor.additions,
                contributor.deletions,
                or_dash(&contributor.first_commit_date),
                or_dash(&contributor.last_commit_date)
            );
        }
        if result.contributors.len() > 5 {
            println!("   … and {} more", result.contributors.len() - 5);
        }

        for commit in result.recent_commits.iter().take(3) {
            let short_hash: String = commit.hash.chars().take(8).collect();
            println!("   🔹 {} {} {}", short_hash, commit.date, commit.message);
        }
    }

    if !report.failures.is_empty() {
        println!("\n❌ Failed repositories:");
        for failure in &report.failures {
            println!(
                "   {} [{}]: {}",
                failure.remote_url,
                failure.step.as_deref().unwrap_or("unknown step"),
                failure.message
            );
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

async fn handle_config(
    show: bool,
    init: bool,
    validate: bool,
    config_path: Option<&PathBuf>,
) -> GitPulseResult<()> {
    if init {
        let config_path = match config_path {
            Some(path) => path.clone(),
            None => get_config_path()?,
        };
        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        GitPulseConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
    }

    if !show && !validate {
        return Ok(());
    }

    let config = load_config(config_path)?;

    if show {
        let rendered = toml::to_string_pretty(&config).map_err(|e| GitPulseError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("show_config"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Get the default configuration file path
fn get_config_path() -> GitPulseResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("gitpulse").join("config.toml"))
        .ok_or_else(|| GitPulseError::Config {
            message: "Could not determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("config_path")
                .with_suggestion("Pass --config with an explicit path"),
        })
}
