// file: src/main.rs
// description: commandline entry point for checking logging setup and timing commands
// reference: application bootstrap and orchestration

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use tracing::{debug, warn};
use wadnr_utilities::logging::record::level_name;
use wadnr_utilities::utils::logging::{
    format_error, format_info, format_success, format_warning, init_cli_logger,
};
use wadnr_utilities::{Config, HandlerKind, Toolkit, setup_logging_with, timer};

#[derive(Parser)]
#[command(name = "wadnr_utilities")]
#[command(author = "Jason Hildreth")]
#[command(version)]
#[command(about = "Logging and timing helpers for DNR GIS scripts", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure logging under a project root and emit test records
    Init {
        #[arg(long, value_name = "DIR")]
        root: PathBuf,

        /// Also emit a warning, which triggers the email handler
        #[arg(long)]
        warning: bool,
    },

    /// Run a program and log how long it took
    Time {
        #[arg(long, value_name = "DIR")]
        root: PathBuf,

        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        program: Vec<String>,
    },

    /// Print the effective configuration as JSON
    ShowConfig,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_cli_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Init { root, warning } => cmd_init(&config, &root, warning),
        Commands::Time { root, program } => cmd_time(&config, &root, &program),
        Commands::ShowConfig => cmd_show_config(&config),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    debug!("Loading configuration from: {}", path.display());
    if path.exists() {
        Config::load(Some(path)).context("Failed to load configuration")
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            path.display()
        );
        Ok(Config::default_config())
    }
}

fn cmd_init(config: &Config, root: &Path, warning: bool) -> Result<ExitCode> {
    let logger = setup_logging_with(root, config)
        .with_context(|| format!("Failed to configure logging under {}", root.display()))?;

    for handler in logger.handlers() {
        let description = match &handler.kind {
            HandlerKind::RotatingFile {
                path,
                max_bytes,
                backup_count,
            } => format!(
                "file {} ({} bytes, {} backups)",
                path.display(),
                max_bytes,
                backup_count
            ),
            HandlerKind::Email {
                mail_host,
                recipients,
            } => format!("email via {} to {}", mail_host, recipients.join(", ")),
            HandlerKind::Console => "console".to_string(),
        };
        let line = format!("{}: {}", level_name(handler.level), description);
        println!("{}", format_info(&line));
    }

    match Toolkit::detect(&config.toolkit) {
        Some(toolkit) => println!(
            "{}",
            format_info(&format!(
                "Geoprocessing toolkit at {}",
                toolkit.install_dir().display()
            ))
        ),
        None => println!(
            "{}",
            format_warning("Geoprocessing toolkit not available; environment setup skipped")
        ),
    }

    logger.debug("Logging initialised");
    logger.info("Logging check from wadnr_utilities init");
    if warning {
        logger.warning("Test warning from wadnr_utilities init");
    }

    println!(
        "{}",
        format_success(&format!("Logging to {}", logger.log_file().display()))
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_time(config: &Config, root: &Path, program: &[String]) -> Result<ExitCode> {
    let Some((executable, args)) = program.split_first() else {
        bail!("No program given to time");
    };

    let logger = setup_logging_with(root, config)
        .with_context(|| format!("Failed to configure logging under {}", root.display()))?;

    let name = Path::new(executable)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| executable.clone());

    let timed = timer(&logger).wrap_named(name, |args: &[String]| {
        Command::new(executable).args(args).status()
    });

    let status = match timed.try_call((args,)) {
        Ok(status) => status,
        Err(e) => {
            logger.error(&format!("Could not start {}: {}", executable, e));
            eprintln!("{}", format_error(&format!("Could not start {}", executable)));
            return Ok(ExitCode::FAILURE);
        }
    };

    if status.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        logger.warning(&format!("{} exited with {}", executable, status));
        let code = status
            .code()
            .and_then(|code| u8::try_from(code).ok())
            .unwrap_or(1);
        Ok(ExitCode::from(code))
    }
}

fn cmd_show_config(config: &Config) -> Result<ExitCode> {
    let rendered =
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    println!("{}", rendered);
    Ok(ExitCode::SUCCESS)
}
