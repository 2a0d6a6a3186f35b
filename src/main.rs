//! audio-setup - Main entry point

use anyhow::Context;
use audio_setup::cli::{Cli, Commands};
use audio_setup::config_file::{SetupConfig, INSTALL_COPY_ENV};
use audio_setup::{Bootstrapper, HttpSource, LogSink, Provisioner, SetupError, SystemHost, Toggle};
use std::path::Path;

fn main() {
    let cli = Cli::parse_args();

    let console = LogSink::console();

    if let Err(e) = audio_setup::process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            match e.downcast_ref::<SetupError>() {
                Some(setup_err) => {
                    if setup_err.is_precondition() {
                        eprintln!("  Nothing was changed.");
                    }
                    setup_err.exit_code()
                }
                None => 1,
            }
        }
    };

    drop(console);
    std::process::exit(code);
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let command = cli
        .command
        .unwrap_or(Commands::Provision { strict: false });

    match command {
        Commands::Validate { config } => validate(&config),
        Commands::Provision { strict } => {
            let config = SetupConfig::load_or_default(cli.config.as_deref())
                .map_err(|e| SetupError::config(format!("{:#}", e)))?;
            provision(config, cli.dry_run, strict)
        }
        Commands::Bootstrap { no_install_copy } => {
            let config = SetupConfig::load_or_default(cli.config.as_deref())
                .map_err(|e| SetupError::config(format!("{:#}", e)))?;
            bootstrap(config, cli.dry_run, no_install_copy)
        }
    }
}

fn validate(path: &Path) -> anyhow::Result<i32> {
    tracing::info!("Validating configuration file: {:?}", path);
    let config = SetupConfig::load_from_file(path)?;
    match config.validate() {
        Ok(()) => {
            println!("✓ Configuration file is valid: {}", path.display());
            Ok(0)
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed: {:#}", e);
            Ok(1)
        }
    }
}

fn provision(config: SetupConfig, dry_run: bool, strict: bool) -> anyhow::Result<i32> {
    let mut host = SystemHost::new(dry_run);
    let report = Provisioner::new(config.provision)
        .dry_run(dry_run)
        .run(&mut host)?;

    println!("{}", report);
    Ok(report.exit_code(strict))
}

fn bootstrap(config: SetupConfig, dry_run: bool, no_install_copy: bool) -> anyhow::Result<i32> {
    let install_copy = if no_install_copy || dry_run {
        Toggle::Off
    } else {
        Toggle::from_env_value(std::env::var(INSTALL_COPY_ENV).ok().as_deref(), Toggle::On)
    };

    let source = HttpSource::new().context("Failed to build HTTP client")?;
    let bootstrapper = Bootstrapper::new(config.bootstrap, install_copy);

    if dry_run {
        let artifact = bootstrapper.fetch(&source)?;
        println!(
            "[DRY RUN] Downloaded {} from branch '{}'; not running it",
            artifact.path().display(),
            artifact.branch
        );
        return Ok(0);
    }

    Ok(bootstrapper.run(&source)?)
}
