//! Command-line interface entry point for `NomosDB`

mod args;
mod commands;

use args::{Cli, Command};
use clap::Parser;
use nomosdb::config::Config;
use nomosdb::info;
use nomosdb::logger::{enable_debug, enable_verbose, init_file_logging, set_level, Level};
use nomosdb::store::Store;
use std::path::{Path, PathBuf};

fn main() {
    let args = Cli::parse();

    // Load configuration once at startup and apply CLI overrides to it
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(Config::get_config_file_path);
    let mut config = Config::load_from(&config_path);
    let defaults = Config::from_defaults();
    config.apply_overrides(&args.to_config_overrides());

    // CLI flag overrides config logging.level; fallback warn
    let mut level = args
        .log_level
        .map(std::convert::Into::into)
        .or_else(|| config.logging.level.parse::<Level>().ok())
        .unwrap_or(Level::Warn);
    if args.debug_flag || level == Level::Debug {
        level = Level::Debug;
        enable_debug();
    }

    let verbose = args.verbose || config.logging.verbose;
    if verbose {
        enable_verbose();
    }
    set_level(level);

    // File logging: CLI flag wins, otherwise config logging.file if set
    let config_log_path: Option<PathBuf> = if config.logging.file.is_empty() {
        None
    } else {
        Some(PathBuf::from(&config.logging.file))
    };
    if let Some(log_path) = args.log_file.as_ref().or(config_log_path.as_ref()) {
        let display_path = log_path.to_string_lossy();
        if init_file_logging(log_path) {
            info!("File logging initialized at: {display_path}");
        } else {
            eprintln!("✗ Failed to initialize file logging at: {display_path}");
        }
    }

    let outcome = match args.command {
        Command::Config { subcommand } => {
            commands::config::run(subcommand, &mut config, &defaults, &config_path)
        }
        command => open_store(Path::new(&config.database.path))
            .and_then(|store| commands::dispatch(command, &commands::Context { store, config })),
    };

    if let Err(e) = outcome {
        eprintln!("✗ {e}");
        std::process::exit(1);
    }
}

fn open_store(path: &Path) -> commands::CommandResult<Store> {
    if path.as_os_str().is_empty() {
        return Err("No database configured; set one with `nomosdb config set db_path PATH`".into());
    }
    Store::open(path).map_err(|e| format!("Cannot open database {}: {e}", path.display()).into())
}
