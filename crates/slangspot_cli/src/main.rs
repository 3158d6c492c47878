//! SlangSpot command-line entry point.
//!
//! # Responsibility
//! - Run the HTTP server with file config plus CLI/env overrides.
//! - Provide account bootstrap and linkage checks for local setups.

use clap::{Args, Parser, Subcommand};
use log::error;
use slangspot_core::repo::user_repo::SqliteUserRepository;
use slangspot_core::service::user_service::UserService;
use slangspot_core::{default_log_level, init_logging_with, open_db, LogConfig, User};
use slangspot_server::ServerConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "slangspot", version, about = "Latin American slang learning community")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web application.
    Serve(ServeArgs),
    /// Create an account directly in the database.
    CreateUser(CreateUserArgs),
    /// Print core linkage information.
    Ping,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// TOML config file.
    #[arg(long, env = "SLANGSPOT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "SLANGSPOT_BIND")]
    bind: Option<String>,
    #[arg(long, env = "SLANGSPOT_DATABASE")]
    database: Option<PathBuf>,
    #[arg(long, env = "SLANGSPOT_LOG_LEVEL")]
    log_level: Option<String>,
    /// Absolute directory for rolling log files.
    #[arg(long, env = "SLANGSPOT_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// Mirror log lines to stderr.
    #[arg(long)]
    log_to_stderr: bool,
}

#[derive(Debug, Args)]
struct CreateUserArgs {
    username: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, env = "SLANGSPOT_DATABASE", default_value = "slangspot.sqlite3")]
    database: PathBuf,
    /// Allow forum moderation.
    #[arg(long)]
    staff: bool,
    /// Bypass every ownership check.
    #[arg(long)]
    superuser: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve(args) => serve(args),
        Command::CreateUser(args) => create_user(args),
        Command::Ping => {
            println!("slangspot_core ping={}", slangspot_core::ping());
            println!("slangspot_core version={}", slangspot_core::core_version());
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_exit module=cli status=error error={}", message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn serve(args: ServeArgs) -> Result<(), String> {
    let mut config = ServerConfig::load(args.config.as_deref()).map_err(|err| err.to_string())?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level);
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = Some(log_dir);
    }
    config.log_to_stderr |= args.log_to_stderr;
    config.validate().map_err(|err| err.to_string())?;

    let log_dir = match &config.log_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|err| format!("cannot resolve working directory: {err}"))?
            .join("logs"),
    };
    let mut log_config = LogConfig::new(
        config
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string()),
        log_dir.to_string_lossy(),
    );
    log_config.to_stderr = config.log_to_stderr;
    init_logging_with(&log_config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("cannot start runtime: {err}"))?;
    runtime
        .block_on(slangspot_server::serve(config))
        .map_err(|err| err.to_string())
}

fn create_user(args: CreateUserArgs) -> Result<(), String> {
    let conn = open_db(&args.database).map_err(|err| err.to_string())?;
    let mut user = User::new(args.username, args.email);
    user.is_staff = args.staff || args.superuser;
    user.is_superuser = args.superuser;
    let stored = UserService::new(SqliteUserRepository::new(&conn))
        .create_user(&user)
        .map_err(|err| err.to_string())?;
    println!("{}", stored.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_override_config() {
        let cli = Cli::try_parse_from([
            "slangspot",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--log-to-stderr",
        ])
        .expect("serve args parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
        assert!(args.log_to_stderr);
    }

    #[test]
    fn create_user_writes_account() {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = dir.path().join("users.sqlite3");
        create_user(CreateUserArgs {
            username: "mod_ana".to_string(),
            email: "ana@example.com".to_string(),
            database: database.clone(),
            staff: true,
            superuser: false,
        })
        .expect("user created");

        let err = create_user(CreateUserArgs {
            username: "MOD_ANA".to_string(),
            email: String::new(),
            database,
            staff: false,
            superuser: false,
        })
        .expect_err("duplicate rejected");
        assert!(err.contains("username"));
    }
}
