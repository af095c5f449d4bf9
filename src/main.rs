pub mod models {
    pub mod weather;
}

pub mod client;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod schema;
pub mod solar;
pub mod utils;
pub mod services {
    pub mod demo_data;
    pub mod smart_start;
    pub mod tick;
    pub mod weather;
}

use crate::client::WeatherClient;
use crate::config::Config;
use crate::services::{demo_data, tick};
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (weather_base_url={}, weather_timeout={}s, snapshot_stale_after={}min, tick_enabled={}, tick_interval={}s, seed_demo_data={})",
        cfg.weather_base_url,
        cfg.weather_timeout.as_secs(),
        cfg.snapshot_stale_after.num_minutes(),
        cfg.tick_enabled,
        cfg.tick_interval.as_secs(),
        cfg.seed_demo_data
    );

    // 2) Connect DB
    let mut conn = PgConnection::establish(&cfg.database_url).map_err(|e| format!("DB connection failed: {}", e))?;
    info!("Connected to database");

    // 3) Apply pending database migrations
    apply_database_migrations(&mut conn)?;

    // 4) Optionally seed the demo site
    if cfg.seed_demo_data {
        demo_data::run(&mut conn)?;
    }

    // 5) Weather provider client
    let client = WeatherClient::new(&cfg.weather_base_url, cfg.weather_timeout);

    // 6) Initial scheduling pass, then the steady-cadence loop
    let scheduled = tick::run_once(&mut conn, &client, cfg.snapshot_stale_after)?;
    if scheduled == 0 {
        info!("No enabled zone opening hours found; nothing to schedule");
    }

    if cfg.tick_enabled {
        info!("Starting scheduling loop: interval={}s", cfg.tick_interval.as_secs());
        tick::run_loop(&mut conn, &client, cfg.snapshot_stale_after, cfg.tick_interval)?;
    } else {
        info!("Scheduling loop disabled via TICK_ENABLED=false");
    }

    Ok(())
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--env-file") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--env-file=") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let path_str = &s["--env-file=".len()..];
                if path_str.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                env_file = Some(PathBuf::from(path_str));
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    if let Some(path) = env_file {
        if !path.is_file() {
            return Err(format!("env file not found: {}", path.display()));
        }
        load_env_file(&path)?;
        Ok(Some(LoadedEnvFile { path, explicit: true }))
    } else {
        let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
        let default_path = cwd.join(".env");
        if default_path.is_file() {
            load_env_file(&default_path)?;
            Ok(Some(LoadedEnvFile {
                path: default_path,
                explicit: false,
            }))
        } else {
            Ok(None)
        }
    }
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let contents = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    for (index, line) in contents.lines().enumerate() {
        match parse_env_assignment(line) {
            Ok(Some((key, value))) => {
                // Preserve any value that was already supplied via the process environment.
                if std::env::var_os(&key).is_none() {
                    // Updating process-level environment variables is unsafe on some targets.
                    unsafe {
                        std::env::set_var(key, value);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                return Err(format!("{}:{}: {}", path.display(), index + 1, e));
            }
        }
    }

    Ok(())
}

fn parse_env_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let without_export = trimmed
        .strip_prefix("export ")
        .map(|s| s.trim_start())
        .unwrap_or(trimmed);

    let (key, value_part) = without_export
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    let value = parse_env_value(value_part)?;
    Ok(Some((key.to_string(), value)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    for quote in ['"', '\''] {
        if let Some(rest) = trimmed.strip_prefix(quote) {
            let Some(end) = rest.find(quote) else {
                return Err(format!("unterminated {}-quoted value", quote));
            };
            let remainder = rest[end + 1..].trim();
            if !remainder.is_empty() && !remainder.starts_with('#') {
                return Err(format!("unexpected characters after closing {} quote", quote));
            }
            return Ok(rest[..end].to_string());
        }
    }

    // Unquoted values run to an inline comment, if any.
    let value = trimmed.split_once('#').map(|(v, _)| v).unwrap_or(trimmed).trim_end();
    Ok(value.to_string())
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "smartstart-engine {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_assignment_forms() {
        assert_eq!(parse_env_assignment("# comment").unwrap(), None);
        assert_eq!(parse_env_assignment("   ").unwrap(), None);
        assert_eq!(
            parse_env_assignment("DATABASE_URL=postgres://x").unwrap(),
            Some(("DATABASE_URL".to_string(), "postgres://x".to_string()))
        );
        assert_eq!(
            parse_env_assignment("export TICK_ENABLED=true").unwrap(),
            Some(("TICK_ENABLED".to_string(), "true".to_string()))
        );
        assert_eq!(
            parse_env_assignment("WEATHER_BASE_URL=http://localhost:8080 # proxy").unwrap(),
            Some(("WEATHER_BASE_URL".to_string(), "http://localhost:8080".to_string()))
        );
        assert_eq!(
            parse_env_assignment("NAME=\"quoted value\"").unwrap(),
            Some(("NAME".to_string(), "quoted value".to_string()))
        );
        assert_eq!(
            parse_env_assignment("NAME='single # not comment'").unwrap(),
            Some(("NAME".to_string(), "single # not comment".to_string()))
        );
    }

    #[test]
    fn env_assignment_errors() {
        assert!(parse_env_assignment("NOEQUALS").is_err());
        assert!(parse_env_assignment("=value").is_err());
        assert!(parse_env_assignment("BAD KEY=1").is_err());
        assert!(parse_env_assignment("NAME=\"unterminated").is_err());
    }
}
