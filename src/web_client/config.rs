//! Configuration for the huddle-web server.

use std::path::PathBuf;

use clap::Parser;

pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub(crate) const BIND_ENV: &str = "HUDDLE_WEB_BIND";
pub(crate) const HOME_ENV: &str = "HUDDLE_HOME";

/// HTTP front end for the huddle chat store.
///
/// Callers authenticate with `Authorization: Bearer <identity token>`.
/// CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(name = "huddle-web", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: HUDDLE_WEB_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Data directory holding huddle.db [env: HUDDLE_HOME] [default: ~/.huddle]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var(HOME_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".huddle"))
                    .unwrap_or_else(|_| PathBuf::from(".huddle"))
            });

        let bind_addr = cli
            .bind
            .or_else(|| std::env::var(BIND_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        Self {
            bind_addr,
            data_dir,
        }
    }
}
