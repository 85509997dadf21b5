use clap::Parser;
use std::net::SocketAddr;

pub const DEFAULT_API_ORIGIN: &str = "http://localhost:8080";

/// MyKad reader service
#[derive(Parser, Debug, Clone)]
#[command(name = "mykad-reader")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Browser origin allowed to call `/api/*`
    #[arg(long, env = "API_ORIGIN", default_value = DEFAULT_API_ORIGIN)]
    pub api_origin: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "MYKAD_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Log level used when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long, env = "MYKAD_LOG", default_value = "info")]
    pub log_level: String,

    /// Hex dump every file read from the card (logged at debug level)
    #[arg(long, env = "MYKAD_DUMP")]
    pub dump: bool,
}

impl Config {
    /// Configured origin with surrounding whitespace removed. Values pasted
    /// into `.env` files often carry a trailing space or CR.
    pub fn api_origin(&self) -> &str {
        self.api_origin.trim()
    }
}
