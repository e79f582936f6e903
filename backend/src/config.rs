use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;

use crate::db;

/// Runtime settings, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "rundown-backend", about = "Classroom story collection server")]
pub struct Config {
    /// Interface to bind the HTTP server to.
    #[arg(long, env = "RUNDOWN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "RUNDOWN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// SQLite database file.
    #[arg(long, env = "RUNDOWN_DATABASE", default_value = "rundown.sqlite")]
    pub database: PathBuf,

    /// Largest CSV upload accepted by the import endpoint.
    #[arg(long, env = "RUNDOWN_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Opens a fresh connection to the configured database.
    pub fn open_db(&self) -> rusqlite::Result<Connection> {
        db::open(&self.database)
    }
}
