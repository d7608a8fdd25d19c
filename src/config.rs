//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::{
    error::SessionError,
    utils::validation::{validate_set_count, RestDuration},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "set-counter")]
#[command(about = "A workout set counter with rest countdown, served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Rest timer minutes (0-59)
    #[arg(long, default_value = "1")]
    pub rest_minutes: u32,

    /// Rest timer seconds (0, 15, 30 or 45)
    #[arg(long, default_value = "0")]
    pub rest_seconds: u32,

    /// Target number of sets (1-99)
    #[arg(short, long, default_value = "10")]
    pub sets: u32,

    /// JSON file the counter is persisted to
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Keep the counter in memory only
    #[arg(long)]
    pub memory_store: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn rest_duration(&self) -> Result<RestDuration, SessionError> {
        RestDuration::new(self.rest_minutes, self.rest_seconds)
    }

    pub fn total_sets(&self) -> Result<u32, SessionError> {
        validate_set_count(self.sets)
    }

    /// Store location, defaulting to the platform data directory
    pub fn store_path(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("set-counter").join("store.json"))
            .unwrap_or_else(|| PathBuf::from("set-counter.json"))
    }
}
