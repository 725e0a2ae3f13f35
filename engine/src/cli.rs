//! CLI interface for Parley
//!
//! Parley has a single mode of operation: the interactive chat session.
//! The flags here only adjust how that session is configured.

use clap::Parser;
use std::path::PathBuf;

/// Parley: chat with a model that can act on your smart home
///
/// Credentials are read from the environment. Set `CLIENT_KEY` for OpenAI, or
/// `AZURE_CLIENT_KEY` together with `CLIENT_ENDPOINT` for Azure OpenAI.
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the model identifier (takes precedence over MODEL_ID)
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,
}
