use clap::Parser;
use speakpal_core::types::{Gender, Level};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "speakpal")]
#[command(about = "Voice and text English practice with an AI partner")]
#[command(version)]
pub struct Args {
    /// Increase verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (defaults to the per-user config directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding config and SPEAKPAL_API_BASE
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Skip the partner screen
    #[arg(long, value_name = "male|female")]
    pub gender: Option<Gender>,

    /// Skip the level screen (needs --gender)
    #[arg(long, value_name = "beginner|intermediate|advanced", requires = "gender")]
    pub level: Option<Level>,

    /// Write the effective config back to the config file before starting
    #[arg(long)]
    pub save_config: bool,
}
