use std::path::PathBuf;

use clap::Parser;

use crate::app::ControllerOptions;

/// Connects your phone's Bluetooth audio when you pick it up.
#[derive(Debug, Parser)]
#[command(name = "holdsense", version, about)]
pub struct Cli {
    /// Directory holding config.toml, models/ and logs/ (defaults to the OS config dir)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log to the console only
    #[arg(long)]
    pub no_file_log: bool,

    /// Do not read control commands from stdin
    #[arg(long)]
    pub no_stdin: bool,
}

impl Cli {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            config_dir: self.config_dir.clone(),
            log_level: self.log_level.clone(),
            disable_file_logging: self.no_file_log,
        }
    }
}
