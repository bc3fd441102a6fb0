use std::path::{Path, PathBuf};
use clap::Parser;
use crate::logging::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "gandi-dyndns", version, about = "Point Gandi LiveDNS records at this host's public IP")]
pub struct Args {
    /// The configuration file location
    ///
    /// `~` and environment variables in the path are expanded.
    #[arg(short, long, default_value = ".gandi.conf")]
    pub config: String,

    /// The Gandi API key, replacing `key` in the [GANDI] section
    #[arg(long, env = "GANDI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// A file to append the run log to, in addition to stderr
    #[arg(short, long, default_value = "gandiDynDNS.log")]
    pub log_file: PathBuf,

    /// Log to stderr only
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// The format of log lines
    #[arg(long, value_enum, default_value_t = LogFormat::Full)]
    pub log_format: LogFormat,

    /// Compare records without writing any changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl Args {
    pub fn log_file(&self) -> Option<&Path> {
        (!self.no_log_file).then_some(self.log_file.as_path())
    }
}
