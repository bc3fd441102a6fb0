use std::process::ExitCode;
use clap::Parser;
use tracing::{debug, error, info};
use crate::{
    cli::Args,
    dns::gandi::GandiProvider,
    ip::ipify::IpifySource,
    settings::Settings,
    updater::{RunSummary, Updater},
};

mod cli;
mod dns;
mod ip;
mod logging;
mod settings;
mod updater;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _logging = match logging::init(args.log_file(), args.log_format) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("unable to open log file {}: {}", args.log_file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    ExitCode::from(finish(run(args).await))
}

async fn run(args: Args) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let cfg = Settings::load(&args.config, args.api_key)?;

    let source = IpifySource::new(
        cfg.lookup.ipv4_url.as_str(),
        cfg.lookup.ipv6_url.as_str(),
        cfg.timeout,
    )?;
    let provider = GandiProvider::new(&cfg.gandi.key, cfg.gandi.api_url.as_str(), cfg.timeout)?;

    if args.dry_run {
        info!("dry run, no records will be written");
    }

    let updater = Updater::new(provider, source, cfg.dns)
        .with_dry_run(args.dry_run);

    Ok(updater.run().await?)
}

/// Logs how the run ended and returns the process exit status.
fn finish(result: Result<RunSummary, Box<dyn std::error::Error>>) -> u8 {
    match result {
        Ok(summary) => {
            for (name, outcome) in summary.records() {
                debug!(?outcome, "{}", name);
            }
            if summary.pending() > 0 {
                info!("{} DNS records would be changed", summary.pending());
            }
            0
        }
        Err(e) => {
            error!("critical error: {}", e);
            1
        }
    }
}
