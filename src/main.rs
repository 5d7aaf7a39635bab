use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::filters::cmd_filters;
use cli::info::cmd_info;
use cli::process::cmd_process;

mod cli;
mod export;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let multi = MultiProgress::new();
    let progress = init_logging(&cli, &multi)?.then_some(&multi);

    match &cli.command {
        Commands::Info(args) => cmd_info(args, &cli, progress),
        Commands::Process(args) => cmd_process(args, &cli, progress),
        Commands::Filters => cmd_filters(),
    }
}

/// Installs the global logger. Returns true when log output is routed
/// through `multi` so spinners stay intact.
fn init_logging(cli: &Cli, multi: &MultiProgress) -> Result<bool> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(cli.loglevel.to_level_filter());

    match cli.log_format {
        LogFormat::Plain => {
            builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                use std::io::Write;
                let line = serde_json::json!({
                    "ts": buf.timestamp().to_string(),
                    "lvl": record.level().as_str(),
                    "target": record.target(),
                    "msg": record.args().to_string(),
                });
                writeln!(buf, "{line}")
            });
        }
    }

    if cli.progress {
        LogWrapper::new(multi.clone(), builder.build()).try_init()?;
        Ok(true)
    } else {
        builder.try_init()?;
        Ok(false)
    }
}
