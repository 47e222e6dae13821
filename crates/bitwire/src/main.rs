mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

/// Inspect, decode and encode packed binary messages described by
/// `*.wire.json` definitions, and exercise the message queues.
#[derive(Parser, Debug)]
#[command(name = "bitwire", version, about = "Packed binary message tooling")]
struct Cli {
    /// Output format. Default: table on a terminal, json otherwise.
    #[arg(long, value_name = "FORMAT", global = true, env = "BITWIRE_FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        global = true,
        env = "BITWIRE_LOG_FORMAT"
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        global = true,
        env = "BITWIRE_LOG_LEVEL"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    tracing::debug!(?format, command = ?cli.command, "bitwire starting");

    let code = cmd::run(cli.command, format).unwrap_or_else(|err| {
        tracing::debug!(code = err.code, "command failed");
        eprintln!("error: {err}");
        err.code
    });
    std::process::exit(code);
}
