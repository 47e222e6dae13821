use clap::{Args, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use bitwire_schema::SchemaRegistry;
use tracing::debug;

use crate::exit::{schema_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod layout;
pub mod pump;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print compiled message layouts.
    Layout(LayoutArgs),
    /// Decode message bytes into field values.
    Decode(DecodeArgs),
    /// Encode field assignments into message bytes.
    Encode(EncodeArgs),
    /// Drive encoded messages through a queue backend and verify ordering.
    Pump(PumpArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Layout(args) => layout::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Pump(args) => pump::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Directory of `*.wire.json` definition files.
    #[arg(long, short = 's', value_name = "DIR", env = "BITWIRE_SCHEMAS")]
    pub schemas: PathBuf,
    /// Message to show. Default: all messages.
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Directory of `*.wire.json` definition files.
    #[arg(long, short = 's', value_name = "DIR", env = "BITWIRE_SCHEMAS")]
    pub schemas: PathBuf,
    /// Message to decode as.
    pub message: String,
    /// Message bytes as hex (optional `0x` prefix).
    #[arg(conflicts_with = "file", required_unless_present = "file")]
    pub hex: Option<String>,
    /// Read raw message bytes from file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Directory of `*.wire.json` definition files.
    #[arg(long, short = 's', value_name = "DIR", env = "BITWIRE_SCHEMAS")]
    pub schemas: PathBuf,
    /// Message to encode.
    pub message: String,
    /// Field assignments: `field=value`, `bitfield.sub=value`, `enum=SYMBOL`,
    /// `array=0x..` or `array=text`.
    pub assignments: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Locking,
    Lockfree,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Locking => "locking",
            Backend::Lockfree => "lockfree",
        }
    }
}

#[derive(Args, Debug)]
pub struct PumpArgs {
    /// Queue backend.
    #[arg(long, default_value = "locking")]
    pub backend: Backend,
    /// Producer threads.
    #[arg(long, default_value_t = 4)]
    pub producers: u16,
    /// Consumer threads.
    #[arg(long, default_value_t = 4)]
    pub consumers: usize,
    /// Messages per producer.
    #[arg(long, default_value_t = 10_000)]
    pub messages: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn load_registry(dir: &Path) -> CliResult<SchemaRegistry> {
    let registry = SchemaRegistry::from_directory(dir)
        .map_err(|err| schema_error(&format!("loading {}", dir.display()), err))?;
    debug!(
        dir = %dir.display(),
        definitions = registry.names().len(),
        "loaded definitions"
    );
    Ok(registry)
}
