use bitwire_schema::{RegistryConfig, ScalarType, DEFINITION_SUFFIX};
use clap::ValueEnum;
use serde::Serialize;

use crate::cmd::{Backend, VersionArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    build_target: &'static str,
    build_profile: &'static str,
    byte_order: &'static str,
    scalar_types: Vec<&'static str>,
    queue_backends: Vec<&'static str>,
    definition_suffix: &'static str,
    max_definitions_from_directory: usize,
    max_definition_file_size: usize,
    max_message_size: usize,
}

impl VersionInfo {
    fn collect() -> Self {
        let limits = RegistryConfig::default();
        Self {
            name: "bitwire",
            version: env!("CARGO_PKG_VERSION"),
            build_target: option_env!("BITWIRE_BUILD_TARGET").unwrap_or("unknown"),
            build_profile: option_env!("BITWIRE_BUILD_PROFILE").unwrap_or("unknown"),
            byte_order: "big-endian",
            scalar_types: ScalarType::ALL.iter().map(|t| t.as_str()).collect(),
            queue_backends: Backend::value_variants().iter().map(|b| b.as_str()).collect(),
            definition_suffix: DEFINITION_SUFFIX,
            max_definitions_from_directory: limits.max_definitions_from_directory,
            max_definition_file_size: limits.max_definition_file_size,
            max_message_size: limits.max_message_size,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.to_string()),
            ("version", self.version.to_string()),
            ("build_target", self.build_target.to_string()),
            ("build_profile", self.build_profile.to_string()),
            ("byte_order", self.byte_order.to_string()),
            ("scalar_types", self.scalar_types.join(", ")),
            ("queue_backends", self.queue_backends.join(", ")),
            ("definition_suffix", self.definition_suffix.to_string()),
            (
                "max_definitions_from_directory",
                self.max_definitions_from_directory.to_string(),
            ),
            (
                "max_definition_file_size",
                self.max_definition_file_size.to_string(),
            ),
            ("max_message_size", self.max_message_size.to_string()),
        ]
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.extended {
        println!("bitwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let info = VersionInfo::collect();
    match format {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Table => {
            let mut out = table(vec!["PROPERTY", "VALUE"]);
            for (key, value) in info.rows() {
                out.add_row(vec![key.to_string(), value]);
            }
            println!("{out}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for (key, value) in info.rows() {
                println!("{key}: {value}");
            }
        }
    }
    Ok(SUCCESS)
}
