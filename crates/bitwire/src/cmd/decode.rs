use bitwire_schema::DecodedField;
use serde::Serialize;
use tracing::warn;

use crate::cmd::{load_registry, DecodeArgs};
use crate::exit::{io_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{parse_hex, print_json, print_raw, table, OutputFormat};

#[derive(Serialize)]
struct DecodeOutput<'a> {
    message: &'a str,
    size: usize,
    fields: Vec<DecodedField>,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.schemas)?;
    let layout = registry
        .message(&args.message)
        .map_err(|err| schema_error("decode", err))?;

    let bytes = match (&args.hex, &args.file) {
        (_, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("reading {}", path.display()), err))?,
        (Some(hex), None) => parse_hex(hex)
            .ok_or_else(|| CliError::new(DATA_INVALID, format!("invalid hex input: {hex}")))?,
        (None, None) => return Err(CliError::usage("decode needs hex input or --file")),
    };

    let fields = layout
        .decode(&bytes)
        .map_err(|err| schema_error("decode", err))?;
    if bytes.len() > layout.size {
        warn!(
            message = %layout.name,
            trailing = bytes.len() - layout.size,
            "ignoring bytes past the message layout"
        );
    }

    match format {
        OutputFormat::Json => print_json(&DecodeOutput {
            message: &layout.name,
            size: layout.size,
            fields,
        }),
        OutputFormat::Table => {
            let mut table = table(vec!["FIELD", "OFFSET", "VALUE"]);
            for field in &fields {
                table.add_row(vec![
                    field.name.clone(),
                    field.offset.to_string(),
                    field.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}:", layout.name);
            for field in &fields {
                println!("  {} = {}", field.name, field.value);
            }
        }
        OutputFormat::Raw => print_raw(&bytes[..layout.size]),
    }

    Ok(SUCCESS)
}
