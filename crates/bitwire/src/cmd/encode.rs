use bitwire_schema::{DynamicMessage, FieldKind, MessageLayout};
use serde::Serialize;

use crate::cmd::{load_registry, EncodeArgs};
use crate::exit::{schema_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{hex_string, parse_hex, print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    message: &'a str,
    size: usize,
    hex: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    Field(&'a str),
    Bits(&'a str, &'a str),
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.schemas)?;
    let layout = registry
        .message(&args.message)
        .map_err(|err| schema_error("encode", err))?;

    let bytes = encode(layout, &args.assignments)?;

    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            message: &layout.name,
            size: layout.size,
            hex: hex::encode(&bytes),
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", hex_string(&bytes)),
        OutputFormat::Raw => print_raw(&bytes),
    }
    Ok(SUCCESS)
}

/// Apply `field=value` assignments to a zeroed message of `layout`.
fn encode(layout: &MessageLayout, assignments: &[String]) -> CliResult<Vec<u8>> {
    let mut message = DynamicMessage::new(layout);
    for assignment in assignments {
        let (target, value) = parse_assignment(assignment)?;
        apply(&mut message, target, value).map_err(|err| {
            CliError::new(err.code, format!("{assignment}: {}", err.message))
        })?;
    }
    Ok(message.into_bytes())
}

fn parse_assignment(input: &str) -> CliResult<(Target<'_>, &str)> {
    let (lhs, value) = input
        .split_once('=')
        .ok_or_else(|| CliError::usage(format!("expected field=value, got {input:?}")))?;
    let lhs = lhs.trim();
    if lhs.is_empty() {
        return Err(CliError::usage(format!("missing field name in {input:?}")));
    }
    let target = match lhs.split_once('.') {
        Some((field, sub)) => Target::Bits(field, sub),
        None => Target::Field(lhs),
    };
    Ok((target, value.trim()))
}

fn apply(message: &mut DynamicMessage<'_>, target: Target<'_>, value: &str) -> CliResult<()> {
    let result = match target {
        Target::Bits(field, sub) => message.set_bits(field, sub, parse_number(value)?),
        Target::Field(field) => {
            let spec = message
                .layout()
                .field(field)
                .ok_or_else(|| CliError::usage(format!("no field {field}")))?;
            match &spec.kind {
                FieldKind::Array { .. } => {
                    let data = if value.starts_with("0x") || value.starts_with("0X") {
                        parse_hex(value).ok_or_else(|| {
                            CliError::new(DATA_INVALID, format!("invalid hex: {value}"))
                        })?
                    } else {
                        value.as_bytes().to_vec()
                    };
                    message.set_bytes(field, &data)
                }
                FieldKind::Enum { .. } => match parse_number(value) {
                    Ok(number) => message.set(field, number),
                    Err(_) => message.set_symbol(field, value),
                },
                FieldKind::Scalar { .. } | FieldKind::Bitfield { .. } => {
                    message.set(field, parse_number(value)?)
                }
            }
        }
    };
    result.map_err(|err| schema_error("encode", err))
}

/// Decimal or `0x` hex, with optional `_` separators.
fn parse_number(input: &str) -> CliResult<u64> {
    let cleaned = input.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse::<u64>(),
    };
    parsed.map_err(|_| CliError::new(DATA_INVALID, format!("invalid number: {input}")))
}
