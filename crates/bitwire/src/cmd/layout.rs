use bitwire_schema::{FieldKind, MessageLayout};

use crate::cmd::{load_registry, LayoutArgs};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{print_json, table, OutputFormat};

pub fn run(args: LayoutArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(&args.schemas)?;
    let layouts: Vec<&MessageLayout> = match &args.message {
        Some(name) => vec![registry
            .message(name)
            .map_err(|err| schema_error("layout", err))?],
        None => registry.messages().collect(),
    };

    print_layouts(&layouts, format);
    Ok(SUCCESS)
}

fn print_layouts(layouts: &[&MessageLayout], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(layouts),
        OutputFormat::Table => {
            let mut table = table(vec!["MESSAGE", "FIELD", "OFFSET", "SIZE", "TYPE"]);
            for layout in layouts {
                for field in &layout.fields {
                    table.add_row(vec![
                        layout.name.clone(),
                        field.name.clone(),
                        field.offset.to_string(),
                        field.size.to_string(),
                        describe(&field.kind),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for layout in layouts {
                println!("{} ({} bytes)", layout.name, layout.size);
                for field in &layout.fields {
                    println!(
                        "  {:<16} @{:<4} {:>3}B  {}",
                        field.name,
                        field.offset,
                        field.size,
                        describe(&field.kind)
                    );
                }
            }
        }
        OutputFormat::Raw => {
            for layout in layouts {
                println!("{} {}", layout.name, layout.size);
            }
        }
    }
}

fn describe(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Enum { spec } => format!("enum {} ({})", spec.name, spec.repr),
        FieldKind::Bitfield { spec } => {
            let bits = spec
                .fields
                .iter()
                .map(|b| format!("{}:{}", b.name, b.width))
                .collect::<Vec<_>>()
                .join(" ");
            format!("bits {} ({}) [{bits}]", spec.name, spec.word)
        }
        other => other.type_name(),
    }
}
