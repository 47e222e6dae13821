#![cfg(feature = "cli")]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const DEFINITIONS: &str = r#"[
    {"kind":"enum","name":"Kind","values":[{"symbol":"DATA"},{"symbol":"CONTROL"}]},
    {"kind":"bitfield","name":"Flags","word":"u16","fields":[
        {"name":"urgent","width":1},
        {"name":"priority","width":3}
    ]},
    {"kind":"message","name":"Packet","fields":[
        {"name":"kind","type":"Kind"},
        {"name":"flags","type":"Flags"},
        {"name":"seq","type":"u32"},
        {"name":"label","type":"u8","count":4}
    ]}
]"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "bitwire-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn schema_dir(tag: &str) -> PathBuf {
    let dir = unique_temp_dir(tag);
    std::fs::write(dir.join("packet.wire.json"), DEFINITIONS).expect("definitions written");
    dir
}

fn bitwire(dir: &Path, args: &[&str]) -> Output {
    let (command, rest) = args.split_first().expect("command given");
    Command::new(env!("CARGO_BIN_EXE_bitwire"))
        .args(["--log-level", "error", "--format", "json", command, "--schemas"])
        .arg(dir)
        .args(rest)
        .output()
        .expect("bitwire should run")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn layout_lists_offsets() {
    let dir = schema_dir("layout");
    let output = bitwire(&dir, &["layout", "Packet"]);
    assert!(output.status.success());

    let layouts = json_stdout(&output);
    assert_eq!(layouts[0]["name"], "Packet");
    assert_eq!(layouts[0]["size"], 11);
    assert_eq!(layouts[0]["fields"][2]["name"], "seq");
    assert_eq!(layouts[0]["fields"][2]["offset"], 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn encode_then_decode() {
    let dir = schema_dir("roundtrip");
    let encoded = bitwire(
        &dir,
        &[
            "encode",
            "Packet",
            "kind=CONTROL",
            "flags.priority=5",
            "flags.urgent=1",
            "seq=0x01020304",
            "label=ab",
        ],
    );
    assert!(encoded.status.success());
    let hex = json_stdout(&encoded)["hex"]
        .as_str()
        .expect("hex output")
        .to_string();
    assert_eq!(hex, "01000b0102030461620000");

    let decoded = bitwire(&dir, &["decode", "Packet", &hex]);
    assert!(decoded.status.success());
    let out = json_stdout(&decoded);
    assert_eq!(out["message"], "Packet");
    assert_eq!(out["fields"][0]["value"]["enum"]["symbol"], "Kind::CONTROL");
    assert_eq!(out["fields"][1]["value"]["bitfield"]["value"], 11);
    assert_eq!(out["fields"][2]["value"]["scalar"], 0x0102_0304);
    assert_eq!(out["fields"][3]["value"]["bytes"], "61620000");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_out_of_range_enum_shows_sentinel() {
    let dir = schema_dir("sentinel");
    let output = bitwire(&dir, &["decode", "Packet", "0x09 0000 00000000 00000000"]);
    assert!(output.status.success());
    let out = json_stdout(&output);
    assert_eq!(out["fields"][0]["value"]["enum"]["value"], 2);
    assert_eq!(
        out["fields"][0]["value"]["enum"]["symbol"],
        "Kind::INVALID_ENUM_VALUE"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_short_input_is_data_invalid() {
    let dir = schema_dir("short");
    let output = bitwire(&dir, &["decode", "Packet", "0102"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("9 bytes missing"), "stderr: {stderr}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unknown_message_is_usage_error() {
    let dir = schema_dir("unknown");
    let output = bitwire(&dir, &["encode", "Nope", "seq=1"]);
    assert_eq!(output.status.code(), Some(64));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn broken_definitions_fail_to_load() {
    let dir = unique_temp_dir("broken");
    std::fs::write(dir.join("bad.wire.json"), "{").expect("definitions written");
    let output = bitwire(&dir, &["layout"]);
    assert_eq!(output.status.code(), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pump_reports_clean_run() {
    for backend in ["locking", "lockfree"] {
        let output = Command::new(env!("CARGO_BIN_EXE_bitwire"))
            .args([
                "--log-level",
                "error",
                "--format",
                "json",
                "pump",
                "--backend",
                backend,
                "--producers",
                "2",
                "--consumers",
                "3",
                "--messages",
                "1000",
            ])
            .output()
            .expect("pump should run");

        assert!(output.status.success(), "backend {backend}");
        let report = json_stdout(&output);
        assert_eq!(report["backend"], backend);
        assert_eq!(report["sent"], 2000);
        assert_eq!(report["received"], 2000);
        assert_eq!(report["reordered"], 0);
    }
}

#[test]
fn version_prints_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_bitwire"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("bitwire {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_reports_codec_details() {
    let output = Command::new(env!("CARGO_BIN_EXE_bitwire"))
        .args(["--format", "json", "version", "--extended"])
        .output()
        .expect("version should run");
    assert!(output.status.success());

    let info = json_stdout(&output);
    assert_eq!(info["name"], "bitwire");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(info["byte_order"], "big-endian");
    assert_eq!(info["definition_suffix"], ".wire.json");
    assert_eq!(
        info["queue_backends"],
        serde_json::json!(["locking", "lockfree"])
    );
    assert!(info["max_message_size"].as_u64().is_some_and(|n| n > 0));
}

#[test]
fn schemas_dir_from_environment() {
    let dir = schema_dir("env");
    let output = Command::new(env!("CARGO_BIN_EXE_bitwire"))
        .args(["--log-level", "error", "--format", "json", "layout", "Packet"])
        .env("BITWIRE_SCHEMAS", &dir)
        .output()
        .expect("layout should run");
    assert!(output.status.success());
    assert_eq!(json_stdout(&output)[0]["size"], 11);

    let _ = std::fs::remove_dir_all(&dir);
}
