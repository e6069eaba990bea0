//! Runs every case in `fixtures/*.json`: encode the value, compare against
//! the expected hex, decode the bytes back and compare the rendered JSON.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use borsh_schema::path_de::from_slice_with_path;
use borsh_schema::{Value, decode_exact, encode, schema};
use colored::Colorize;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    schema: serde_json::Value,
    value: serde_json::Value,
    /// Expected encoding; absent when `error` is set.
    #[serde(default)]
    hex: Option<String>,
    /// Expected decode rendering when it differs from `value`.
    #[serde(default)]
    decoded: Option<serde_json::Value>,
    /// Substring of the expected encode error.
    #[serde(default)]
    error: Option<String>,
}

fn run_case(case: &Case) -> Result<(), String> {
    let schema = schema::json::from_json(&case.schema).map_err(|e| e.to_string())?;
    let encoded = encode(&schema, &Value::from(case.value.clone()));

    if let Some(expected) = case.error.as_deref() {
        return match encoded {
            Ok(bytes) => Err(format!("expected error containing {expected:?}, got {}", hex::encode(bytes))),
            Err(error) if error.to_string().contains(expected) => Ok(()),
            Err(error) => Err(format!("expected error containing {expected:?}, got {error}")),
        };
    }

    let bytes = encoded.map_err(|e| e.to_string())?;
    let Some(expected_hex) = case.hex.as_deref() else {
        return Err("case has neither `hex` nor `error`".to_string());
    };
    let actual_hex = hex::encode(&bytes);
    if actual_hex != expected_hex {
        return Err(format!("encoded {actual_hex}, expected {expected_hex}"));
    }

    let decoded = decode_exact(&schema, &bytes).map_err(|e| e.to_string())?.to_json();
    let expected = case.decoded.as_ref().unwrap_or(&case.value);
    if &decoded != expected {
        return Err(format!("decoded {decoded}, expected {expected}"));
    }
    Ok(())
}

fn fixture_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    files.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
    files.sort();
    Ok(files)
}

fn main() -> ExitCode {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures")));
    let files = match fixture_files(&dir) {
        Ok(files) => files,
        Err(error) => {
            eprintln!("{} failed to list {}: {error}", "error:".red().bold(), dir.display());
            return ExitCode::FAILURE;
        }
    };

    let (mut passed, mut failed) = (0usize, 0usize);
    for file in files {
        let cases = std::fs::read(&file)
            .map_err(|e| e.to_string())
            .and_then(|bytes| from_slice_with_path::<Vec<Case>>(&bytes).map_err(|e| e.to_string()));
        let cases = match cases {
            Ok(cases) => cases,
            Err(error) => {
                eprintln!("{} {}: {error}", "error:".red().bold(), file.display());
                failed += 1;
                continue;
            }
        };
        let file_name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        for case in &cases {
            match run_case(case) {
                Ok(()) => {
                    passed += 1;
                    eprintln!("{} {file_name} :: {}", "ok  ".green(), case.name);
                }
                Err(reason) => {
                    failed += 1;
                    eprintln!("{} {file_name} :: {}: {reason}", "FAIL".red().bold(), case.name);
                }
            }
        }
    }

    eprintln!("{passed} passed, {failed} failed");
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
